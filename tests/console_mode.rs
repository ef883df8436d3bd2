mod support;

use predicates::prelude::*;
use predicates::str::contains;

use support::TestDir;

#[test]
fn console_session_persists_changes() {
    let dir = TestDir::new();

    dir.cmd()
        .arg("console")
        .write_stdin(
            "task-cli add \"Buy groceries\"\n\
             task-cli add \"Write report\"\n\
             update 1 \"Buy groceries and cook\" --status in-progress\n\
             delete 2\n\
             list\n\
             exit\n",
        )
        .assert()
        .success()
        .stdout(contains("> "))
        .stdout(contains("Task added successfully. (ID: 2)"))
        .stdout(contains("Buy groceries and cook"))
        .stdout(contains("Goodbye! :)"));

    let document = dir.read_document();
    assert_eq!(document["nextId"], 3);
    assert_eq!(document["tasks"][0]["status"], "IN_PROGRESS");
    assert_eq!(document["tasks"].as_array().expect("tasks").len(), 1);
}

#[test]
fn console_reports_errors_and_continues() {
    let dir = TestDir::new();

    dir.cmd()
        .arg("console")
        .write_stdin("get 5\nadd \"unterminated\nadd fine\n")
        .assert()
        .success()
        .stdout(contains("error: Task not found: 5"))
        .stdout(contains("unterminated quote"))
        .stdout(contains("Task added successfully. (ID: 1)"));
}

#[test]
fn console_ends_at_end_of_input() {
    let dir = TestDir::new();
    dir.cmd()
        .arg("console")
        .write_stdin("add one\n")
        .assert()
        .success()
        .stdout(contains("Task added successfully. (ID: 1)"));
}

#[test]
fn run_executes_script() {
    let dir = TestDir::new();
    let script = dir
        .write_file(
            "seed.tasks",
            "# seed the list\n\nadd \"Buy groceries\"\nadd \"Write report\"\nmark-done 2\n",
        )
        .expect("write script");

    dir.cmd()
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(contains("Task marked done successfully."))
        .stdout(contains("> ").not());

    let listed = dir.json(&["list", "done"]);
    assert_eq!(listed["data"]["count"], 1);
    assert_eq!(listed["data"]["tasks"][0]["description"], "Write report");
}

#[test]
fn run_stops_at_first_failure() {
    let dir = TestDir::new();
    let script = dir
        .write_file("broken.tasks", "add one\ndelete 9\nadd two\n")
        .expect("write script");

    dir.cmd()
        .arg("run")
        .arg(&script)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Task not found: 9"));

    let listed = dir.json(&["list"]);
    assert_eq!(listed["data"]["count"], 1);
}

#[test]
fn run_requires_readable_script() {
    let dir = TestDir::new();
    dir.cmd()
        .args(["run", "missing.tasks"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("cannot read script"));
}
