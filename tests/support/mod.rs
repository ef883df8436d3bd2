#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Scratch directory that task-cli runs in, isolated from the user's config.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Default document location: `tasks.json` in the working directory
    pub fn document_path(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_document(&self) -> Value {
        let text = fs::read_to_string(self.document_path()).expect("read document");
        serde_json::from_str(&text).expect("document json")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("task-cli").expect("binary");
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("xdg"))
            .env_remove("TASK_CLI_FILE")
            .env_remove("TASK_CLI_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run a command with `--json` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }
}
