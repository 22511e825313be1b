use std::path::{Path, PathBuf};

use assert_cmd::{assert::Assert, Command};
use tempfile::TempDir;

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(input: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("input.txt"), input).unwrap();

        Self { dir }
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("input.txt")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.output().join(path)).unwrap()
    }

    /// `ratebatch run` against this workspace, without delay unless overridden later.
    pub fn run<I, S>(&self, extra: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = Command::cargo_bin("ratebatch").unwrap();
        command
            .env_remove("RATEBATCH_DELAY")
            .env_remove("RATEBATCH_LIMIT")
            .env_remove("RATEBATCH_OUTPUT")
            .arg("run")
            .arg(self.input())
            .arg("--output")
            .arg(self.output())
            .args(extra);
        command
    }
}

pub fn stdout(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

pub fn stderr(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}
