use std::path::PathBuf;

use crate::{error::RunError, executor::command};

/// Something the external operation needs before the first item can run.
#[cfg_attr(test, mockall::automock)]
pub trait Prerequisite {
    fn ensure(&self) -> impl Future<Output = Result<PathBuf, RunError>> + Send;
}

/// Requires `program` on `PATH`, optionally installing it once when it is missing.
#[derive(Clone, Debug)]
pub struct ProgramPrerequisite {
    program: String,
    install: Option<Vec<String>>,
}

impl ProgramPrerequisite {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            install: None,
        }
    }

    /// Permits installation with the given command line.
    pub fn install_with(mut self, install: Option<Vec<String>>) -> Self {
        self.install = install.filter(|command| !command.is_empty());
        self
    }

    fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    fn missing(&self) -> RunError {
        RunError::PrerequisiteMissing {
            program: self.program.clone(),
        }
    }
}

impl Prerequisite for ProgramPrerequisite {
    #[tracing::instrument(skip_all, fields(program = %self.program))]
    async fn ensure(&self) -> Result<PathBuf, RunError> {
        if let Some(path) = self.locate() {
            tracing::debug!(path = %path.display(), "found");
            return Ok(path);
        }

        let Some((installer, args)) = self.install.as_ref().and_then(|install| install.split_first()) else {
            return Err(self.missing());
        };

        tracing::info!("{} not found, installing with `{}`", self.program, self.install.iter().flatten().cloned().collect::<Vec<_>>().join(" "));

        match command::run(installer, args, None).await.and_then(|output| command::into_stdout(installer, output)) {
            Ok(_) => tracing::info!("installed {}", self.program),
            Err(err) => tracing::warn!("installation failed: {err:#}"),
        }

        self.locate().ok_or_else(|| self.missing())
    }
}
