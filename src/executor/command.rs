use std::{ffi::OsStr, process::{Output, Stdio}, time::Duration};

use anyhow::Context as _;
use tokio::process::Command;

use crate::{executor::Executor, item::WorkItem};

const ID_PLACEHOLDER: &str = "{id}";
const LINE_PLACEHOLDER: &str = "{line}";

/// Runs an arbitrary program once per item, its stdout becoming the payload.
///
/// Arguments may reference `{id}` and `{line}`. When neither appears, the identifier
/// is appended as the last argument.
#[derive(Clone, Debug)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandExecutor {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn render_args(&self, item: &WorkItem) -> Vec<String> {
        let templated = self.args.iter().any(|arg| arg.contains(ID_PLACEHOLDER) || arg.contains(LINE_PLACEHOLDER));
        let mut args = self
            .args
            .iter()
            .map(|arg| arg.replace(ID_PLACEHOLDER, &item.id).replace(LINE_PLACEHOLDER, &item.line))
            .collect::<Vec<_>>();
        if !templated {
            args.push(item.id.clone());
        }

        args
    }
}

impl Executor for CommandExecutor {
    #[tracing::instrument(skip_all, fields(item = %item.id))]
    async fn execute(&self, item: WorkItem) -> anyhow::Result<String> {
        let output = run(&self.program, self.render_args(&item), self.timeout).await?;
        let stdout = into_stdout(&self.program, output)?;

        String::from_utf8(stdout).with_context(|| format!("{} printed invalid UTF-8", self.program))
    }
}

/// Spawns `program` and waits for it. The child is killed if the returned future is dropped.
pub async fn run<I, S>(program: &str, args: I, timeout: Option<Duration>) -> anyhow::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null()).kill_on_drop(true);

    tracing::debug!(program, "spawning");

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, command.output())
            .await
            .map_err(|_| anyhow::anyhow!("{program} timed out after {}s", limit.as_secs_f64()))?,
        None => command.output().await,
    };

    output.with_context(|| format!("failed to run {program}"))
}

pub fn into_stdout(program: &str, output: Output) -> anyhow::Result<Vec<u8>> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            anyhow::bail!("{program} exited with {}", output.status);
        }
        anyhow::bail!("{program} exited with {}: {stderr}", output.status);
    }

    Ok(output.stdout)
}
