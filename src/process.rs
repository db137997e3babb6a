use std::{process::Stdio, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, Command},
    time::timeout,
};
use tokio_stream::{wrappers::SplitStream, StreamExt};
use tracing::{debug, info, warn};

#[derive(thiserror::Error, Debug)]
pub enum StepError {
    #[error("failed to spawn '{step}': {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for '{step}': {source}")]
    Wait {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{step}' failed with exit code {}", code.map(|code| code.to_string()).unwrap_or_else(|| "none (terminated by signal)".to_string()))]
    Failed { step: String, code: Option<i32> },

    #[error("'{step}' timed out after {}s", limit.as_secs())]
    Timeout { step: String, limit: Duration },
}

/// Logs the child's output line by line. Output is decoded lossily and a
/// read failure only stops the logging, never the step.
async fn stream_output(step: &str, child: &mut Child) {
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return;
    };

    let stdout = SplitStream::new(BufReader::new(stdout).split(b'\n'));
    let stderr = SplitStream::new(BufReader::new(stderr).split(b'\n'));

    let mut stdio_merged = StreamExt::merge(stdout, stderr);

    while let Some(line) = stdio_merged.next().await {
        match line {
            Ok(line) => info!("{}: {}", step, String::from_utf8_lossy(&line).trim_end()),
            Err(err) => {
                warn!("{}: failed to read output: {}", step, err);
                break;
            }
        }
    }
}

/// Runs `command` to completion, forwarding its output to the log.
///
/// A non-zero exit is an error; the child is killed if the returned future
/// is dropped before it finishes.
pub async fn run(step: &str, command: &mut Command) -> Result<(), StepError> {
    debug!("{}: {:?}", step, command.as_std());

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| StepError::Spawn {
            step: step.to_string(),
            source,
        })?;

    stream_output(step, &mut child).await;

    let status = child.wait().await.map_err(|source| StepError::Wait {
        step: step.to_string(),
        source,
    })?;

    if !status.success() {
        return Err(StepError::Failed {
            step: step.to_string(),
            code: status.code(),
        });
    }

    Ok(())
}

pub async fn run_with_timeout(
    step: &str,
    command: &mut Command,
    limit: Duration,
) -> Result<(), StepError> {
    timeout(limit, run(step, command))
        .await
        .map_err(|_| StepError::Timeout {
            step: step.to_string(),
            limit,
        })?
}

/// Runs a check command silently and reports whether it exited with zero.
pub async fn succeeds(step: &str, command: &mut Command) -> Result<bool, StepError> {
    let status = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| StepError::Spawn {
            step: step.to_string(),
            source,
        })?;

    debug!("{}: {}", step, status);

    Ok(status.success())
}
