use derive_more::Display;
use derive_more::From;
use log::{debug, error, info, warn};
use std::future::poll_fn;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::task::Poll;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::Command;
use tokio::select;

#[derive(Debug, From, Display)]
pub enum CommandError {
    #[display(fmt = "IO Error occurred while executing command: {}", _0)]
    IO(io::Error),
    #[display(fmt = "Process exited with non-zero exit code: Code {}", _0)]
    NonZeroExitCode(i32),
}

impl std::error::Error for CommandError {}

pub type CommandResult<T> = Result<T, CommandError>;

/// Executes `program` with `args` in the provided working directory
/// piping its output to the application log and returning the exit
/// status once the process has finished
pub async fn run_command(
    working_dir: impl AsRef<Path>,
    program: &str,
    args: &[&str],
) -> CommandResult<ExitStatus> {
    let working_dir = working_dir.as_ref();
    debug!("{program} {} (in {working_dir:?})", args.join(" "));

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    pipe_and_wait(command).await
}

/// Same as [`run_command`] but treats any non-zero exit code as an error
pub async fn run_command_checked(
    working_dir: impl AsRef<Path>,
    program: &str,
    args: &[&str],
) -> CommandResult<()> {
    let status = run_command(working_dir, program, args).await?;
    match exit_code(status) {
        0 => Ok(()),
        code => Err(CommandError::NonZeroExitCode(code)),
    }
}

/// Exit code of a finished process. Processes killed by a signal
/// have no code and are reported as -1
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Line reader over a child stream which may not exist or may
/// have already reached its end
struct OptionalReader<V> {
    child: Option<Lines<BufReader<V>>>,
}

impl<V> OptionalReader<V>
where
    V: Unpin + AsyncRead,
{
    fn new(value: Option<V>) -> Self {
        Self {
            child: value.map(|value| BufReader::new(value).lines()),
        }
    }

    fn is_open(&self) -> bool {
        self.child.is_some()
    }

    async fn next_line(&mut self) -> io::Result<Option<String>> {
        if let Some(child) = &mut self.child {
            let line = child.next_line().await?;
            if line.is_none() {
                self.child = None;
            }
            return Ok(line);
        }
        // Never resolve if no child
        poll_fn(|_| Poll::Pending).await
    }
}

/// Spawns the command child piping its output to the logging for
/// the application and waiting until the process exits returning the
/// exit status of the program or an Error
async fn pipe_and_wait(mut command: Command) -> CommandResult<ExitStatus> {
    let mut child = command.spawn()?;

    let mut stdout = OptionalReader::new(child.stdout.take());
    let mut stderr = OptionalReader::new(child.stderr.take());

    /// Git reports most progress on stderr so only lines which look
    /// like failures are raised above info
    fn pipe_line(line: &str, stderr: bool) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if trimmed.starts_with("fatal:") || trimmed.starts_with("error:") {
            error!("{trimmed}");
        } else if trimmed.starts_with("warning:") || trimmed.starts_with("hint:") {
            warn!("{trimmed}");
        } else if stderr {
            debug!("{trimmed}");
        } else {
            info!("{trimmed}");
        }
    }

    while stdout.is_open() || stderr.is_open() {
        select! {
            result = stdout.next_line() => {
                if let Some(line) = result? {
                    pipe_line(&line, false);
                }
            }
            result = stderr.next_line() => {
                if let Some(line) = result? {
                    pipe_line(&line, true);
                }
            }
        }
    }

    Ok(child.wait().await?)
}
