use crate::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Run an external program to completion and return its stdout.
///
/// `Ok(None)` when the program is not installed. A non-zero exit is
/// [`Error::Command`] carrying the trimmed stderr. The child is killed if the
/// future is dropped, so an aborted task does not leave it running.
pub(crate) async fn run<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<Option<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = match command.output().await {
        Ok(output) => output,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(program, "program not found");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        return Err(Error::Command {
            program: program.to_string(),
            message,
        });
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}
