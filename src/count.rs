use std::{
    ffi::OsString,
    os::unix::process::ExitStatusExt,
    path::Path,
    process::{Command, Stdio},
};

use tracing::debug;

use crate::{error::Error, Result};

/// Default pattern matching lines holding nothing but spaces
pub const BLANK_LINE_PATTERN: &str = "^( )*$";

/// Anything that can tell how many lines of something there are
pub trait LineCountSource {
    fn count(&self) -> Result<u64>;
}

/// Runs a shell command line and reads a non-negative integer from the first line it prints.
#[derive(Debug, Clone)]
pub struct ShellPipeline {
    script: String,
    args: Vec<OsString>,
}

impl ShellPipeline {
    /// Run `script` via `sh -c`.
    pub fn new<S: Into<String>>(script: S) -> ShellPipeline {
        Self {
            script: script.into(),
            args: Vec::new(),
        }
    }

    /// Counts the lines of `path` matching the extended regex `pattern`.
    ///
    /// Both are handed to the shell as positional parameters, never spliced into the script.
    pub fn blank_lines<P: AsRef<Path>>(path: P, pattern: &str) -> ShellPipeline {
        Self::new(r#"grep -E -- "$1" "$2" | wc -l"#)
            .arg(pattern)
            .arg(path.as_ref())
    }

    /// Append a positional parameter, available to the script as `$1`, `$2`, ...
    pub fn arg<A: Into<OsString>>(mut self, arg: A) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl LineCountSource for ShellPipeline {
    fn count(&self) -> Result<u64> {
        debug!(script = %self.script, "running line count pipeline");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.script)
            // $0
            .arg("sh")
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;

        if let Some(signal) = output.status.signal() {
            return Err(Error::ChildSignal(signal));
        }

        match output.status.code() {
            Some(0) => {}
            Some(code) => return Err(Error::ChildExit(code)),
            None => return Err(Error::ChildExit(-1)),
        }

        parse_count(&output.stdout)
    }
}

/// Parses the first line of `stdout` as count.
fn parse_count(stdout: &[u8]) -> Result<u64> {
    let text = String::from_utf8_lossy(stdout);
    let first = text.lines().next().unwrap_or_default().trim();

    first
        .parse::<u64>()
        .map_err(|_| Error::BadCount(first.to_owned()))
}
