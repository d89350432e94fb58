//! Static analyzer invocation and diagnostic extraction.
//!
//! Runs luacheck against one file with one config, streams its stdout line by
//! line, and keeps only "accessing undefined variable" diagnostics whose
//! identifier follows one of our naming conventions. Everything else the
//! analyzer says (syntax errors, style warnings) is ignored.

use crate::classify::Reference;
use crate::error::AnalyzerError;
use log::debug;
use regex::Regex;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

static DIAGNOSTIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.+?):(\d+):(\d+):\s*(.*)$").unwrap());
static UNDEFINED_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^accessing undefined variable '(\w+)'").unwrap());

/// luacheck exits with 0, 1 or 2 for "no warnings", "warnings" and
/// "errors"; anything above means the tool itself failed.
const MAX_DIAGNOSTIC_EXIT_CODE: i32 = 2;
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One diagnostic as reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// `file:line:column`, kept opaque.
    pub location: String,
    pub message: String,
}

/// Parses a `<location>: <message>` line. Other lines yield `None`.
pub fn parse_diagnostic(line: &str) -> Option<Diagnostic> {
    let caps = DIAGNOSTIC_LINE.captures(line.trim_end())?;
    Some(Diagnostic {
        location: format!("{}:{}:{}", &caps[1], &caps[2], &caps[3]),
        message: caps[4].to_string(),
    })
}

/// Extracts the identifier of an "accessing undefined variable" message.
pub fn undefined_variable(message: &str) -> Option<&str> {
    UNDEFINED_VARIABLE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Maps analyzer output lines to classified references, in emission order.
pub fn references_from_lines<I, S>(lines: I) -> Vec<Reference>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| reference_from_line(line.as_ref()))
        .collect()
}

fn reference_from_line(line: &str) -> Option<Reference> {
    let diagnostic = parse_diagnostic(line)?;
    let identifier = undefined_variable(&diagnostic.message)?;
    let reference = Reference::from_identifier(identifier);
    if reference.is_none() {
        debug!("ignoring undefined '{}' at {}", identifier, diagnostic.location);
    }
    reference
}

/// Runs `program` on `source` with `config` and returns the references it
/// reports, in the order they were emitted.
///
/// The analyzer is killed and an error returned if it has not exited
/// within `timeout`.
pub fn analyze(
    program: &str,
    source: &Path,
    config: &Path,
    timeout: Duration,
) -> Result<Vec<Reference>, AnalyzerError> {
    debug!(
        "running {} -q --no-color --config {} {}",
        program,
        config.display(),
        source.display()
    );
    let mut child = Command::new(program)
        .arg("-q")
        .arg("--no-color")
        .arg("--config")
        .arg(config)
        .arg(source)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| AnalyzerError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let Some(stdout) = child.stdout.take() else {
        let _ = child.kill();
        return Err(AnalyzerError::Io(std::io::Error::other(
            "analyzer stdout was not captured",
        )));
    };

    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let deadline = Instant::now() + timeout;
    let mut references = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(line)) => references.extend(reference_from_line(&line)),
            Ok(Err(err)) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalyzerError::Io(err));
            }
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalyzerError::Timeout {
                    program: program.to_string(),
                    timeout,
                });
            }
        }
    }
    let _ = reader.join();

    // Closing stdout is not exiting; the deadline covers the wait too.
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AnalyzerError::Timeout {
                program: program.to_string(),
                timeout,
            });
        }
        thread::sleep(remaining.min(EXIT_POLL_INTERVAL));
    };
    match status.code() {
        Some(code) if code <= MAX_DIAGNOSTIC_EXIT_CODE => Ok(references),
        _ => Err(AnalyzerError::Failed {
            program: program.to_string(),
            status: status.to_string(),
        }),
    }
}
