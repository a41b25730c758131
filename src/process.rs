// Copyright 2026 Martin Pool

//! Run one external process — the compiler or a test harness — to
//! completion, with its output captured for the diagnostic log.

use anyhow::{Context, Result};
use camino::Utf8Path;
use subprocess::{ExitStatus, Popen, PopenConfig, Redirection};
use tracing::{debug, trace};

/// Spawn `argv` in `in_dir` and block until it exits. Spawn failures are
/// errors; a non-zero exit is a normal result the caller interprets.
pub fn run_command(argv: &[String], in_dir: &Utf8Path) -> Result<ExitStatus> {
    debug!("run {}", argv.join(" "));
    let mut child = Popen::create(
        argv,
        PopenConfig {
            stdin: Redirection::None,
            stdout: Redirection::Pipe,
            stderr: Redirection::Merge,
            cwd: Some(in_dir.as_os_str().to_owned()),
            ..Default::default()
        },
    )
    .with_context(|| format!("failed to spawn {}", argv.join(" ")))?;
    let (output, _) = child
        .communicate(None)
        .with_context(|| format!("read output of {}", argv.join(" ")))?;
    let status = child.wait().context("wait for child")?;
    if let Some(output) = output.filter(|o| !o.trim().is_empty()) {
        trace!("child output:\n{output}");
    }
    if !status.success() {
        debug!("{} exited {status:?}", argv.join(" "));
    }
    Ok(status)
}
