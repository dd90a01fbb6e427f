use anyhow::{Context, Result, bail};
use std::process::Command;

/// Run an external tool to completion, logging the invocation.
///
/// Stdout/stderr are inherited so long-running tools (COLMAP, Instant-NGP)
/// stay visible in the service log. A non-zero exit status is an error.
pub fn run_tool(command: &mut Command) -> Result<()> {
    log::info!(
        "Running: {} {}",
        command.get_program().to_string_lossy(),
        command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let program = command.get_program().to_string_lossy().into_owned();
    let status = command
        .status()
        .with_context(|| format!("Failed to start '{}'. Is it installed?", program))?;

    if !status.success() {
        bail!("'{}' exited with status {}", program, status);
    }
    Ok(())
}
