//! Subcommand implementations.
//!
//! Each command reads its inputs from disk and writes either a new patch
//! file or a report to the supplied writer.

mod apply;
mod inspect;
mod rewrite;

use crate::cli::Command;
use anyhow::{Context, Result};
use patchwork_patch::Patch;
use std::{fs, io::Write, path::Path};

pub fn run(command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Inspect { file, format } => inspect::inspect(&file, format, out),
        Command::Invert { file, output } => rewrite::invert(&file, &output),
        Command::Combine {
            first,
            second,
            output,
        } => rewrite::combine(&first, &second, &output),
        Command::Rebalance { file, output } => rewrite::rebalance(&file, &output),
        Command::Apply {
            changes,
            base,
            config,
            output,
        } => apply::apply(&changes, &base, config.as_deref(), output.as_deref(), out),
    }
}

pub(crate) fn read_patch(path: &Path) -> Result<Patch> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read patch file: {}", path.display()))?;
    Patch::from_bytes(&bytes)
        .with_context(|| format!("Failed to decode patch file: {}", path.display()))
}

pub(crate) fn write_patch(path: &Path, patch: &Patch) -> Result<()> {
    fs::write(path, patch.to_bytes())
        .with_context(|| format!("Failed to write patch file: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        changes = patch.get_change_count(),
        "wrote patch"
    );
    Ok(())
}
