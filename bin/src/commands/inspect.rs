use super::read_patch;
use crate::cli::Format;
use anyhow::Result;
use std::{io::Write, path::Path};

pub(super) fn inspect(file: &Path, format: Format, out: &mut impl Write) -> Result<()> {
    let patch = read_patch(file)?;
    match format {
        Format::Changes => {
            for change in patch.get_changes() {
                writeln!(out, "{change}")?;
            }
        },
        Format::Json => writeln!(out, "{}", patch.get_json())?,
        Format::Dot => write!(out, "{}", patch.get_dot_graph())?,
    }
    Ok(())
}
