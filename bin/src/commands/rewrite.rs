use super::{read_patch, write_patch};
use anyhow::Result;
use std::path::Path;

pub(super) fn invert(file: &Path, output: &Path) -> Result<()> {
    let patch = read_patch(file)?;
    write_patch(output, &patch.invert())
}

pub(super) fn combine(first: &Path, second: &Path, output: &Path) -> Result<()> {
    let mut combined = read_patch(first)?;
    let second = read_patch(second)?;
    combined.combine(&second, true);
    write_patch(output, &combined)
}

pub(super) fn rebalance(file: &Path, output: &Path) -> Result<()> {
    let mut patch = read_patch(file)?;
    patch.rebalance();
    write_patch(output, &patch)
}
