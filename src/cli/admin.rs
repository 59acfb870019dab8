use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::Context;

/// Copy a study file into the data directory
pub fn upload(ctx: &Context, file: PathBuf, name: Option<String>) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive a study name from {}", file.display()))?,
    };

    let target = ctx
        .store
        .upload(ctx.session.identity(), &file, &name)
        .with_context(|| format!("Failed to upload {}", file.display()))?;
    println!("Uploaded {} -> {}", file.display(), target.display());
    Ok(())
}

/// Remove a study file from the data directory
pub fn delete(ctx: &Context, study: &str) -> Result<()> {
    ctx.store
        .delete(ctx.session.identity(), study)
        .with_context(|| format!("Failed to delete {}", study))?;
    println!("Deleted {}", study);
    Ok(())
}
