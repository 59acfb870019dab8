use anyhow::{Context as _, Result};

use super::Context;

/// List the studies visible to the logged-in user
pub fn run(ctx: &Context) -> Result<()> {
    let identity = ctx.session.identity();
    let studies = ctx
        .store
        .list(identity)
        .context("Failed to list studies")?;

    println!("Studies for {} ({})", identity.name, identity.id);
    println!("Data directory: {}", ctx.store.root().display());
    println!();

    if studies.is_empty() {
        println!("  (none)");
    }
    for study in &studies {
        println!("  {}", study);
    }

    Ok(())
}
