use anyhow::{Context as _, Result};

use toxhub::pipeline::prepare;

use super::Context;

/// Display the layout of a study and the resolved analysis defaults
pub fn run(ctx: &Context, study: &str) -> Result<()> {
    let table = ctx
        .store
        .load(ctx.session.identity(), study)
        .with_context(|| format!("Failed to load study {}", study))?;

    println!("Study Information");
    println!("=================");
    println!("Study: {}", study);
    println!("Rows: {}", table.len());
    println!();

    println!("Columns:");
    for (i, header) in table.headers().iter().enumerate() {
        println!("  {:3}. {}", i + 1, header);
    }
    println!();

    let (dataset, config) = prepare(&table, &ctx.config.analysis)?;

    println!("Analysis columns:");
    println!("  Group:       {}", config.columns.group);
    println!("  Time:        {}", config.columns.time);
    println!("  Measurement: {}", config.columns.measurement);
    println!();

    let measured = dataset.observations().iter().filter(|o| o.is_measured()).count();
    println!("Observations: {} ({} measured)", dataset.len(), measured);
    if dataset.skipped_rows() > 0 {
        println!("Skipped rows: {} (no group or time)", dataset.skipped_rows());
    }
    if let Some(first) = dataset.invalid_cells().first() {
        println!(
            "Non-numeric measurements: {} (first: {})",
            dataset.invalid_cells().len(),
            first
        );
    }

    println!("Groups: {}", dataset.groups().join(", "));
    let times: Vec<String> = dataset.time_points().iter().map(|t| t.to_string()).collect();
    println!("Time points: {}", times.join(", "));
    println!();

    println!("Defaults:");
    println!("  Statistic time point: {}", config.statistic_time_point);
    println!(
        "  Control group: {}",
        config.control_group.as_deref().unwrap_or("<none>")
    );

    Ok(())
}
