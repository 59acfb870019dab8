use anyhow::{Context as _, Result};
use log::info;
use serde::Serialize;

use toxhub::config::AnalysisOptions;
use toxhub::filter::TimeSelection;
use toxhub::pipeline::{analyze, prepare, Analysis};
use toxhub::posthoc::{Procedure, ProcedureFailure};
use toxhub::report::{
    comparison_sheet, render_failure, render_sheet, summary_sheet, trend_sheet, write_workbook,
    ExportOptions,
};
use toxhub::session::Results;

use super::{AnalyzeArgs, Context};

#[derive(Serialize)]
struct FailureReport {
    procedure: Procedure,
    kind: &'static str,
    message: String,
}

impl From<&ProcedureFailure> for FailureReport {
    fn from(failure: &ProcedureFailure) -> Self {
        Self {
            procedure: failure.procedure,
            kind: failure.error.kind(),
            message: failure.error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    study: &'a str,
    #[serde(flatten)]
    analysis: &'a Analysis,
    results: &'a Results,
    failures: Vec<FailureReport>,
    narrative: String,
}

fn overrides(args: &AnalyzeArgs) -> Result<AnalysisOptions> {
    let statistic_time_point = args
        .time_point
        .as_deref()
        .map(str::parse::<TimeSelection>)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let time_range = match (args.from, args.to) {
        (None, None) => None,
        (from, to) => Some((from.unwrap_or(f64::NEG_INFINITY), to.unwrap_or(f64::INFINITY))),
    };

    Ok(AnalysisOptions {
        group_column: args.group_column.clone(),
        time_column: args.time_column.clone(),
        measurement_column: args.measurement_column.clone(),
        time_range,
        selected_groups: args.groups.clone(),
        statistic_time_point,
        control_group: args.control.clone(),
    })
}

fn selected_procedures(args: &AnalyzeArgs) -> Vec<Procedure> {
    if args.all || args.procedures.is_empty() {
        return Procedure::ALL.to_vec();
    }
    let mut procedures: Vec<Procedure> = args.procedures.iter().map(|p| Procedure::from(*p)).collect();
    procedures.sort();
    procedures.dedup();
    procedures
}

fn colors_enabled() -> bool {
    #[cfg(feature = "colorized_output")]
    {
        console::colors_enabled()
    }
    #[cfg(not(feature = "colorized_output"))]
    {
        false
    }
}

/// Summarize a study, run the selected procedures and optionally export
pub fn run(ctx: &mut Context, args: AnalyzeArgs) -> Result<()> {
    let table = ctx
        .store
        .load(ctx.session.identity(), &args.study)
        .with_context(|| format!("Failed to load study {}", args.study))?;

    let options = ctx.config.analysis.clone().merged_with(overrides(&args)?);
    let (dataset, config) = prepare(&table, &options)?;
    let analysis = analyze(&dataset, &config);

    info!(
        "Analyzing {} for '{}' (session {})",
        args.study,
        ctx.session.identity().id,
        ctx.session.id()
    );

    ctx.session.describe_control(&analysis.summary, analysis.control());
    let mut failures = Vec::new();
    for procedure in selected_procedures(&args) {
        if let Err(failure) = ctx.session.run(procedure, &analysis) {
            failures.push(failure);
        }
    }

    if args.json {
        let report = AnalysisReport {
            study: &args.study,
            analysis: &analysis,
            results: ctx.session.results(),
            failures: failures.iter().map(FailureReport::from).collect(),
            narrative: ctx.session.summary_text(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let colored = colors_enabled();
        println!("{}", render_sheet(&trend_sheet(&analysis.trend), colored));
        println!("{}", render_sheet(&summary_sheet(&analysis.summary), colored));
        for result in ctx.session.results().values() {
            println!("{}", render_sheet(&comparison_sheet(result), colored));
        }
        for failure in &failures {
            print!("{}", render_failure(failure, colored));
        }
        if !failures.is_empty() {
            println!();
        }
        println!("{}", ctx.session.summary_text());
    }

    if let Some(path) = &args.export {
        write_workbook(
            path,
            &analysis.summary,
            ctx.session.results(),
            &ExportOptions::default(),
        )
        .with_context(|| format!("Failed to write report {}", path.display()))?;
        if !args.json {
            println!();
            println!("Report written to {}", path.display());
        }
    }

    Ok(())
}
