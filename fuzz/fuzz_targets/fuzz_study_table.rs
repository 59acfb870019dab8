#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use toxhub::config::AnalysisOptions;
use toxhub::pipeline::{analyze, prepare};
use toxhub::posthoc::{run, Procedure};
use toxhub::report::{export_workbook, ExportOptions};
use toxhub::session::Results;
use toxhub::table::Table;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must load, analyze and export without panicking
    let Ok(table) = Table::from_reader(Cursor::new(data), b',') else {
        return;
    };
    let Ok((dataset, config)) = prepare(&table, &AnalysisOptions::default()) else {
        return;
    };
    let analysis = analyze(&dataset, &config);

    let mut results = Results::new();
    for procedure in Procedure::ALL {
        if let Ok(result) = run(procedure, &analysis.samples, analysis.control()) {
            results.insert(procedure, result);
        }
    }

    let _ = export_workbook(&analysis.summary, &results, &ExportOptions::default());
});
