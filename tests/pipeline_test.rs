//! End-to-end tests: study table -> filters -> summary -> post-hoc procedures

use std::io::Cursor;

use toxhub::config::AnalysisOptions;
use toxhub::dataset::{Observation, TimePoint};
use toxhub::error::AnalysisError;
use toxhub::filter::TimeSelection;
use toxhub::pipeline::{analyze, prepare, Analysis};
use toxhub::posthoc::{run, ComparisonResult, GroupSamples, Procedure};
use toxhub::session::{Identity, Role, Session};
use toxhub::summary::summarize_groups;
use toxhub::table::Table;

const STUDY: &str = "\
Animal,Group,Day,BodyWeight,Notes
1,A,0,10,
2,A,0,11,
3,A,0,NA,lost sample
4,B,0,12,
5,B,0,13,
6,C,0,10,
7,C,0,12,
1,A,7,1,
2,A,7,2,
3,A,7,3,
4,B,7,4,
5,B,7,5,
8,B,7,6,
6,C,7,1,
7,C,7,2,
9,C,7,3,
";

fn study() -> Table {
    Table::from_reader(Cursor::new(STUDY), b',').unwrap()
}

fn run_analysis(options: AnalysisOptions) -> Analysis {
    let (dataset, config) = prepare(&study(), &options).unwrap();
    analyze(&dataset, &config)
}

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {} +/- {}, got {}",
        expected,
        tolerance,
        actual
    );
}

#[test]
fn test_defaults_pick_last_time_point_and_first_group() {
    let analysis = run_analysis(AnalysisOptions {
        measurement_column: Some("BodyWeight".to_string()),
        ..Default::default()
    });

    assert_eq!(
        analysis.config.statistic_time_point,
        TimeSelection::At(TimePoint::from(7))
    );
    assert_eq!(analysis.control(), Some("A"));

    let a = analysis.summary.get("A").unwrap();
    assert_eq!(a.count, 3);
    assert_close(a.mean, 2.0, 1e-12);
    assert_close(a.sem, 1.0 / 3f64.sqrt(), 1e-12);

    // trend: 3 groups x 2 days, the NA at day 0 is not counted
    assert_eq!(analysis.trend.len(), 6);
    let a0 = &analysis.trend.rows()[0];
    assert_eq!((a0.group.as_str(), a0.time), ("A", Some(TimePoint::from(0))));
    assert_eq!(a0.count, 2);
    assert_close(a0.mean, 10.5, 1e-12);
}

#[test]
fn test_time_window_and_pooled_statistics() {
    let analysis = run_analysis(AnalysisOptions {
        measurement_column: Some("BodyWeight".to_string()),
        time_range: Some((0.0, 0.0)),
        statistic_time_point: Some(TimeSelection::Pooled),
        ..Default::default()
    });

    assert_eq!(analysis.trend.len(), 3);
    assert!(analysis
        .trend
        .rows()
        .iter()
        .all(|r| r.time == Some(TimePoint::from(0))));
    // pooled statistics stay inside the window
    assert_eq!(analysis.summary.get("B").unwrap().count, 2);
}

#[test]
fn test_group_selection_limits_every_step() {
    let analysis = run_analysis(AnalysisOptions {
        measurement_column: Some("BodyWeight".to_string()),
        selected_groups: Some(vec!["A".to_string(), "B".to_string()]),
        ..Default::default()
    });

    assert_eq!(analysis.summary.len(), 2);
    assert_eq!(analysis.samples.len(), 2);
    assert!(analysis.trend.rows().iter().all(|r| r.group != "C"));
}

#[test]
fn test_unknown_control_is_configuration_error() {
    let err = prepare(
        &study(),
        &AnalysisOptions {
            measurement_column: Some("BodyWeight".to_string()),
            control_group: Some("Z".to_string()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

#[test]
fn test_non_numeric_cell_only_fails_procedures() {
    let table = Table::from_reader(
        Cursor::new("Group,Day,BodyWeight\nA,0,1\nA,0,2\nB,0,3\nB,0,<LOD\nB,0,5\n"),
        b',',
    )
    .unwrap();
    let (dataset, config) = prepare(&table, &AnalysisOptions::default()).unwrap();
    let analysis = analyze(&dataset, &config);

    // the summary still renders, with the bad cell treated as missing
    assert_eq!(analysis.summary.len(), 2);
    assert_eq!(analysis.summary.get("B").unwrap().count, 2);
    assert_eq!(analysis.trend.len(), 2);
    assert_eq!(analysis.invalid_cells.len(), 1);

    let mut session = Session::for_identity(Identity {
        id: "client01".to_string(),
        name: "Client".to_string(),
        role: Role::User,
        prefix: String::new(),
    });
    for procedure in Procedure::ALL {
        let failure = session.run(procedure, &analysis).unwrap_err();
        assert!(matches!(failure.error, AnalysisError::Configuration(_)));
        let message = failure.to_string();
        assert!(message.starts_with(procedure.label()), "{}", message);
        assert!(message.contains("'BodyWeight'"), "{}", message);
        assert!(message.contains("'<LOD'"), "{}", message);
        assert!(message.contains("data row 4"), "{}", message);
    }
    assert!(session.results().is_empty());
}

#[test]
fn test_text_column_as_measurement_still_summarizes() {
    let analysis = run_analysis(AnalysisOptions {
        measurement_column: Some("Notes".to_string()),
        statistic_time_point: Some(TimeSelection::Pooled),
        ..Default::default()
    });

    assert!(analysis.summary.is_empty());
    assert_eq!(analysis.invalid_cells.len(), 1);
    assert_eq!(analysis.invalid_cells[0].value, "lost sample");
    assert!(matches!(
        analysis.run(Procedure::Tukey),
        Err(AnalysisError::Configuration(_))
    ));
}

#[test]
fn test_three_procedures_on_study() {
    let analysis = run_analysis(AnalysisOptions {
        measurement_column: Some("BodyWeight".to_string()),
        control_group: Some("A".to_string()),
        ..Default::default()
    });

    let dunnett = match run(Procedure::Dunnett, &analysis.samples, analysis.control()).unwrap() {
        ComparisonResult::Dunnett(result) => result,
        other => panic!("unexpected result: {:?}", other),
    };
    assert_eq!(dunnett.rows.len(), 2);
    assert_eq!(dunnett.rows[0].comparison, "A vs B");
    assert_close(dunnett.rows[0].p_value, 0.018424, 1e-3);
    assert_close(dunnett.rows[1].p_value, 1.0, 1e-6);

    let tukey = match run(Procedure::Tukey, &analysis.samples, None).unwrap() {
        ComparisonResult::Tukey(result) => result,
        other => panic!("unexpected result: {:?}", other),
    };
    assert_eq!(tukey.rows.len(), 3);
    let ab = &tukey.rows[0];
    assert_eq!((ab.group1.as_str(), ab.group2.as_str()), ("A", "B"));
    assert_close(ab.mean_difference, 3.0, 1e-12);
    assert_close(ab.p_adjusted, 0.024229, 1e-3);
    assert_close(ab.lower, 0.49476, 1e-2);
    assert_close(ab.upper, 5.50524, 1e-2);
    assert!(ab.reject);

    let scheffe = match run(Procedure::Scheffe, &analysis.samples, None).unwrap() {
        ComparisonResult::Scheffe(result) => result,
        other => panic!("unexpected result: {:?}", other),
    };
    assert_eq!(scheffe.pairs, 3);
    let ab = &scheffe.rows[0];
    assert_eq!(ab.mean_difference, -3.0);
    assert_close(ab.p_value, 0.021312, 1e-4);
    assert_close(ab.p_adjusted, 0.063936, 3e-4);
    assert_eq!(ab.marker(), "ns");
}

#[test]
fn test_procedures_are_deterministic() {
    let analysis = run_analysis(AnalysisOptions {
        measurement_column: Some("BodyWeight".to_string()),
        ..Default::default()
    });
    for procedure in Procedure::ALL {
        let first = run(procedure, &analysis.samples, analysis.control()).unwrap();
        let second = run(procedure, &analysis.samples, analysis.control()).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_single_animal_group_only_blocks_dunnett() {
    let samples = GroupSamples::from_groups(vec![
        ("A", vec![1.0, 2.0, 3.0]),
        ("B", vec![4.0, 5.0, 6.0]),
        ("C", vec![2.0]),
    ]);
    assert!(matches!(
        run(Procedure::Dunnett, &samples, Some("A")),
        Err(AnalysisError::InsufficientData(_))
    ));
    assert_eq!(run(Procedure::Tukey, &samples, None).unwrap().len(), 3);
    assert_eq!(run(Procedure::Scheffe, &samples, None).unwrap().len(), 3);
}

#[test]
fn test_dunnett_without_control_data_fails_cleanly() {
    let samples = GroupSamples::from_groups(vec![
        ("B", vec![4.0, 5.0, 6.0]),
        ("C", vec![1.0, 2.0, 3.0]),
    ]);
    let err = run(Procedure::Dunnett, &samples, Some("A")).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn observations(values: &[Option<f64>]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(row, value)| Observation {
                row,
                group: "G1".to_string(),
                time: TimePoint::from(0),
                measurement: *value,
            })
            .collect()
    }

    proptest! {
        /// count, mean and sem follow their textbook definitions
        #[test]
        fn test_summary_matches_definitions(
            values in prop::collection::vec(prop::option::of(-1e3f64..1e3), 1..40)
        ) {
            let observations = observations(&values);
            let summary = summarize_groups(observations.iter());
            let present: Vec<f64> = values.iter().flatten().copied().collect();

            // a group with no measurement produces no row
            let Some(row) = summary.get("G1") else {
                prop_assert!(present.is_empty());
                return Ok(());
            };
            prop_assert_eq!(row.count, present.len());

            let mean = present.iter().sum::<f64>() / present.len() as f64;
            prop_assert!((row.mean - mean).abs() < 1e-9);

            if present.len() <= 1 {
                prop_assert!(row.sem.is_nan());
            } else {
                let n = present.len() as f64;
                let mean = present.iter().sum::<f64>() / n;
                let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
                prop_assert!((row.sem - (var / n).sqrt()).abs() < 1e-9);
            }
        }

        /// Bonferroni adjusted p-values never exceed 1 and are never below the raw p
        #[test]
        fn test_bonferroni_adjustment_is_capped(
            groups in prop::collection::vec(prop::collection::vec(0.0f64..100.0, 3..8), 2..6)
        ) {
            let samples = GroupSamples::from_groups(
                groups.into_iter().enumerate().map(|(i, v)| (format!("G{}", i), v)),
            );
            if let Ok(ComparisonResult::Scheffe(result)) = run(Procedure::Scheffe, &samples, None) {
                for row in &result.rows {
                    prop_assert!(row.p_adjusted <= 1.0);
                    prop_assert!(row.p_adjusted >= row.p_value);
                    let expected = (row.p_value * result.pairs as f64).min(1.0);
                    prop_assert!((row.p_adjusted - expected).abs() < 1e-12);
                }
            }
        }
    }
}
