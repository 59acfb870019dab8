use super::*;
use std::io::Cursor;

const STUDY_CSV: &str = "Group,Day,BodyWeight\n\
G2,0,21.9\n\
G1,0,21.5\n\
G1,7,23.0\n\
G2,7,NA\n\
,7,22.0\n\
G3,14,\n";

fn load(csv: &str) -> Table {
    Table::from_reader(Cursor::new(csv), b',').unwrap()
}

fn columns() -> ColumnSelection {
    ColumnSelection::new("Group", "Day", "BodyWeight")
}

#[test]
fn test_dataset_from_table() {
    let dataset = Dataset::from_table(&load(STUDY_CSV), &columns()).unwrap();

    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.skipped_rows(), 1);
    assert_eq!(dataset.groups(), vec!["G1", "G2", "G3"]);
    assert_eq!(
        dataset.time_points(),
        vec![TimePoint::from(0), TimePoint::from(7), TimePoint::from(14)]
    );

    let first = &dataset.observations()[0];
    assert_eq!(first.row, 0);
    assert_eq!(first.group, "G2");
    assert_eq!(first.measurement, Some(21.9));

    // NA and empty cells become missing measurements
    assert_eq!(dataset.observations()[3].measurement, None);
    assert_eq!(dataset.observations()[4].measurement, None);
    assert_eq!(dataset.observations()[4].row, 5);
}

#[test]
fn test_non_numeric_measurement_is_recorded() {
    let dataset = Dataset::from_table(
        &load("Group,Day,BodyWeight\nG1,0,1.5\nG1,0,<LOD\nG2,0,NA\n"),
        &columns(),
    )
    .unwrap();

    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.observations()[1].measurement, None);
    assert_eq!(dataset.invalid_cells().len(), 1);

    let cell = &dataset.invalid_cells()[0];
    assert_eq!(cell.row, 1);
    assert_eq!(cell.value, "<LOD");
    assert_eq!(
        cell.to_string(),
        "column 'BodyWeight' has non-numeric value '<LOD' in data row 2"
    );
}

#[test]
fn test_non_numeric_time_is_rejected() {
    let err =
        Dataset::from_table(&load("Group,Day,BodyWeight\nG1,D7,1.0\n"), &columns()).unwrap_err();
    assert!(err.to_string().contains("'Day'"));
}

#[test]
fn test_missing_column() {
    let selection = ColumnSelection::new("Group", "Week", "BodyWeight");
    let err = Dataset::from_table(&load(STUDY_CSV), &selection).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

#[test]
fn test_time_point_ordering_and_display() {
    let mut points = vec![
        TimePoint::from(14),
        TimePoint::new(-0.0).unwrap(),
        TimePoint::new(3.5).unwrap(),
        TimePoint::from(0),
    ];
    points.sort();
    points.dedup();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].to_string(), "0");
    assert_eq!(points[1].to_string(), "3.5");
    assert_eq!(points[2].to_string(), "14");
    assert!(TimePoint::new(f64::NAN).is_none());
}
