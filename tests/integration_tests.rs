use pums_vehicle_tabulator::loader::parse_csv_records;
use pums_vehicle_tabulator::model::{IncomeBracket, Tenure};
use pums_vehicle_tabulator::normalize::normalize;
use pums_vehicle_tabulator::report::write_workbook;
use pums_vehicle_tabulator::tabulate::build_report_tables;

#[test]
fn test_full_pipeline() {
    let bytes = include_bytes!("fixtures/sample_pums.csv");
    let raw = parse_csv_records(&bytes[..]).expect("Failed to parse fixture");
    assert_eq!(raw.len(), 9);

    // 6 distinct households, one of them a group-quarters row
    let records = normalize(&raw).expect("Failed to normalize fixture");
    assert_eq!(records.len(), 5);

    let tables = build_report_tables(&records).expect("Failed to build tables");

    assert_eq!(tables.renter_rollup.len(), 2);
    assert_eq!(tables.owner_rollup.len(), 2);
    assert_eq!(tables.renter_by_subarea.len(), 3);
    assert_eq!(tables.owner_by_subarea.len(), 2);

    // Renter 60-90% AMI bracket spans two PUMAs with equal weight
    let renters = &tables.renter_rollup[1];
    assert_eq!(renters.bracket, IncomeBracket::Ami60To90);
    assert_eq!(renters.vehicles_0, 5.0);
    assert_eq!(renters.vehicles_2, 5.0);
    assert_eq!(renters.total, 10.0);
    assert_eq!(renters.share_0, 0.5);
    assert_eq!(renters.share_2, 0.5);

    // Owner 0-30% AMI bracket is a single one-vehicle household
    let owners = &tables.owner_rollup[0];
    assert_eq!(owners.tenure, Tenure::Homeowner);
    assert_eq!(owners.bracket, IncomeBracket::UpTo30Ami);
    assert_eq!(owners.vehicles_1, 10.0);
    assert_eq!(owners.total, 10.0);
    assert_eq!(owners.share_1, 1.0);
}

#[test]
fn test_rollup_totals_match_by_subarea_sums() {
    let bytes = include_bytes!("fixtures/sample_pums.csv");
    let records = normalize(&parse_csv_records(&bytes[..]).unwrap()).unwrap();
    let tables = build_report_tables(&records).unwrap();

    for rollup_row in &tables.renter_rollup {
        let summed: f64 = tables
            .renter_by_subarea
            .iter()
            .filter(|r| r.bracket == rollup_row.bracket)
            .map(|r| r.total)
            .sum();
        assert!((summed - rollup_row.total).abs() < 1e-9);
    }
}

#[test]
fn test_pipeline_writes_workbook() {
    let bytes = include_bytes!("fixtures/sample_pums.csv");
    let records = normalize(&parse_csv_records(&bytes[..]).unwrap()).unwrap();
    let tables = build_report_tables(&records).unwrap();

    let path = format!(
        "{}/pums_vehicle_tabulator_integration.xlsx",
        std::env::temp_dir().display()
    );
    let _ = std::fs::remove_file(&path);

    write_workbook(&path, &tables).expect("Failed to write workbook");
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    std::fs::remove_file(&path).unwrap();
}
