//! Parsers for the two raw-record sources: the Census API's JSON table
//! format and the local CSV cache written by the `fetch` subcommand.

use std::fs::File;
use std::io::Read;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::error::ValidationError;
use crate::model::{HouseholdRecord, NON_HOUSING_UNIT_INCOME};

/// Columns the pipeline needs, in the order `fetch` requests them.
pub const REQUIRED_COLUMNS: [&str; 6] = ["SERIALNO", "WGTP", "PUMA", "VEH", "TEN", "HINCP"];

/// Parses the Census API response body into household records.
///
/// The API returns a JSON array of arrays: a header row of column names
/// followed by one row per person, every cell a string (or null for
/// not-applicable). Blank HINCP cells mark vacant/group-quarters rows and
/// map to the non-housing-unit sentinel; blank VEH and TEN cells only occur
/// on those same rows and map to values the normalizer rejects if they
/// somehow show up on a real housing unit.
pub fn parse_api_table(bytes: &[u8]) -> Result<Vec<HouseholdRecord>> {
    let table: Vec<Vec<Option<String>>> =
        serde_json::from_slice(bytes).context("Census API response is not a JSON table")?;

    let Some((header, rows)) = table.split_first() else {
        bail!("Census API response contained no header row");
    };

    let mut indices = [0usize; 6];
    for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = header
            .iter()
            .position(|cell| cell.as_deref() == Some(column))
            .with_context(|| format!("Census API response is missing column {column}"))?;
    }
    let [serialno_at, weight_at, puma_at, vehicles_at, tenure_at, income_at] = indices;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != header.len() {
            bail!(
                "Census API row has {} cells, header has {}",
                row.len(),
                header.len()
            );
        }

        let cell = |at: usize| row[at].as_deref().unwrap_or("");
        let serialno = cell(serialno_at).to_string();
        if serialno.is_empty() {
            bail!("Census API row with empty SERIALNO");
        }

        records.push(HouseholdRecord {
            weight: parse_field(&serialno, "WGTP", cell(weight_at))?,
            puma: cell(puma_at).to_string(),
            vehicles: parse_blankable(&serialno, "VEH", cell(vehicles_at), -1)?,
            tenure_code: parse_blankable(&serialno, "TEN", cell(tenure_at), 0)?,
            income: parse_blankable(&serialno, "HINCP", cell(income_at), NON_HOUSING_UNIT_INCOME)?,
            serialno,
        });
    }

    debug!(rows = records.len(), "Parsed API table");
    Ok(records)
}

fn parse_field<T: std::str::FromStr>(
    serialno: &str,
    field: &'static str,
    value: &str,
) -> Result<T, ValidationError> {
    value.parse().map_err(|_| ValidationError::MalformedField {
        serialno: serialno.to_string(),
        field,
        value: value.to_string(),
    })
}

fn parse_blankable(
    serialno: &str,
    field: &'static str,
    value: &str,
    blank_as: i64,
) -> Result<i64, ValidationError> {
    if value.is_empty() {
        return Ok(blank_as);
    }
    parse_field(serialno, field, value)
}

/// Deserializes household records from CSV.
pub fn parse_csv_records<R: Read>(reader: R) -> Result<Vec<HouseholdRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let record: HouseholdRecord = result?;
        records.push(record);
    }

    Ok(records)
}

/// Reads household records from a CSV cache file on disk.
pub fn read_records_csv(path: &str) -> Result<Vec<HouseholdRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let records = parse_csv_records(file)?;

    debug!(path, rows = records.len(), "Read CSV cache");
    Ok(records)
}

/// Writes household records to a CSV cache file.
pub fn write_records_csv(path: &str, records: &[HouseholdRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_table_basic() {
        let body = br#"[
            ["SERIALNO","WGTP","PUMA","VEH","TEN","HINCP","state"],
            ["2023HU01","57","01301","2","3","45000","41"],
            ["2023HU02","31","01302","0","1","120000","41"]
        ]"#;

        let records = parse_api_table(body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].serialno, "2023HU01");
        assert_eq!(records[0].weight, 57.0);
        assert_eq!(records[0].puma, "01301");
        assert_eq!(records[0].vehicles, 2);
        assert_eq!(records[0].tenure_code, 3);
        assert_eq!(records[0].income, 45_000);
    }

    #[test]
    fn test_parse_api_table_blank_cells_mark_non_housing_units() {
        let body = br#"[
            ["SERIALNO","WGTP","PUMA","VEH","TEN","HINCP"],
            ["2023GQ01","0","01301",null,null,null]
        ]"#;

        let records = parse_api_table(body).unwrap();

        assert_eq!(records[0].income, NON_HOUSING_UNIT_INCOME);
        assert_eq!(records[0].vehicles, -1);
        assert_eq!(records[0].tenure_code, 0);
    }

    #[test]
    fn test_parse_api_table_malformed_income() {
        let body = br#"[
            ["SERIALNO","WGTP","PUMA","VEH","TEN","HINCP"],
            ["2023HU01","57","01301","2","3","lots"]
        ]"#;

        let err = parse_api_table(body).unwrap_err();
        assert!(err.to_string().contains("HINCP"));
        assert!(err.to_string().contains("2023HU01"));
    }

    #[test]
    fn test_parse_api_table_missing_column() {
        let body = br#"[
            ["SERIALNO","WGTP","PUMA","VEH","TEN"],
            ["2023HU01","57","01301","2","3"]
        ]"#;

        let err = parse_api_table(body).unwrap_err();
        assert!(err.to_string().contains("HINCP"));
    }

    #[test]
    fn test_csv_round_trip() {
        let records = vec![HouseholdRecord {
            serialno: "2023HU01".to_string(),
            weight: 57.0,
            puma: "01301".to_string(),
            vehicles: 2,
            tenure_code: 3,
            income: 45_000,
        }];

        let path = format!(
            "{}/pums_vehicle_tabulator_test_cache.csv",
            std::env::temp_dir().display()
        );
        let _ = std::fs::remove_file(&path);

        write_records_csv(&path, &records).unwrap();
        let read_back = read_records_csv(&path).unwrap();

        assert_eq!(read_back, records);
        std::fs::remove_file(&path).unwrap();
    }
}
