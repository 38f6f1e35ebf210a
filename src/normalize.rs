//! Record normalization: one clean housing unit per household.
//!
//! The microdata source delivers one row per *person*, with household-level
//! fields repeated on every row. This stage collapses that repetition and
//! drops vacant/group-quarters records, then recodes tenure and income into
//! the categories the report tabulates.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ValidationError;
use crate::model::{
    HouseholdRecord, IncomeBracket, NON_HOUSING_UNIT_INCOME, NormalizedRecord, Tenure,
    VEHICLE_TOP_CODE,
};

/// Normalizes raw household rows into one [`NormalizedRecord`] per household.
///
/// Order of operations: deduplicate by SERIALNO (first occurrence wins, later
/// occurrences must agree on every household-level field), discard
/// non-housing-unit records, then recode tenure, vehicles, and income.
///
/// # Errors
///
/// Fails on the first record with an unrecognized tenure code, a negative
/// vehicle count, or duplicate rows whose household-level fields disagree.
pub fn normalize(records: &[HouseholdRecord]) -> Result<Vec<NormalizedRecord>, ValidationError> {
    let mut seen: HashMap<&str, &HouseholdRecord> = HashMap::new();
    let mut out = Vec::new();

    for record in records {
        if let Some(first) = seen.get(record.serialno.as_str()) {
            // Person rows repeat the household fields verbatim; anything
            // else means the source contract is broken.
            if *first != record {
                return Err(ValidationError::DuplicateFieldMismatch {
                    serialno: record.serialno.clone(),
                });
            }
            continue;
        }
        seen.insert(&record.serialno, record);

        if record.income == NON_HOUSING_UNIT_INCOME {
            continue;
        }

        out.push(normalize_one(record)?);
    }

    debug!(
        raw_rows = records.len(),
        households = out.len(),
        "Normalized household records"
    );

    Ok(out)
}

fn normalize_one(record: &HouseholdRecord) -> Result<NormalizedRecord, ValidationError> {
    let tenure = Tenure::from_code(record.tenure_code).ok_or_else(|| {
        ValidationError::UnknownTenureCode {
            serialno: record.serialno.clone(),
            code: record.tenure_code,
        }
    })?;

    if record.vehicles < 0 {
        return Err(ValidationError::NegativeVehicleCount {
            serialno: record.serialno.clone(),
            count: record.vehicles,
        });
    }
    let vehicles = (record.vehicles as u64).min(VEHICLE_TOP_CODE as u64) as u8;

    Ok(NormalizedRecord {
        serialno: record.serialno.clone(),
        weight: record.weight,
        puma: record.puma.clone(),
        vehicles,
        tenure,
        bracket: IncomeBracket::classify(record.income),
    })
}
