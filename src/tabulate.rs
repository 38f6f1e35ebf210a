//! Pivots aggregated cells into the wide report tables.
//!
//! This is the one stage that resolves absent-vs-zero: every row materializes
//! all seven vehicle-count columns, filling zero where the aggregation has no
//! cell. Totals and proportion columns are derived here and nowhere else.

use tracing::debug;

use crate::aggregate::{CellCounts, GroupKey, Grouping, weighted_counts};
use crate::error::TabulationError;
use crate::model::{IncomeBracket, NormalizedRecord, Tenure, VEHICLE_TOP_CODE};
use serde::Serialize;

/// One report row: weighted counts per vehicle category, their total, and
/// each category's share of the total.
///
/// `subarea` is `None` on rollup rows. Share columns are rounded to four
/// decimal places; count columns are exact sums of survey weights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideRow {
    pub subarea: Option<String>,
    pub tenure: Tenure,
    pub bracket: IncomeBracket,

    pub vehicles_0: f64,
    pub vehicles_1: f64,
    pub vehicles_2: f64,
    pub vehicles_3: f64,
    pub vehicles_4: f64,
    pub vehicles_5: f64,
    pub vehicles_6_plus: f64,

    pub total: f64,

    pub share_0: f64,
    pub share_1: f64,
    pub share_2: f64,
    pub share_3: f64,
    pub share_4: f64,
    pub share_5: f64,
    pub share_6_plus: f64,
}

impl WideRow {
    /// Count columns in vehicle-category order `0..=6`.
    pub fn counts(&self) -> [f64; 7] {
        [
            self.vehicles_0,
            self.vehicles_1,
            self.vehicles_2,
            self.vehicles_3,
            self.vehicles_4,
            self.vehicles_5,
            self.vehicles_6_plus,
        ]
    }

    /// Share columns in vehicle-category order `0..=6`.
    pub fn shares(&self) -> [f64; 7] {
        [
            self.share_0,
            self.share_1,
            self.share_2,
            self.share_3,
            self.share_4,
            self.share_5,
            self.share_6_plus,
        ]
    }
}

/// Rounds to four decimal places, ties to even.
///
/// Half-to-even is used over half-up so the output is reproducible across
/// environments; the choice only matters on exact .00005 boundaries.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round_ties_even() / 10_000.0
}

/// Pivots an aggregated cell mapping into wide rows.
///
/// Rows come out sorted by tenure, income bracket, then subarea. The
/// ordering is cosmetic but deterministic, inherited from the key order of
/// the cell map.
///
/// # Errors
///
/// Returns [`TabulationError::ZeroTotal`] if a group's weights sum to zero.
/// Groups only exist where records were observed, so this guards an
/// invariant rather than a reachable state.
pub fn build_table(cells: &CellCounts) -> Result<Vec<WideRow>, TabulationError> {
    cells.iter().map(|(key, by_cat)| widen(key, by_cat)).collect()
}

fn widen(
    key: &GroupKey,
    by_cat: &std::collections::BTreeMap<u8, f64>,
) -> Result<WideRow, TabulationError> {
    let mut counts = [0.0_f64; 7];
    for cat in 0..=VEHICLE_TOP_CODE {
        if let Some(weight) = by_cat.get(&cat) {
            counts[cat as usize] = *weight;
        }
    }

    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return Err(TabulationError::ZeroTotal {
            key: format!("{key:?}"),
        });
    }

    let shares = counts.map(|c| round4(c / total));

    Ok(WideRow {
        subarea: key.subarea.clone(),
        tenure: key.tenure,
        bracket: key.bracket,
        vehicles_0: counts[0],
        vehicles_1: counts[1],
        vehicles_2: counts[2],
        vehicles_3: counts[3],
        vehicles_4: counts[4],
        vehicles_5: counts[5],
        vehicles_6_plus: counts[6],
        total,
        share_0: shares[0],
        share_1: shares[1],
        share_2: shares[2],
        share_3: shares[3],
        share_4: shares[4],
        share_5: shares[5],
        share_6_plus: shares[6],
    })
}

/// The four tables the report ships: each tenure both by subarea and rolled
/// up across subareas.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTables {
    pub renter_by_subarea: Vec<WideRow>,
    pub renter_rollup: Vec<WideRow>,
    pub owner_by_subarea: Vec<WideRow>,
    pub owner_rollup: Vec<WideRow>,
}

/// Builds all four report tables from normalized records.
///
/// Rollups re-aggregate from the records with the rollup key rather than
/// summing the by-subarea rows, keeping a single aggregation code path.
pub fn build_report_tables(
    records: &[NormalizedRecord],
) -> Result<ReportTables, TabulationError> {
    let by_subarea = build_table(&weighted_counts(records, Grouping::BySubarea))?;
    let rollup = build_table(&weighted_counts(records, Grouping::Rollup))?;

    let split = |rows: Vec<WideRow>| -> (Vec<WideRow>, Vec<WideRow>) {
        rows.into_iter().partition(|r| r.tenure == Tenure::Renter)
    };
    let (renter_by_subarea, owner_by_subarea) = split(by_subarea);
    let (renter_rollup, owner_rollup) = split(rollup);

    debug!(
        renter_by_subarea = renter_by_subarea.len(),
        renter_rollup = renter_rollup.len(),
        owner_by_subarea = owner_by_subarea.len(),
        owner_rollup = owner_rollup.len(),
        "Built report tables"
    );

    Ok(ReportTables {
        renter_by_subarea,
        renter_rollup,
        owner_by_subarea,
        owner_rollup,
    })
}
