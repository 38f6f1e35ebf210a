//! Trait for the external microdata retrieval collaborator.

use anyhow::Result;

use pums_vehicle_tabulator::model::HouseholdRecord;

/// Abstraction over a survey microdata provider (e.g., the Census Bureau
/// PUMS API).
///
/// The contract matches the raw source: one row per person, household-level
/// fields repeated across a household's rows. Deduplication is the
/// normalizer's job, not the provider's.
#[async_trait::async_trait]
pub trait MicrodataApi {
    /// Returns every raw household row for the configured survey extract.
    async fn fetch_households(&self) -> Result<Vec<HouseholdRecord>>;
}
