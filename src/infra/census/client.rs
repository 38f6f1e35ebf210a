use std::time::Duration;

use anyhow::Result;

use crate::services::microdata_api::MicrodataApi;
use pums_vehicle_tabulator::loader::{REQUIRED_COLUMNS, parse_api_table};
use pums_vehicle_tabulator::model::HouseholdRecord;

/// Client for the Census Bureau ACS 1-year PUMS endpoint.
///
/// Requests the household columns the pipeline needs for a single state's
/// PUMAs. The API works without a key for low request volumes; set
/// `CENSUS_API_KEY` to lift the daily cap.
pub struct CensusPumsClient {
    base_url: String,
    year: u16,
    state: String,
    pumas: String,
    api_key: Option<String>,
}

impl CensusPumsClient {
    pub fn new(year: u16, state: String, pumas: String, api_key: Option<String>) -> Self {
        Self {
            base_url: "https://api.census.gov".to_string(),
            year,
            state,
            pumas,
            api_key,
        }
    }

    fn query_url(&self) -> String {
        let mut url = format!(
            "{}/data/{}/acs/acs1/pums?get={}&for=public%20use%20microdata%20area:{}&in=state:{}",
            self.base_url,
            self.year,
            REQUIRED_COLUMNS.join(","),
            self.pumas,
            self.state,
        );
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(key);
        }
        url
    }
}

#[async_trait::async_trait]
impl MicrodataApi for CensusPumsClient {
    async fn fetch_households(&self) -> Result<Vec<HouseholdRecord>> {
        let url = self.query_url();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("API returned status {}: {}", status, body));
        }

        let bytes = response.bytes().await?;
        parse_api_table(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_shape() {
        let client = CensusPumsClient::new(2023, "41".to_string(), "*".to_string(), None);
        let url = client.query_url();

        assert!(url.starts_with("https://api.census.gov/data/2023/acs/acs1/pums?"));
        assert!(url.contains("get=SERIALNO,WGTP,PUMA,VEH,TEN,HINCP"));
        assert!(url.contains("for=public%20use%20microdata%20area:*"));
        assert!(url.contains("in=state:41"));
        assert!(!url.contains("key="));
    }

    #[test]
    fn test_query_url_appends_key() {
        let client = CensusPumsClient::new(
            2023,
            "41".to_string(),
            "01301,01302".to_string(),
            Some("secret".to_string()),
        );

        assert!(client.query_url().ends_with("&key=secret"));
    }
}
