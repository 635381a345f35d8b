use error_stack::{report, ResultExt};
use google_sheets4::{
    api::{BatchUpdateValuesRequest, ValueRange},
    Sheets,
};
use std::fmt::Debug;
use tracing::instrument;

use super::{
    auth::{self},
    http_client::{self, HttpsConnector},
    string_grid::IntoStringGrid,
};
use crate::{
    config::sheets_config::SpreadsheetConfig,
    domain::sheets::a1_notation::A1Notation,
    ports::spreadsheet::{CellWrite, SpreadsheetError, SpreadsheetGateway, StringGrid},
};

/// [`SpreadsheetGateway`] backed by the Google Sheets v4 API.
pub struct SpreadsheetManager {
    pub config: SpreadsheetConfig,
    hub: Sheets<HttpsConnector>,
}

impl Debug for SpreadsheetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpreadsheetManager {{ config: {:?} }}", self.config)
    }
}

impl SpreadsheetManager {
    #[instrument(name = "SpreadsheetManager::new")]
    pub async fn new(config: SpreadsheetConfig) -> error_stack::Result<Self, SpreadsheetError> {
        let client = http_client::http_client();
        let auth = auth::auth(&config, client.clone()).await?;
        auth::ensure_token(&auth).await?;
        let hub = Sheets::new(client, auth);

        Ok(SpreadsheetManager { config, hub })
    }
}

#[async_trait::async_trait]
impl SpreadsheetGateway for SpreadsheetManager {
    #[instrument]
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &A1Notation,
    ) -> error_stack::Result<StringGrid, SpreadsheetError> {
        let response = self
            .hub
            .spreadsheets()
            .values_get(spreadsheet_id, range.as_ref())
            .doit()
            .await
            .change_context(SpreadsheetError::FailedToFetchRange)
            .attach_printable_lazy(|| format!("Failed to fetch range {}", range))?;

        // An empty range comes back without `values`.
        Ok(response.1.values.unwrap_or_default().into_string_grid())
    }

    #[instrument]
    async fn read_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[A1Notation],
    ) -> error_stack::Result<Vec<StringGrid>, SpreadsheetError> {
        let mut call = self.hub.spreadsheets().values_batch_get(spreadsheet_id);
        for range in ranges {
            call = call.add_ranges(range.as_ref());
        }

        let response = call
            .doit()
            .await
            .change_context(SpreadsheetError::FailedToFetchRange)
            .attach_printable_lazy(|| format!("Failed to fetch ranges {:?}", ranges))?;

        let value_ranges = response.1.value_ranges.unwrap_or_default();
        if value_ranges.len() != ranges.len() {
            return Err(report!(SpreadsheetError::FailedToFetchRange)).attach_printable(format!(
                "Asked for {} ranges, got {}",
                ranges.len(),
                value_ranges.len()
            ));
        }

        Ok(value_ranges
            .into_iter()
            .map(|value_range| value_range.values.unwrap_or_default().into_string_grid())
            .collect())
    }

    #[instrument(skip(cells), fields(cells = cells.len()))]
    async fn write_cells(
        &self,
        spreadsheet_id: &str,
        cells: &[CellWrite],
    ) -> error_stack::Result<usize, SpreadsheetError> {
        if cells.is_empty() {
            return Ok(0);
        }

        let request = BatchUpdateValuesRequest {
            data: Some(cells.iter().map(ValueRange::from).collect()),
            include_values_in_response: Some(false),
            value_input_option: Some("USER_ENTERED".to_string()),
            ..Default::default()
        };

        let response = self
            .hub
            .spreadsheets()
            .values_batch_update(request, spreadsheet_id)
            .doit()
            .await
            .change_context(SpreadsheetError::FailedToWriteRange)
            .attach_printable_lazy(|| format!("Failed to write {} cells", cells.len()))?;

        for updated in response.1.responses.iter().flatten() {
            if let Some(range) = &updated.updated_range {
                tracing::debug!("Updated {}", range);
            }
        }

        Ok(response.1.total_updated_cells.unwrap_or_default().max(0) as usize)
    }
}
