use error_stack::ResultExt;
use google_sheets4::oauth2::{self, authenticator::Authenticator};
use tracing::instrument;

use super::http_client::{HttpClient, HttpsConnector};
use crate::{
    config::sheets_config::{AuthKind, SpreadsheetConfig},
    ports::spreadsheet::SpreadsheetError,
};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

#[instrument(skip(client), fields(kind = %config.kind))]
pub async fn auth(
    config: &SpreadsheetConfig,
    client: HttpClient,
) -> error_stack::Result<Authenticator<HttpsConnector>, SpreadsheetError> {
    let credentials = config.credentials.as_path();

    match config.kind {
        AuthKind::Installed => {
            let secret = oauth2::read_application_secret(credentials)
                .await
                .change_context(SpreadsheetError::FailedToAuthenticate)
                .attach_printable_lazy(|| {
                    format!(
                        "Could not read the OAuth client secret at '{}'",
                        credentials.display()
                    )
                })?;

            // Opens the consent page on first use; later runs reuse the cached token.
            oauth2::InstalledFlowAuthenticator::with_client(
                secret,
                oauth2::InstalledFlowReturnMethod::HTTPRedirect,
                client,
            )
            .persist_tokens_to_disk(&config.token_cache)
            .build()
            .await
            .change_context(SpreadsheetError::FailedToAuthenticate)
            .attach_printable_lazy(|| {
                format!(
                    "Could not set up the token cache at '{}'",
                    config.token_cache.display()
                )
            })
        }
        AuthKind::ServiceAccount => {
            let secret = oauth2::read_service_account_key(credentials)
                .await
                .change_context(SpreadsheetError::FailedToAuthenticate)
                .attach_printable_lazy(|| {
                    format!(
                        "Could not read the service account key at '{}'",
                        credentials.display()
                    )
                })?;

            oauth2::ServiceAccountAuthenticator::with_client(secret, client)
                .build()
                .await
                .change_context(SpreadsheetError::FailedToAuthenticate)
        }
    }
}

/// Requests a token up front so that an unusable credential fails the run
/// before any spreadsheet is read.
#[instrument(skip_all)]
pub async fn ensure_token(
    authenticator: &Authenticator<HttpsConnector>,
) -> error_stack::Result<(), SpreadsheetError> {
    authenticator
        .token(SCOPES)
        .await
        .map(|_| ())
        .change_context(SpreadsheetError::FailedToAuthenticate)
}
