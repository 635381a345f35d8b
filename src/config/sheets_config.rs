use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthKind {
    /// OAuth client secret of an installed application. The user grants
    /// access in the browser once; tokens are cached on disk.
    #[default]
    Installed,
    /// Service account key. The register must be shared with the account.
    ServiceAccount,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SpreadsheetConfig {
    pub kind: AuthKind,
    pub credentials: PathBuf,
    pub token_cache: PathBuf,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            kind: AuthKind::default(),
            credentials: PathBuf::from("credentials.json"),
            token_cache: PathBuf::from("token.json"),
        }
    }
}
