//! Request and response bodies of the bridge endpoints.

use serde::{Deserialize, Deserializer, Serialize};

/// Engine-defined episode options, e.g. `{"round_length": 2}`.
pub type ResetOptions = serde_json::Map<String, serde_json::Value>;

/// `GET /reset` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResetResponse {
    pub reset: bool,
    pub seed: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: ResetOptions,
}

/// JSON body returned alongside non-2xx statuses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

fn null_as_empty<'de, D>(de: D) -> Result<ResetOptions, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ResetOptions>::deserialize(de)?.unwrap_or_default())
}
