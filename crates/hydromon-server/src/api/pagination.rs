use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use utoipa::IntoParams;

const MAX_LIMIT: u64 = 1000;

/// Default number of entries the history views show.
pub const DEFAULT_HISTORY_LIMIT: u64 = 10;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum number of entries, newest first (default 10, max 1000)
    #[param(required = false)]
    #[serde(default, deserialize_with = "deserialize_optional_u64")]
    pub limit: Option<u64>,
}

impl LimitParams {
    pub fn resolve(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_LIMIT) as usize
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum U64Input {
    Number(u64),
    Text(String),
}

pub(crate) fn deserialize_optional_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<U64Input>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(U64Input::Number(number)) => Ok(Some(number)),
        Some(U64Input::Text(text)) => text
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(DeError::custom),
    }
}
