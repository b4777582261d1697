use serde::Deserialize;
use serde_json::Value;

/// Response from the account-level `credits` endpoint.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Credits {
    /// Remaining credits on the account
    pub credits: u64,
    #[serde(skip)]
    raw_json: Value,
}

impl_answer!(Credits);
