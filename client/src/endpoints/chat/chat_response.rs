use serde::Deserialize;
use serde_json::Value;

/// Response from the `chat` endpoint.
///
/// Same shape as [`Completions`](crate::endpoints::completions::Completions),
/// kept separate since the two schemas may diverge.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Chat {
    /// Text of the next assistant turn
    pub text: String,
    /// Whether this is the last streamed response
    #[serde(default)]
    pub reached_end: bool,
    /// Whether the conversation was cut off by the context length
    #[serde(default)]
    pub truncated_prompt: Option<bool>,
    /// Why generation ended
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
    #[serde(skip)]
    raw_json: Value,
}

impl_answer!(Chat);
