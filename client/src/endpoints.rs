//! Request and answer types for every TextSynth endpoint.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use crate::{error::Result, validation::Validate};

/// Implements [`Answer`] for answer types that keep their source document in
/// a `raw_json` field.
macro_rules! impl_answer {
    ($($answer:ty),+ $(,)?) => {
        $(
            impl $crate::endpoints::Answer for $answer {
                fn raw_json(&self) -> &serde_json::Value {
                    &self.raw_json
                }

                fn set_raw_json(&mut self, raw: serde_json::Value) {
                    self.raw_json = raw;
                }
            }
        )+
    };
}

pub mod chat;
pub mod completions;
pub mod credits;
pub mod generation;
pub mod logprob;
pub mod text_to_image;
pub mod tokenize;
pub mod transcript;
pub mod translate;

/// The endpoints an engine exposes, keyed by the path segment that selects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Completions,
    Chat,
    Translate,
    Logprob,
    Tokenize,
    TextToImage,
    Transcript,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 7] = [
        EndpointKind::Completions,
        EndpointKind::Chat,
        EndpointKind::Translate,
        EndpointKind::Logprob,
        EndpointKind::Tokenize,
        EndpointKind::TextToImage,
        EndpointKind::Transcript,
    ];

    /// Returns the path segment under `/v1/engines/{engine_id}/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Completions => "completions",
            EndpointKind::Chat => "chat",
            EndpointKind::Translate => "translate",
            EndpointKind::Logprob => "logprob",
            EndpointKind::Tokenize => "tokenize",
            EndpointKind::TextToImage => "text_to_image",
            EndpointKind::Transcript => "transcript",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request body for one engine endpoint.
///
/// Implementing this trait binds a request type to the endpoint it is sent to
/// and to the answer type its response decodes into.
pub trait Endpoint: Serialize + Validate {
    /// The answer returned by this endpoint.
    type Response: Answer;

    /// The endpoint this request is sent to.
    const KIND: EndpointKind;
}

/// A decoded response from the TextSynth API.
///
/// Answers keep the JSON document they were decoded from, in case the API
/// grows fields this crate does not know about yet.
pub trait Answer: DeserializeOwned {
    /// Returns the original JSON from which this answer was built.
    fn raw_json(&self) -> &Value;

    #[doc(hidden)]
    fn set_raw_json(&mut self, raw: Value);

    /// Fix-ups applied after decoding.
    #[doc(hidden)]
    fn normalize(&mut self) {}
}

/// Decodes an answer from an already-parsed JSON document.
pub fn decode_answer<T: Answer>(raw: Value) -> Result<T> {
    let mut answer = <T as Deserialize>::deserialize(&raw)?;
    answer.normalize();
    answer.set_raw_json(raw);
    Ok(answer)
}

/// Decodes an answer from a response body.
pub(crate) fn parse_answer<T: Answer>(body: &[u8]) -> Result<T> {
    let raw: Value = serde_json::from_slice(body)?;
    decode_answer(raw)
}

/// Serde helpers for the base64 payloads used by `tokenize` and `text_to_image`.
pub(crate) mod base64_data {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, de::Error};

    fn decode<E: Error>(encoded: &str) -> Result<Vec<u8>, E> {
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| E::custom(format!("invalid base64 data: {e}")))
    }

    pub fn bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        decode(&encoded)
    }

    pub fn optional_list<'de, D>(deserializer: D) -> Result<Option<Vec<Vec<u8>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<Vec<String>> = Option::deserialize(deserializer)?;
        encoded
            .map(|list| list.iter().map(|item| decode(item)).collect())
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_endpoint_paths_are_unique() {
        let paths: HashSet<&str> = EndpointKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(paths.len(), EndpointKind::ALL.len());
        assert_eq!(EndpointKind::TextToImage.to_string(), "text_to_image");
    }
}
