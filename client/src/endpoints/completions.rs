use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{Endpoint, EndpointKind, generation::GenerationOptions};
use crate::{
    error::Result,
    validation::{Validate, require_non_empty},
};

/// Body of a `completions` request.
#[derive(Serialize, Debug, Clone)]
pub struct CompletionsRequest<'a> {
    /// The text to be completed by the model
    pub prompt: &'a str,
    #[serde(flatten)]
    pub options: &'a GenerationOptions,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl<'a> CompletionsRequest<'a> {
    pub fn new(prompt: &'a str, options: &'a GenerationOptions) -> Self {
        Self {
            prompt,
            options,
            stream: false,
        }
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

impl Validate for CompletionsRequest<'_> {
    fn validate(&self) -> Result<()> {
        require_non_empty("prompt", self.prompt)?;
        self.options.validate()
    }
}

impl Endpoint for CompletionsRequest<'_> {
    type Response = Completions;
    const KIND: EndpointKind = EndpointKind::Completions;
}

/// Generated text: a single string, or one string per completion when `n > 1`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CompletionText {
    Single(String),
    Multiple(Vec<String>),
}

impl CompletionText {
    /// Returns the first (or only) generated text.
    pub fn first(&self) -> Option<&str> {
        match self {
            CompletionText::Single(text) => Some(text),
            CompletionText::Multiple(texts) => texts.first().map(String::as_str),
        }
    }

    /// Returns every generated text.
    pub fn all(&self) -> Vec<&str> {
        match self {
            CompletionText::Single(text) => vec![text.as_str()],
            CompletionText::Multiple(texts) => texts.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for CompletionText {
    fn default() -> Self {
        CompletionText::Single(String::new())
    }
}

impl fmt::Display for CompletionText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionText::Single(text) => f.write_str(text),
            CompletionText::Multiple(texts) => f.write_str(&texts.concat()),
        }
    }
}

impl PartialEq<str> for CompletionText {
    fn eq(&self, other: &str) -> bool {
        matches!(self, CompletionText::Single(text) if text == other)
    }
}

impl PartialEq<&str> for CompletionText {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Response from the `completions` endpoint.
///
/// When streaming, one of these is produced per chunk and only the last one
/// (with `reached_end` set) carries the token counts.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Completions {
    /// Text completion
    pub text: CompletionText,
    /// Whether this is the last streamed response
    #[serde(default)]
    pub reached_end: bool,
    /// Whether the prompt was cut off by the context length
    #[serde(default)]
    pub truncated_prompt: Option<bool>,
    /// Why the completion ended ("stop", "length", ...)
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Number of tokens in the prompt
    #[serde(default)]
    pub input_tokens: Option<u32>,
    /// Number of generated tokens
    #[serde(default)]
    pub output_tokens: Option<u32>,
    #[serde(skip)]
    raw_json: Value,
}

impl_answer!(Completions);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::decode_answer;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let options = GenerationOptions::new().max_tokens(16);
        let request = CompletionsRequest::new("Once upon a time", &options);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"prompt": "Once upon a time", "max_tokens": 16})
        );
        let request = request.streaming();
        assert_eq!(serde_json::to_value(&request).unwrap()["stream"], true);
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let options = GenerationOptions::new();
        assert!(CompletionsRequest::new("", &options).validate().is_err());
    }

    #[test]
    fn test_decode_full_answer() {
        let raw = json!({
            "text": " there was a castle.",
            "reached_end": true,
            "truncated_prompt": false,
            "finish_reason": "stop",
            "input_tokens": 4,
            "output_tokens": 6
        });
        let answer: Completions = decode_answer(raw.clone()).unwrap();
        assert_eq!(answer.text, " there was a castle.");
        assert!(answer.reached_end);
        assert_eq!(answer.truncated_prompt, Some(false));
        assert_eq!(answer.finish_reason.as_deref(), Some("stop"));
        assert_eq!(answer.input_tokens, Some(4));
        assert_eq!(answer.output_tokens, Some(6));
        assert_eq!(crate::Answer::raw_json(&answer), &raw);
    }

    #[test]
    fn test_decode_multiple_texts() {
        let answer: Completions = decode_answer(json!({"text": ["a", "b"]})).unwrap();
        assert_eq!(answer.text.all(), vec!["a", "b"]);
        assert_eq!(answer.text.first(), Some("a"));
        assert_eq!(answer.text.to_string(), "ab");
    }

    #[test]
    fn test_missing_text_is_a_protocol_error() {
        let err = decode_answer::<Completions>(json!({"reached_end": true})).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Protocol);
    }
}
