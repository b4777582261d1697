use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Endpoint, EndpointKind};
use crate::{
    error::{Result, TextSynthError},
    validation::{Validate, require_non_empty},
};

/// How token contents are returned by the `tokenize` endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenContentType {
    /// Only token ids are returned.
    #[default]
    None,
    /// Token contents are returned as base64 strings.
    Base64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TokenizeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_content_type: Option<TokenContentType>,
}

impl TokenizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| TextSynthError::Validation(format!("invalid tokenize options: {e}")))
    }

    /// Also return the bytes of each token.
    pub fn with_token_content(mut self) -> Self {
        self.token_content_type = Some(TokenContentType::Base64);
        self
    }
}

/// Body of a `tokenize` request.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct TokenizeRequest<'a> {
    pub text: &'a str,
    #[serde(flatten)]
    pub options: &'a TokenizeOptions,
}

impl<'a> TokenizeRequest<'a> {
    pub fn new(text: &'a str, options: &'a TokenizeOptions) -> Self {
        Self { text, options }
    }
}

impl Validate for TokenizeRequest<'_> {
    fn validate(&self) -> Result<()> {
        require_non_empty("text", self.text)
    }
}

impl Endpoint for TokenizeRequest<'_> {
    type Response = Tokenize;
    const KIND: EndpointKind = EndpointKind::Tokenize;
}

/// Response from the `tokenize` endpoint.
///
/// Some tokens are not complete UTF-8 sequences, so token contents are
/// decoded into raw bytes rather than strings.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Tokenize {
    /// Token ids for the input text, in order
    pub tokens: Vec<u32>,
    /// Byte content of each token, when requested
    #[serde(default, deserialize_with = "super::base64_data::optional_list")]
    pub token_content: Option<Vec<Vec<u8>>>,
    #[serde(skip)]
    raw_json: Value,
}

impl_answer!(Tokenize);

impl Tokenize {
    /// Pairs every token id with its content, if contents were requested.
    pub fn tokens_with_content(&self) -> Option<impl Iterator<Item = (u32, &[u8])>> {
        let content = self.token_content.as_ref()?;
        Some(
            self.tokens
                .iter()
                .copied()
                .zip(content.iter().map(Vec::as_slice)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::decode_answer;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let options = TokenizeOptions::new().with_token_content();
        let request = TokenizeRequest::new("Hello world", &options);
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"text": "Hello world", "token_content_type": "base64"})
        );
        let plain = TokenizeOptions::new();
        assert_eq!(
            serde_json::to_value(TokenizeRequest::new("Hi", &plain)).unwrap(),
            json!({"text": "Hi"})
        );
    }

    #[test]
    fn test_unknown_content_type_is_rejected() {
        assert!(TokenizeOptions::from_json(json!({"token_content_type": "hex"})).is_err());
        assert!(TokenizeOptions::from_json(json!({"token_content_type": "none"})).is_ok());
    }

    #[test]
    fn test_token_content_is_decoded() {
        // "SGVsbG8=" is "Hello", "IHdvcmxk" is " world"
        let answer: Tokenize = decode_answer(json!({
            "tokens": [15496, 995],
            "token_content": ["SGVsbG8=", "IHdvcmxk"]
        }))
        .unwrap();
        assert_eq!(answer.tokens, vec![15496, 995]);
        let pairs: Vec<(u32, &[u8])> = answer.tokens_with_content().unwrap().collect();
        assert_eq!(pairs, vec![(15496, &b"Hello"[..]), (995, &b" world"[..])]);
    }

    #[test]
    fn test_missing_token_content() {
        let answer: Tokenize = decode_answer(json!({"tokens": [1, 2, 3]})).unwrap();
        assert_eq!(answer.token_content, None);
        assert!(answer.tokens_with_content().is_none());
    }

    #[test]
    fn test_invalid_base64_is_a_protocol_error() {
        let err = decode_answer::<Tokenize>(json!({"tokens": [1], "token_content": ["!!"]}))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Protocol);
    }
}
