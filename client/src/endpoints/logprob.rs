use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Endpoint, EndpointKind};
use crate::{
    error::Result,
    validation::{Validate, require_non_empty},
};

/// Body of a `logprob` request: how likely is `continuation` after `context`.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct LogprobRequest<'a> {
    /// Context for evaluating the continuation; may be empty
    pub context: &'a str,
    /// The text being scored
    pub continuation: &'a str,
}

impl<'a> LogprobRequest<'a> {
    pub fn new(context: &'a str, continuation: &'a str) -> Self {
        Self {
            context,
            continuation,
        }
    }
}

impl Validate for LogprobRequest<'_> {
    fn validate(&self) -> Result<()> {
        require_non_empty("continuation", self.continuation)
    }
}

impl Endpoint for LogprobRequest<'_> {
    type Response = Logprob;
    const KIND: EndpointKind = EndpointKind::Logprob;
}

/// Response from the `logprob` endpoint.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Logprob {
    /// Logarithm of the probability of the continuation
    pub logprob: f64,
    /// Number of tokens in the continuation
    pub num_tokens: u32,
    /// True if the continuation would be produced by greedy sampling
    pub is_greedy: bool,
    /// Total number of input tokens (context + continuation)
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(skip)]
    raw_json: Value,
}

impl_answer!(Logprob);

impl Logprob {
    /// Probability of the continuation, `exp(logprob)`.
    pub fn probability(&self) -> f64 {
        self.logprob.exp()
    }

    /// Average log-probability per continuation token.
    pub fn mean_logprob(&self) -> Option<f64> {
        (self.num_tokens > 0).then(|| self.logprob / f64::from(self.num_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::decode_answer;
    use serde_json::json;

    #[test]
    fn test_empty_context_is_allowed() {
        assert!(LogprobRequest::new("", "Hello").validate().is_ok());
        assert!(LogprobRequest::new("Hello", "").validate().is_err());
    }

    #[test]
    fn test_response_decoding() {
        let answer: Logprob = decode_answer(json!({
            "logprob": -2.0,
            "num_tokens": 4,
            "is_greedy": false,
            "input_tokens": 9
        }))
        .unwrap();
        assert_eq!(answer.logprob, -2.0);
        assert_eq!(answer.num_tokens, 4);
        assert!(!answer.is_greedy);
        assert_eq!(answer.input_tokens, Some(9));
        assert_eq!(answer.mean_logprob(), Some(-0.5));
        assert!((answer.probability() - (-2.0f64).exp()).abs() < 1e-12);
    }
}
