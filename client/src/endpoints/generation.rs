use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{
    error::{Result, TextSynthError},
    validation::{Validate, check_finite, check_min, check_range, require_non_empty},
};

/// Sampling options shared by the `completions` and `chat` endpoints.
///
/// Every field is optional; unset fields are left out of the request so the
/// server applies its own defaults. Built either with the setters below or
/// from a JSON object with [`GenerationOptions::from_json`].
///
/// # Fields
/// * `max_tokens` - Maximum number of tokens to generate (at least 1)
/// * `temperature` - Sampling temperature (0.0 to 2.0)
/// * `top_k` - Keep only the `k` most likely tokens (1 to 1000)
/// * `top_p` - Nucleus sampling threshold (0.0 to 1.0)
/// * `n` - Number of completions to generate (1 to 16)
/// * `stop` - Sequences that end generation when produced
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default, deserialize_with = "stop_sequences")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Bias added to the logits of the given token ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_p: Option<f64>,
    /// A BNF grammar the output must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar: Option<String>,
    /// A JSON schema the output must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// `stop` may be given as a single string or a list of strings.
fn stop_sequences<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stop {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Stop>::deserialize(deserializer)? {
        Some(Stop::One(stop)) => Some(vec![stop]),
        Some(Stop::Many(stops)) => Some(stops),
        None => None,
    })
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from a JSON object such as `{"max_tokens": 16}`.
    ///
    /// # Errors
    /// Returns `TextSynthError::Validation` for unknown keys, badly typed
    /// values, or values out of range.
    pub fn from_json(value: Value) -> Result<Self> {
        let options: GenerationOptions = serde_json::from_value(value)
            .map_err(|e| TextSynthError::Validation(format!("invalid generation options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    /// Adds a stop sequence. Can be called several times.
    pub fn stop<S: Into<String>>(mut self, stop: S) -> Self {
        self.stop.get_or_insert_with(Vec::new).push(stop.into());
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Biases the logit of `token` by `bias`. Can be called several times.
    pub fn logit_bias(mut self, token: u32, bias: f64) -> Self {
        self.logit_bias
            .get_or_insert_with(BTreeMap::new)
            .insert(token.to_string(), bias);
        self
    }

    pub fn presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn repetition_penalty(mut self, penalty: f64) -> Self {
        self.repetition_penalty = Some(penalty);
        self
    }

    pub fn typical_p(mut self, typical_p: f64) -> Self {
        self.typical_p = Some(typical_p);
        self
    }

    pub fn grammar<S: Into<String>>(mut self, grammar: S) -> Self {
        self.grammar = Some(grammar.into());
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl Validate for GenerationOptions {
    fn validate(&self) -> Result<()> {
        check_min("max_tokens", self.max_tokens, 1)?;
        check_range("temperature", self.temperature, 0.0, 2.0)?;
        check_range("top_k", self.top_k, 1, 1000)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;
        check_range("n", self.n, 1, 16)?;
        check_range("presence_penalty", self.presence_penalty, -2.0, 2.0)?;
        check_range("frequency_penalty", self.frequency_penalty, -2.0, 2.0)?;
        check_finite("repetition_penalty", self.repetition_penalty)?;
        if let Some(penalty) = self.repetition_penalty {
            if penalty <= 0.0 {
                return Err(TextSynthError::invalid(
                    "repetition_penalty",
                    "must be greater than 0",
                ));
            }
        }
        check_range("typical_p", self.typical_p, 0.0, 1.0)?;
        if let Some(stops) = &self.stop {
            for stop in stops {
                require_non_empty("stop", stop)?;
            }
        }
        if let Some(biases) = &self.logit_bias {
            for (token, bias) in biases {
                if token.parse::<u32>().is_err() {
                    return Err(TextSynthError::invalid(
                        "logit_bias",
                        format!("'{token}' is not a token id"),
                    ));
                }
                check_finite("logit_bias", Some(*bias))?;
            }
        }
        if let Some(schema) = &self.schema {
            if !schema.is_object() {
                return Err(TextSynthError::invalid("schema", "must be a JSON object"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_builder_serializes_only_set_fields() {
        let options = GenerationOptions::new()
            .max_tokens(16)
            .temperature(0.5)
            .stop("\n")
            .stop("###");
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(
            value,
            json!({"max_tokens": 16, "temperature": 0.5, "stop": ["\n", "###"]})
        );
    }

    #[test]
    fn test_from_json_accepts_known_keys() {
        let options = GenerationOptions::from_json(json!({
            "max_tokens": 16,
            "top_k": 40,
            "stop": "\n",
            "logit_bias": {"50256": -100.0}
        }))
        .unwrap();
        assert_eq!(options.max_tokens, Some(16));
        assert_eq!(options.top_k, Some(40));
        assert_eq!(options.stop, Some(vec!["\n".to_string()]));
        assert_eq!(options.logit_bias.unwrap()["50256"], -100.0);
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        let err = GenerationOptions::from_json(json!({"max_tokens": 16, "beams": 3})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("beams"));
    }

    #[test]
    fn test_ranges() {
        assert!(GenerationOptions::new().max_tokens(0).validate().is_err());
        assert!(GenerationOptions::new().temperature(2.5).validate().is_err());
        assert!(GenerationOptions::new().temperature(2.0).validate().is_ok());
        assert!(GenerationOptions::new().top_k(0).validate().is_err());
        assert!(GenerationOptions::new().top_p(1.5).validate().is_err());
        assert!(GenerationOptions::new().n(17).validate().is_err());
        assert!(GenerationOptions::new().presence_penalty(-3.0).validate().is_err());
        assert!(GenerationOptions::new().repetition_penalty(0.0).validate().is_err());
        assert!(GenerationOptions::new().stop("").validate().is_err());
        assert!(
            GenerationOptions::new()
                .schema(json!("not an object"))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_logit_bias_keys_must_be_token_ids() {
        let err = GenerationOptions::from_json(json!({"logit_bias": {"hello": 1.0}})).unwrap_err();
        assert!(err.to_string().contains("logit_bias"));
    }
}
