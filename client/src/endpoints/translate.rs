use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Endpoint, EndpointKind};
use crate::{
    error::{Result, TextSynthError},
    validation::{
        AUTO_DETECT, TRANSLATE_LANGUAGES, Validate, check_language, check_range,
        require_non_empty,
    },
};

/// Options for the `translate` endpoint.
///
/// # Fields
/// * `source_lang` - Language code of the input texts, or `"auto"` to detect it
/// * `target_lang` - Language code to translate into
/// * `num_beams` - Number of beams used by the decoder (1 to 5)
/// * `split_sentences` - Whether to translate each sentence separately
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TranslateOptions {
    pub source_lang: String,
    pub target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_beams: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_sentences: Option<bool>,
}

impl TranslateOptions {
    pub fn new<S: Into<String>, T: Into<String>>(source_lang: S, target_lang: T) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            num_beams: None,
            split_sentences: None,
        }
    }

    /// Translates into `target_lang`, letting the engine detect the source language.
    pub fn auto_detect<T: Into<String>>(target_lang: T) -> Self {
        Self::new(AUTO_DETECT, target_lang)
    }

    /// Builds options from a JSON object; unknown keys are rejected.
    pub fn from_json(value: Value) -> Result<Self> {
        let options: TranslateOptions = serde_json::from_value(value)
            .map_err(|e| TextSynthError::Validation(format!("invalid translate options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn num_beams(mut self, num_beams: u32) -> Self {
        self.num_beams = Some(num_beams);
        self
    }

    pub fn split_sentences(mut self, split_sentences: bool) -> Self {
        self.split_sentences = Some(split_sentences);
        self
    }
}

impl Validate for TranslateOptions {
    fn validate(&self) -> Result<()> {
        if self.source_lang != AUTO_DETECT {
            check_language("source_lang", &self.source_lang, TRANSLATE_LANGUAGES)?;
        }
        check_language("target_lang", &self.target_lang, TRANSLATE_LANGUAGES)?;
        check_range("num_beams", self.num_beams, 1, 5)
    }
}

/// Body of a `translate` request.
#[derive(Serialize, Debug, Clone)]
pub struct TranslateRequest<'a, S: AsRef<str> + Serialize> {
    pub text: &'a [S],
    #[serde(flatten)]
    pub options: &'a TranslateOptions,
}

impl<'a, S: AsRef<str> + Serialize> TranslateRequest<'a, S> {
    pub fn new(text: &'a [S], options: &'a TranslateOptions) -> Self {
        Self { text, options }
    }
}

impl<S: AsRef<str> + Serialize> Validate for TranslateRequest<'_, S> {
    fn validate(&self) -> Result<()> {
        if self.text.is_empty() {
            return Err(TextSynthError::invalid("text", "must contain at least one text"));
        }
        for text in self.text {
            require_non_empty("text", text.as_ref())?;
        }
        self.options.validate()
    }
}

impl<S: AsRef<str> + Serialize> Endpoint for TranslateRequest<'_, S> {
    type Response = Translate;
    const KIND: EndpointKind = EndpointKind::Translate;
}

/// Response from the `translate` endpoint, one entry per input text.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Translate {
    /// Translated texts, in input order
    pub translations: Vec<TranslateText>,
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
    #[serde(skip)]
    raw_json: Value,
}

impl_answer!(Translate);

/// A single translation from the `translate` endpoint.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TranslateText {
    /// Text translated into the target language
    pub text: String,
    /// Language detected when the source was `auto`
    #[serde(default)]
    pub detected_source_lang: Option<String>,
}
