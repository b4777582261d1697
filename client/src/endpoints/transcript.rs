use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use super::Answer;
use crate::{
    error::{Result, TextSynthError},
    validation::{TRANSCRIPT_LANGUAGES, Validate, check_language},
};

/// Options for the `transcript` endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TranscriptOptions {
    /// Language spoken in the audio
    pub language: String,
}

impl TranscriptOptions {
    pub fn new<S: Into<String>>(language: S) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let options: TranscriptOptions = serde_json::from_value(value)
            .map_err(|e| TextSynthError::Validation(format!("invalid transcript options: {e}")))?;
        options.validate()?;
        Ok(options)
    }
}

impl Validate for TranscriptOptions {
    fn validate(&self) -> Result<()> {
        check_language("language", &self.language, TRANSCRIPT_LANGUAGES)
    }
}

/// An audio track to transcribe, in MP3, M4A, MP4, WAV or Opus format.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl AudioFile {
    pub fn new<S: Into<String>>(file_name: S, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// Reads an audio file from disk.
    ///
    /// # Errors
    /// Returns `TextSynthError::Validation` if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            TextSynthError::Validation(format!("cannot read audio file {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        Ok(Self::new(file_name, data))
    }
}

/// Body of a `transcript` request.
///
/// Sent as a multipart form rather than through `Engine::send`: the
/// serialized options go in a `json` part and the audio in a `file` part.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct TranscriptRequest<'a> {
    #[serde(flatten)]
    pub options: &'a TranscriptOptions,
    #[serde(skip)]
    pub audio: &'a AudioFile,
}

impl<'a> TranscriptRequest<'a> {
    pub fn new(audio: &'a AudioFile, options: &'a TranscriptOptions) -> Self {
        Self { options, audio }
    }
}

impl Validate for TranscriptRequest<'_> {
    fn validate(&self) -> Result<()> {
        if self.audio.data.is_empty() {
            return Err(TextSynthError::invalid("file", "audio data must not be empty"));
        }
        self.options.validate()
    }
}

/// Response from the `transcript` endpoint.
///
/// Segments are ordered by start time.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    /// Full transcribed text
    pub text: String,
    /// Language of the transcribed text
    #[serde(default)]
    pub language: Option<String>,
    /// Length of the audio, in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Timestamped segments
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    #[serde(skip)]
    raw_json: Value,
}

impl Answer for Transcript {
    fn raw_json(&self) -> &Value {
        &self.raw_json
    }

    fn set_raw_json(&mut self, raw: Value) {
        self.raw_json = raw;
    }

    fn normalize(&mut self) {
        // stable, so segments sharing a start time keep the server's order
        self.segments
            .sort_by(|a, b| a.start.total_cmp(&b.start));
    }
}

/// A timestamped segment of a transcript. Times are in seconds.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TranscriptSegment {
    pub id: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
