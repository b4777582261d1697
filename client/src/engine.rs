use log::debug;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::{
    client::TextSynthClient,
    endpoints::{
        Endpoint, EndpointKind,
        chat::{Chat, ChatMessage, ChatRequest},
        completions::{Completions, CompletionsRequest},
        generation::GenerationOptions,
        logprob::{Logprob, LogprobRequest},
        text_to_image::{TextToImage, TextToImageOptions, TextToImageRequest},
        tokenize::{Tokenize, TokenizeOptions, TokenizeRequest},
        transcript::{AudioFile, Transcript, TranscriptOptions, TranscriptRequest},
        translate::{Translate, TranslateOptions, TranslateRequest},
    },
    error::Result,
    stream::AnswerStream,
    validation::{Validate, require_non_empty},
};

/// A handle on one TextSynth engine.
///
/// Creating an engine makes no request: an unknown engine id is only
/// reported, as `UnknownEngine`, by the first call that reaches the server.
/// Every method validates its arguments first and fails with `Validation`
/// without touching the network when they are out of range.
///
/// # Example
/// ```no_run
/// use textsynth::{GenerationOptions, TextSynthClient};
///
/// # async fn run() -> textsynth::Result<()> {
/// let client = TextSynthClient::new("api.textsynth.com", "my-key")?;
/// let engine = client.engine("gptj_6B")?;
/// let options = GenerationOptions::new().max_tokens(20);
/// let answer = engine.completions("Once upon a time", &options).await?;
/// println!("{}", answer.text);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    client: TextSynthClient,
    engine_id: String,
}

impl Engine {
    pub(crate) fn new(client: TextSynthClient, engine_id: String) -> Result<Self> {
        require_non_empty("engine_id", &engine_id)?;
        Ok(Self { client, engine_id })
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    pub fn client(&self) -> &TextSynthClient {
        &self.client
    }

    fn path(&self, kind: EndpointKind) -> String {
        format!("engines/{}/{}", self.engine_id, kind)
    }

    /// Validates and sends any endpoint request, returning its decoded answer.
    pub async fn send<E: Endpoint>(&self, request: &E) -> Result<E::Response> {
        request.validate()?;
        debug!("Sending {} request to engine {}", E::KIND, self.engine_id);
        self.client.post_json(&self.path(E::KIND), request).await
    }

    async fn send_streaming<E, T>(&self, request: &E) -> Result<AnswerStream<T>>
    where
        E: Endpoint,
        T: crate::stream::StreamedAnswer,
    {
        request.validate()?;
        debug!("Streaming {} from engine {}", E::KIND, self.engine_id);
        let response = self.client.post_json_raw(&self.path(E::KIND), request).await?;
        Ok(AnswerStream::from_response(response))
    }

    /// Completes `prompt`.
    pub async fn completions(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Completions> {
        self.send(&CompletionsRequest::new(prompt, options)).await
    }

    /// Completes `prompt`, yielding the text as it is generated.
    ///
    /// Status errors are returned here; errors met while reading the body are
    /// yielded by the stream.
    pub async fn completions_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<AnswerStream<Completions>> {
        self.send_streaming(&CompletionsRequest::new(prompt, options).streaming())
            .await
    }

    /// Answers the last user turn of a conversation.
    pub async fn chat(&self, turns: &[ChatMessage], options: &GenerationOptions) -> Result<Chat> {
        self.send(&ChatRequest::new(turns, options)).await
    }

    pub async fn chat_stream(
        &self,
        turns: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<AnswerStream<Chat>> {
        self.send_streaming(&ChatRequest::new(turns, options).streaming())
            .await
    }

    /// Translates every text in `texts`. The answer has one translation per
    /// input, in the same order.
    pub async fn translate<S>(&self, texts: &[S], options: &TranslateOptions) -> Result<Translate>
    where
        S: AsRef<str> + Serialize,
    {
        self.send(&TranslateRequest::new(texts, options)).await
    }

    /// Log probability of `continuation` following `context`.
    pub async fn logprob(&self, context: &str, continuation: &str) -> Result<Logprob> {
        self.send(&LogprobRequest::new(context, continuation)).await
    }

    pub async fn tokenize(&self, text: &str, options: &TokenizeOptions) -> Result<Tokenize> {
        self.send(&TokenizeRequest::new(text, options)).await
    }

    /// Generates images from a text prompt.
    pub async fn text_to_image(
        &self,
        prompt: &str,
        options: &TextToImageOptions,
    ) -> Result<TextToImage> {
        self.send(&TextToImageRequest::new(prompt, options)).await
    }

    /// Transcribes speech from an audio file.
    ///
    /// Unlike the other endpoints this one is sent as a multipart form.
    pub async fn transcript(
        &self,
        audio: &AudioFile,
        options: &TranscriptOptions,
    ) -> Result<Transcript> {
        let request = TranscriptRequest::new(audio, options);
        request.validate()?;
        let form = Form::new()
            .text("json", serde_json::to_string(&request)?)
            .part(
                "file",
                Part::bytes(audio.data.clone()).file_name(audio.file_name.clone()),
            );
        debug!(
            "Sending transcript request to engine {} ({} bytes of audio)",
            self.engine_id,
            audio.data.len()
        );
        self.client
            .post_multipart(&self.path(EndpointKind::Transcript), form)
            .await
    }
}
