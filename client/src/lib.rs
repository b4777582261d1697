//! Async client for the [TextSynth](https://textsynth.com) API.
//!
//! A [`TextSynthClient`] holds the host, the secret key and a pooled HTTP
//! client. [`TextSynthClient::engine`] returns an [`Engine`] handle whose
//! methods map one-to-one onto the engine endpoints: `completions`, `chat`,
//! `translate`, `logprob`, `tokenize`, `text_to_image` and `transcript`.

pub mod client;
pub mod endpoints;
pub mod engine;
pub mod error;
pub mod stream;
pub mod validation;

pub use client::{
    ClientBuilder, DEFAULT_HOST, SECRET_KEY_ENV, TextSynthClient, default_client, engine,
    set_default_client,
};
pub use endpoints::{
    Answer, Endpoint, EndpointKind,
    chat::{Chat, ChatMessage, ChatRequest, Role},
    completions::{CompletionText, Completions, CompletionsRequest},
    credits::Credits,
    decode_answer,
    generation::GenerationOptions,
    logprob::{Logprob, LogprobRequest},
    text_to_image::{
        GeneratedImage, IMAGE_SIZES, TextToImage, TextToImageOptions, TextToImageRequest,
    },
    tokenize::{TokenContentType, Tokenize, TokenizeOptions, TokenizeRequest},
    transcript::{AudioFile, Transcript, TranscriptOptions, TranscriptRequest, TranscriptSegment},
    translate::{Translate, TranslateOptions, TranslateRequest, TranslateText},
};
pub use engine::Engine;
pub use error::{ErrorKind, Result, TextSynthError};
pub use stream::{AnswerStream, StreamedAnswer};
pub use validation::Validate;
