use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use textsynth::{ChatMessage, DEFAULT_HOST, GenerationOptions};

#[derive(Parser, Debug)]
#[command(
    name = "textsynth",
    about = "Command-line client for the TextSynth API",
    version
)]
pub struct Cli {
    /// API host; a value without scheme is reached over HTTPS
    #[arg(long, env = "TEXTSYNTH_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// API secret key (alternatively use TEXTSYNTH_SECRET_KEY env var)
    #[arg(long, env = "TEXTSYNTH_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Print the JSON answer instead of its text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the credits left on the account
    Credits,

    /// Complete a prompt
    Complete {
        #[command(flatten)]
        engine: EngineArg,
        prompt: String,
        #[command(flatten)]
        generation: GenerationArgs,
        /// Print the text as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Continue a conversation
    Chat {
        #[command(flatten)]
        engine: EngineArg,
        /// System prompt
        #[arg(long)]
        system: Option<String>,
        /// Conversation turns, alternating user and assistant, starting and
        /// ending with a user turn
        #[arg(required = true)]
        messages: Vec<String>,
        #[command(flatten)]
        generation: GenerationArgs,
        #[arg(long)]
        stream: bool,
    },

    /// Translate one or more texts
    Translate {
        #[command(flatten)]
        engine: EngineArg,
        /// Source language code, or "auto" to detect it
        #[arg(long, default_value = "auto")]
        source_lang: String,
        /// Target language code
        #[arg(long)]
        target_lang: String,
        #[arg(long)]
        num_beams: Option<u32>,
        /// Translate each sentence separately
        #[arg(long)]
        split_sentences: bool,
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Log probability of a continuation
    Logprob {
        #[command(flatten)]
        engine: EngineArg,
        #[arg(long, default_value = "")]
        context: String,
        continuation: String,
    },

    /// Split a text into tokens
    Tokenize {
        #[command(flatten)]
        engine: EngineArg,
        /// Also print the bytes of each token
        #[arg(long)]
        content: bool,
        text: String,
    },

    /// Generate images and write them as JPEG files
    Image {
        #[command(flatten)]
        engine: EngineArg,
        prompt: String,
        #[arg(long)]
        count: Option<u32>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        timesteps: Option<u32>,
        #[arg(long)]
        guidance_scale: Option<f64>,
        #[arg(long)]
        seed: Option<i64>,
        #[arg(long)]
        negative_prompt: Option<String>,
        /// Directory the images are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// File name prefix of the written images
        #[arg(long, default_value = "image")]
        prefix: String,
    },

    /// Transcribe an audio file
    Transcript {
        #[command(flatten)]
        engine: EngineArg,
        #[arg(long, default_value = "en")]
        language: String,
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EngineArg {
    /// Engine to use, e.g. gptj_6B
    #[arg(short, long)]
    pub engine: String,
}

/// Sampling options shared by `complete` and `chat`.
#[derive(Args, Debug, Clone, Default)]
pub struct GenerationArgs {
    #[arg(long)]
    pub max_tokens: Option<u32>,
    #[arg(long)]
    pub temperature: Option<f64>,
    #[arg(long)]
    pub top_k: Option<u32>,
    #[arg(long)]
    pub top_p: Option<f64>,
    /// Stop sequence, may be repeated
    #[arg(long)]
    pub stop: Vec<String>,
    #[arg(long)]
    pub seed: Option<i64>,
    /// Any other option, as a JSON object; the flags above take precedence
    #[arg(long)]
    pub options: Option<String>,
}

impl GenerationArgs {
    pub fn to_options(&self) -> anyhow::Result<GenerationOptions> {
        let mut options = match &self.options {
            Some(json) => {
                let value = serde_json::from_str(json).context("--options is not valid JSON")?;
                GenerationOptions::from_json(value)?
            }
            None => GenerationOptions::new(),
        };
        if let Some(max_tokens) = self.max_tokens {
            options = options.max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            options = options.temperature(temperature);
        }
        if let Some(top_k) = self.top_k {
            options = options.top_k(top_k);
        }
        if let Some(top_p) = self.top_p {
            options = options.top_p(top_p);
        }
        for stop in &self.stop {
            options = options.stop(stop.as_str());
        }
        if let Some(seed) = self.seed {
            options = options.seed(seed);
        }
        Ok(options)
    }
}

/// Turns the positional chat arguments into role-tagged turns.
pub fn chat_turns(system: Option<&str>, messages: &[String]) -> Vec<ChatMessage> {
    let mut turns: Vec<ChatMessage> = system.map(ChatMessage::system).into_iter().collect();
    turns.extend(messages.iter().enumerate().map(|(i, content)| {
        if i % 2 == 0 {
            ChatMessage::user(content.as_str())
        } else {
            ChatMessage::assistant(content.as_str())
        }
    }));
    turns
}
