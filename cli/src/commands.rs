use anyhow::Context;
use futures::StreamExt;
use log::info;
use std::{
    io::{self, Write},
    time::Duration,
};
use textsynth::{
    Answer, AnswerStream, AudioFile, Engine, StreamedAnswer, TextSynthClient, TextToImageOptions,
    TokenizeOptions, TranscriptOptions, TranslateOptions,
};

use crate::cli::{Cli, Command, chat_turns};

fn build_client(cli: &Cli) -> anyhow::Result<TextSynthClient> {
    let mut builder = TextSynthClient::builder().host(cli.host.as_str());
    if let Some(secret_key) = &cli.secret_key {
        builder = builder.secret_key(secret_key.as_str());
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(timeout));
    }
    builder.build().context("Failed to create the TextSynth client")
}

fn print_json<A: Answer>(answer: &A) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(answer.raw_json())?);
    Ok(())
}

/// Writes chunks to stdout as they arrive.
async fn print_stream<T: StreamedAnswer>(
    mut stream: AnswerStream<T>,
    json: bool,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Stream interrupted")?;
        if json {
            writeln!(stdout, "{}", serde_json::to_string(chunk.raw_json())?)?;
        } else {
            write!(stdout, "{}", chunk.fragment())?;
        }
        stdout.flush()?;
    }
    if !json {
        writeln!(stdout)?;
    }
    Ok(())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = build_client(&cli)?;
    let engine = |id: &str| -> anyhow::Result<Engine> { Ok(client.engine(id)?) };
    let json = cli.json;

    match cli.command {
        Command::Credits => {
            let credits = client.credits().await.context("Failed to query credits")?;
            if json {
                print_json(&credits)?;
            } else {
                println!("{}", credits.credits);
            }
        }
        Command::Complete {
            engine: engine_arg,
            prompt,
            generation,
            stream,
        } => {
            let engine = engine(&engine_arg.engine)?;
            let options = generation.to_options()?;
            if stream {
                let chunks = engine.completions_stream(&prompt, &options).await?;
                print_stream(chunks, json).await?;
            } else {
                let answer = engine.completions(&prompt, &options).await?;
                if json {
                    print_json(&answer)?;
                } else {
                    for text in answer.text.all() {
                        println!("{text}");
                    }
                }
            }
        }
        Command::Chat {
            engine: engine_arg,
            system,
            messages,
            generation,
            stream,
        } => {
            let engine = engine(&engine_arg.engine)?;
            let options = generation.to_options()?;
            let turns = chat_turns(system.as_deref(), &messages);
            if stream {
                let chunks = engine.chat_stream(&turns, &options).await?;
                print_stream(chunks, json).await?;
            } else {
                let answer = engine.chat(&turns, &options).await?;
                if json {
                    print_json(&answer)?;
                } else {
                    println!("{}", answer.text);
                }
            }
        }
        Command::Translate {
            engine: engine_arg,
            source_lang,
            target_lang,
            num_beams,
            split_sentences,
            texts,
        } => {
            let engine = engine(&engine_arg.engine)?;
            let mut options = TranslateOptions::new(source_lang, target_lang);
            if let Some(num_beams) = num_beams {
                options = options.num_beams(num_beams);
            }
            if split_sentences {
                options = options.split_sentences(true);
            }
            let answer = engine.translate(texts.as_slice(), &options).await?;
            if json {
                print_json(&answer)?;
            } else {
                for translation in &answer.translations {
                    match &translation.detected_source_lang {
                        Some(lang) => println!("[{lang}] {}", translation.text),
                        None => println!("{}", translation.text),
                    }
                }
            }
        }
        Command::Logprob {
            engine: engine_arg,
            context,
            continuation,
        } => {
            let answer = engine(&engine_arg.engine)?
                .logprob(&context, &continuation)
                .await?;
            if json {
                print_json(&answer)?;
            } else {
                println!(
                    "logprob={} num_tokens={} is_greedy={}",
                    answer.logprob, answer.num_tokens, answer.is_greedy
                );
            }
        }
        Command::Tokenize {
            engine: engine_arg,
            content,
            text,
        } => {
            let mut options = TokenizeOptions::new();
            if content {
                options = options.with_token_content();
            }
            let answer = engine(&engine_arg.engine)?
                .tokenize(&text, &options)
                .await?;
            if json {
                print_json(&answer)?;
            } else if let Some(pairs) = answer.tokens_with_content() {
                for (token, bytes) in pairs {
                    println!("{token}\t{:?}", String::from_utf8_lossy(bytes));
                }
            } else {
                let tokens: Vec<String> = answer.tokens.iter().map(u32::to_string).collect();
                println!("{}", tokens.join(" "));
            }
        }
        Command::Image {
            engine: engine_arg,
            prompt,
            count,
            width,
            height,
            timesteps,
            guidance_scale,
            seed,
            negative_prompt,
            out_dir,
            prefix,
        } => {
            let options = TextToImageOptions {
                image_count: count,
                width,
                height,
                timesteps,
                guidance_scale,
                seed,
                negative_prompt,
                ..Default::default()
            };
            let answer = engine(&engine_arg.engine)?
                .text_to_image(&prompt, &options)
                .await?;
            tokio::fs::create_dir_all(&out_dir)
                .await
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            for (i, image) in answer.images.iter().enumerate() {
                let path = out_dir.join(format!("{prefix}-{i}.jpg"));
                tokio::fs::write(&path, &image.data)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {} bytes to {}", image.data.len(), path.display());
                println!("{}", path.display());
            }
        }
        Command::Transcript {
            engine: engine_arg,
            language,
            file,
        } => {
            let audio = AudioFile::from_path(&file).await?;
            let answer = engine(&engine_arg.engine)?
                .transcript(&audio, &TranscriptOptions::new(language))
                .await?;
            if json {
                print_json(&answer)?;
            } else {
                for segment in &answer.segments {
                    println!(
                        "[{:>8.2} - {:>8.2}] {}",
                        segment.start,
                        segment.end,
                        segment.text.trim()
                    );
                }
                if answer.segments.is_empty() {
                    println!("{}", answer.text);
                }
            }
        }
    }
    Ok(())
}
