use futures::StreamExt;
use textsynth::{ChatMessage, GenerationOptions, StreamedAnswer, TranslateOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reads TEXTSYNTH_SECRET_KEY
    let engine = textsynth::engine("mistral_7B")?;

    println!("=== TextSynth Examples ===\n");

    println!("1. Completion:");
    let options = GenerationOptions::new().max_tokens(40).temperature(0.7);
    let answer = engine.completions("Once upon a time", &options).await?;
    println!("Once upon a time{}\n", answer.text);

    println!("2. Streamed completion:");
    let mut stream = engine
        .completions_stream("The three laws of robotics are", &options)
        .await?;
    while let Some(chunk) = stream.next().await {
        print!("{}", chunk?.fragment());
    }
    println!("\n");

    println!("3. Chat:");
    let turns = [
        ChatMessage::system("You are a helpful programming expert."),
        ChatMessage::user("What are the main advantages of Rust?"),
    ];
    let answer = engine.chat(&turns, &options).await?;
    println!("{}\n", answer.text);

    println!("4. Translation:");
    let translator = textsynth::engine("m2m100_1_2B")?;
    let answer = translator
        .translate(&["Hello, world!"], &TranslateOptions::auto_detect("fr"))
        .await?;
    for translation in &answer.translations {
        println!("{}", translation.text);
    }

    let credits = textsynth::default_client()?.credits().await?;
    println!("\nCredits left: {}", credits.credits);
    Ok(())
}
