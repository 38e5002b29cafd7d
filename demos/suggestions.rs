//! Query the translation memory
//!
//! Usage: `cargo run --example suggestions -- [from] [to] [text...]`

use dotenvy::dotenv;
use zanata_client::{ClientConfig, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let from = args.next().unwrap_or_else(|| "en".to_string());
    let to = args.next().unwrap_or_else(|| "ja".to_string());
    let mut texts: Vec<String> = args.collect();
    if texts.is_empty() {
        texts.push("a".to_string());
    }

    let session = Session::from_config(&ClientConfig::from_env()?)?;
    let suggestions = session.get_suggestions(&texts, &from, &to, None).await?;

    println!("{}", suggestions.len());
    for suggestion in &suggestions {
        println!(
            "{:?},{:?}",
            suggestion.source_contents, suggestion.target_contents
        );
    }

    Ok(())
}
