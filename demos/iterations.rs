//! Walk a project's iterations and print a translated document of the newest one
//!
//! Usage: `cargo run --example iterations -- [project] [document] [locale]`

use dotenvy::dotenv;
use zanata_client::{ClientConfig, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let project_id = args.next().unwrap_or_else(|| "coala".to_string());
    let document_name = args.next().unwrap_or_else(|| project_id.clone());
    let locale = args.next().unwrap_or_else(|| "de-DE".to_string());

    let session = Session::from_config(&ClientConfig::from_env()?)?;

    let project = session.get_project(&project_id, None).await?;
    let iterations = session.get_iterations(&project, None).await?;

    println!("{}", iterations.len());
    for iteration in &iterations {
        println!("{},{}", iteration.id, iteration.status);
    }

    let Some(latest) = iterations.last() else {
        return Ok(());
    };

    let document = session
        .get_translated_documentation(&project.id, &latest.id, &document_name, &locale, None)
        .await?;
    let tree = document.into_json().await?;
    println!("{}", serde_json::to_string_pretty(&tree)?);

    Ok(())
}
