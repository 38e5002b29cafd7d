//! CLI command definitions and handlers

use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::core::models::{Iteration, Project, Suggestion};
use crate::core::session::Session;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Commands for the Zanata client
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all projects
    Projects,

    /// Show one project
    Project {
        /// Project id
        id: String,
    },

    /// List the iterations of a project
    Iterations {
        /// Project id
        project: String,
    },

    /// Query the translation memory
    Suggest {
        /// Source texts to look up
        #[arg(required = true)]
        texts: Vec<String>,

        /// Source locale
        #[arg(long, default_value = "en")]
        from: String,

        /// Target locale
        #[arg(long)]
        to: String,
    },

    /// Download a translated document of an iteration
    Docs {
        /// Project id
        project: String,

        /// Iteration id
        iteration: String,

        /// Document name within the iteration
        document: String,

        /// Locale, e.g. de-DE
        locale: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Dispatch a parsed command
pub async fn run(
    session: &Session,
    command: Commands,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Commands::Projects => handle_projects(session, format, cancel).await,
        Commands::Project { id } => handle_project(session, &id, format, cancel).await,
        Commands::Iterations { project } => {
            handle_iterations(session, &project, format, cancel).await
        }
        Commands::Suggest { texts, from, to } => {
            handle_suggest(session, &texts, &from, &to, format, cancel).await
        }
        Commands::Docs {
            project,
            iteration,
            document,
            locale,
            output,
        } => {
            handle_docs(
                session, &project, &iteration, &document, &locale, output, format, cancel,
            )
            .await
        }
    }
}

/// Handle project listing
pub async fn handle_projects(
    session: &Session,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let projects = session.get_projects(Some(cancel)).await?;

    if format == OutputFormat::Text {
        println!("{} projects on {}", projects.len(), session.domain());
        for project in &projects {
            print_project(project);
        }
        return Ok(());
    }

    emit(&projects, format)
}

/// Handle single project lookup
pub async fn handle_project(
    session: &Session,
    id: &str,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let project = session.get_project(id, Some(cancel)).await?;

    if format == OutputFormat::Text {
        print_project(&project);
        return Ok(());
    }

    emit(&project, format)
}

/// Handle iteration listing
pub async fn handle_iterations(
    session: &Session,
    project: &str,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let iterations = session.get_iterations_by_id(project, Some(cancel)).await?;

    if format == OutputFormat::Text {
        println!("{} iterations of {}", iterations.len(), project);
        for iteration in &iterations {
            print_iteration(iteration);
        }
        return Ok(());
    }

    emit(&iterations, format)
}

/// Handle suggestion query
pub async fn handle_suggest(
    session: &Session,
    texts: &[String],
    from: &str,
    to: &str,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let suggestions = session.get_suggestions(texts, from, to, Some(cancel)).await?;

    if format == OutputFormat::Text {
        println!("{} suggestions", suggestions.len());
        for (rank, suggestion) in suggestions.iter().enumerate() {
            print_suggestion(rank + 1, suggestion);
        }
        return Ok(());
    }

    emit(&suggestions, format)
}

/// Handle document download
#[allow(clippy::too_many_arguments)]
pub async fn handle_docs(
    session: &Session,
    project: &str,
    iteration: &str,
    name: &str,
    locale: &str,
    output: Option<PathBuf>,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Instant;
    use tracing::info;

    let start_time = Instant::now();
    let mut document = session
        .get_translated_documentation(project, iteration, name, locale, Some(cancel))
        .await?;

    let Some(path) = output else {
        // Structured output needs the whole tree; text mode pretty-prints JSON.
        let value = document.into_json().await?;
        return match format {
            OutputFormat::Yaml => emit(&value, format),
            _ => emit(&value, OutputFormat::Json),
        };
    };

    info!("Writing {} ({}) to {}", name, locale, path.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")?,
    );
    pb.set_message(path.display().to_string());

    let mut file = tokio::fs::File::create(&path).await?;
    let mut written = 0u64;
    let outcome = async {
        use tokio::io::AsyncWriteExt;

        while let Some(chunk) = document.next_chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            pb.set_position(written);
        }
        file.flush().await?;
        anyhow::Ok(())
    }
    .await;

    if let Err(e) = outcome {
        pb.abandon_with_message("Failed");
        drop(file);
        // Leave no truncated file behind.
        let _ = tokio::fs::remove_file(&path).await;
        return Err(e);
    }

    pb.finish_with_message("Completed");
    info!("Wrote {} bytes in {:?}", written, start_time.elapsed());
    println!("\n✅ {} saved to {}", name, path.display());
    println!("   Size: {} bytes", written);

    Ok(())
}

fn print_project(project: &Project) {
    println!("{}\t{}\t{}", project.id, project.name, project.status);
}

fn print_iteration(iteration: &Iteration) {
    println!("{}\t{}", iteration.id, iteration.status);
}

fn print_suggestion(rank: usize, suggestion: &Suggestion) {
    println!(
        "{}. {} → {}",
        rank,
        suggestion.source_contents.join(" | "),
        suggestion.target_contents.join(" | ")
    );
}

fn emit<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{}", rendered);
    Ok(())
}

/// Render `value` in a structured format
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json | OutputFormat::Text => serde_json::to_string_pretty(value)?,
    })
}
