//! List the projects on the configured server, then look up the first one

use dotenvy::dotenv;
use zanata_client::{ClientConfig, Session};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match ClientConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("❌ Cannot load configuration: {}", e);
            return;
        }
    };

    let session = match Session::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            println!("❌ Cannot create session: {}", e);
            return;
        }
    };

    let projects = match session.get_projects(None).await {
        Ok(projects) => projects,
        Err(e) => {
            println!("❌ Listing projects failed: {}", e);
            return;
        }
    };

    println!("{}", projects.len());
    for project in &projects {
        println!("{},{},{}", project.name, project.id, project.status);
    }

    if let Some(first) = projects.first() {
        match session.get_project(&first.id, None).await {
            Ok(project) => println!("{}", project.id == first.id),
            Err(e) => println!("❌ Lookup of {} failed: {}", first.id, e),
        }
    }
}
