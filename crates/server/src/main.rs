//! Agora Server
//!
//! Axum server exposing the debate-generation entry point and the ideas API,
//! plus one-shot CLI commands that work directly on the database.

mod api;

use agora_core::debate::{DebateService, IdeaSeed};
use agora_core::state::{DebateDb, IdeaManager, NewIdea, ResponseManager, DEFAULT_DB_PATH};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use api::{AppState, SharedState};

/// Overrides the database location
const DB_PATH_VAR: &str = "AGORA_DB_PATH";

#[derive(Parser, Clone)]
#[command(author, version, about = "Agora - AI-assisted debates on ideas")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Agora server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Post an idea and generate its opening debate (CLI mode, no server)
    Debate {
        /// Idea title
        #[arg(short, long)]
        title: String,
        /// Idea description
        #[arg(short, long)]
        content: String,
        /// Author name
        #[arg(short, long)]
        author: Option<String>,
    },
    /// List ideas with their viewpoint counts
    Ideas,
}

fn open_db() -> anyhow::Result<DebateDb> {
    let path = std::env::var(DB_PATH_VAR).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    tracing::info!(path = %path, "Opening debate database");
    DebateDb::open_at(&path)
}

fn build_state() -> anyhow::Result<SharedState> {
    let db = open_db()?;
    let debate = DebateService::from_env(Arc::new(db.clone()));
    Ok(AppState::new(db, debate))
}

// === Server Entry ===

pub async fn run_server(host: &str, port: u16) -> anyhow::Result<()> {
    let state = build_state()?;
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!(%addr, "Agora server listening");
    println!("🗣  Agora Server running at http://{}", addr);
    println!("   Debate:  POST /functions/v1/generate-debate, /api/v1/debate");
    println!("   Ideas:   /api/v1/ideas, /:id/responses, /:id/thread, /:id/events");
    println!("   Docs:    /api/v1/openapi.json");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_debate(title: String, content: String, author: Option<String>) -> anyhow::Result<()> {
    let state = build_state()?;

    let idea = IdeaManager::new(&state.db).create(NewIdea {
        title,
        content,
        author_name: author,
    })?;
    println!("💡 Idea {} created", idea.id);

    let outcome = state
        .debate
        .generate_for(&IdeaSeed {
            idea_id: idea.id.clone(),
            title: idea.title.clone(),
            content: idea.content.clone(),
        })
        .await?;

    let summary = serde_json::json!({
        "success": true,
        "responses": outcome.responses(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    for response in ResponseManager::new(&state.db).list_for_idea(&idea.id)? {
        println!("\n[{}] {}\n{}", response.viewpoint, response.author_name, response.content);
    }

    Ok(())
}

fn list_ideas() -> anyhow::Result<()> {
    let db = open_db()?;
    let ideas = IdeaManager::new(&db).list()?;
    let responses = ResponseManager::new(&db);

    if ideas.is_empty() {
        println!("No ideas yet. Post one with `agora debate --title ... --content ...`");
        return Ok(());
    }

    for idea in ideas {
        let tally = responses.tally(&idea.id)?;
        println!(
            "{}  {}  (by {}, {} a favor / {} en contra / {} neutral)",
            idea.id, idea.title, idea.author_name, tally.favor, tally.contra, tally.neutral
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    match args.command {
        None => run_server("127.0.0.1", 8080).await,
        Some(CliCommand::Serve { port, host }) => run_server(&host, port).await,
        Some(CliCommand::Debate {
            title,
            content,
            author,
        }) => run_debate(title, content, author).await,
        Some(CliCommand::Ideas) => list_ideas(),
    }
}
