//! Research RAG server binary
//!
//! Run with: cargo run -p research-rag --bin research-rag-server

use research_rag::{config::RagConfig, server::RagServer, Error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        tracing::info!("Loaded environment from {}", path.display());
    }

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    Research RAG System                    ║
║     Paper Q&A with Sources and Metric Extraction          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM: {:?} / {}", config.llm.backend, config.llm.model);
    tracing::info!(
        "  - Embeddings: {:?} / {} ({} dims)",
        config.embeddings.backend,
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - Collection: {}", config.index.collection_name);
    tracing::info!("  - Staging dir: {}", config.staging.data_dir.display());

    let server = match RagServer::new(config).await {
        Ok(server) => server,
        Err(e @ Error::MissingCredential(_)) => {
            tracing::error!("{}", e);
            eprintln!("\n{}\nSet it in your shell or in a .env file and restart.", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/sessions                 - Create a session");
    println!("  POST /api/sessions/:id/documents   - Upload PDFs");
    println!("  POST /api/sessions/:id/query       - Ask questions");
    println!("  POST /api/sessions/:id/metrics     - Extract metrics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
