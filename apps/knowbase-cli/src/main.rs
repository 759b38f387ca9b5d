use std::env;
use std::path::PathBuf;

use knowbase_core::chunker::ChunkingConfig;
use knowbase_core::config::{expand_path, Config};
use knowbase_core::types::Category;
use knowbase_embed::default_embedder;
use knowbase_ingest::Normalizer;
use knowbase_rag::{responder, KnowledgeService, QueryOptions};
use tracing_subscriber::EnvFilter;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {prog} <ingest|ingest-repo|ask|info> [args...]");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

async fn open_service(config: &Config) -> anyhow::Result<KnowledgeService> {
    let db_dir = expand_path(config.get_or::<String>("storage.db_dir", "data/knowbase_db".to_string()));
    let table: String = config.get_or("storage.table", "professional_knowledge".to_string());
    let chunking = ChunkingConfig {
        chunk_size: config.get_or("chunking.chunk_size", 1000),
        overlap: config.get_or("chunking.overlap", 200),
    };
    std::fs::create_dir_all(&db_dir)?;
    KnowledgeService::open(&db_dir, &table, default_embedder()?, chunking).await
}

fn normalizer(config: &Config) -> Normalizer {
    let repos_dir: String = config.get_or("ingest.repos_dir", "data/repos".to_string());
    Normalizer::new(expand_path(repos_dir))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let data_dir = args.first().map(PathBuf::from).unwrap_or_else(|| {
                expand_path(config.get_or::<String>("ingest.data_dir", "data/documents".to_string()))
            });
            println!("Ingesting from {}", data_dir.display());
            let documents = normalizer(&config).process_directory(&data_dir)?;
            let service = open_service(&config).await?;
            let report = service.ingest(&documents).await?;
            println!(
                "Ingest complete: {} documents, {} chunks",
                report.documents, report.chunks
            );
        }
        "ingest-repo" => {
            let url = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: knowbase ingest-repo <url>");
                std::process::exit(1)
            });
            let documents = normalizer(&config).process_repository(&url)?;
            let service = open_service(&config).await?;
            let report = service.ingest(&documents).await?;
            println!(
                "Ingested {}: {} documents, {} chunks",
                url, report.documents, report.chunks
            );
        }
        "ask" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: knowbase ask \"<question>\" [k] [category]");
                std::process::exit(1)
            });
            let k = args
                .get(1)
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or_else(|| config.get_or("retrieval.default_k", 5));
            let category = args.get(2).map(|s| Category::parse(s));
            let service = open_service(&config).await?;
            let response = service
                .query(
                    &question,
                    &QueryOptions { context_count: k, category, include_sources: true },
                )
                .await;
            println!("{}", response.answer);
            println!(
                "\n({} sources, {:.2}s)",
                response.sources_used,
                response.processing_time.as_secs_f64()
            );
            for ctx in &response.contexts {
                println!(
                    "  - {} [{}] relevance {:.3}",
                    ctx.meta.file_name(),
                    ctx.meta.category,
                    ctx.relevance_score
                );
            }
        }
        "info" => {
            let service = open_service(&config).await?;
            let info = service.knowledge_base_info().await;
            println!(
                "Knowledge base: {} chunks, categories: {:?}, status: {:?}",
                info.total_chunks, info.categories, info.status
            );
            println!("\n{}", responder::expertise_summary(&info));
        }
        _ => {
            eprintln!("Unknown command: {cmd}");
            std::process::exit(1);
        }
    }
    Ok(())
}
