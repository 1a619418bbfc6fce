//! omnidex CLI — molecular network exploration service.
//!
//! Usage:
//!   omnidex serve [--addr host:port] [--db path] [--metabo-db path]
//!   omnidex mcp [--transport stdio] [--db path]
//!   omnidex search <query> [--species taxon] [--datasets list] [--db path]

use clap::{Parser, Subcommand};
use omnidex::query::{fan_out, resolve_identifiers, Dataset, MatchMode, DEFAULT_SPECIES};
use omnidex::server::{router, AppState};
use omnidex::storage::{MetaboStore, NetworkStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "omnidex",
    version,
    about = "Molecular interaction network and metabolomics exploration service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
        /// Path to the network SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Path to the metabolomics SQLite database file
        #[arg(long)]
        metabo_db: Option<PathBuf>,
    },
    /// Start the MCP (Model Context Protocol) server
    Mcp {
        /// Transport type (currently only stdio)
        #[arg(long, default_value = "stdio")]
        transport: String,
        /// Path to the network SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Resolve a query and print rows from every dataset as JSON
    Search {
        /// Comma- or semicolon-separated identifiers
        query: String,
        /// NCBI taxon to search within
        #[arg(long, default_value = DEFAULT_SPECIES)]
        species: String,
        /// Datasets to query (default: all five)
        #[arg(long, value_delimiter = ',')]
        datasets: Option<Vec<Dataset>>,
        /// Path to the network SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Default database directory (~/.local/share/omnidex)
fn data_dir() -> PathBuf {
    let base = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let dir = base.join("omnidex");
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn default_db_path() -> PathBuf {
    data_dir().join("network.db")
}

fn default_metabo_db_path() -> PathBuf {
    data_dir().join("metabo.db")
}

fn open_network(db: Option<PathBuf>) -> Result<Arc<NetworkStore>, String> {
    let path = db.unwrap_or_else(default_db_path);
    NetworkStore::open(&path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))
}

fn cmd_serve(addr: SocketAddr, db: Option<PathBuf>, metabo_db: Option<PathBuf>) -> i32 {
    tracing_subscriber::fmt().init();

    let network = match open_network(db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let metabo_path = metabo_db.unwrap_or_else(default_metabo_db_path);
    let metabo = match MetaboStore::open(&metabo_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!(
                "Error: failed to open database at {}: {}",
                metabo_path.display(),
                e
            );
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let app = router(AppState::new(network, metabo));
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                eprintln!("failed to bind {}: {}", addr, e);
                return 1;
            }
        };
        tracing::info!(%addr, "omnidex listening");
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
            return 1;
        }
        0
    })
}

fn cmd_search(
    query: &str,
    species: &str,
    datasets: Option<Vec<Dataset>>,
    db: Option<PathBuf>,
) -> i32 {
    let network = match open_network(db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let resolved = match resolve_identifiers(
            network.as_ref(),
            query,
            species,
            MatchMode::default(),
        )
        .await
        {
            Ok(resolved) => resolved,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };

        let datasets = datasets.unwrap_or_else(|| Dataset::ALL.to_vec());
        let mut report = serde_json::Map::new();
        report.insert(
            "resolvedIdentifiers".into(),
            serde_json::to_value(&resolved.resolved_identifiers).unwrap_or_default(),
        );
        let mut failed = false;
        for (dataset, result) in fan_out(&network, &datasets, &resolved) {
            match result {
                Ok(rows) => match serde_json::to_value(&rows) {
                    Ok(serde_json::Value::Object(wrapper)) => {
                        report.extend(wrapper);
                    }
                    Ok(other) => {
                        report.insert(dataset.to_string(), other);
                    }
                    Err(e) => {
                        eprintln!("Error: {}: {}", dataset, e);
                        failed = true;
                    }
                },
                Err(e) => {
                    eprintln!("Error: {}: {}", dataset, e);
                    failed = true;
                }
            }
        }

        match serde_json::to_string_pretty(&serde_json::Value::Object(report)) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        i32::from(failed)
    })
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            addr,
            db,
            metabo_db,
        } => {
            let code = cmd_serve(addr, db, metabo_db);
            std::process::exit(code);
        }
        Commands::Mcp { transport, db } => {
            if transport != "stdio" {
                eprintln!("error: only 'stdio' transport is currently supported");
                std::process::exit(1);
            }
            let db_path = db.unwrap_or_else(default_db_path);
            let code = omnidex::mcp::run_mcp_server(db_path);
            std::process::exit(code);
        }
        Commands::Search {
            query,
            species,
            datasets,
            db,
        } => {
            let code = cmd_search(&query, &species, datasets, db);
            std::process::exit(code);
        }
    }
}
