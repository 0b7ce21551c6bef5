//! Leadsearch CLI: incremental lead search from the terminal.
//!
//! Usage:
//!   leadsearch search <query> [--base-url url | --fixture leads.json]
//!   leadsearch interactive [--debounce-ms 300] [--base-url url | --fixture leads.json]

use clap::{Args, Parser, Subcommand};
use leadsearch::{
    ClientConfig, HttpSearchBackend, InMemoryLeadStore, Lead, SearchBackend, SearchOptions,
    SearchSession, SearchSnapshot, SessionPhase,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "leadsearch",
    version,
    about = "Incremental search over sales leads"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct BackendArgs {
    /// Base URL of the lead API (defaults to $LEADSEARCH_BASE_URL or http://localhost:5047)
    #[arg(long, conflicts_with = "fixture")]
    base_url: Option<String>,
    /// Search a local JSON file of leads instead of the lead API
    #[arg(long)]
    fixture: Option<PathBuf>,
    /// Search endpoint path
    #[arg(long, default_value = "/leads")]
    endpoint: String,
    /// Queries shorter than this are not searched
    #[arg(long, default_value_t = 1)]
    min_length: usize,
    /// Abandon requests that take longer than this
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single search and print the results
    Search {
        /// Free-text query
        query: String,
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Read queries from stdin, one per line, searching as they change
    Interactive {
        /// Quiet period before a query is searched
        #[arg(long, default_value_t = 300)]
        debounce_ms: u64,
        #[command(flatten)]
        backend: BackendArgs,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_backend(args: &BackendArgs) -> Result<Arc<dyn SearchBackend>, String> {
    if let Some(path) = &args.fixture {
        let store = InMemoryLeadStore::from_json_file(path)
            .map_err(|e| format!("failed to load fixture {}: {}", path.display(), e))?;
        return Ok(Arc::new(store));
    }
    let mut config = ClientConfig::from_env();
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url.clone());
    }
    let backend = HttpSearchBackend::new(&config).map_err(|e| e.to_string())?;
    Ok(Arc::new(backend))
}

fn options_for(args: &BackendArgs, debounce_ms: u64) -> SearchOptions {
    let options = SearchOptions::new()
        .with_debounce_ms(debounce_ms)
        .with_min_query_length(args.min_length)
        .with_endpoint(args.endpoint.clone());
    match args.timeout_ms {
        Some(ms) => options.with_request_timeout_ms(ms),
        None => options,
    }
}

fn print_leads(leads: &[Lead]) {
    if leads.is_empty() {
        println!("No leads found.");
        return;
    }
    println!("{:<16}  {:<24}  {:<28}  {:<12}", "ID", "NAME", "EMAIL", "STATUS");
    println!("{}", "-".repeat(86));
    for lead in leads {
        println!(
            "{:<16}  {:<24}  {:<28}  {:<12}",
            lead.id, lead.name, lead.email, lead.status
        );
    }
}

fn print_snapshot(snapshot: &SearchSnapshot) {
    match snapshot.phase {
        SessionPhase::Debouncing if !snapshot.loading => {}
        _ if snapshot.loading => println!("searching for '{}'...", snapshot.query),
        SessionPhase::Committed => match &snapshot.error {
            Some(message) => println!("error: {}", message),
            None => print_leads(&snapshot.data),
        },
        SessionPhase::Idle if !snapshot.query.is_empty() => {
            println!("'{}' is too short to search", snapshot.query)
        }
        _ => {}
    }
}

fn settled(snapshot: &SearchSnapshot) -> bool {
    matches!(snapshot.phase, SessionPhase::Committed | SessionPhase::Idle) && !snapshot.loading
}

async fn cmd_search(query: String, args: BackendArgs) -> i32 {
    let backend = match open_backend(&args) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let session = match SearchSession::new(backend, options_for(&args, 0)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut updates = session.subscribe();
    session.search(&query);
    loop {
        let snapshot = updates.borrow_and_update().clone();
        if settled(&snapshot) {
            print_snapshot(&snapshot);
            return if snapshot.error.is_some() { 1 } else { 0 };
        }
        if updates.changed().await.is_err() {
            return 1;
        }
    }
}

async fn cmd_interactive(debounce_ms: u64, args: BackendArgs) -> i32 {
    let backend = match open_backend(&args) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let session = match SearchSession::new(backend, options_for(&args, debounce_ms)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    eprintln!("type a query per line; empty line clears, EOF quits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = session.subscribe();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => session.search(line.trim_end()),
                Ok(None) => break,
                Err(e) => {
                    eprintln!("Error: failed to read stdin: {}", e);
                    session.cleanup();
                    return 1;
                }
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_snapshot(&snapshot);
            }
        }
    }

    // Let an in-flight search finish before tearing down.
    if session.has_pending_work() {
        let wait = tokio::time::timeout(Duration::from_secs(30), async {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                print_snapshot(&snapshot);
                if settled(&snapshot) && !session.has_pending_work() {
                    break;
                }
            }
        });
        let _ = wait.await;
    }
    session.cleanup();
    0
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        match cli.command {
            Commands::Search { query, backend } => cmd_search(query, backend).await,
            Commands::Interactive { debounce_ms, backend } => cmd_interactive(debounce_ms, backend).await,
        }
    });
    std::process::exit(code);
}
