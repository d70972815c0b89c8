//! `omnimcp` - interactive front end for the universal MCP client
//!
//! ```bash
//! # One server, id taken from the file stem
//! omnimcp servers/weather.py
//!
//! # Several servers (ids server_1, server_2, ...)
//! omnimcp servers/weather.py servers/finance.js
//!
//! # Every *.py / *.js script in a directory
//! omnimcp --discover ./servers
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use omnimcp_core::{
    ClientConfig, Logger, McpClient, ServerConnection, TracingLogger, UniversalClient,
};

const DEFAULT_DISCOVERY_DIR: &str = "./servers";
const QUIT_COMMANDS: &[&str] = &["quit", "exit", "q"];

/// Universal MCP client - profiles any MCP server and drives multi-step tool workflows
#[derive(Parser, Debug)]
#[command(name = "omnimcp", version, about, long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .multiple(true)
        .args(["servers", "discover", "http"])
))]
struct Cli {
    /// Server scripts to launch (.py or .js)
    servers: Vec<PathBuf>,

    /// Connect every script found in a directory
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = DEFAULT_DISCOVERY_DIR)]
    discover: Option<PathBuf>,

    /// Connect a streamable HTTP server, as ID=URL (repeatable)
    #[arg(long, value_name = "ID=URL")]
    http: Vec<String>,

    /// Configuration file replacing the workspace config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let cwd = std::env::current_dir().ok();
    let config = ClientConfig::load(cli.config.as_deref(), cwd.as_deref())
        .context("failed to load configuration")?;

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    init_logging(level);

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::with_component("omnimcp-cli"));
    let client = UniversalClient::new(config, logger.clone())?;

    let result = run(&cli, &client, logger).await;
    client.shutdown().await;
    result
}

/// Initialize the tracing subscriber; `RUST_LOG` directives win over `level`
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli, client: &UniversalClient, logger: Arc<dyn Logger>) -> Result<()> {
    for (server_id, path) in script_ids(&cli.servers) {
        client
            .connect_to_server(&server_id, &path)
            .await
            .with_context(|| format!("failed to connect to {}", path.display()))?;
    }

    for spec in &cli.http {
        let (server_id, url) = parse_http_spec(spec)?;
        let mcp = McpClient::connect_http(url, logger.clone()).await?;
        let connection = ServerConnection::open(server_id, mcp, logger.clone()).await?;
        client.add_server(Arc::new(connection)).await?;
    }

    if let Some(dir) = &cli.discover {
        let connected = client.auto_discover_servers(dir).await?;
        println!("Discovered {} server(s) in {}", connected.len(), dir.display());
    }

    interactive_session(client).await
}

/// Pair each script with its server id
///
/// A single script is named after its file stem; several are numbered
/// `server_1`, `server_2`, ... in argument order.
fn script_ids(scripts: &[PathBuf]) -> Vec<(String, PathBuf)> {
    match scripts {
        [single] => vec![(omnimcp_core::client::server_id_for(single), single.clone())],
        many => many
            .iter()
            .enumerate()
            .map(|(i, path)| (format!("server_{}", i + 1), path.clone()))
            .collect(),
    }
}

/// Split an `ID=URL` argument
fn parse_http_spec(spec: &str) -> Result<(&str, &str)> {
    match spec.split_once('=') {
        Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
            Ok((id.trim(), url.trim()))
        }
        _ => bail!("invalid --http value '{}', expected ID=URL", spec),
    }
}

fn print_summary(client: &UniversalClient) {
    println!("\n🚀 Universal MCP Client Started!");
    println!("Connected servers:");
    for profile in client.profiles() {
        let domain = profile
            .domain
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  • {}: {} domain ({} tools)",
            profile.server_id,
            domain,
            profile.tools.len()
        );
    }
    println!("\nType your queries or 'quit' to exit.");
}

fn is_quit(line: &str) -> bool {
    QUIT_COMMANDS.contains(&line.to_lowercase().as_str())
}

fn prompt(text: &str) {
    print!("{}", text);
    // Best effort; a closed stdout ends the session at the next read anyway
    let _ = std::io::stdout().flush();
}

async fn interactive_session(client: &UniversalClient) -> Result<()> {
    print_summary(client);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt("\nQuery: ");
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else { break };

        let query = line.trim();
        if is_quit(query) {
            break;
        }
        if query.is_empty() {
            continue;
        }

        tokio::select! {
            result = client.process_query(query) => match result {
                Ok(response) => println!("\n🤖 {}", response),
                Err(e) => println!("\n❌ Error: {}", e),
            },
            _ = tokio::signal::ctrl_c() => {
                client.cancellation_token().cancel();
                println!();
                break;
            }
        }
    }

    println!("Shutting down...");
    Ok(())
}
