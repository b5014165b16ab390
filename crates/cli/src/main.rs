mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::{Parser, Subcommand};
use gateway::Client;
use runtime::{Session, ToolRegistry};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that can call external tools. \
If the user asks about the weather or the current time, or needs a math expression \
evaluated, use the matching function. After receiving tool results, give the user a \
clear, well-formatted answer.";
const CONFIG_FILE: &str = "hydra.toml";

#[derive(Parser)]
#[command(name = "hydra")]
#[command(about = "A chat client with local tool calling", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// List the builtin tools and their schemas
    Tools,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat().await,
        Some(Commands::Tools) => cmd_tools(),
    }
}

fn load_config() -> Result<Config> {
    if Path::new(CONFIG_FILE).exists() {
        Ok(Config::load(CONFIG_FILE)?)
    } else {
        Ok(Config::default())
    }
}

fn cmd_tools() -> Result<()> {
    let registry = ToolRegistry::builtin();
    for definition in registry.definitions() {
        println!("{}: {}", definition.name, definition.description);
        let schema = serde_json::to_string_pretty(&definition.parameters)
            .unwrap_or_else(|_| "{}".to_string());
        for line in schema.lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

/// Case-insensitive session terminator, localized spelling included.
fn is_sentinel(input: &str) -> bool {
    let lowered = input.to_lowercase();
    matches!(lowered.as_str(), "exit" | "quit" | "выход")
}

async fn cmd_chat() -> Result<()> {
    println!("hydra v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let (base_url, api_key) = config.credentials()?;

    let client = Client::builder(base_url, api_key)
        .model(config.gateway.model.as_str())
        .max_tokens(config.gateway.max_tokens)
        .temperature(config.gateway.temperature)
        .timeout(config.gateway.timeout())
        .build();

    let registry = ToolRegistry::builtin();
    println!("Model: {}", config.gateway.model);
    println!("Tools:");
    for definition in registry.definitions() {
        println!("  - {}: {}", definition.name, definition.description);
    }
    println!("Type 'exit' or 'quit' (or Ctrl+D) to leave.\n");

    let mut session =
        Session::new(client, registry, SYSTEM_PROMPT).with_policy(config.tool_policy);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_sentinel(input) {
            break;
        }

        match session.chat(input).await {
            Ok(turn) => {
                for invocation in &turn.invocations {
                    println!(
                        "  [tool] {}({}) -> {}",
                        invocation.name, invocation.arguments, invocation.output
                    );
                }
                println!("\n{}\n", turn.reply);
            }
            Err(e) => {
                // A failed turn never ends the session.
                eprintln!("Error: {e}\n");
            }
        }
    }

    println!("\nSession ended.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_matching() {
        assert!(is_sentinel("exit"));
        assert!(is_sentinel("QUIT"));
        assert!(is_sentinel("Выход"));
        assert!(!is_sentinel("exit please"));
        assert!(!is_sentinel("hello"));
    }
}
