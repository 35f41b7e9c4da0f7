use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use wr3223_rs::logging::{init_logger_with_default, log_error};
use wr3223_rs::registry::{self, commands};
use wr3223_rs::{
    build_read_request, connect, format_result, humanize, log_info, missing_codes, ChecksumMode,
    QueryResult, SessionConfig,
};

#[derive(Parser)]
#[command(name = "wr3223-cli")]
#[command(about = "CLI tool for Hermes WR3223 ventilation controllers")]
struct Cli {
    /// Serial port, e.g. /dev/ttyUSB0 or COM3
    #[arg(short, long, global = true)]
    port: Option<String>,
    /// Controller address (0-99)
    #[arg(short, long, global = true)]
    address: Option<i64>,
    /// JSON session config; command line flags override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Verify the block check character of every response
    #[arg(long, global = true)]
    strict_checksum: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all known commands
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the request bytes for a command without touching the port
    Request { code: String },
    /// Read one or more commands
    Read {
        #[arg(required = true)]
        codes: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Read every known command
    Poll {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SessionConfig::default(),
        };
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(address) = self.address {
            config.address = address;
        }
        if self.strict_checksum {
            config.checksum = ChecksumMode::Strict;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_results(codes: &[&str], results: &QueryResult, json: bool) -> anyhow::Result<()> {
    for code in missing_codes(codes, results) {
        log_error(&format!("No result for {code}"));
    }
    if json {
        let ordered: BTreeMap<&String, &String> = results.iter().collect();
        println!("{}", serde_json::to_string_pretty(&ordered)?);
        return Ok(());
    }
    for code in codes {
        if let Some(value) = results.get(*code) {
            println!("{}", format_result(code, value));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger_with_default("info");

    let cli = Cli::parse();

    match &cli.command {
        Commands::List { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(commands())?);
            } else {
                for spec in commands() {
                    println!(
                        "{}  {:<45} {:<10} {}{}",
                        spec.code,
                        spec.description,
                        spec.unit_or_empty(),
                        if spec.writable { "rw" } else { "ro" },
                        if spec.has_mapping() {
                            format!("  ({} values)", spec.mapping.len())
                        } else {
                            String::new()
                        }
                    );
                }
            }
        }
        Commands::Request { code } => {
            let config = cli.session_config()?;
            let request = build_read_request(config.address, code)?;
            println!("{}  {}", hex::encode(&request), humanize(&request));
        }
        Commands::Read { codes, json } => {
            let mut session = connect(cli.session_config()?).await?;
            let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
            let results = session.read_many(codes.iter().copied()).await;
            session.disconnect().await?;
            print_results(&codes, &results, *json)?;
        }
        Commands::Poll { json } => {
            let mut session = connect(cli.session_config()?).await?;
            let results = session.read_all().await;
            session.disconnect().await?;
            log_info(&format!(
                "Read {} of {} commands",
                results.len(),
                registry::all_codes().len()
            ));
            print_results(registry::all_codes(), &results, *json)?;
        }
    }

    Ok(())
}
