use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use switchboard::core::config::{self, CliOverrides, ServerEntry};

#[derive(Parser)]
#[command(name = "switchboard", about = "Terminal client for IRC-style chat servers")]
struct Args {
    /// Config file to use instead of ~/.switchboard/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Nick to register with
    #[arg(short, long)]
    nick: Option<String>,

    /// Server to connect to at startup (host[:port]); repeatable
    #[arg(long, value_parser = config::parse_server_arg)]
    connect: Vec<ServerEntry>,

    /// Log file path
    #[arg(long)]
    log_file: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .map_err(|e| {
        eprintln!("switchboard: {e}");
        std::io::Error::other(e.to_string())
    })?;

    let overrides = CliOverrides {
        nick: args.nick,
        connect: args.connect,
        log_level: args.log_level,
        log_file: args.log_file,
    };
    let resolved = config::resolve(&file_config, &overrides);

    // Initialize file logger; the terminal belongs to the TUI
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = LevelFilter::from_str(&resolved.log_level).unwrap_or(LevelFilter::Debug);
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    log::info!(
        "Switchboard starting as {} ({} autoconnect servers)",
        resolved.nick,
        resolved.servers.len()
    );

    switchboard::tui::run(resolved).await.inspect_err(|e| {
        log::error!("Terminal failure: {}", e);
        eprintln!("switchboard: {e}");
    })
}
