mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::args::Arguments;
use log::{error, info, LevelFilter};
use std::path::Path;
use storage_controller::config::Config;
use storage_controller::controller::Controller;
use storage_controller::utils::logging::init_logging;
use tokio::io::{self, AsyncBufReadExt, BufReader};

const SEPARATOR: &str = "──────────────────────────────── ✧ ✧ ✧ ────────────────────────────────";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arguments::parse();

    if args.verbose {
        init_logging(LevelFilter::Info);
    } else {
        init_logging(LevelFilter::Warn);
    }

    let config = match &args.config {
        Some(config_path) => Config::parse_from_file(config_path).map_err(|e| {
            error!("Failed to load configuration '{}': {:#}", config_path, e);
            e
        })?,
        None => Config::default(),
    };

    let mut controller = Controller::start(&config);

    println!("{}", SEPARATOR);
    println!("Storage controller is running.");
    println!("Available commands:");
    println!(" - register <id> <address> <port>: Register or update a storage node");
    println!(" - heartbeat <id>: Refresh a node's liveness");
    println!(" - upload <filename> <owner_id>: Record an upload owned by a node");
    println!(" - download <filename> <out_dir>: Fetch a file from one of its owners");
    println!(" - status: Display nodes and files");
    println!("{}", SEPARATOR);

    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal.");
                break;
            }
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "register" if parts.len() == 4 => {
                match controller.register_node(parts[1], parts[2], parts[3]).await {
                    Ok(()) => println!(
                        "Node {} registered at {}:{} (ONLINE)",
                        parts[1], parts[2], parts[3]
                    ),
                    Err(e) => eprintln!("Failed to register node: {}", e),
                }
            }
            "heartbeat" if parts.len() == 2 => match controller.heartbeat(parts[1]).await {
                Ok(()) => println!("Node {} is ONLINE", parts[1]),
                Err(e) => eprintln!("Heartbeat rejected: {}", e),
            },
            "upload" if parts.len() == 3 => {
                match controller.upload_file(parts[1], parts[2]).await {
                    Ok(()) => println!("File '{}' uploaded and owned by {}", parts[1], parts[2]),
                    Err(e) => eprintln!("Failed to upload file: {}", e),
                }
            }
            "download" if parts.len() == 3 => {
                match download(&controller, parts[1], Path::new(parts[2])).await {
                    Ok(path) => println!("File downloaded successfully! Saved to {:?}", path),
                    Err(e) => eprintln!("Failed to download file: {:#}", e),
                }
            }
            "status" if parts.len() == 1 => {
                print!("{}", controller.status().await);
            }
            _ => {
                eprintln!(
                    "Wrong command or syntax '{}'. Valid commands are: 'register <id> <address> <port>', 'heartbeat <id>', 'upload <filename> <owner_id>', 'download <filename> <out_dir>' or 'status'",
                    parts[0]
                );
            }
        }
        println!("{}", SEPARATOR);
    }

    controller.shutdown();
    Ok(())
}

async fn download(controller: &Controller, filename: &str, out_dir: &Path) -> Result<std::path::PathBuf> {
    let data = controller.download_file(filename).await?;

    let name = Path::new(filename)
        .file_name()
        .context("Filename has no final component")?;
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create directory {:?}", out_dir))?;
    let path = out_dir.join(name);
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}
