// CLI entry point for the Tile Duel server.
//
// Starts a standalone server that two clients connect to. See `server.rs`
// for the networking architecture and `handler.rs` for the per-connection
// protocol. Logging goes through `tracing`; set `RUST_LOG` to change the
// level (default `info`).
//
// Usage:
//   tile-duel-server [OPTIONS]
//     --config <FILE>   JSON config file (see `config.rs`)
//     --port <PORT>     Listen port (default: 8080)
//     --seed <SEED>     Seed for tile generation (default: random)

use std::path::PathBuf;

use tile_duel_server::{ServerConfig, start_server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = parse_args();

    let (handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            error!("failed to start server: {e}");
            std::process::exit(1);
        }
    };

    info!(%addr, "tile duel server listening");
    handle.join();
}

/// Parse command-line arguments into a `ServerConfig`. Uses simple
/// `std::env::args()` matching. `--config` is applied first so that
/// `--port` and `--seed` override the file wherever they appear.
fn parse_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut port: Option<u16> = None;
    let mut seed: Option<u64> = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--config requires a file path");
                    std::process::exit(1);
                }));
            }
            "--port" => {
                i += 1;
                port = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                }));
            }
            "--seed" => {
                i += 1;
                seed = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a valid number");
                    std::process::exit(1);
                }));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => ServerConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        }),
        None => ServerConfig::default(),
    };
    if let Some(port) = port {
        config.port = port;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config
}

fn print_usage() {
    println!("Usage: tile-duel-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>   JSON config file");
    println!("  --port <PORT>     Listen port (default: 8080)");
    println!("  --seed <SEED>     Seed for tile generation (default: random)");
    println!("  --help, -h        Show this help");
}
