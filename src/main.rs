//! git-syncd - repository-state synchronization daemon
//!
//! Keeps a disk-backed cache of derived repository state (branches, file
//! status, divergence, stashes) and serves it to the desktop UI over a
//! localhost API, recomputing through the selected git backend when the
//! cache is stale.
//!
//! # Usage
//! ```bash
//! git-syncd                          # Start daemon on the default port
//! git-syncd --git-backend=git2      # Use the libgit2 backend
//! git-syncd status                   # Check if running
//! git-syncd kill                     # Stop running instance
//! ```

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_syncd::context::AppContext;
use git_syncd::git::BackendKind;
use git_syncd::routes;

/// Repository-state synchronization daemon for the desktop client
#[derive(Parser)]
#[command(name = "git-syncd")]
#[command(about = "Repository-state synchronization daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Git execution backend: cli (subprocess) or git2 (in-process library)
    #[arg(long = "git-backend", value_name = "NAME", default_value = "cli")]
    git_backend: String,

    /// Override the user-data directory holding cache and settings
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Port to run the server on
    #[arg(short, long, default_value = "3002")]
    port: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// Check if git-syncd is currently running
    Status,
    /// Stop the running git-syncd instance
    Kill,
}

/// PID file info stored as JSON
#[derive(serde::Serialize, serde::Deserialize)]
struct PidInfo {
    pid: u32,
    port: u16,
    backend: String,
}

fn get_pid_file_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("git-syncd.pid");
    path
}

fn read_pid_info() -> Option<PidInfo> {
    let path = get_pid_file_path();
    let mut file = fs::File::open(&path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_pid_info(info: &PidInfo) -> anyhow::Result<()> {
    let path = get_pid_file_path();
    let mut file = fs::File::create(&path)?;
    file.write_all(serde_json::to_string(info)?.as_bytes())?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(get_pid_file_path());
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    // On Unix, sending signal 0 checks if process exists
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(&["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|output| {
            let output_str = String::from_utf8_lossy(&output.stdout);
            output_str.contains(&pid.to_string())
        })
        .unwrap_or(false)
}

#[cfg(unix)]
fn kill_process(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, libc::SIGTERM) == 0 }
}

#[cfg(windows)]
fn kill_process(pid: u32) -> bool {
    use std::process::Command;
    Command::new("taskkill")
        .args(&["/PID", &pid.to_string(), "/F"])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn handle_status() {
    match read_pid_info() {
        Some(info) => {
            if is_process_running(info.pid) {
                println!("✓ git-syncd is running");
                println!("  PID:     {}", info.pid);
                println!("  Backend: {}", info.backend);
                println!("  URL:     http://127.0.0.1:{}", info.port);
            } else {
                println!("✗ git-syncd is not running (stale PID file)");
                remove_pid_file();
            }
        }
        None => {
            println!("✗ git-syncd is not running");
        }
    }
}

fn handle_kill() {
    match read_pid_info() {
        Some(info) => {
            if is_process_running(info.pid) {
                if kill_process(info.pid) {
                    println!("✓ Stopped git-syncd (PID {})", info.pid);
                    remove_pid_file();
                } else {
                    println!("✗ Failed to stop git-syncd (PID {})", info.pid);
                }
            } else {
                println!("✗ git-syncd is not running (stale PID file)");
                remove_pid_file();
            }
        }
        None => {
            println!("✗ git-syncd is not running");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Status) => {
            handle_status();
            return Ok(());
        }
        Some(Commands::Kill) => {
            handle_kill();
            return Ok(());
        }
        None => {}
    }

    // Check if already running
    if let Some(info) = read_pid_info() {
        if is_process_running(info.pid) {
            eprintln!("✗ git-syncd is already running (PID {})", info.pid);
            eprintln!("  URL: http://127.0.0.1:{}", info.port);
            eprintln!();
            eprintln!("Run 'git-syncd kill' to stop it first.");
            std::process::exit(1);
        } else {
            remove_pid_file();
        }
    }

    // Initialize tracing (quieter for production)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Backend is resolved once per process lifetime
    let backend = BackendKind::from_name(&cli.git_backend);

    let data_dir = match cli.data_dir.or_else(|| dirs::data_dir().map(|d| d.join("git-syncd"))) {
        Some(dir) => dir,
        None => {
            eprintln!("✗ No user-data directory available; pass --data-dir");
            std::process::exit(1);
        }
    };

    let ctx = match AppContext::new(data_dir.clone(), backend) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            eprintln!("✗ Failed to initialize data directory: {}", e);
            eprintln!("  Path: {}", data_dir.display());
            std::process::exit(1);
        }
    };

    // CORS configuration for the UI shell running in another process
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(ctx))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Bind to the port
    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", cli.port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    // Write PID file
    let pid_info = PidInfo {
        pid: std::process::id(),
        port: cli.port,
        backend: backend.name().to_string(),
    };
    write_pid_info(&pid_info)?;

    println!();
    println!("  git-syncd");
    println!();
    println!("  Backend:  {}", backend.name());
    println!("  Data dir: {}", data_dir.display());
    println!("  Server:   http://127.0.0.1:{}", cli.port);
    println!();
    println!("  Commands:");
    println!("    git-syncd status  - Check if running");
    println!("    git-syncd kill    - Stop the daemon");
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    // Set up graceful shutdown
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        println!("\n  Shutting down...");
        remove_pid_file();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
