//! SMB2 share browser CLI

use clap::{Parser, Subcommand};
use smb_share_browser::client::ClientConfig;
use smb_share_browser::registry::{ConnectOptions, ConnectionRegistry};
use smb_share_browser::DirectoryEntry;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "smb-client")]
#[command(about = "Browse SMB2 shares and directories", long_about = None)]
struct Args {
    /// SMB server address, hostname, smb:// URL or UNC prefix
    #[arg(short = 'H', long)]
    host: String,

    /// Port to connect to
    #[arg(short = 'p', long, default_value = "445")]
    port: u16,

    /// Username for authentication
    #[arg(short = 'u', long, default_value = "guest")]
    username: String,

    /// Password for authentication
    #[arg(short = 'P', long, default_value = "")]
    password: String,

    /// Domain/workgroup
    #[arg(short = 'd', long, default_value = "")]
    domain: String,

    /// Seconds to wait for each response
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    /// Fail instead of inventing drive letters when shares cannot be listed
    #[arg(long)]
    no_fallback: bool,

    /// Fail the handshake when the server answers with an error status
    #[arg(long)]
    strict_handshake: bool,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the server's shares
    Drives,

    /// List files in a directory
    Ls {
        /// Directory path to list
        path: String,
    },

    /// Download a file from the server
    Get {
        /// Remote file path
        remote: String,
        /// Local file path
        local: PathBuf,
    },

    /// Upload a file to the server
    Put {
        /// Local file path
        local: PathBuf,
        /// Remote file path
        remote: String,
    },
}

fn print_entries(entries: &[DirectoryEntry]) {
    for entry in entries {
        let kind = if entry.is_drive {
            "share"
        } else if entry.is_directory {
            "dir"
        } else {
            "file"
        };
        let modified = entry
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<6} {:>12} {:<16} {}",
            kind, entry.size, modified, entry.name
        );
    }
}

async fn run(args: Args) -> smb_share_browser::Result<()> {
    let config = ClientConfig::default()
        .with_request_timeout(Duration::from_secs(args.timeout))
        .with_synthetic_drive_fallback(!args.no_fallback)
        .with_strict_handshake(args.strict_handshake);
    let registry = ConnectionRegistry::new(config);

    tracing::info!("Connecting to {}:{}", args.host, args.port);
    registry
        .connect(
            ConnectOptions::new(&args.host, &args.username, &args.password)
                .domain(&args.domain)
                .port(args.port),
        )
        .await?;

    let result = match &args.command {
        Commands::Drives => registry.list_drives(None).await.map(|e| print_entries(&e)),
        Commands::Ls { path } => registry
            .list_files(path, None)
            .await
            .map(|e| print_entries(&e)),
        Commands::Get { remote, local } => {
            tracing::info!("Downloading {} -> {}", remote, local.display());
            registry
                .download_file(remote, &local.to_string_lossy(), None)
                .await
        }
        Commands::Put { local, remote } => {
            tracing::info!("Uploading {} -> {}", local.display(), remote);
            registry
                .upload_file(&local.to_string_lossy(), remote, None)
                .await
        }
    };

    registry.disconnect(None).await?;
    tracing::info!("Disconnected");
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}
