mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ctxpack", about = "Resolve Dockerfile dependencies and pack minimal build contexts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the workspace files a Dockerfile build depends on
    Deps {
        #[command(flatten)]
        flags: commands::ResolveFlags,
        /// Print a JSON array instead of one path per line
        #[arg(long)]
        json: bool,
    },
    /// Write a tar build context holding only those files
    Context {
        #[command(flatten)]
        flags: commands::ResolveFlags,
        /// Output file, or `-` for stdout
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries results (possibly a tar stream); logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deps { flags, json } => commands::deps(&flags, json).await?,
        Commands::Context { flags, output } => commands::context(&flags, &output).await?,
    }

    Ok(())
}
