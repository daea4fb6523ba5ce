use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, Context};
use tracing_subscriber::filter::EnvFilter;

mod info;
mod session;

#[derive(Debug, Parser)]
#[command(name = "uvm-dbg", about = "Inspect and debug programs for the UVM")]
struct Args {
    /// Address of the debug server, overriding the config file
    #[clap(long, global = true)]
    server: Option<String>,

    /// Config file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the header and sections of an image
    Info {
        file: PathBuf,

        #[clap(long)]
        json: bool,
    },
    /// Disassemble the code section of an image
    Disasm {
        file: PathBuf,

        #[clap(long)]
        json: bool,
    },
    /// Start an interactive debug session
    Debug {
        /// Image to load before the session opens
        file: Option<PathBuf>,
    },
}

fn load_config(args: &Args) -> eyre::Result<config::Config> {
    let mut config = match &args.config {
        Some(path) => config::load_from(path).wrap_err("loading config")?,
        None => match config::default_path() {
            Some(path) => config::load_or_default(path).wrap_err("loading config")?,
            None => config::Config::default(),
        },
    };
    if let Some(server) = &args.server {
        config.server.url = server.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install().context("installing color_eyre")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::debug!(?config, "loaded config");

    match args.command {
        Command::Info { file, json } => {
            let bytes = read_file(&file).await?;
            info::print_info(&bytes, json)
        }
        Command::Disasm { file, json } => {
            let bytes = read_file(&file).await?;
            info::print_disassembly(&bytes, json)
        }
        Command::Debug { file } => session::run(&config, file).await,
    }
}

async fn read_file(path: &Path) -> eyre::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("reading {}", path.display()))
}
