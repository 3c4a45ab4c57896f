//! cryptobackup: encrypted file backup CLI
//!
//! Commands:
//!   upload    encrypt a local file and store it
//!   download  fetch a stored object and decrypt it
//!   list      list the children of a remote directory
//!   delete    remove a stored object and its metadata
//!   info      print the metadata recorded for an object
//!   genkey    print a random hex key
//!   version   print the version
//!   config    print the effective configuration

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cbk_core::config::CbkConfig;
use cbk_core::Algorithm;
use cbk_crypto::{CipherBackend, SecretKey};
use cbk_pipeline::Pipeline;
use cbk_storage::{build_store, ObjectStore, StoreBackend};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cryptobackup",
    version,
    about = "Encrypted file backup tool",
    long_about = "cryptobackup: encrypt files with AES-GCM or XOR and keep them in a local object store"
)]
struct Cli {
    /// Path to cryptobackup.toml configuration file
    #[arg(long, short = 'c', env = "CBK_CONFIG", default_value = "cryptobackup.toml", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [logging] level
    #[arg(long, env = "CBK_LOG", global = true)]
    log: Option<String>,

    /// Log format; overrides [logging] format
    #[arg(long, env = "CBK_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a local file and upload it
    Upload {
        /// Local file to encrypt
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Remote path of the stored object
        #[arg(long, short = 'r')]
        remote: String,
        #[command(flatten)]
        crypto: CryptoArgs,
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Download an object and decrypt it to a local file
    Download {
        /// Remote path of the stored object
        #[arg(long, short = 'r')]
        remote: String,
        /// Local destination (parent directories are created)
        #[arg(long, short = 'f')]
        file: PathBuf,
        #[command(flatten)]
        crypto: CryptoArgs,
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// List the entries of a remote directory
    List {
        /// Remote directory
        #[arg(long, short = 'p', default_value = "/")]
        path: String,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Delete a stored object and its metadata
    Delete {
        /// Remote path of the stored object
        #[arg(long, short = 'r')]
        remote: String,
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Show the metadata recorded for an object
    Info {
        /// Remote path of the stored object
        #[arg(long, short = 'r')]
        remote: String,
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Generate a random key and print it as hex
    Genkey {
        /// Key length in bytes (16, 24 or 32 for AES)
        #[arg(long, default_value_t = cbk_crypto::key::DEFAULT_KEY_SIZE)]
        size: usize,
    },

    /// Print version information
    Version,

    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        storage: StorageArgs,
        /// Algorithm to report instead of [crypto] algorithm
        #[arg(long, short = 'a')]
        algo: Option<Algorithm>,
    },
}

#[derive(clap::Args)]
struct CryptoArgs {
    /// Encryption key, hex encoded
    #[arg(long, short = 'k', env = "CBK_KEY", hide_env_values = true)]
    key: String,
    /// Cipher algorithm (aes, xor); overrides [crypto] algorithm
    #[arg(long, short = 'a')]
    algo: Option<Algorithm>,
}

impl std::fmt::Debug for CryptoArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoArgs")
            .field("key", &"[REDACTED]")
            .field("algo", &self.algo)
            .finish()
    }
}

#[derive(clap::Args, Debug)]
struct StorageArgs {
    /// Base directory of the local store; overrides [storage] root
    #[arg(long, short = 's')]
    storage: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (mut config, found) = load_config(&cli.config).await?;

    let level = cli.log.clone().unwrap_or_else(|| config.logging.level.clone());
    let format = match cli.log_format {
        Some(f) => f,
        None => LogFormat::from_str(&config.logging.format, true)
            .map_err(|e| anyhow::anyhow!("invalid [logging] format: {e}"))?,
    };
    init_logging(&level, format);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        found,
        "cryptobackup starting"
    );

    let ctx = CancellationToken::new();

    match cli.command {
        Commands::Upload { file, remote, crypto, storage } => {
            storage.apply(&mut config);
            cmd_upload(&config, &ctx, &crypto, &file, &remote).await
        }
        Commands::Download { remote, file, crypto, storage } => {
            storage.apply(&mut config);
            cmd_download(&config, &ctx, &crypto, &remote, &file).await
        }
        Commands::List { path, json, storage } => {
            storage.apply(&mut config);
            cmd_list(&config, &ctx, &path, json).await
        }
        Commands::Delete { remote, storage } => {
            storage.apply(&mut config);
            cmd_delete(&config, &ctx, &remote).await
        }
        Commands::Info { remote, json, storage } => {
            storage.apply(&mut config);
            cmd_info(&config, &ctx, &remote, json).await
        }
        Commands::Genkey { size } => cmd_genkey(size),
        Commands::Version => {
            println!("cryptobackup version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Config { storage, algo } => {
            storage.apply(&mut config);
            if let Some(algo) = algo {
                config.crypto.algorithm = algo;
            }
            cmd_config_show(&config, &cli.config)
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Load the config file, falling back to defaults when it does not exist.
async fn load_config(path: &Path) -> Result<(CbkConfig, bool)> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config: {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((CbkConfig::default(), false))
    }
}

impl StorageArgs {
    fn apply(&self, config: &mut CbkConfig) {
        if let Some(root) = &self.storage {
            config.storage.root = root.clone();
        }
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let layer = fmt::layer().with_writer(std::io::stderr);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

fn open_store(config: &CbkConfig) -> Result<StoreBackend> {
    build_store(&config.storage).with_context(|| {
        format!(
            "opening {:?} store at {}",
            config.storage.backend,
            config.storage.root.display()
        )
    })
}

fn open_pipeline(config: &CbkConfig, crypto: &CryptoArgs) -> Result<Pipeline<CipherBackend, StoreBackend>> {
    let algorithm = crypto.algo.unwrap_or(config.crypto.algorithm);
    let key = SecretKey::from_hex(&crypto.key).context("invalid key")?;
    let cipher = CipherBackend::new(algorithm, key.as_bytes())
        .with_context(|| format!("creating {algorithm} cipher"))?;
    Ok(Pipeline::new(cipher, open_store(config)?))
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn cmd_upload(
    config: &CbkConfig,
    ctx: &CancellationToken,
    crypto: &CryptoArgs,
    file: &Path,
    remote: &str,
) -> Result<()> {
    let pipeline = open_pipeline(config, crypto)?;

    println!("encrypting and uploading: {} -> {remote}", file.display());
    let pb = make_spinner("upload");
    pb.set_message(file.display().to_string());

    let result = pipeline.upload_file(ctx, file, remote).await;
    pb.finish_and_clear();
    let report = result.with_context(|| format!("uploading {}", file.display()))?;

    println!(
        "✓ uploaded {} ({} bytes, {} bytes encrypted)",
        report.remote_path, report.original_size, report.encrypted_size
    );
    Ok(())
}

async fn cmd_download(
    config: &CbkConfig,
    ctx: &CancellationToken,
    crypto: &CryptoArgs,
    remote: &str,
    file: &Path,
) -> Result<()> {
    let pipeline = open_pipeline(config, crypto)?;

    println!("downloading and decrypting: {remote} -> {}", file.display());
    let pb = make_spinner("download");
    pb.set_message(remote.to_string());

    let result = pipeline.download_file(ctx, remote, file).await;
    pb.finish_and_clear();
    let report = result.with_context(|| format!("downloading {remote}"))?;

    println!("✓ downloaded {} ({} bytes)", report.remote_path, report.bytes);
    Ok(())
}

async fn cmd_list(config: &CbkConfig, ctx: &CancellationToken, path: &str, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let entries = store
        .list(ctx, path)
        .await
        .with_context(|| format!("listing {path}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", output::listing(path, &entries));
    }
    Ok(())
}

async fn cmd_delete(config: &CbkConfig, ctx: &CancellationToken, remote: &str) -> Result<()> {
    let store = open_store(config)?;

    println!("deleting: {remote}");
    store
        .delete(ctx, remote)
        .await
        .with_context(|| format!("deleting {remote}"))?;

    info!(remote, "deleted object");
    println!("✓ deleted");
    Ok(())
}

async fn cmd_info(config: &CbkConfig, ctx: &CancellationToken, remote: &str, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let metadata = store
        .get_metadata(ctx, remote)
        .await
        .with_context(|| format!("reading info for {remote}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        print!("{}", output::file_info(remote, &metadata));
    }
    Ok(())
}

fn cmd_genkey(size: usize) -> Result<()> {
    let key = SecretKey::generate(size).context("generating key")?;
    print!("{}", output::generated_key(size, &key.to_hex()));
    Ok(())
}

fn cmd_config_show(config: &CbkConfig, path: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("serializing config")?;
    println!("# {}", path.display());
    print!("{rendered}");
    Ok(())
}
