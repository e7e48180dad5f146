//! # Code Provisioning Subcommands
//!
//! `actv codes generate` mints random codes into a seed file; `actv seed`
//! loads a seed file into the configured store; `actv stats` reports counts.
//!
//! A seed file is a JSON array of `{code, plan, expires_at}` objects. Extra
//! fields on an entry are ignored on load and preserved on append.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use clap::{Args, Subcommand};
use rand::RngCore;

use actv_core::{CodeId, Timestamp};
use actv_state::Plan;
use actv_store::{CodeStats, NewCode, SeedReport, StoreBackend, StoreConfig};

/// Random bytes per generated code, before encoding.
const CODE_ENTROPY_BYTES: usize = 12;

/// Where the code store lives. Mirrors the service's environment variables.
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Backend: memory, file or postgres.
    #[arg(long = "store", env = "CODE_STORE")]
    pub kind: Option<String>,
    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
    /// JSON store file for the file backend.
    #[arg(long, env = "CODES_FILE")]
    pub codes_file: Option<PathBuf>,
    /// Per-operation store timeout in milliseconds.
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,
}

impl StoreArgs {
    /// Resolve into a store config.
    pub fn config(&self) -> Result<StoreConfig> {
        let backend = StoreBackend::resolve(
            self.kind.as_deref(),
            self.database_url.clone(),
            self.codes_file.clone(),
        )
        .map_err(anyhow::Error::msg)?;
        if self.timeout_ms == 0 {
            bail!("store timeout must be positive");
        }
        Ok(StoreConfig {
            backend,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

/// Arguments for `actv codes`.
#[derive(Args, Debug)]
pub struct CodesArgs {
    #[command(subcommand)]
    pub command: CodesCommand,
}

/// Code subcommands.
#[derive(Subcommand, Debug)]
pub enum CodesCommand {
    /// Generate random activation codes and append them to a seed file.
    Generate(GenerateArgs),
}

/// Arguments for `actv codes generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of codes to generate.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,
    /// Plan granted by the codes: lifetime or trial.
    #[arg(short, long, default_value = "lifetime")]
    pub plan: Plan,
    /// Expiry, ISO 8601 UTC.
    #[arg(short, long = "expires", default_value = "2099-12-31T23:59:59Z", value_parser = parse_timestamp)]
    pub expires_at: Timestamp,
    /// Seed file to append to. Created if missing.
    #[arg(short, long, default_value = "codes.json")]
    pub out: PathBuf,
    /// Also write the new codes as CSV.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,
}

/// Arguments for `actv seed`.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Seed file (JSON array of codes).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Arguments for `actv stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub store: StoreArgs,
}

fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    Timestamp::parse(s).map_err(|e| e.to_string())
}

/// Execute `actv codes`.
pub fn run_codes(args: &CodesArgs) -> Result<u8> {
    match &args.command {
        CodesCommand::Generate(args) => cmd_generate(args),
    }
}

fn cmd_generate(args: &GenerateArgs) -> Result<u8> {
    if args.count == 0 {
        bail!("--count must be greater than 0");
    }
    let codes = generate_codes(args.count, args.plan, args.expires_at)?;
    let total = append_seed_file(&args.out, &codes)?;

    println!("OK: generated {} {} codes", codes.len(), args.plan);
    println!("  Seed file: {} ({total} codes total)", args.out.display());

    if let Some(csv) = &args.export_csv {
        export_csv(csv, &codes)?;
        println!("  CSV:       {}", csv.display());
    }

    for entry in codes.iter().take(3) {
        println!("  {}", entry.code);
    }
    if codes.len() > 3 {
        println!("  ... and {} more", codes.len() - 3);
    }
    Ok(0)
}

/// Execute `actv seed`.
pub fn run_seed(args: &SeedArgs) -> Result<u8> {
    let codes = read_seed_file(&args.file)?;
    let config = args.store.config()?;
    if config.backend == StoreBackend::Memory {
        tracing::warn!("seeding the in-memory store; nothing will persist after exit");
    }

    let report = block_on(seed_store(&config, &codes))??;
    println!(
        "OK: seeded {} backend: {} inserted, {} skipped",
        config.backend.name(),
        report.inserted,
        report.skipped
    );
    Ok(0)
}

/// Execute `actv stats`.
pub fn run_stats(args: &StatsArgs) -> Result<u8> {
    let config = args.store.config()?;
    let stats = block_on(store_stats(&config))??;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("backend:   {}", config.backend.name());
        println!("total:     {}", stats.total);
        println!("used:      {}", stats.used);
        println!("available: {}", stats.available);
    }
    Ok(0)
}

/// Open `config` and seed `codes` into it.
pub async fn seed_store(config: &StoreConfig, codes: &[NewCode]) -> Result<SeedReport> {
    let store = actv_store::open(config)
        .await
        .context("failed to open code store")?;
    store.seed(codes).await.context("seeding failed")
}

/// Open `config` and read its counts.
pub async fn store_stats(config: &StoreConfig) -> Result<CodeStats> {
    let store = actv_store::open(config)
        .await
        .context("failed to open code store")?;
    store.stats().await.context("failed to read code stats")
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// A fresh random code: `ACT-` followed by 16 URL-safe base64 characters.
pub fn generate_code() -> Result<CodeId> {
    let mut bytes = [0u8; CODE_ENTROPY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Ok(CodeId::new(format!("ACT-{}", URL_SAFE_NO_PAD.encode(bytes)))?)
}

/// `count` fresh codes sharing a plan and expiry.
pub fn generate_codes(count: usize, plan: Plan, expires_at: Timestamp) -> Result<Vec<NewCode>> {
    (0..count)
        .map(|_| {
            Ok(NewCode {
                code: generate_code()?,
                plan,
                expires_at,
            })
        })
        .collect()
}

/// Load a seed file.
pub fn read_seed_file(path: &Path) -> Result<Vec<NewCode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid seed file: {}", path.display()))
}

/// Append `codes` to the seed file at `path`, creating it if missing.
/// Returns the number of entries now in the file.
pub fn append_seed_file(path: &Path, codes: &[NewCode]) -> Result<usize> {
    let mut entries: Vec<serde_json::Value> = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid seed file: {}", path.display()))?
    } else {
        Vec::new()
    };
    for code in codes {
        entries.push(serde_json::to_value(code)?);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&entries)?)
        .with_context(|| format!("failed to write seed file: {}", path.display()))?;
    Ok(entries.len())
}

/// Write `codes` as `code,plan,expires_at` CSV.
pub fn export_csv(path: &Path, codes: &[NewCode]) -> Result<()> {
    let mut csv = String::from("code,plan,expires_at\n");
    for c in codes {
        csv.push_str(&format!("{},{},{}\n", c.code, c.plan, c.expires_at));
    }
    std::fs::write(path, csv).with_context(|| format!("failed to write CSV: {}", path.display()))
}
