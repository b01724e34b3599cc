use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use larder_ocr::{
    MockEngine, OcrEngine, OcrSpaceEngine, Orchestrator, ReceiptPipeline, ScanOptions, TesseractEngine,
};
use larder_parse::{LineRuleEngine, ReceiptParser};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

mod config;

use config::{LarderConfig, OcrSettings};

/// Receipt photo in, structured line items out.
#[derive(Parser, Debug)]
#[command(name = "larder", author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: the platform config dir's larder/config.toml)
    #[arg(short, long, global = true, env = "LARDER_CONFIG")]
    config: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// OCR a receipt image and print the receipt with its diagnostics
    Scan {
        image: PathBuf,
        /// OCR language code, e.g. eng
        #[arg(long)]
        lang: Option<String>,
        /// Run only this engine (tesseract, ocr_space, mock)
        #[arg(long)]
        engine: Option<String>,
    },
    /// Parse already-recognized receipt text
    Parse { text_file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the JSON, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = LarderConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let parser = build_parser(&config)?;

    match cli.command {
        Command::Parse { text_file } => {
            let text = tokio::fs::read_to_string(&text_file)
                .await
                .with_context(|| format!("Failed to read {}", text_file.display()))?;
            print_json(&parser.parse(&text), cli.pretty)?;
        }
        Command::Scan { image, lang, engine } => {
            let orchestrator = build_orchestrator(&config.ocr)?;
            let pipeline = ReceiptPipeline::new(orchestrator, parser, config.preprocess.clone());
            let options = ScanOptions { lang: lang.unwrap_or_else(|| config.ocr.language.clone()), engine };
            let processed = pipeline
                .process_file(&image, &options)
                .await
                .with_context(|| format!("Failed to scan {}", image.display()))?;
            print_json(&processed, cli.pretty)?;
        }
    }
    Ok(())
}

fn build_parser(config: &LarderConfig) -> Result<ReceiptParser> {
    let mut rules = LineRuleEngine::with_defaults();
    if let Some(path) = &config.rules_file {
        rules = rules
            .merge_file(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?;
        tracing::info!(path = %path.display(), rules = rules.len(), "merged line rules");
    }
    Ok(ReceiptParser::new(rules, config.parser.clone()))
}

fn build_orchestrator(settings: &OcrSettings) -> Result<Orchestrator> {
    let client = reqwest::Client::new();
    let limiter = (settings.max_concurrent_requests > 0)
        .then(|| Arc::new(Semaphore::new(settings.max_concurrent_requests)));

    let primary = build_engine(&settings.primary, settings, &client, limiter.clone())
        .with_context(|| format!("Failed to set up primary OCR engine '{}'", settings.primary))?;

    // A missing secondary only costs the fallback, so it is not fatal.
    let secondary = match settings.secondary.as_deref() {
        Some(id) if id != settings.primary => match build_engine(id, settings, &client, limiter) {
            Ok(engine) => Some(engine),
            Err(e) => {
                tracing::warn!(engine = id, error = %e, "secondary OCR engine disabled");
                None
            }
        },
        _ => None,
    };

    Ok(Orchestrator::new(primary, secondary, settings.orchestrator.clone()))
}

fn build_engine(
    id: &str,
    settings: &OcrSettings,
    client: &reqwest::Client,
    limiter: Option<Arc<Semaphore>>,
) -> Result<Arc<dyn OcrEngine>> {
    match id {
        "tesseract" => Ok(Arc::new(TesseractEngine::new(settings.tessdata_path.clone()))),
        "ocr_space" => {
            let key = std::env::var(&settings.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .with_context(|| format!("{} is not set", settings.api_key_env))?;
            let mut engine = OcrSpaceEngine::new(client.clone(), Arc::from(key))
                .with_endpoint(settings.ocr_space_endpoint.clone());
            if let Some(limiter) = limiter {
                engine = engine.with_limiter(limiter);
            }
            Ok(Arc::new(engine))
        }
        "mock" => {
            let text = match &settings.mock_text_file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => String::new(),
            };
            Ok(Arc::new(MockEngine::new("mock", text, 90.0)))
        }
        other => bail!("unknown OCR engine '{other}'"),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{json}");
    Ok(())
}
