//! ODDSIGHT: betting odds extraction and probability analysis.
//!
//! Entry point. Loads configuration, initialises structured logging and
//! dispatches to one of the subcommands:
//!
//! - `oddsight analyze <file|->` analyzes OCR text from a file or stdin
//! - `oddsight ocr <image>` recognizes an image, then analyzes it
//! - `oddsight serve` runs the HTTP service (default)

use anyhow::{Context, Result};
use std::io::Read;
use std::sync::Arc;
use tracing::{info, warn};

use oddsight::config::AppConfig;
use oddsight::extractor::OddsExtractor;
use oddsight::ocr::{OcrProvider, TesseractOcr};
use oddsight::report;
use oddsight::service::{self, ServiceState};
use oddsight::types::Locale;

const BANNER: &str = r#"
  ___  ____  ____  ____ ___ ____ _   _ _____
 / _ \|  _ \|  _ \/ ___|_ _/ ___| | | |_   _|
| | | | | | | | | \___ \| | |  _| |_| | | |
| |_| | |_| | |_| |___) | | |_| |  _  | | |
 \___/|____/|____/|____/___\____|_| |_| |_|

  Betting odds extraction and probability analysis
  v0.1.0
"#;

/// Exit status when the input holds fewer than two usable coefficients.
const EXIT_NO_ODDS: i32 = 2;

const USAGE: &str = "usage: oddsight [serve | analyze <file|-> | ocr <image>]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let (cfg, config_path) = AppConfig::load_from_env()?;

    init_logging();

    match config_path {
        Some(path) => info!(path = %path, "Configuration loaded"),
        None => warn!("No config file found, using defaults"),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => run_server(&cfg).await,
        Some("analyze") => {
            let source = args.get(1).map(String::as_str).unwrap_or("-");
            let text = read_text(source)?;
            print_analysis(&text.to_lowercase(), cfg.analysis.locale);
            Ok(())
        }
        Some("ocr") => {
            let path = args.get(1).context(USAGE)?;
            run_ocr(&cfg, path).await
        }
        Some(other) => {
            eprintln!("unknown command: {other}\n{USAGE}");
            std::process::exit(64);
        }
    }
}

async fn run_server(cfg: &AppConfig) -> Result<()> {
    println!("{BANNER}");
    info!(
        locale = %cfg.analysis.locale,
        storage = cfg.storage.enabled,
        ocr = cfg.ocr.enabled,
        "ODDSIGHT starting up"
    );

    let state = ServiceState::from_config(cfg).await?;
    service::serve(Arc::new(state), &cfg.server.host, cfg.server.port).await?;

    info!("ODDSIGHT shut down cleanly.");
    Ok(())
}

async fn run_ocr(cfg: &AppConfig, path: &str) -> Result<()> {
    let image = std::fs::read(path).with_context(|| format!("Failed to read image: {path}"))?;
    let ocr = TesseractOcr::from_config(&cfg.ocr);

    match ocr.recognize(&image).await {
        Some(text) => {
            print_analysis(&text, cfg.analysis.locale);
            Ok(())
        }
        None => {
            println!("{}", report::ocr_failed_message(cfg.analysis.locale));
            std::process::exit(EXIT_NO_ODDS);
        }
    }
}

/// Print the report, or the no-odds message and exit with `EXIT_NO_ODDS`.
fn print_analysis(text: &str, locale: Locale) {
    match OddsExtractor::new(locale).analyze(text) {
        Ok(result) => {
            info!(%result, "Analysis complete");
            println!("{}", report::render(&result, locale));
        }
        Err(e) => {
            info!(error = %e, "No odds found");
            println!("{}", report::no_odds_message(locale));
            std::process::exit(EXIT_NO_ODDS);
        }
    }
}

fn read_text(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
    }
}

/// Initialise the `tracing` subscriber. Logs go to stderr so reports on
/// stdout stay clean.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("oddsight=info"));

    let json_logging = std::env::var("ODDSIGHT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}
