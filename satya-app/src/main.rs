use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use satya_analyzer::{AnalysisRequest, Analyzer, Credentials};
use satya_common::observability::{LogConfig, init_logging};
use satya_config::{SatyaConfig, SatyaConfigLoader};
use std::path::PathBuf;

mod render;
mod server;

#[derive(Debug, Parser)]
#[command(name = "satya", version, about = "Check news and forwarded messages for misinformation")]
struct Cli {
    /// YAML configuration file; skipped when it does not exist.
    #[arg(long, short, env = "SATYA_CONFIG", default_value = "satya.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse a URL, a .txt/.md/.html file, or the given text itself.
    Analyze {
        source: String,
        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Serve `POST /analyze` over HTTP.
    Serve {
        /// Defaults to `server.port` from the configuration.
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A local .env is optional.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: SatyaConfig = SatyaConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // 2) Logging as configured
    let log_path = init_logging(LogConfig {
        app_name: "satya",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::info!(log_path = %log_path.display(), config = %cli.config.display(), "satya.start");

    cfg.validate()?;
    let analyzer = Analyzer::from_config(&cfg);
    let credentials = Credentials::from_config(&cfg);
    if credentials.search().is_none() {
        tracing::info!("search credentials not configured; related news disabled");
    }

    match cli.command {
        Command::Analyze { source, json } => {
            let text = satya_web::resolve_source(&source).await?;
            let report = analyzer
                .analyze(&AnalysisRequest::new(text, credentials))
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::render_report(&report));
            }
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(cfg.server.port);
            server::run_server(server::AppState::new(analyzer, credentials), port).await?;
        }
    }
    Ok(())
}
