mod config;
mod output;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, Command};
use compartment_engine::{
    ChatClient, DocumentFile, ProgressUpdate, SummaryStore, UploadCoordinator, UploadInput,
};
use engine_logging::{engine_error, engine_info, LogDestination};
use log::LevelFilter;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, CONFIG_FILENAME};

fn cli() -> Command {
    Command::new("compartment")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upload documents for summarization and browse the resulting compartments")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .default_value(CONFIG_FILENAME)
                .value_parser(value_parser!(PathBuf))
                .help("Path to the RON configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output"),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a PDF, Markdown or text document")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Document to upload"),
                ),
        )
        .subcommand(
            Command::new("text")
                .about("Upload plain text from a file or stdin")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .help("Text file, or - to read stdin"),
                ),
        )
        .subcommand(
            Command::new("ask")
                .about("Ask a question about the uploaded document")
                .arg(
                    Arg::new("question")
                        .required(true)
                        .num_args(1..)
                        .help("Question text"),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    let config = AppConfig::load(&config_path)?.with_overrides(|key| std::env::var(key).ok());

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if config.log_to_file {
        LogDestination::with_default_file()
    } else {
        LogDestination::Terminal
    };
    engine_logging::initialize(destination, level);
    engine_info!("Using backend {}", config.base_url);

    let user_id = config.resolve_user_id()?;

    match matches.subcommand() {
        Some(("upload", args)) => {
            let Some(path) = args.get_one::<PathBuf>("path") else {
                bail!("missing document path");
            };
            let file = DocumentFile::from_path(path)
                .await
                .with_context(|| format!("failed to read {path:?}"))?;
            run_upload(&config, &user_id, UploadInput::File(file)).await
        }
        Some(("text", args)) => {
            let Some(source) = args.get_one::<String>("path") else {
                bail!("missing text path");
            };
            let content = if source == "-" {
                read_all(tokio::io::stdin())
                    .await
                    .context("failed to read stdin")?
            } else {
                tokio::fs::read_to_string(source)
                    .await
                    .with_context(|| format!("failed to read {source:?}"))?
            };
            run_upload(&config, &user_id, UploadInput::Text(content)).await
        }
        Some(("ask", args)) => {
            let question = args
                .get_many::<String>("question")
                .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            run_ask(&config, &user_id, &question).await
        }
        _ => bail!("unknown command"),
    }
}

async fn read_all<R>(mut reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut content = String::new();
    reader.read_to_string(&mut content).await?;
    Ok(content)
}

async fn run_upload(config: &AppConfig, user_id: &str, input: UploadInput) -> anyhow::Result<()> {
    if let Err(err) = input.validate() {
        bail!("{}", err.user_message());
    }

    let coordinator = UploadCoordinator::from_settings(config.client_settings())
        .context("invalid backend settings")?;
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let sink = |update: ProgressUpdate| println!("{}", output::progress_line(&update));
    let result = match coordinator.upload(input, user_id, &sink, &cancel).await {
        Ok(result) => result,
        Err(err) => {
            engine_error!("Upload failed: {}", err);
            bail!("{}", err.user_message());
        }
    };

    println!("\n{}", output::outline_text(&result.title, &result.outline()));
    let path = SummaryStore::new(config.output_dir.clone())
        .save(&result)
        .context("failed to save summary")?;
    println!("Saved to {}", path.display());
    Ok(())
}

async fn run_ask(config: &AppConfig, user_id: &str, question: &str) -> anyhow::Result<()> {
    let client = ChatClient::new(config.client_settings()).context("invalid backend settings")?;
    match client.ask(question, user_id).await {
        Ok(reply) => {
            println!("{}", output::chat_text(&reply));
            Ok(())
        }
        Err(err) => {
            engine_error!("Chat request failed: {}", err);
            bail!("{}", err.user_message())
        }
    }
}
