use std::process;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use page_translator::core::{
    format_output_path, print_error_message, print_info_message, read_document, write_document,
    PageError,
};
use page_translator::env::{self, EnvVar};
use page_translator::parsers::get_title;
use page_translator::translation::core::{PageCommand, PageTranslationController, PassState};
use page_translator::translation::storage::{translate_selection, HistoryStore};
use page_translator::translation::{
    ConfigManager, GeminiTranslator, TranslationConfig, TranslationEngine,
};

/// Translate HTML pages in place and restore them later
#[derive(Parser, Debug)]
#[command(name = "page-translator", author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate every visible text and attribute of a page
    Translate {
        /// Input HTML file, `-` for stdin
        input: String,

        /// Output file, supports %title%, %lang% and %timestamp%
        #[arg(short, long)]
        output: Option<String>,

        /// Target language, e.g. "German"
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Restore a translated page to its original text
    Restore {
        /// Input HTML file, `-` for stdin
        input: String,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the translation status of a page as JSON
    Status {
        /// Input HTML file, `-` for stdin
        input: String,
    },
    /// Translate a single piece of text and record it in the history
    Text {
        text: String,

        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Inspect or clear the translation history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List history entries, newest first
    List,
    /// Remove all history entries
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write an example configuration file
    Init { path: String },
    /// Describe the supported environment variables
    Env,
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            print_error_message(&format!("Error: {}", e));
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        print_error_message(&format!("Error: {}", e));
        process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(env::core::LogLevel::get_or_default(
            "info".to_string(),
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>, lang: Option<String>) -> Result<TranslationConfig, PageError> {
    let manager = match path {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };

    let mut config = manager.into_config();
    if let Some(lang) = lang {
        config.target_lang = lang;
    }

    Ok(config)
}

fn open_history(config: &TranslationConfig) -> Result<HistoryStore, PageError> {
    match config.history_file() {
        Some(path) => Ok(HistoryStore::open(path, config.max_history_items)?),
        None => Ok(HistoryStore::in_memory(config.max_history_items)),
    }
}

async fn run(cli: Cli) -> Result<(), PageError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Translate {
            input,
            output,
            lang,
        } => {
            let config = load_config(config_path, lang)?;
            let document = read_document(&input)?;
            let translator = Rc::new(GeminiTranslator::new(&config)?);

            let controller =
                PageTranslationController::new(document.dom.document.clone(), translator, &config);

            // 页面本身可能写到标准输出，摘要只写日志
            match controller.start().await {
                Some(PassState::Done(summary)) => tracing::info!(
                    "Translated {} of {} items ({} failed)",
                    summary.success_count,
                    summary.units,
                    summary.failure_count
                ),
                Some(PassState::Failed(reason)) => return Err(PageError::new(&reason)),
                Some(state) => tracing::warn!("{}", state),
                None => tracing::info!("Page is already translated"),
            }

            let title = get_title(&document.dom.document);
            let output = output
                .map(|path| format_output_path(&path, title.as_deref(), &config.target_lang));
            write_document(&document, output.as_deref())?;
        }
        Commands::Restore { input, output } => {
            let document = read_document(&input)?;
            let engine = TranslationEngine::new(document.dom.document.clone());

            let restored = engine.restore();
            tracing::info!("Restored {} items", restored);

            write_document(&document, output.as_deref())?;
        }
        Commands::Status { input } => {
            let config = load_config(config_path, None)?;
            let document = read_document(&input)?;
            let translator = Rc::new(GeminiTranslator::new(&config)?);

            let controller =
                PageTranslationController::new(document.dom.document.clone(), translator, &config);
            let response = controller
                .handle(PageCommand::GetPageTranslationStatus)
                .await;

            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| PageError::new(&e.to_string()))?;
            print_info_message(&json);
        }
        Commands::Text { text, lang } => {
            let config = load_config(config_path, lang)?;
            let translator = GeminiTranslator::new(&config)?;
            let history = open_history(&config)?;

            let translation = translate_selection(&translator, &history, &text).await?;
            print_info_message(&translation);
        }
        Commands::History { action } => {
            let config = load_config(config_path, None)?;
            let history = open_history(&config)?;

            match action {
                HistoryAction::List => {
                    for entry in history.list()? {
                        print_info_message(&format!(
                            "[{}] {} => {}",
                            entry.timestamp, entry.original, entry.translation
                        ));
                    }
                }
                HistoryAction::Clear => {
                    history.clear()?;
                    print_info_message("History cleared");
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path } => {
                ConfigManager::generate_example_config(&path)?;
                print_info_message(&format!("Wrote example configuration to {}", path));
            }
            ConfigAction::Env => print_info_message(&env::generate_env_docs()),
        },
    }

    Ok(())
}
