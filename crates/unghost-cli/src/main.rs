//! unghost - terminal client for the Unghost outreach backend
//!
//! Chats with the research agents, answers plan interrupts, enhances prompts,
//! replays recorded sessions and manages the persisted settings.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use unghost_cli::render::{self, LiveView};
use unghost_cli::{ChatSession, Config, SendOptions};
use unghost_client::{extract_replay_id, ChatBackend, ClientConfig, UnghostClient};
use unghost_store::{MessageStore, SettingsStore};
use unghost_types::ReportStyle;

#[derive(Debug, Parser)]
#[command(
    name = "unghost",
    author,
    version,
    about = "Research a contact and draft personalized outreach from the terminal."
)]
struct Cli {
    /// Config file to use instead of config/default.toml and config/{ENV}.toml
    #[arg(long, short = 'c', global = true, env = "UNGHOST_CONFIG")]
    config: Option<PathBuf>,

    /// Backend API base URL (overrides config)
    #[arg(long, global = true, env = "UNGHOST_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start an interactive chat, optionally with a first message
    Chat {
        message: Option<String>,
    },

    /// Rewrite a prompt in the configured report style
    Enhance {
        prompt: String,
        /// Extra context for the rewrite
        #[arg(long)]
        context: Option<String>,
    },

    /// Replay a recorded session by id or by a URL carrying `?replay=<id>`
    Replay {
        id: String,
    },

    /// Show the effective configuration
    Config {
        /// Also fetch the backend's published configuration
        #[arg(long)]
        server: bool,
    },

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommand>,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Print the current settings as JSON
    Show,
    /// Set the outreach report style
    ReportStyle {
        /// aggressive, conservative, go_nuts or friendly
        style: ReportStyle,
    },
    /// Set the background the agents should know about you
    Background {
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
    }

    init_logging(&config);

    let client = UnghostClient::new(ClientConfig::from(&config.backend))?;
    tracing::debug!(base_url = %client.base_url(), "Backend client ready");
    let backend: Arc<dyn ChatBackend> = Arc::new(client);
    let settings = SettingsStore::open(&config.storage.settings_dir);

    match cli.command {
        Command::Chat { message } => {
            let session = build_session(&config, backend, settings);
            run_chat(session, message).await
        }
        Command::Enhance { prompt, context } => {
            let session = build_session(&config, backend, settings);
            let enhanced = session.enhance_prompt(&prompt, context.as_deref()).await?;
            println!("{}", enhanced);
            Ok(())
        }
        Command::Replay { id } => {
            let replay_id = extract_replay_id(&id).unwrap_or(id);
            let mut session = build_session(&config, backend, settings);
            spawn_stop_on_ctrl_c(&session);
            let mut view = LiveView::new();
            let outcome = session
                .replay_with_updates(&replay_id, |store, _| show(&mut view, store))
                .await;
            print!("{}", view.finish(session.store()));
            if outcome?.stopped {
                println!("(stopped)");
            }
            Ok(())
        }
        Command::Config { server } => {
            print!("{}", config.to_toml().context("Failed to render configuration")?);
            if server {
                let server_config = backend.fetch_config().await?;
                println!("\n# backend");
                println!("{}", serde_json::to_string_pretty(&server_config)?);
            }
            Ok(())
        }
        Command::Settings { command } => run_settings(settings, command),
    }
}

fn build_session(
    config: &Config,
    backend: Arc<dyn ChatBackend>,
    settings: SettingsStore,
) -> ChatSession {
    ChatSession::new(backend, settings, &config.storage.output_dir)
        .with_background_investigation(config.chat.enable_background_investigation)
}

fn run_settings(mut settings: SettingsStore, command: Option<SettingsCommand>) -> Result<()> {
    match command.unwrap_or(SettingsCommand::Show) {
        SettingsCommand::Show => {
            println!("# {}", settings.path().display());
            println!("{}", serde_json::to_string_pretty(settings.settings())?);
        }
        SettingsCommand::ReportStyle { style } => {
            settings.set_report_style(style)?;
            println!("Report style set to {}", style.as_str());
        }
        SettingsCommand::Background { text } => {
            settings.set_user_background(text)?;
            println!("User background saved");
        }
    }
    Ok(())
}

/// Ctrl-C stops the turn in flight. With nothing streaming it exits.
fn spawn_stop_on_ctrl_c(session: &ChatSession) {
    let stop = session.stop_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !stop.stop() {
                println!();
                std::process::exit(130);
            }
        }
    });
}

fn show(view: &mut LiveView, store: &MessageStore) {
    print!("{}", view.refresh(store));
    std::io::stdout().flush().ok();
}

async fn run_chat(mut session: ChatSession, first_message: Option<String>) -> Result<()> {
    spawn_stop_on_ctrl_c(&session);
    let mut view = LiveView::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type a message, /help for commands, /quit to leave.");
    let mut pending = first_message;

    loop {
        let input = match pending.take() {
            Some(input) => input,
            None => {
                print!("{}", prompt_for(&session));
                std::io::stdout().flush().ok();
                match lines.next_line().await? {
                    Some(line) => line,
                    None => break,
                }
            }
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if !run_chat_command(&mut session, command).await? {
                break;
            }
            print!("{}", view.finish(session.store()));
            continue;
        }

        let (content, options) = resolve_feedback(&session, input);
        let result = session
            .send_message_with_updates(&content, options, |store, _| show(&mut view, store))
            .await;
        print!("{}", view.finish(session.store()));
        match result {
            Ok(outcome) => {
                if outcome.stopped {
                    println!("(stopped)");
                }
                if outcome.skipped > 0 {
                    tracing::warn!(skipped = outcome.skipped, "Some events could not be decoded");
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

fn prompt_for(session: &ChatSession) -> String {
    match session.store().last_interrupt_message() {
        Some(interrupt) => format!(
            "Choose 1-{} or type feedback> ",
            interrupt.options.len().max(1)
        ),
        None => "> ".to_string(),
    }
}

/// A bare option number answers the pending interrupt with that option.
fn resolve_feedback(session: &ChatSession, input: &str) -> (String, SendOptions) {
    let choice = session.store().last_interrupt_message().and_then(|interrupt| {
        let index: usize = input.parse().ok()?;
        interrupt.options.get(index.checked_sub(1)?).cloned()
    });

    match choice {
        Some(option) => (option.text, SendOptions::feedback(option.value)),
        None => (input.to_string(), SendOptions::default()),
    }
}

/// Returns false when the chat should end.
async fn run_chat_command(session: &mut ChatSession, command: &str) -> Result<bool> {
    let (name, argument) = match command.split_once(' ') {
        Some((name, argument)) => (name, Some(argument.trim())),
        None => (command, None),
    };

    match name {
        "quit" | "exit" => return Ok(false),
        "help" => {
            println!("/enhance <prompt>   rewrite a prompt in your report style");
            println!("/history            print the whole conversation");
            println!("/research           show the open research");
            println!("/export [path]      save the open research's report as markdown");
            println!("/podcast            turn the open research's report into audio");
            println!("/close              close the open research");
            println!("/quit               leave");
        }
        "enhance" => match argument {
            Some(prompt) => println!("{}", session.enhance_prompt(prompt, None).await?),
            None => println!("Usage: /enhance <prompt>"),
        },
        "history" => println!("{}", render::render_conversation(session.store())),
        "research" => match session.store().open_research_id() {
            Some(id) => println!("{}", render::render_research_card(session.store(), id)),
            None => println!("No research is open"),
        },
        "export" => match session.store().open_research_id().map(str::to_string) {
            Some(id) => {
                let path = session
                    .export_report(&id, argument.map(std::path::Path::new))
                    .await?;
                println!("Report saved to {}", path.display());
            }
            None => println!("No research is open"),
        },
        "podcast" => match session.store().open_research_id().map(str::to_string) {
            Some(id) => match session.listen_to_podcast(&id).await {
                Ok(path) => println!("Podcast saved to {}", path.display()),
                Err(e) => eprintln!("Error: {}", e),
            },
            None => println!("No research is open"),
        },
        "close" => session.store_mut().close_research(),
        other => println!("Unknown command /{}", other),
    }
    Ok(true)
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout belongs to the conversation, logs go to stderr
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
