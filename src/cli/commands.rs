//! Subcommand handlers for ask, chat and config actions.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use super::args::{ConfigAction, TurnArgs};
use super::presenter::TerminalPresenter;
use avatar_chat::chat::GroqChat;
use avatar_chat::config::{default_path as get_config_path, Config, DEFAULT_CONFIG_TOML};
use avatar_chat::conversation::{Conversation, TurnRequest};
use avatar_chat::tavus::TavusClient;

/// Build the conversation with its collaborators, once per process.
fn build_conversation(config: &Config) -> Result<Conversation, String> {
    let chat = GroqChat::new(config.groq_api_key.clone(), &config.chat)
        .map_err(|e| format!("Failed to create chat client: {}", e))?;
    let video = TavusClient::new(&config.tavus)
        .map_err(|e| format!("Failed to create Tavus client: {}", e))?;
    log::debug!("Chat model {} at {}", chat.model(), chat.base_url());
    log::debug!(
        "Replica {} at {} (poll every {:?}, give up after {:?})",
        video.replica_id(),
        video.videos_url(),
        video.poll_interval(),
        video.max_wait()
    );
    Ok(Conversation::new(Arc::new(chat), video))
}

fn turn_request(message: &str, turn: &TurnArgs) -> TurnRequest {
    TurnRequest {
        user_input: message.to_string(),
        system_context: turn.system.clone(),
        tone: turn.tone.into(),
        generate_video: !turn.no_video,
    }
}

/// Drive one turn to completion, or until Ctrl-C drops it.
async fn play_turn<W: Write>(
    conversation: &Conversation,
    request: TurnRequest,
    presenter: &mut TerminalPresenter<W>,
) -> Result<(), String> {
    let updates = conversation.turn(request);
    tokio::pin!(updates);

    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(update) => presenter
                    .present(&update)
                    .map_err(|e| format!("Failed to write output: {}", e))?,
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                eprintln!("Turn cancelled.");
                return Ok(());
            }
        }
    }
}

/// Resolves on Ctrl-C.
///
/// Once a turn has listened for Ctrl-C the default handler is gone, so the
/// prompt has to listen as well.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Next input line, or `None` on EOF or when `interrupt` resolves first.
async fn read_line<R, F>(lines: &mut Lines<R>, interrupt: F) -> Result<Option<String>, String>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::select! {
        line = lines.next_line() => line.map_err(|e| format!("Failed to read input: {}", e)),
        _ = interrupt => Ok(None),
    }
}

/// Send one message and print the reply and video progress.
pub fn run_ask(config: &Config, message: &str, turn: &TurnArgs) -> Result<(), String> {
    let conversation = build_conversation(config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    rt.block_on(async {
        let mut presenter = TerminalPresenter::new(std::io::stdout());
        play_turn(&conversation, turn_request(message, turn), &mut presenter).await
    })
}

/// Read messages from stdin, one turn per line, until EOF, `/quit` or Ctrl-C
/// at the prompt.
pub fn run_chat(config: &Config, turn: &TurnArgs) -> Result<(), String> {
    let conversation = build_conversation(config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    rt.block_on(async {
        let mut presenter = TerminalPresenter::new(std::io::stdout());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("Type a message and press Enter. /quit to exit.");
        loop {
            print!("> ");
            std::io::stdout().flush().ok();

            let line = read_line(&mut lines, interrupted()).await?;
            let Some(line) = line else {
                println!();
                return Ok(());
            };

            let message = line.trim();
            if message.is_empty() {
                continue;
            }
            if message == "/quit" {
                return Ok(());
            }

            presenter.reset();
            play_turn(&conversation, turn_request(message, turn), &mut presenter).await?;
            println!();
        }
    })
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, path: Option<&Path>) -> Result<(), String> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load(path).map_err(|e| e.to_string())?;

            println!("Current configuration:");
            println!("  Chat API: {}", config.chat.base_url);
            println!("  Chat model: {}", config.chat.model);
            println!("  Tavus API: {}", config.tavus.base_url);
            println!("  Replica: {}", config.tavus.replica_id);
            println!("  Request timeout: {}s", config.tavus.request_timeout.as_secs());
            println!("  Poll interval: {}s", config.tavus.poll_interval.as_secs());
            println!("  Max wait: {}s", config.tavus.max_wait.as_secs());
            println!("  Log level: {}", config.log_level);
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            if config_path.exists() {
                println!("Config file already exists: {}", config_path.display());
                return Ok(());
            }

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create directory '{}': {}", parent.display(), e)
                })?;
            }
            std::fs::write(&config_path, DEFAULT_CONFIG_TOML).map_err(|e| {
                format!("Failed to write '{}': {}", config_path.display(), e)
            })?;
            println!("Created config file: {}", config_path.display());
        }
    }

    Ok(())
}
