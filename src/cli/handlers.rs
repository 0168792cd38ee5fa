use anyhow::{anyhow, bail};
use crossterm::style::Stylize;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::{parse_chat_input, ChatInput, SessionArgs};
use crate::client::{AgentClient, ClientError, FileUpload};
use crate::core::mentioned_agent;
use crate::sync::{Phase, SessionController, SessionStore, TranscriptEntry};
use crate::utils::{new_entries, print_entries, print_session_summary};
use crate::{Config, Result};

type Controller = SessionController<AgentClient>;

fn build_controller(config: &Config) -> Result<Controller> {
    let client = AgentClient::from_config(&config.backend)?;
    tracing::debug!("Using backend at {}", client.base_url());
    Ok(SessionController::new(client, config.session.clone()))
}

/// Mount-time check; one-shot commands need a ready session.
async fn require_ready(controller: &Controller) -> Result<()> {
    match controller.check_state().await? {
        Phase::Ready => Ok(()),
        _ => bail!("Session is not initialized (or the backend is unreachable). Run 'agentdeck init' first."),
    }
}

pub async fn show_state(config: Config) -> Result<()> {
    // Unlike mount, an explicit state command reports an unreachable backend
    let client = AgentClient::from_config(&config.backend)?;
    let snapshot = client.fetch_state().await?;
    print_session_summary(&snapshot);

    if !snapshot.messages.is_empty() {
        println!();
        let mut store = SessionStore::default();
        store.set_snapshot(snapshot);
        print_entries(&store.transcript());
    }
    Ok(())
}

pub async fn init_session(config: Config, args: SessionArgs) -> Result<()> {
    let controller = build_controller(&config)?;

    if controller.check_state().await? == Phase::Ready {
        println!("Session is already initialized");
        print_session_summary(&controller.view().snapshot);
        return Ok(());
    }

    let session = controller.update_config(|session| args.apply(session)).await?;
    println!(
        "Initializing session in container '{}' (port {}, model {})...",
        session.container_name, session.port, session.model
    );

    match controller.initialize().await {
        Ok(ack) => {
            println!(
                "✅ {}",
                ack.message.as_deref().unwrap_or("Session initialized")
            );
            print_session_summary(&controller.view().snapshot);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Session init failed: {}", e);
            Err(anyhow!("Failed to initialize session: {}", e))
        }
    }
}

pub async fn send_message(config: Config, message: String) -> Result<()> {
    let controller = build_controller(&config)?;
    require_ready(&controller).await?;

    let before = controller.view().transcript;
    let reply = controller.send_message(&message).await?;
    let after = controller.view().transcript;

    print_entries(new_entries(&before, &after));
    print_final_answer(&reply.response, &after);
    println!("{}", format!("({} is now active)", reply.agent_name).dark_grey());
    Ok(())
}

pub async fn upload_files(config: Config, paths: Vec<PathBuf>) -> Result<()> {
    let controller = build_controller(&config)?;
    require_ready(&controller).await?;

    let files = read_files(&paths).await?;
    let receipt = controller.upload_files(files).await?;
    for line in &receipt.uploaded {
        println!("✅ {}", line);
    }
    Ok(())
}

pub async fn show_config(config: Config, write: bool) -> Result<()> {
    match Config::path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config directory on this platform"),
    }
    print!("{}", toml::to_string_pretty(&config)?);

    if write {
        let path = config.save()?;
        println!("Config written to {}", path.display());
    }
    Ok(())
}

pub async fn run_chat(config: Config, args: SessionArgs) -> Result<()> {
    let controller = Arc::new(build_controller(&config)?);

    if controller.check_state().await? != Phase::Ready {
        let session = controller.update_config(|session| args.apply(session)).await?;
        println!(
            "No active session. Setting one up in container '{}' with {}...",
            session.container_name, session.model
        );
        if let Err(e) = controller.initialize().await {
            tracing::error!("Session init failed: {}", e);
            return Err(anyhow!("Failed to initialize session: {}", e));
        }
    }

    let view = controller.view();
    print_session_summary(&view.snapshot);
    println!("{}", "Type /help for commands. Mention an agent with @name.".dark_grey());
    println!();
    print_entries(&view.transcript);

    let mut lines = spawn_line_reader(std::io::stdin());
    loop {
        print!("{} ", ">".bold());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                controller.detach();
                break;
            }
            line = lines.recv() => line.transpose()?,
        };
        let Some(line) = line else {
            break;
        };

        let input = parse_chat_input(&line);
        if input == ChatInput::Quit {
            break;
        }

        // Run the action on its own task so an interrupt leaves the request
        // to finish; the detached controller discards whatever comes back.
        let task = tokio::spawn({
            let controller = controller.clone();
            async move { handle_chat_input(&controller, input).await }
        });

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                controller.detach();
                eprintln!("\nInterrupted. The backend will still finish the current request.");
                break;
            }
            result = task => {
                if let Err(e) = result? {
                    tracing::error!("{}", e);
                    eprintln!("{} {}", "error:".red().bold(), e);
                    if e.downcast_ref::<ClientError>().is_some_and(ClientError::is_retryable) {
                        eprintln!("{}", "(you can try that again)".dark_grey());
                    }
                }
            }
        }
    }

    controller.detach();
    println!("Bye");
    Ok(())
}

/// Read lines on a plain thread. A blocked read there never holds up
/// runtime shutdown, so Ctrl-C at the prompt exits right away.
fn spawn_line_reader<R>(input: R) -> mpsc::UnboundedReceiver<std::io::Result<String>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in BufReader::new(input).lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn handle_chat_input(controller: &Controller, input: ChatInput) -> Result<()> {
    match input {
        ChatInput::Empty | ChatInput::Quit => Ok(()),
        ChatInput::Help => {
            println!("/upload <paths...>  upload files into the session workplace");
            println!("/refresh            reload the conversation from the backend");
            println!("/agents             list agents");
            println!("/quit               leave (the backend session keeps running)");
            println!("//text              send a message starting with '/'");
            Ok(())
        }
        ChatInput::Unknown(command) => bail!("Unknown command '/{}'. Try /help", command),
        ChatInput::Agents => {
            let snapshot = controller.view().snapshot;
            for agent in &snapshot.available_agents {
                let marker = if snapshot.current_agent.as_deref() == Some(agent.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}", marker, agent);
            }
            Ok(())
        }
        ChatInput::Refresh => {
            let phase = controller.refresh().await?;
            let view = controller.view();
            if phase == Phase::Uninitialized {
                bail!("Backend session is gone. Restart the chat to set it up again.");
            }
            print_entries(&view.transcript);
            Ok(())
        }
        ChatInput::Upload(paths) => {
            let files = read_files(&paths).await?;
            controller.upload_files(files).await?;
            if let Some(notice) = controller.view().notice {
                println!("{}", notice.green());
            }
            Ok(())
        }
        ChatInput::Message(text) => {
            let before = controller.view();
            if let Some(agent) = mentioned_agent(&text, &before.snapshot.available_agents) {
                println!("{}", format!("-> routing to {}", agent).dark_grey());
            }

            let reply = controller.send_message(&text).await?;
            let after = controller.view().transcript;
            print_entries(new_entries(&before.transcript, &after));
            print_final_answer(&reply.response, &after);
            Ok(())
        }
    }
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<FileUpload>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = FileUpload::from_path(path)
            .await
            .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
        files.push(file);
    }
    Ok(files)
}

/// The backend extracts a final answer from the last turn; show it when it
/// differs from what was just printed.
fn print_final_answer(response: &str, transcript: &[TranscriptEntry]) {
    let last = transcript.last().map(|entry| entry.message.content.trim());
    let response = response.trim();
    if !response.is_empty() && last != Some(response) {
        println!("{} {}", "Answer:".green().bold(), response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    /// Input that never produces a byte, like a terminal nobody types into
    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            loop {
                std::thread::park();
            }
        }
    }

    #[tokio::test]
    async fn test_line_reader_forwards_lines_then_closes() {
        let mut lines = spawn_line_reader(Cursor::new("hello @coder\n/quit\n"));

        assert_eq!(lines.recv().await.unwrap().unwrap(), "hello @coder");
        assert_eq!(lines.recv().await.unwrap().unwrap(), "/quit");
        assert!(lines.recv().await.is_none());
    }

    #[test]
    fn test_idle_input_does_not_block_shutdown() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let mut lines = spawn_line_reader(Silent);
            tokio::select! {
                _ = lines.recv() => panic!("silent input produced a line"),
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        });

        // Dropping the runtime waits on its blocking pool; a read parked
        // there would keep this from ever finishing
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            drop(runtime);
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }
}
