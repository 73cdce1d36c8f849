mod actions;
mod audio;
mod command;
mod config;
mod hotkey;
mod platform;
mod speech;
mod state;
mod stats;
mod tracking;
mod transcriber;
mod tts;
mod typing;
mod ui;
mod vad;

use command::{CommandExecutor, CommandResult};
use config::Config;
use platform::Platform;
use speech::Recognition;
use state::{RuntimeState, SharedState};
use tts::SharedNarrator;
use typing::InputMethod;

use clap::{Parser, Subcommand};
use flume::Receiver;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

const GREETING: &str =
    "Personal Assistant started. Say 'stop' to exit or 'start hand tracking' for mouse control.";
const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that.";
const SERVICE_UNAVAILABLE: &str = "Sorry, there was an issue with the speech recognition service.";
const ESCAPE_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "handsfree", about = "Voice desktop assistant with hand-tracking mouse control")]
struct Cli {
    /// Config file; defaults are used when it is missing
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one hand-tracking session and exit
    Track,
    /// Dispatch a single command, e.g. `run create file notes.txt`
    Run {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

/// One unit of user input for the assistant loop
enum Input {
    Voice(Recognition),
    Typed(String),
}

#[hotpath::main]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config);
    let state = RuntimeState::new();

    if let Err(e) = hotkey::start_escape_watcher(state.clone()) {
        log::warn!("[HOTKEY] Emergency key unavailable: {}", e);
    }

    let narrator = tts::build_narrator(&config.tts, state.clone()).await;
    let executor = Arc::new(CommandExecutor::new(
        narrator.clone(),
        Platform::current(),
        std::env::current_dir()?,
        InputMethod::parse(&config.typing.input_method),
    ));

    match cli.command {
        Some(Command::Track) => {
            let voice = start_listener(&config, &state);
            hand_tracking(&config, &state, &narrator, &voice).await;
        }
        Some(Command::Run { text }) => {
            let text = text.join(" ");
            if dispatch(&executor, text).await == CommandResult::StartHandTracking {
                let voice = start_listener(&config, &state);
                hand_tracking(&config, &state, &narrator, &voice).await;
            }
        }
        None => assistant_loop(&config, state, narrator, executor).await?,
    }
    Ok(())
}

/// The interactive loop: voice or typed commands until stopped
async fn assistant_loop(
    config: &Config,
    state: SharedState,
    narrator: SharedNarrator,
    executor: Arc<CommandExecutor>,
) -> anyhow::Result<()> {
    log::info!("[MAIN] {} ready", config.name);

    let (interrupt_tx, interrupt_rx) = flume::bounded::<()>(1);
    let interrupt_state = state.clone();
    ctrlc::set_handler(move || {
        // End a running session through the escape path first
        if interrupt_state.tracking_active.load(Ordering::SeqCst) {
            interrupt_state.set_escape(true);
            interrupt_state.set_escape(false);
        }
        let _ = interrupt_tx.try_send(());
    })?;

    let mut voice = start_listener(config, &state);
    let mut typed = Some(spawn_stdin_reader());
    let mut escape_check = tokio::time::interval(ESCAPE_POLL);

    say(&narrator, GREETING).await;
    let mut prompt = true;

    loop {
        if voice.is_none() && typed.is_none() {
            log::warn!("[MAIN] No voice or keyboard input left");
            break;
        }
        if prompt {
            ui::listening();
            prompt = false;
        }

        let input = tokio::select! {
            _ = interrupt_rx.recv_async() => {
                ui::clear_line();
                say(&narrator, "Assistant stopped").await;
                break;
            }
            _ = escape_check.tick() => {
                if state.take_escape() {
                    ui::clear_line();
                    say(&narrator, "Emergency stop activated").await;
                    break;
                }
                continue;
            }
            recognition = next_message(&voice) => match recognition {
                Some(r) => Input::Voice(r),
                None => {
                    log::warn!("[VOICE] Listener stopped, typed commands only");
                    voice = None;
                    continue;
                }
            },
            line = next_message(&typed) => match line {
                Some(line) => Input::Typed(line),
                None => {
                    log::debug!("[MAIN] stdin closed");
                    typed = None;
                    continue;
                }
            },
        };

        prompt = true;
        let text = match input {
            Input::Voice(Recognition::Recognized(text)) => text,
            Input::Voice(Recognition::Ambiguous) => {
                ui::clear_line();
                say(&narrator, NOT_UNDERSTOOD).await;
                continue;
            }
            Input::Voice(Recognition::ServiceUnavailable) => {
                ui::clear_line();
                say(&narrator, SERVICE_UNAVAILABLE).await;
                continue;
            }
            Input::Typed(line) if line.trim().is_empty() => continue,
            Input::Typed(line) => line,
        };
        ui::heard(&text);

        match dispatch(&executor, text).await {
            CommandResult::Continue => {}
            CommandResult::Exit => break,
            CommandResult::StartHandTracking => {
                hand_tracking(config, &state, &narrator, &voice).await;
                // Drop whatever arrived while the session owned the microphone
                if let Some(rx) = &voice {
                    let stale = rx.drain().count();
                    if stale > 0 {
                        log::debug!("[VOICE] Dropped {} results heard during the session", stale);
                    }
                }
            }
        }
    }

    ui::clear_line();
    Ok(())
}

fn start_listener(config: &Config, state: &SharedState) -> Option<Receiver<Recognition>> {
    match speech::spawn_listener(&config.speech, state.clone()) {
        Ok(rx) => Some(rx),
        Err(e) => {
            log::warn!("[VOICE] {}", e);
            None
        }
    }
}

/// Typed commands, one per line
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = flume::unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Next message from an optional channel; `None` once it disconnects, pending forever without one
async fn next_message<T>(rx: &Option<Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv_async().await.ok(),
        None => std::future::pending().await,
    }
}

async fn say(narrator: &SharedNarrator, text: &str) {
    let narrator = narrator.clone();
    let text = text.to_string();
    if let Err(e) = tokio::task::spawn_blocking(move || narrator.say(&text)).await {
        log::error!("[TTS] Narration task failed: {}", e);
    }
}

async fn dispatch(executor: &Arc<CommandExecutor>, text: String) -> CommandResult {
    let executor = executor.clone();
    match tokio::task::spawn_blocking(move || executor.handle(&text)).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("[COMMAND] Command task failed: {}", e);
            CommandResult::Continue
        }
    }
}

async fn hand_tracking(
    config: &Config,
    state: &SharedState,
    narrator: &SharedNarrator,
    voice: &Option<Receiver<Recognition>>,
) {
    let tracking = config.tracking.clone();
    let state = state.clone();
    let narrator = narrator.clone();
    let voice = voice.clone();

    let result = tokio::task::spawn_blocking(move || {
        tracking::run_hand_tracking(&tracking, state, narrator.as_ref(), voice)
    })
    .await;

    match result {
        Ok(Ok(report)) => log::info!(
            "[TRACKING] Session over ({:?}), cursor at ({:.0}, {:.0})",
            report.reason,
            report.final_cursor.0,
            report.final_cursor.1
        ),
        Ok(Err(e)) => log::warn!("[TRACKING] Session did not start: {}", e),
        Err(e) => log::error!("[TRACKING] Session thread failed: {}", e),
    }
}
