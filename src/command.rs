//! Command dispatch - maps a spoken or typed phrase onto a desktop action
//!
//! Matching is by lowercase substring, checked in a fixed order; the first
//! keyword found wins. "stop" is checked before everything else, so any phrase
//! containing it ends the assistant.

use crate::actions::{self, SystemStats};
use crate::platform::Platform;
use crate::tts::SharedNarrator;
use crate::typing::{InputMethod, TypingInput};
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantCommand {
    Exit,
    Open(String),
    CreateFile(String),
    DeleteFile(Option<String>),
    ListFiles,
    Screenshot,
    SystemStats,
    Type(Option<String>),
    Shutdown,
    StartHandTracking,
    Unknown,
}

/// What the assistant loop should do after a command ran
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandResult {
    Continue,
    Exit,
    StartHandTracking,
}

impl AssistantCommand {
    pub fn parse(input: &str) -> Self {
        let text = input.trim().to_lowercase();
        let text = text.trim_end_matches(|c: char| c.is_ascii_punctuation());

        // Everything left after removing the keyword, or None if that is empty
        let argument = |keyword: &str| {
            let rest = text.replace(keyword, "");
            let rest = rest.trim();
            (!rest.is_empty()).then(|| rest.to_string())
        };

        if text.contains("stop") || text.contains("exit") {
            AssistantCommand::Exit
        } else if text.contains("open") {
            AssistantCommand::Open(argument("open").unwrap_or_default())
        } else if text.contains("create file") {
            AssistantCommand::CreateFile(
                argument("create file").unwrap_or_else(|| actions::DEFAULT_FILE_NAME.to_string()),
            )
        } else if text.contains("delete file") {
            AssistantCommand::DeleteFile(argument("delete file"))
        } else if text.contains("list files") {
            AssistantCommand::ListFiles
        } else if text.contains("screenshot") {
            AssistantCommand::Screenshot
        } else if text.contains("system stats") {
            AssistantCommand::SystemStats
        } else if text.contains("type") {
            AssistantCommand::Type(argument("type"))
        } else if text.contains("shutdown") {
            AssistantCommand::Shutdown
        } else if text.contains("start hand tracking") {
            AssistantCommand::StartHandTracking
        } else {
            AssistantCommand::Unknown
        }
    }
}

/// Runs parsed commands and narrates their outcome
pub struct CommandExecutor {
    narrator: SharedNarrator,
    platform: Platform,
    workdir: PathBuf,
    input_method: InputMethod,
    shutdown_delay: Duration,
}

impl CommandExecutor {
    pub fn new(narrator: SharedNarrator, platform: Platform, workdir: PathBuf, input_method: InputMethod) -> Self {
        Self {
            narrator,
            platform,
            workdir,
            input_method,
            shutdown_delay: Duration::from_secs(10),
        }
    }

    pub fn handle(&self, text: &str) -> CommandResult {
        let command = AssistantCommand::parse(text);
        log::debug!("[COMMAND] {:?} <- {:?}", command, text);
        self.execute(command)
    }

    pub fn execute(&self, command: AssistantCommand) -> CommandResult {
        let say = |text: &str| self.narrator.say(text);

        match command {
            AssistantCommand::Exit => {
                say("Goodbye");
                return CommandResult::Exit;
            }
            AssistantCommand::Open(app) => match self.platform.launch(&app) {
                Ok(()) => say(&format!("Opening {}", app)),
                Err(e) => say(&format!("Failed to open {}. Error: {}", app, e)),
            },
            AssistantCommand::CreateFile(name) => match actions::create_file(&self.workdir, &name) {
                Ok(msg) => say(&msg),
                Err(e) => say(&format!("Failed to create file. Error: {}", e)),
            },
            AssistantCommand::DeleteFile(None) => say("Please specify a file to delete"),
            AssistantCommand::DeleteFile(Some(name)) => {
                match actions::delete_file(&self.workdir, &name) {
                    Ok(msg) => say(&msg),
                    Err(e) => say(&format!("Failed to delete file. Error: {}", e)),
                }
            }
            AssistantCommand::ListFiles => match actions::list_files(&self.workdir) {
                Ok(names) => say(&actions::describe_files(&names)),
                Err(e) => say(&format!("Failed to list files. Error: {}", e)),
            },
            AssistantCommand::Screenshot => match actions::take_screenshot(&self.workdir) {
                Ok(msg) => say(&msg),
                Err(e) => say(&format!("Failed to take screenshot. Error: {}", e)),
            },
            AssistantCommand::SystemStats => say(&SystemStats::sample().describe()),
            AssistantCommand::Type(None) => say("Please specify text to type"),
            AssistantCommand::Type(Some(text)) => {
                let typed = TypingInput::new(self.input_method).and_then(|mut input| input.type_text(&text));
                match typed {
                    Ok(()) => say("Text typed"),
                    Err(e) => say(&format!("Failed to type text. Error: {}", e)),
                }
            }
            AssistantCommand::Shutdown => {
                say("Shutting down in 10 seconds");
                thread::sleep(self.shutdown_delay);
                if let Some(failure) = shutdown_failure(self.platform.shutdown()) {
                    say(&failure);
                }
            }
            AssistantCommand::StartHandTracking => return CommandResult::StartHandTracking,
            AssistantCommand::Unknown => say("Command not recognized"),
        }

        CommandResult::Continue
    }
}

/// Narration for a shutdown that did not go through, e.g. sudo refusing without a TTY
fn shutdown_failure(result: io::Result<ExitStatus>) -> Option<String> {
    match result {
        Ok(status) if status.success() => None,
        Ok(status) => Some(format!("Failed to shut down. Error: {}", status)),
        Err(e) => Some(format!("Failed to shut down. Error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::tests::RecordingNarrator;
    use std::fs;
    use std::sync::Arc;

    fn executor(dir: &PathBuf) -> (CommandExecutor, Arc<RecordingNarrator>) {
        let narrator = Arc::new(RecordingNarrator::default());
        let executor = CommandExecutor::new(
            narrator.clone(),
            Platform::current(),
            dir.clone(),
            InputMethod::Direct,
        );
        (executor, narrator)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("handsfree-cmd-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(AssistantCommand::parse("Exit please"), AssistantCommand::Exit);
        assert_eq!(
            AssistantCommand::parse("Open Firefox."),
            AssistantCommand::Open("firefox".into())
        );
        assert_eq!(
            AssistantCommand::parse("create file notes.txt"),
            AssistantCommand::CreateFile("notes.txt".into())
        );
        assert_eq!(
            AssistantCommand::parse("create file"),
            AssistantCommand::CreateFile("newfile.txt".into())
        );
        assert_eq!(AssistantCommand::parse("delete file"), AssistantCommand::DeleteFile(None));
        assert_eq!(AssistantCommand::parse("list files"), AssistantCommand::ListFiles);
        assert_eq!(AssistantCommand::parse("take a screenshot"), AssistantCommand::Screenshot);
        assert_eq!(AssistantCommand::parse("system stats"), AssistantCommand::SystemStats);
        assert_eq!(
            AssistantCommand::parse("type hello world"),
            AssistantCommand::Type(Some("hello world".into()))
        );
        assert_eq!(AssistantCommand::parse("shutdown"), AssistantCommand::Shutdown);
        assert_eq!(
            AssistantCommand::parse("Start hand tracking."),
            AssistantCommand::StartHandTracking
        );
        assert_eq!(AssistantCommand::parse("what time is it"), AssistantCommand::Unknown);
    }

    #[test]
    fn test_parse_order_first_match_wins() {
        // "stop" outranks everything, including the hand-tracking phrase
        assert_eq!(AssistantCommand::parse("stop hand tracking"), AssistantCommand::Exit);
        // "open" is checked before "create file"
        assert!(matches!(
            AssistantCommand::parse("create file and open it"),
            AssistantCommand::Open(_)
        ));
        // "type" sits before "start hand tracking"
        assert!(matches!(
            AssistantCommand::parse("type start hand tracking"),
            AssistantCommand::Type(_)
        ));
    }

    #[test]
    fn test_execute_file_commands() {
        let dir = scratch_dir("files");
        let (executor, narrator) = executor(&dir);

        assert_eq!(executor.handle("create file todo.txt"), CommandResult::Continue);
        assert!(dir.join("todo.txt").exists());
        executor.handle("list files");
        executor.handle("delete file todo.txt");
        executor.handle("delete file todo.txt");
        executor.handle("delete file");

        let lines = narrator.lines();
        assert_eq!(lines[0], "File todo.txt created");
        assert_eq!(lines[1], "Files in current directory: todo.txt");
        assert_eq!(lines[2], "File todo.txt deleted");
        assert!(lines[3].starts_with("Failed to delete file. Error: "));
        assert_eq!(lines[4], "Please specify a file to delete");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_execute_control_results() {
        let dir = scratch_dir("control");
        let (executor, narrator) = executor(&dir);

        assert_eq!(executor.handle("start hand tracking"), CommandResult::StartHandTracking);
        assert_eq!(executor.handle("type"), CommandResult::Continue);
        assert_eq!(executor.handle("sing a song"), CommandResult::Continue);
        assert_eq!(executor.handle("exit"), CommandResult::Exit);

        assert_eq!(
            narrator.lines(),
            vec!["Please specify text to type", "Command not recognized", "Goodbye"]
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_shutdown_failure_reports_exit_status() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(shutdown_failure(Ok(ExitStatus::from_raw(0))), None);
        // wait status 256 is exit code 1
        let failure = shutdown_failure(Ok(ExitStatus::from_raw(256))).unwrap();
        assert_eq!(failure, "Failed to shut down. Error: exit status: 1");

        let failure = shutdown_failure(Err(io::Error::new(io::ErrorKind::NotFound, "no sudo"))).unwrap();
        assert_eq!(failure, "Failed to shut down. Error: no sudo");
    }
}
