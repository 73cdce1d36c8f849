//! Host OS strategy for launching applications and powering off

use std::io;
use std::process::{Command, ExitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was built for; any other unix counts as Linux
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    pub fn launch_command(&self, app: &str) -> Command {
        match self {
            Platform::Windows => {
                // `start` is a cmd builtin; the empty string is the window title
                let mut cmd = Command::new("cmd");
                cmd.args(["/C", "start", "", app]);
                cmd
            }
            Platform::MacOs => {
                let mut cmd = Command::new("open");
                cmd.args(["-a", app]);
                cmd
            }
            Platform::Linux => {
                let mut cmd = Command::new("xdg-open");
                cmd.arg(app);
                cmd
            }
        }
    }

    pub fn shutdown_command(&self) -> Command {
        match self {
            Platform::Windows => {
                let mut cmd = Command::new("shutdown");
                cmd.args(["/s", "/t", "0"]);
                cmd
            }
            Platform::MacOs | Platform::Linux => {
                let mut cmd = Command::new("sudo");
                cmd.args(["shutdown", "-h", "now"]);
                cmd
            }
        }
    }

    /// Start an application without waiting for it to exit
    pub fn launch(&self, app: &str) -> io::Result<()> {
        let child = self.launch_command(app).spawn()?;
        log::debug!("[PLATFORM] Launched {} (pid {})", app, child.id());
        Ok(())
    }

    pub fn shutdown(&self) -> io::Result<ExitStatus> {
        self.shutdown_command().status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(cmd: &Command) -> Vec<String> {
        std::iter::once(cmd.get_program())
            .chain(cmd.get_args())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_launch_commands() {
        assert_eq!(
            argv(&Platform::Windows.launch_command("notepad")),
            ["cmd", "/C", "start", "", "notepad"]
        );
        assert_eq!(
            argv(&Platform::MacOs.launch_command("Safari")),
            ["open", "-a", "Safari"]
        );
        assert_eq!(
            argv(&Platform::Linux.launch_command("firefox")),
            ["xdg-open", "firefox"]
        );
    }

    #[test]
    fn test_shutdown_commands() {
        assert_eq!(
            argv(&Platform::Windows.shutdown_command()),
            ["shutdown", "/s", "/t", "0"]
        );
        assert_eq!(
            argv(&Platform::Linux.shutdown_command()),
            ["sudo", "shutdown", "-h", "now"]
        );
        assert_eq!(
            argv(&Platform::MacOs.shutdown_command()),
            argv(&Platform::Linux.shutdown_command())
        );
    }

    #[test]
    fn test_current() {
        #[cfg(target_os = "linux")]
        assert_eq!(Platform::current(), Platform::Linux);
        #[cfg(target_os = "macos")]
        assert_eq!(Platform::current(), Platform::MacOs);
    }
}
