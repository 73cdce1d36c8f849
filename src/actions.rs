//! Desktop actions behind the voice commands
//!
//! Each action returns the sentence to narrate on success. File paths are
//! resolved against a working directory so the actions can be exercised
//! without touching the process cwd.

use chrono::Local;
use starship_battery::units::ratio::percent;
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::System;
use thiserror::Error;
use xcap::Monitor;

pub const FILE_CONTENTS: &str = "Created by Personal Assistant";
pub const DEFAULT_FILE_NAME: &str = "newfile.txt";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Screenshot(String),
}

impl ActionError {
    fn file(path: &Path, source: std::io::Error) -> Self {
        ActionError::File {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub fn create_file(dir: &Path, name: &str) -> Result<String, ActionError> {
    let path = dir.join(name);
    fs::write(&path, FILE_CONTENTS).map_err(|e| ActionError::file(&path, e))?;
    Ok(format!("File {} created", name))
}

pub fn delete_file(dir: &Path, name: &str) -> Result<String, ActionError> {
    let path = dir.join(name);
    fs::remove_file(&path).map_err(|e| ActionError::file(&path, e))?;
    Ok(format!("File {} deleted", name))
}

/// Entry names in `dir`, sorted
pub fn list_files(dir: &Path) -> Result<Vec<String>, ActionError> {
    let mut names = fs::read_dir(dir)
        .map_err(|e| ActionError::file(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    Ok(names)
}

pub fn describe_files(names: &[String]) -> String {
    format!("Files in current directory: {}", names.join(", "))
}

pub fn screenshot_name(now: chrono::DateTime<Local>) -> String {
    format!("screenshot_{}.png", now.format("%Y%m%d_%H%M%S"))
}

/// Capture the primary monitor into a timestamped PNG
pub fn take_screenshot(dir: &Path) -> Result<String, ActionError> {
    let monitors =
        Monitor::all().map_err(|e| ActionError::Screenshot(format!("Failed to get monitors: {}", e)))?;
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| monitors.first())
        .ok_or_else(|| ActionError::Screenshot("No monitors found".into()))?;

    let image = monitor
        .capture_image()
        .map_err(|e| ActionError::Screenshot(format!("Failed to capture screen: {}", e)))?;

    let name = screenshot_name(Local::now());
    let path = dir.join(&name);
    image
        .save(&path)
        .map_err(|e| ActionError::Screenshot(format!("Failed to save {}: {}", path.display(), e)))?;
    log::info!("[ACTIONS] Screenshot {}x{} -> {}", image.width(), image.height(), path.display());
    Ok(format!("Screenshot saved as {}", name))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub battery_percent: Option<u8>,
}

impl SystemStats {
    /// Sample CPU over the minimum update interval, plus memory and battery
    pub fn sample() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu();
        sys.refresh_memory();

        let total = sys.total_memory();
        let memory_percent = if total == 0 {
            0.0
        } else {
            (sys.used_memory() as f64 / total as f64 * 100.0) as f32
        };

        Self {
            cpu_percent: sys.global_cpu_info().cpu_usage(),
            memory_percent,
            battery_percent: battery_percent(),
        }
    }

    pub fn describe(&self) -> String {
        let battery = match self.battery_percent {
            Some(p) => format!("Battery: {}% remaining", p),
            None => "No battery info".to_string(),
        };
        format!(
            "CPU usage: {:.1}%. Memory usage: {:.1}%. {}",
            self.cpu_percent, self.memory_percent, battery
        )
    }
}

/// State of charge of the first battery the OS reports
fn battery_percent() -> Option<u8> {
    let manager = match starship_battery::Manager::new() {
        Ok(manager) => manager,
        Err(e) => {
            log::debug!("[ACTIONS] Battery info unavailable: {}", e);
            return None;
        }
    };
    let mut batteries = manager.batteries().ok()?;
    let battery = batteries.find_map(|battery| battery.ok())?;
    Some(whole_percent(battery.state_of_charge().get::<percent>()))
}

fn whole_percent(value: f32) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
