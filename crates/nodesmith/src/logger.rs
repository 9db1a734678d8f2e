//! Per-turn transcript logging.
//!
//! Every user-visible line of a turn is appended here with a timestamp and
//! flushed to disk exactly once, at the end of the turn, under a name derived
//! from the material the turn produced.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use regex::Regex;

/// Replace every non-alphanumeric character with an underscore, one-for-one.
pub fn sanitize_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9]").unwrap();
    re.replace_all(name, "_").to_string()
}

pub struct TurnLog {
    entries: Vec<String>,
    artifact_name: Option<String>,
    echo: bool,
}

impl Default for TurnLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            artifact_name: None,
            echo: false,
        }
    }

    /// Also print each recorded line to stdout (interactive sessions)
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Append one line to the transcript.
    pub fn record(&mut self, message: &str) {
        if self.echo {
            println!("{}", message);
        }
        let timestamp = Local::now().format("%H:%M:%S");
        self.entries.push(format!("[{}] {}", timestamp, message));
    }

    /// Record the artifact this turn produced. The first name observed keys
    /// the log file; later names in the same turn do not rename it.
    pub fn set_artifact_name(&mut self, name: &str) {
        if self.artifact_name.is_none() {
            self.artifact_name = Some(name.to_string());
        }
    }

    pub fn artifact_name(&self) -> Option<&str> {
        self.artifact_name.as_deref()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Persist the transcript under `output_dir`, returning the path written.
    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        let filename = match &self.artifact_name {
            Some(name) => format!("{}_Log.md", sanitize_name(name)),
            None => format!(
                "Generation_Log_{}.md",
                Local::now().format("%Y%m%d_%H%M%S")
            ),
        };

        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(filename);

        let mut body = String::from("# Generation Log\n\n");
        body.push_str(&self.entries.join("\n"));
        fs::write(&path, body)?;

        Ok(path)
    }
}
