use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::quiz::session::{DEFAULT_MAX_QUESTIONS, DEFAULT_SECONDS_PER_QUESTION, QuizSettings};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    #[serde(default = "default_seconds_per_question")]
    pub seconds_per_question: u32,
    #[serde(default = "default_theme")]
    pub theme: String,
    /// JSON catalog replacing the bundled questions.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

fn default_max_questions() -> usize {
    DEFAULT_MAX_QUESTIONS
}
fn default_seconds_per_question() -> u32 {
    DEFAULT_SECONDS_PER_QUESTION
}
fn default_theme() -> String {
    "terminal-default".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            seconds_per_question: default_seconds_per_question(),
            theme: default_theme(),
            catalog_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mcquiz")
            .join("config.toml")
    }

    /// A quiz needs at least one question and one second per question.
    pub fn normalize(&mut self) {
        self.max_questions = self.max_questions.max(1);
        self.seconds_per_question = self.seconds_per_question.max(1);
    }

    pub fn quiz_settings(&self) -> QuizSettings {
        QuizSettings {
            max_questions: self.max_questions,
            seconds_per_question: self.seconds_per_question,
        }
    }
}
