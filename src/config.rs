use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chatgpt::config::ChatGPTEngine;
use serde::Deserialize;

use crate::auth::Credential;
use crate::error::{AppError, Result};

/// Everything read from the YAML config file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub users: HashMap<String, Credential>,
    pub game: GameSettings,
    pub ai: AiSettings,
}

/// Reward and gate constants. Both deployment variants of the game differ only here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub roadmap_unlock_xp: u32,
    pub scramble_unlock_xp: u32,
    pub static_skill_step: f64,
    pub ai_skill_step: f64,
    pub scramble_skill_step: f64,
    /// Bounds for the XP an AI-generated question or word may award.
    pub min_reward_xp: u32,
    pub max_reward_xp: u32,
    pub catalog_path: PathBuf,
    pub personality_path: PathBuf,
}

impl GameSettings {
    pub fn reward_range(&self) -> RangeInclusive<u32> {
        self.min_reward_xp..=self.max_reward_xp
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            roadmap_unlock_xp: 50,
            scramble_unlock_xp: 0,
            static_skill_step: 0.1,
            ai_skill_step: 0.2,
            scramble_skill_step: 0.1,
            min_reward_xp: 10,
            max_reward_xp: 20,
            catalog_path: PathBuf::from("data/quiz_catalog.json"),
            personality_path: PathBuf::from("data/personality_quiz.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub engine: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            engine: "gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            timeout_secs: 30,
        }
    }
}

impl AiSettings {
    pub fn chatgpt_engine(&self) -> Result<ChatGPTEngine> {
        match self.engine.as_str() {
            "gpt-3.5-turbo" => Ok(ChatGPTEngine::Gpt35Turbo),
            "gpt-4" => Ok(ChatGPTEngine::Gpt4),
            "gpt-4-32k" => Ok(ChatGPTEngine::Gpt4_32k),
            other => Err(AppError::Config(format!("unsupported AI engine '{}'", other))),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let game = &self.game;
        for (name, step) in [
            ("static_skill_step", game.static_skill_step),
            ("ai_skill_step", game.ai_skill_step),
            ("scramble_skill_step", game.scramble_skill_step),
        ] {
            if !step.is_finite() || step < 0.0 {
                return Err(AppError::Config(format!(
                    "game.{} must be a non-negative number, got {}",
                    name, step
                )));
            }
        }
        if game.min_reward_xp > game.max_reward_xp {
            return Err(AppError::Config(format!(
                "game.min_reward_xp ({}) is above game.max_reward_xp ({})",
                game.min_reward_xp, game.max_reward_xp
            )));
        }
        if self.users.is_empty() {
            log::warn!("No users configured; nobody will be able to log in");
        }
        self.ai.chatgpt_engine()?;
        Ok(())
    }
}
