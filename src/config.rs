//! TOML configuration.
//!
//! Every section is optional; a missing file means built-in defaults. Values
//! are validated once after parsing so the rest of the crate can trust them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// `"*"` allows any origin; anything else is used as the single allowed origin.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: default_cors_origin(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_cors_origin() -> String {
    "*".to_string()
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    950
}
fn default_overlap_chars() -> usize {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_max_top_k() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlannerConfig {
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_session_minutes")]
    pub default_session_minutes: u32,
    #[serde(default = "default_sessions_per_week")]
    pub default_sessions_per_week: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            calendar_name: default_calendar_name(),
            default_timezone: default_timezone(),
            default_session_minutes: default_session_minutes(),
            default_sessions_per_week: default_sessions_per_week(),
        }
    }
}

fn default_calendar_name() -> String {
    "Study Planner AI Agent".to_string()
}
fn default_timezone() -> String {
    "Asia/Kathmandu".to_string()
}
fn default_session_minutes() -> u32 {
    60
}
fn default_sessions_per_week() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Generated calendars longer than this (in characters) are rejected.
    #[serde(default = "default_max_calendar_chars")]
    pub max_calendar_chars: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_calendar_chars: default_max_calendar_chars(),
        }
    }
}

fn default_max_calendar_chars() -> usize {
    200_000
}

impl Config {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chars == 0 {
            anyhow::bail!("chunking.max_chars must be > 0");
        }
        if self.chunking.overlap_chars >= self.chunking.max_chars {
            anyhow::bail!("chunking.overlap_chars must be < chunking.max_chars");
        }

        if self.retrieval.max_top_k == 0 {
            anyhow::bail!("retrieval.max_top_k must be >= 1");
        }
        if !(1..=self.retrieval.max_top_k).contains(&self.retrieval.default_top_k) {
            anyhow::bail!(
                "retrieval.default_top_k must be in [1, {}]",
                self.retrieval.max_top_k
            );
        }

        if !(1..=7).contains(&self.planner.default_sessions_per_week) {
            anyhow::bail!("planner.default_sessions_per_week must be in [1, 7]");
        }
        if self.planner.default_session_minutes == 0 {
            anyhow::bail!("planner.default_session_minutes must be > 0");
        }
        if self.planner.calendar_name.trim().is_empty() {
            anyhow::bail!("planner.calendar_name must not be empty");
        }

        if self.output.max_calendar_chars == 0 {
            anyhow::bail!("output.max_calendar_chars must be > 0");
        }
        if self.server.max_body_bytes == 0 {
            anyhow::bail!("server.max_body_bytes must be > 0");
        }

        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}
