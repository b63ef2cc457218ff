use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::exercise::ExerciseKind;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// フレーム取得の上限レート。0 なら待たない
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// 起動時に選択する種目
    #[serde(default)]
    pub exercise: ExerciseKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayConfig {
    /// 姿勢記録 (JSON lines)
    #[serde(default = "default_replay_path")]
    pub path: PathBuf,
    /// 末尾まで来たら先頭に戻る
    #[serde(default)]
    pub repeat: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// EnvFilter 書式。RUST_LOG があればそちらを優先
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_true")]
    pub file: bool,
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

fn default_target_fps() -> u32 { 30 }
fn default_replay_path() -> PathBuf { PathBuf::from("poses.jsonl") }
fn default_log_filter() -> String { "info".to_string() }
fn default_true() -> bool { true }
fn default_log_dir() -> PathBuf { PathBuf::from("logs") }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            exercise: ExerciseKind::default(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: default_replay_path(),
            repeat: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: default_true(),
            dir: default_log_dir(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }
}
