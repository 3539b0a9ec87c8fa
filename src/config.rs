use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    /// Telegram user ids allowed to use the bot. Empty disables the gate.
    pub allowed_user_ids: Vec<i64>,
    /// Origin prefixed onto scheme-less image references and used to
    /// recognize gallery page links in plain text messages.
    pub gallery_origin: String,
    pub http_timeout_seconds: u64,
    pub http_user_agent: String,
    /// Root under which per-chat download directories are created.
    pub download_root: PathBuf,
    pub pdf_file_name: String,
    /// Lines per outbound message when sending expanded episode links.
    pub split_batch_size: usize,
    /// Edit the progress message every N downloaded items.
    pub progress_update_every: usize,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_csv_i64(name: &str) -> Vec<i64> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .filter_map(|value| value.trim().parse::<i64>().ok())
        .collect()
}

fn normalize_origin(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let download_root = env::var("DOWNLOAD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir());

        Ok(Config {
            bot_token: env_string("BOT_TOKEN", ""),
            log_level: env_string("LOG_LEVEL", "info"),
            allowed_user_ids: env_csv_i64("ALLOWED_USER_IDS"),
            gallery_origin: normalize_origin(env_string(
                "GALLERY_ORIGIN",
                "https://multporn.net",
            )),
            http_timeout_seconds: env_u64("HTTP_TIMEOUT_SECONDS", 30),
            http_user_agent: env_string("HTTP_USER_AGENT", DEFAULT_USER_AGENT),
            download_root,
            pdf_file_name: env_string("PDF_FILE_NAME", "output.pdf"),
            split_batch_size: env_usize("SPLIT_BATCH_SIZE", 30).max(1),
            progress_update_every: env_usize("PROGRESS_UPDATE_EVERY", 5).max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_stripped_of_trailing_slashes() {
        assert_eq!(
            normalize_origin("https://example.com/".to_string()),
            "https://example.com"
        );
        assert_eq!(
            normalize_origin(" https://example.com ".to_string()),
            "https://example.com"
        );
    }
}
