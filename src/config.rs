use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{PipelineError, Result};

/// Maximum number of ids the detail endpoint accepts per request
pub const MAX_DETAIL_BATCH: usize = 50;

/// Configuration for the YouTube stat pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawler and YouTube API settings
    pub crawler: CrawlerConfig,

    /// Morphological parser settings
    pub parser: ParserConfig,

    /// Dataset and feature settings
    pub data: DataConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Channel to crawl
    pub channel_id: Option<String>,

    /// YouTube Data API key
    pub api_key: Option<String>,

    /// Search (list) endpoint
    pub search_url: String,

    /// Videos (detail) endpoint
    pub videos_url: String,

    /// Items requested per list page
    pub page_size: usize,

    /// Ids per detail request
    pub detail_batch_size: usize,

    /// Attempts per request before giving up on transient failures
    pub max_retries: u32,

    /// Backoff unit in seconds; attempt `n` waits `n * unit`
    pub backoff_unit_secs: u64,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Yahoo! developer client id
    pub client_id: Option<String>,

    /// Morphological analysis endpoint
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Titles matching any of these patterns are skipped
    pub ignore_title_patterns: Vec<String>,

    /// Words matching any of these patterns never enter the vocabulary
    pub ignore_word_patterns: Vec<String>,

    /// Part-of-speech tags eligible for the vocabulary
    pub allowed_pos: Vec<String>,

    /// Minimum number of videos a word must appear in to get a column
    pub min_word_occur: usize,

    /// Inclusive cutoff date for the feature matrix
    pub before_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root under which `working/<channel_id>` is created
    pub base_dir: PathBuf,

    /// Log level used by the binary
    pub log_level: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            channel_id: None,
            api_key: None,
            search_url: "https://www.googleapis.com/youtube/v3/search".to_string(),
            videos_url: "https://www.googleapis.com/youtube/v3/videos".to_string(),
            page_size: 50,
            detail_batch_size: MAX_DETAIL_BATCH,
            max_retries: 5,
            backoff_unit_secs: 2,
            timeout_seconds: 30,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            endpoint: "https://jlp.yahooapis.jp/MAService/V1/parse".to_string(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ignore_title_patterns: Vec::new(),
            ignore_word_patterns: vec!["^[0-9]+$".to_string()],
            // noun, verb, adjectival verb, adjective, adverb
            allowed_pos: ["名詞", "動詞", "形容動詞", "形容詞", "副詞"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_word_occur: 5,
            before_date: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            log_level: "info".to_string(),
        }
    }
}

impl DataConfig {
    pub fn compiled_title_patterns(&self) -> Result<Vec<Regex>> {
        compile_patterns(&self.ignore_title_patterns)
    }

    pub fn compiled_word_patterns(&self) -> Result<Vec<Regex>> {
        compile_patterns(&self.ignore_word_patterns)
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(PipelineError::from))
        .collect()
}

impl Config {
    /// Load configuration from the first readable candidate file, then apply
    /// environment overrides. Falls back to defaults plus environment.
    pub fn load() -> Result<Self> {
        match Self::locate(Path::new(".")) {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// First existing candidate configuration file under `dir`
    pub fn locate(dir: &Path) -> Option<PathBuf> {
        let config_paths = ["youtube-stat.toml", "config/youtube-stat.toml"];

        config_paths
            .iter()
            .map(|path| dir.join(path))
            .find(|path| path.exists())
    }

    /// Load configuration from a specific TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&config_str)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        config.apply_env();
        Ok(config)
    }

    /// Override settings with environment variables
    pub fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("YOUTUBE_API_KEY") {
            self.crawler.api_key = Some(api_key);
        }

        if let Ok(client_id) = std::env::var("YAHOO_API_CLIENT_ID") {
            self.parser.client_id = Some(client_id);
        }

        if let Ok(channel_id) = std::env::var("YOUTUBE_STAT_CHANNEL_ID") {
            self.crawler.channel_id = Some(channel_id);
        }

        if let Ok(base_dir) = std::env::var("YOUTUBE_STAT_BASE_DIR") {
            self.output.base_dir = PathBuf::from(base_dir);
        }

        if let Ok(log_level) = std::env::var("YOUTUBE_STAT_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let config_str =
            toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.crawler.page_size == 0 || self.crawler.page_size > 50 {
            return Err(PipelineError::Config(
                "crawler.page_size must be between 1 and 50".to_string(),
            ));
        }

        if self.crawler.detail_batch_size == 0 || self.crawler.detail_batch_size > MAX_DETAIL_BATCH {
            return Err(PipelineError::Config(format!(
                "crawler.detail_batch_size must be between 1 and {}",
                MAX_DETAIL_BATCH
            )));
        }

        self.data.compiled_title_patterns()?;
        self.data.compiled_word_patterns()?;

        Ok(())
    }

    /// Channel id, or `MissingPrecondition` when unset
    pub fn require_channel_id(&self) -> Result<&str> {
        self.crawler
            .channel_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PipelineError::MissingPrecondition("channel_id is not specified".to_string()))
    }

    /// Directory holding every artifact for the configured channel
    pub fn working_dir(&self) -> Result<PathBuf> {
        let channel_id = self.require_channel_id()?;
        Ok(self.output.base_dir.join("working").join(channel_id))
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "YouTube Stat Configuration:\n\
            - Channel: {}\n\
            - Base Directory: {}\n\
            - Max Retries: {}\n\
            - Min Word Occurrence: {}\n\
            - Before Date: {}",
            self.crawler.channel_id.as_deref().unwrap_or("<unset>"),
            self.output.base_dir.display(),
            self.crawler.max_retries,
            self.data.min_word_occur,
            self.data
                .before_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "<none>".to_string()),
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.config.crawler.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.crawler.api_key = Some(api_key.into());
        self
    }

    pub fn with_parser_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.parser.client_id = Some(client_id.into());
        self
    }

    pub fn with_base_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.base_dir = dir;
        self
    }

    pub fn with_min_word_occur(mut self, min: usize) -> Self {
        self.config.data.min_word_occur = min;
        self
    }

    pub fn with_before_date(mut self, date: NaiveDate) -> Self {
        self.config.data.before_date = Some(date);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.config.crawler.max_retries = retries;
        self
    }

    pub fn with_backoff_unit_secs(mut self, secs: u64) -> Self {
        self.config.crawler.backoff_unit_secs = secs;
        self
    }

    pub fn with_ignore_title_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.data.ignore_title_patterns = patterns;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
