//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// GradeLevel
// ---------------------------------------------------------------------------

/// Target reader level for analysis prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GradeLevel {
    Primary,
    #[default]
    Middle,
}

impl GradeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::Primary => "primary",
            GradeLevel::Middle => "middle",
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Connection settings for the generation, speech and image capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// When `false` every capability call short-circuits to its fallback.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible endpoint (no trailing `/v1`).
    pub base_url: String,
    /// API key: `None` for local providers.
    pub api_key: Option<String>,
    /// Text-generation model.
    pub model: String,
    /// Speech-synthesis model.
    pub tts_model: String,
    /// Voice name passed to the speech endpoint.
    pub tts_voice: String,
    /// Image-generation model used for cover art.
    pub image_model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Upper bound on any single capability call.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            tts_model: "gpt-4o-mini-tts".into(),
            tts_voice: "alloy".into(),
            image_model: "gpt-image-1".into(),
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Format of the raw PCM payloads returned by speech synthesis.
///
/// WAV payloads carry their own header and ignore these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate of raw 16-bit PCM payloads in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count of raw PCM payloads.
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// ReaderConfig
// ---------------------------------------------------------------------------

/// Close-reading behaviour and popover geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Resuming a paused paragraph always starts from the beginning.
    pub auto_restart: bool,
    /// Characters of article context sent with a selection analysis.
    pub analysis_context_chars: usize,
    pub grade_level: GradeLevel,
    pub popover_width: f32,
    /// Space the popover needs below the selection before it flips above.
    pub popover_height: f32,
    /// Distance above the selection used when the popover flips.
    pub popover_flip_offset: f32,
    /// Minimum gap kept between the popover and the viewport edge.
    pub viewport_margin: f32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            auto_restart: false,
            analysis_context_chars: 1000,
            grade_level: GradeLevel::default(),
            popover_width: 480.0,
            popover_height: 300.0,
            popover_flip_offset: 400.0,
            viewport_margin: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationLimits
// ---------------------------------------------------------------------------

/// How much source text each prompt embeds, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationLimits {
    pub vocab_source_chars: usize,
    pub outline_source_chars: usize,
    pub workshop_source_chars: usize,
    pub coach_context_chars: usize,
    pub cover_hint_chars: usize,
    /// Texts this short are spoken by the local speech path instead of the
    /// synthesis capability.
    pub direct_tts_max_chars: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            vocab_source_chars: 1500,
            outline_source_chars: 2000,
            workshop_source_chars: 2000,
            coach_context_chars: 500,
            cover_hint_chars: 300,
            direct_tts_max_chars: 12,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use smartread::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub audio: AudioConfig,
    pub reader: ReaderConfig,
    pub limits: GenerationLimits,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill `llm.api_key` from the environment when the file left it unset.
    pub fn with_env_api_key(mut self, var: &str) -> Self {
        if self.llm.api_key.as_deref().map_or(true, str::is_empty) {
            if let Ok(key) = std::env::var(var) {
                self.llm.api_key = Some(key);
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
