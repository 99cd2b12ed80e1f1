use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "voxedit.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Extra word -> replacement corrections, merged over the built-in table
    #[serde(default)]
    pub corrections: HashMap<String, String>,
    /// Language id -> interpreter used by the "compile" command
    #[serde(default = "default_compile")]
    pub compile: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            notifications: NotificationsConfig::default(),
            corrections: HashMap::new(),
            compile: default_compile(),
        }
    }
}

fn default_compile() -> HashMap<String, String> {
    HashMap::from([("python".to_string(), "python3".to_string())])
}

// ============================================================================
// Notifications Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NotificationsConfig {
    /// How long transient messages stay before reverting
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
        }
    }
}

impl NotificationsConfig {
    pub fn duration(&self) -> Option<Duration> {
        (self.duration_ms > 0).then(|| Duration::from_millis(self.duration_ms))
    }
}

fn default_duration_ms() -> u64 {
    1000
}

// ============================================================================
// LLM Config
// ============================================================================

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "backend")]
pub enum LlmConfig {
    #[serde(rename = "openai-compat")]
    OpenAiCompat {
        /// Base URL - can use preset or explicit URL
        #[serde(default)]
        base_url: String,
        /// Preset shortcuts: "lm_studio", "openai", "ollama"
        #[serde(default)]
        preset: Option<String>,
        #[serde(default = "default_model")]
        model: String,
        /// API key (supports ${ENV_VAR} syntax)
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_temperature")]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    #[serde(rename = "disabled")]
    Disabled,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::OpenAiCompat {
            base_url: String::new(),
            preset: None,
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

fn default_model() -> String {
    "local-model".into()
}

fn default_temperature() -> Option<f32> {
    Some(0.1)
}

/// Expand ${VAR} to environment variable values
fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();

    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!("Environment variable '{}' not found", var_name);
                String::new()
            });
            result.replace_range(start..start + end + 1, &value);
        } else {
            break;
        }
    }

    result
}

impl LlmConfig {
    /// Resolve preset to base_url if needed, and expand env vars in api_key
    pub fn resolve_presets(&mut self) {
        if let LlmConfig::OpenAiCompat {
            base_url,
            preset,
            api_key,
            ..
        } = self
        {
            if base_url.is_empty() {
                *base_url = match preset.as_deref() {
                    Some("openai") => "https://api.openai.com/v1".to_string(),
                    Some("ollama") => "http://localhost:11434/v1".to_string(),
                    Some("lm_studio") | None => "http://localhost:1234/v1".to_string(),
                    Some(other) => {
                        tracing::warn!("Unknown preset '{}', using LM Studio default", other);
                        "http://localhost:1234/v1".to_string()
                    }
                };
            }

            if let Some(key) = api_key {
                *key = expand_env_vars(key);
            }
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(s)?;
        config.llm.resolve_presets();
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when missing or invalid
    pub fn load(path: &Path) -> Self {
        let mut config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Invalid config {}: {}; using defaults", path.display(), e);
                        Config::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Cannot read {}: {}; using defaults", path.display(), e);
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        config.llm.resolve_presets();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.notifications.duration_ms, 1000);
        assert_eq!(config.compile.get("python").map(String::as_str), Some("python3"));
        match config.llm {
            LlmConfig::OpenAiCompat { base_url, .. } => {
                assert_eq!(base_url, "http://localhost:1234/v1")
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_preset_and_env_expansion() {
        // SAFETY: test-local variable name, no other test reads it
        unsafe { std::env::set_var("VOXEDIT_TEST_KEY", "sk-test") };
        let config = Config::from_toml_str(
            r#"
[llm]
backend = "openai-compat"
preset = "openai"
model = "gpt-4o-mini"
api_key = "${VOXEDIT_TEST_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(
            config.llm,
            LlmConfig::OpenAiCompat {
                base_url: "https://api.openai.com/v1".into(),
                preset: Some("openai".into()),
                model: "gpt-4o-mini".into(),
                api_key: Some("sk-test".into()),
                temperature: Some(0.1),
                max_tokens: None,
            }
        );
    }

    #[test]
    fn test_corrections_and_disabled_backend() {
        let config = Config::from_toml_str(
            r#"
[llm]
backend = "disabled"

[notifications]
duration_ms = 0

[corrections]
coffee = "copy"
um = ""
"#,
        )
        .unwrap();
        assert_eq!(config.llm, LlmConfig::Disabled);
        assert_eq!(config.notifications.duration(), None);
        assert_eq!(config.corrections.get("um").map(String::as_str), Some(""));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load(Path::new("/nonexistent/voxedit.toml"));
        assert_eq!(config.notifications.duration_ms, 1000);
    }
}
