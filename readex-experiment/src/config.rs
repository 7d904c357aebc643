use crate::error::ConfigError;
use readex_provider::{ChatSettings, Passages, ProviderError, StaticProvider};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_READING_INSTRUCTIONS: &str = "Thank you for participating in this study.\n\n\
In this task, you will read a series of short paragraphs while we record your brain activity.\n\n\
For each paragraph:\n\
  \u{2022} Read silently at a comfortable pace.\n\
  \u{2022} When you are done reading, press the SPACEBAR or click the 'Done' button.\n\
  \u{2022} After each paragraph, answer a multiple-choice question about what you read.\n\n\
Please try to stay as still as possible during each paragraph to reduce EEG artifacts.\n\n\
Press 'Begin' when you are ready to start.";

pub const DEFAULT_PREFERENCE_INSTRUCTIONS: &str = "On each page you will see two paragraphs \
about the same topic.\n\nRead both, then click the one you would rather learn from and press \
'Continue'.\n\nThere are no right or wrong answers.";

/// Whole study file. Every section and field has a default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub reading: ReadingConfig,
    pub preference: PreferenceConfig,
    pub provider: ProviderConfig,
    pub log: LogConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub stimuli: PathBuf,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub columns: ColumnNames,
    pub instructions: Option<String>,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            stimuli: PathBuf::from("stimuli.csv"),
            shuffle: true,
            seed: None,
            columns: ColumnNames::default(),
            instructions: None,
        }
    }
}

impl ReadingConfig {
    pub fn instructions(&self) -> &str {
        self.instructions
            .as_deref()
            .unwrap_or(DEFAULT_READING_INSTRUCTIONS)
    }
}

/// Stimulus Source column names
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub text: String,
    pub question: String,
    pub options: [String; 4],
    pub correct: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            text: "text".into(),
            question: "question".into(),
            options: [
                "option_A".into(),
                "option_B".into(),
                "option_C".into(),
                "option_D".into(),
            ],
            correct: "correct_option".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoundConfig {
    pub title: String,
    /// Text the provider rewrites for this round
    #[serde(default)]
    pub source: String,
    /// Passages used by the offline provider
    #[serde(default)]
    pub offline: Option<Passages>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreferenceConfig {
    pub pages: PathBuf,
    pub rounds: Vec<RoundConfig>,
    pub instructions: Option<String>,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            pages: PathBuf::from("pages.csv"),
            rounds: vec![
                RoundConfig {
                    title: "Topic 5: Plate Tectonics".into(),
                    source: String::new(),
                    offline: None,
                },
                RoundConfig {
                    title: "Topic 6: Electricity".into(),
                    source: String::new(),
                    offline: None,
                },
            ],
            instructions: None,
        }
    }
}

impl PreferenceConfig {
    pub fn instructions(&self) -> &str {
        self.instructions
            .as_deref()
            .unwrap_or(DEFAULT_PREFERENCE_INSTRUCTIONS)
    }

    pub fn round_titles(&self) -> Vec<String> {
        self.rounds.iter().map(|r| r.title.clone()).collect()
    }

    /// Offline provider from the configured canned passages
    pub fn offline_provider(&self) -> StaticProvider {
        let canned: Option<Vec<Passages>> = self.rounds.iter().map(|r| r.offline.clone()).collect();
        StaticProvider::new(canned.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
    pub system_prompt: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 120,
            temperature: None,
            system_prompt: "You rewrite short educational paragraphs for middle-school \
                            students. Always answer with a single JSON object."
                .into(),
        }
    }
}

impl ProviderConfig {
    /// Resolves the API key from the environment
    pub fn chat_settings(&self, rounds: &[RoundConfig]) -> Result<ChatSettings, ProviderError> {
        let api_key = std::env::var(&self.api_key_env)
            .map_err(|_| ProviderError::MissingApiKey(self.api_key_env.clone()))?;
        Ok(ChatSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            api_key_env: self.api_key_env.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            temperature: self.temperature,
            system_prompt: self.system_prompt.clone(),
            round_sources: rounds.iter().map(|r| r.source.clone()).collect(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub reading_prefix: String,
    pub preference_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            reading_prefix: "EEG_log".into(),
            preference_prefix: "preference_log".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: String,
    /// TrueType/OpenType font used for all text
    pub font: PathBuf,
    pub fullscreen: bool,
    pub width: u32,
    pub height: u32,
    pub text_size: f32,
    pub title_size: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "EEG Reading Experiment".into(),
            font: PathBuf::from("assets/DejaVuSans.ttf"),
            fullscreen: true,
            width: 1280,
            height: 720,
            text_size: 22.0,
            title_size: 30.0,
        }
    }
}

impl StudyConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reading.columns.text.trim().is_empty() {
            return Err(ConfigError::Invalid("reading.columns.text is empty".into()));
        }
        if self.log.reading_prefix.trim().is_empty() || self.log.preference_prefix.trim().is_empty()
        {
            return Err(ConfigError::Invalid("log prefixes must not be empty".into()));
        }
        if self.display.text_size <= 0.0 || self.display.title_size <= 0.0 {
            return Err(ConfigError::Invalid("text sizes must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readex_provider::ContentProvider;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config: StudyConfig = toml::from_str("").unwrap();
        assert!(config.reading.shuffle);
        assert_eq!(config.log.dir, PathBuf::from("logs"));
        assert_eq!(config.log.reading_prefix, "EEG_log");
        assert_eq!(config.reading.columns.options[3], "option_D");
        assert_eq!(config.preference.rounds.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: StudyConfig = toml::from_str(
            r#"
            [reading]
            stimuli = "db.csv"
            shuffle = false
            seed = 7

            [reading.columns]
            text = "paragraph"

            [[preference.rounds]]
            title = "Volcanoes"
            source = "Volcanoes form where..."
            offline = ["one", "two"]
            "#,
        )
        .unwrap();
        assert_eq!(config.reading.stimuli, PathBuf::from("db.csv"));
        assert!(!config.reading.shuffle);
        assert_eq!(config.reading.seed, Some(7));
        assert_eq!(config.reading.columns.text, "paragraph");
        assert_eq!(config.reading.columns.question, "question");
        assert_eq!(config.preference.round_titles(), vec!["Volcanoes".to_string()]);
        assert!(config.reading.instructions().contains("SPACEBAR"));
    }

    #[test]
    fn example_study_file_parses() {
        let config: StudyConfig =
            toml::from_str(include_str!("../../readex.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.preference.rounds.len(), 2);
        let offline = config.preference.offline_provider();
        assert_eq!(
            offline.passages("p", 1).unwrap()[0],
            "Think of a wire as a pipe and the charges as water flowing through it."
        );
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reading]\nshuffle = \"yes\"").unwrap();
        let err = StudyConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_rejects_zero_text_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\ntext_size = 0.0").unwrap();
        assert!(matches!(
            StudyConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_key_env_is_reported() {
        let config = ProviderConfig {
            api_key_env: "READEX_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            config.chat_settings(&[]),
            Err(ProviderError::MissingApiKey(name)) if name == "READEX_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }
}
