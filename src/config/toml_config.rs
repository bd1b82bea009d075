use crate::core::{AssemblyMember, ConfigProvider};
use crate::utils::error::{Result, VotingError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional roster of assembly members allowed to vote.
    #[serde(default)]
    pub members: Vec<AssemblyMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(VotingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| VotingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 沒有設定檔時，從環境變數建立配置
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("VOTING_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_seconds = match std::env::var("VOTING_API_TIMEOUT") {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                VotingError::InvalidConfigValueError {
                    field: "VOTING_API_TIMEOUT".to_string(),
                    value: raw.clone(),
                    reason: format!("Not a number of seconds: {}", e),
                }
            })?),
            Err(_) => None,
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout_seconds,
            },
            logging: LoggingConfig::default(),
            members: Vec::new(),
        })
    }

    /// 替換環境變數 (例如 ${VOTING_API_URL})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| VotingError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for AppConfig {
    fn base_url(&self) -> &str {
        &self.api.base_url
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.api.timeout_seconds
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;

        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_positive_number("api.timeout_seconds", timeout, 1)?;
        }

        validation::validate_unique_ids("members.id", self.members.iter().map(|m| m.id))?;
        for member in &self.members {
            validation::validate_non_empty_string("members.last_name", &member.last_name)?;
        }

        Ok(())
    }
}
