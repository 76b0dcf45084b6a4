use crate::error::{AppError, AppResult, ConfigError, FileError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 测评后端根地址
    pub api_base_url: String,
    /// 计时器持久化文件
    pub timer_store_path: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 代码题未识别出语言时的默认语言
    pub default_code_language: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            timer_store_path: "timers.json".to_string(),
            request_timeout_secs: 30,
            default_code_language: "php".to_string(),
            verbose_logging: false,
            output_log_file: "session.log".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 先读取 TOML 配置文件（若存在），再用环境变量覆盖
    ///
    /// 配置文件路径取自 `ASSESSMENT_CONFIG`，默认 `assessment.toml`
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("ASSESSMENT_CONFIG").unwrap_or_else(|_| "assessment.toml".to_string());
        let config = if Path::new(&path).exists() {
            Self::from_toml_file(Path::new(&path))?.with_env_overrides()?
        } else {
            Self::from_env()?
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::File(FileError::TomlParseFailed { source, .. }) => {
                AppError::File(FileError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(self.api_base_url),
            timer_store_path: std::env::var("TIMER_STORE_PATH").unwrap_or(self.timer_store_path),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", self.request_timeout_secs, "u64")?,
            default_code_language: std::env::var("DEFAULT_CODE_LANGUAGE").unwrap_or(self.default_code_language),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging, "bool")?,
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        })
    }

    fn validate(&self) -> AppResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                key: "request_timeout_secs".to_string(),
                value: "0".to_string(),
                expected: "大于 0 的整数".to_string(),
            }));
        }
        Ok(())
    }
}

/// 环境变量存在时解析，不存在时保留原值
fn env_or<T: FromStr>(var_name: &str, current: T, expected_type: &str) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(raw) => parse_env_value(var_name, &raw, expected_type),
        Err(_) => Ok(current),
    }
}

fn parse_env_value<T: FromStr>(var_name: &str, raw: &str, expected_type: &str) -> AppResult<T> {
    raw.trim().parse().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: raw.to_string(),
            expected_type: expected_type.to_string(),
        })
    })
}
