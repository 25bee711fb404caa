//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。所有变量都以 `PAGE_TRANSLATOR_` 开头。

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 只读取显式设置的值，未设置时返回 `Ok(None)`
    fn lookup() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "PAGE_TRANSLATOR_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 目标语言（写入提示词，例如 `Turkish`）
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "PAGE_TRANSLATOR_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language name used in the translation prompt";

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim();
            if lang.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Target language must not be empty".to_string(),
                });
            }
            Ok(lang.to_string())
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "PAGE_TRANSLATOR_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Gemini generateContent endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "PAGE_TRANSLATOR_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Gemini API key";

        fn parse(value: &str) -> EnvResult<String> {
            let key = value.trim();
            if key.len() < 8 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API key too short (minimum 8 characters)".to_string(),
                });
            }
            Ok(key.to_string())
        }
    }

    /// 批次大小
    pub struct BatchSize;
    impl EnvVar<usize> for BatchSize {
        const NAME: &'static str = "PAGE_TRANSLATOR_BATCH_SIZE";
        const DEFAULT: Option<usize> = Some(10);
        const DESCRIPTION: &'static str = "Number of texts per translation batch";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100)
        }
    }

    /// 批次间隔
    pub struct BatchDelay;
    impl EnvVar<Duration> for BatchDelay {
        const NAME: &'static str = "PAGE_TRANSLATOR_BATCH_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(500));
        const DESCRIPTION: &'static str = "Delay between batches in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of milliseconds".to_string(),
            })?;

            if millis > 60_000 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Delay too long (max 60000 ms)".to_string(),
                });
            }

            Ok(Duration::from_millis(millis))
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "PAGE_TRANSLATOR_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(10));
        const DESCRIPTION: &'static str = "Translation request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 300 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 300 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 历史记录相关环境变量
pub mod storage {
    use super::*;

    /// 历史文件路径
    pub struct HistoryPath;
    impl EnvVar<String> for HistoryPath {
        const NAME: &'static str = "PAGE_TRANSLATOR_HISTORY_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the JSON translation history file";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "History path must not be empty".to_string(),
                });
            }
            Ok(shellexpand::tilde(path).into_owned())
        }
    }

    /// 历史记录上限
    pub struct MaxHistoryItems;
    impl EnvVar<usize> for MaxHistoryItems {
        const NAME: &'static str = "PAGE_TRANSLATOR_MAX_HISTORY_ITEMS";
        const DEFAULT: Option<usize> = Some(50);
        const DESCRIPTION: &'static str = "Maximum number of history entries kept";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 10000)
        }
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    docs.push_str("## Core\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"info\")\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));

    docs.push_str("\n## Translation\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::TargetLang::NAME,
        translation::TargetLang::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::ApiUrl::NAME,
        translation::ApiUrl::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::ApiKey::NAME,
        translation::ApiKey::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::BatchSize::NAME,
        translation::BatchSize::DESCRIPTION,
        translation::BatchSize::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::BatchDelay::NAME,
        translation::BatchDelay::DESCRIPTION,
        translation::BatchDelay::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::RequestTimeout::NAME,
        translation::RequestTimeout::DESCRIPTION,
        translation::RequestTimeout::DEFAULT
    ));

    docs.push_str("\n## History\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        storage::HistoryPath::NAME,
        storage::HistoryPath::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        storage::MaxHistoryItems::NAME,
        storage::MaxHistoryItems::DESCRIPTION,
        storage::MaxHistoryItems::DEFAULT
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(translation::ApiUrl::parse("https://generativelanguage.googleapis.com").is_ok());
        assert!(translation::ApiUrl::parse("ftp://example.com").is_err());
        assert!(translation::ApiUrl::parse("not-a-url").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(translation::BatchSize::parse("10").unwrap(), 10);
        assert!(translation::BatchSize::parse("0").is_err());
        assert!(translation::BatchSize::parse("ten").is_err());

        assert_eq!(
            translation::BatchDelay::parse("0").unwrap(),
            Duration::from_millis(0)
        );
        assert!(translation::RequestTimeout::parse("0").is_err());
        assert!(translation::RequestTimeout::parse("301").is_err());
    }

    #[test]
    fn test_lookup_unset_is_none() {
        env::remove_var(storage::MaxHistoryItems::NAME);
        assert_eq!(storage::MaxHistoryItems::lookup().unwrap(), None);
        assert_eq!(storage::MaxHistoryItems::get().unwrap(), 50);
    }

    #[test]
    fn test_env_docs_lists_variables() {
        let docs = generate_env_docs();
        assert!(docs.contains("PAGE_TRANSLATOR_API_KEY"));
        assert!(docs.contains("PAGE_TRANSLATOR_BATCH_DELAY_MS"));
    }
}
