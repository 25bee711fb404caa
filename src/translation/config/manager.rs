//! 配置管理器
//!
//! 加载顺序：`.env` 文件 → 配置文件（TOML/JSON）→ 环境变量覆盖 → 验证

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{helpers::config_error, TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub target_lang: String,
    pub api_url: String,
    pub api_key: Option<String>,

    // 请求配置
    pub max_text_length: usize,
    pub request_timeout_secs: u64,
    pub temperature: f64,
    pub max_output_tokens: u32,

    // 批次配置
    pub batch_size: usize,
    pub batch_delay_ms: u64,

    // 提取配置
    pub min_text_length: usize,
    pub ui_class_prefix: String,

    // 历史记录配置
    pub history_path: Option<String>,
    pub max_history_items: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,

            max_text_length: constants::DEFAULT_MAX_TEXT_LENGTH,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            temperature: constants::DEFAULT_TEMPERATURE,
            max_output_tokens: constants::DEFAULT_MAX_OUTPUT_TOKENS,

            batch_size: constants::DEFAULT_BATCH_SIZE,
            batch_delay_ms: constants::BATCH_DELAY_MS,

            min_text_length: constants::MIN_TEXT_LENGTH,
            ui_class_prefix: constants::UI_CLASS_PREFIX.to_string(),

            history_path: None,
            max_history_items: constants::DEFAULT_MAX_HISTORY_ITEMS,
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_lang: &str) -> Self {
        Self {
            target_lang: target_lang.to_string(),
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.batch_size == 0 {
            return Err(config_error("批次大小不能为0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(config_error("请求超时不能为0"));
        }

        if self.max_history_items == 0 {
            return Err(config_error("历史记录上限不能为0"));
        }

        if self.max_text_length == 0 {
            return Err(config_error("最大文本长度不能为0"));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(config_error(format!("无效的 API URL: {}", self.api_url)));
        }

        Ok(())
    }

    /// 应用环境变量覆盖，只处理显式设置的变量
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{storage, translation, EnvVar};

        match translation::TargetLang::lookup() {
            Ok(Some(target_lang)) => self.target_lang = target_lang,
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }

        match translation::ApiUrl::lookup() {
            Ok(Some(api_url)) => {
                self.api_url = api_url;
                tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }

        match translation::ApiKey::lookup() {
            Ok(Some(api_key)) => self.api_key = Some(api_key),
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }

        match translation::BatchSize::lookup() {
            Ok(Some(batch_size)) => self.batch_size = batch_size,
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }

        match translation::BatchDelay::lookup() {
            Ok(Some(delay)) => self.batch_delay_ms = delay.as_millis() as u64,
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }

        match translation::RequestTimeout::lookup() {
            Ok(Some(timeout)) => self.request_timeout_secs = timeout.as_secs(),
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }

        match storage::HistoryPath::lookup() {
            Ok(Some(path)) => self.history_path = Some(path),
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }

        match storage::MaxHistoryItems::lookup() {
            Ok(Some(max_items)) => self.max_history_items = max_items,
            Ok(None) => {}
            Err(e) => tracing::warn!("忽略环境变量: {}", e),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// 历史文件路径（展开 `~`）
    pub fn history_file(&self) -> Option<String> {
        self.history_path
            .as_deref()
            .map(|path| shellexpand::tilde(path).into_owned())
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 从默认搜索路径创建配置管理器
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let config = Self::load_config()?;
        Self::finish(config)
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();

        let expanded_path = shellexpand::tilde(path);
        let config = Self::load_from_file(&expanded_path)?;
        Self::finish(config)
    }

    fn finish(mut config: TranslationConfig) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 查找第一个存在的配置文件
    fn load_config() -> TranslationResult<TranslationConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
