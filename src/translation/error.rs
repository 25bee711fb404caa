//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

use crate::core::PageError;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 配额或速率限制已耗尽
    #[error("配额已耗尽: {0}")]
    QuotaExceeded(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 翻译服务错误
    #[error("翻译服务错误: {0}")]
    TranslationServiceError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 存储错误
    #[error("存储错误: {0}")]
    StorageError(String),

    /// 节点已从文档中移除
    #[error("节点已脱离文档: {0}")]
    DetachedNode(String),

    /// 页面中没有可翻译内容
    #[error("no translatable content")]
    NoTranslatableContent,

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::NetworkError(_) => true,
            TranslationError::TimeoutError(_) => true,
            TranslationError::TranslationServiceError(_) => true,
            TranslationError::QuotaExceeded(_) => false, // 需要等待配额恢复
            TranslationError::ConfigError(_) => false,
            TranslationError::InvalidInput(_) => false,
            TranslationError::ParseError(_) => false,
            TranslationError::SerializationError(_) => false,
            TranslationError::StorageError(_) => true,
            TranslationError::DetachedNode(_) => false,
            TranslationError::NoTranslatableContent => false,
            TranslationError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::QuotaExceeded(_) => ErrorSeverity::Error,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::TimeoutError(_) => ErrorSeverity::Warning,
            TranslationError::TranslationServiceError(_) => ErrorSeverity::Error,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::StorageError(_) => ErrorSeverity::Warning,
            TranslationError::DetachedNode(_) => ErrorSeverity::Info,
            TranslationError::NoTranslatableContent => ErrorSeverity::Warning,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::QuotaExceeded(_) => ErrorCategory::Quota,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::TimeoutError(_) => ErrorCategory::Timeout,
            TranslationError::TranslationServiceError(_) => ErrorCategory::Service,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::StorageError(_) => ErrorCategory::Storage,
            TranslationError::DetachedNode(_) => ErrorCategory::Transport,
            TranslationError::NoTranslatableContent => ErrorCategory::Content,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let new_msg = match &self {
            TranslationError::NoTranslatableContent => return self,
            _ => format!("{} (上下文: {})", self.message(), context),
        };

        match &mut self {
            TranslationError::ConfigError(ref mut msg)
            | TranslationError::NetworkError(ref mut msg)
            | TranslationError::QuotaExceeded(ref mut msg)
            | TranslationError::InvalidInput(ref mut msg)
            | TranslationError::TimeoutError(ref mut msg)
            | TranslationError::TranslationServiceError(ref mut msg)
            | TranslationError::ParseError(ref mut msg)
            | TranslationError::SerializationError(ref mut msg)
            | TranslationError::StorageError(ref mut msg)
            | TranslationError::DetachedNode(ref mut msg)
            | TranslationError::InternalError(ref mut msg) => *msg = new_msg,
            TranslationError::NoTranslatableContent => {}
        }

        self
    }

    /// 不带类别前缀的原始消息
    ///
    /// 逐项失败时展示给用户的原因，例如远端返回的 `error.message`。
    pub fn message(&self) -> String {
        match self {
            TranslationError::ConfigError(msg)
            | TranslationError::NetworkError(msg)
            | TranslationError::QuotaExceeded(msg)
            | TranslationError::InvalidInput(msg)
            | TranslationError::TimeoutError(msg)
            | TranslationError::TranslationServiceError(msg)
            | TranslationError::ParseError(msg)
            | TranslationError::SerializationError(msg)
            | TranslationError::StorageError(msg)
            | TranslationError::DetachedNode(msg)
            | TranslationError::InternalError(msg) => msg.clone(),
            TranslationError::NoTranslatableContent => self.to_string(),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Quota,
    Input,
    Timeout,
    Service,
    Parsing,
    Serialization,
    Storage,
    Transport,
    Content,
    Internal,
}

/// 转换为PageError，供命令行使用
impl From<TranslationError> for PageError {
    fn from(error: TranslationError) -> Self {
        PageError::new(&error.to_string())
    }
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::StorageError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<toml::ser::Error> for TranslationError {
    fn from(error: toml::ser::Error) -> Self {
        TranslationError::SerializationError(format!("TOML序列化错误: {}", error))
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        TranslationError::TimeoutError(format!("异步操作超时: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        let error = error.without_url();
        if error.is_timeout() {
            TranslationError::TimeoutError(error.to_string())
        } else if error.is_decode() {
            TranslationError::ParseError(error.to_string())
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误统计信息
#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    pub total_errors: usize,
    pub by_category: std::collections::HashMap<ErrorCategory, usize>,
    pub by_severity: std::collections::HashMap<ErrorSeverity, usize>,
    pub retryable_errors: usize,
    pub critical_errors: usize,
}

impl ErrorStats {
    /// 记录错误
    pub fn record_error(&mut self, error: &TranslationError) {
        self.total_errors += 1;

        let category = error.category();
        *self.by_category.entry(category).or_insert(0) += 1;

        let severity = error.severity();
        *self.by_severity.entry(severity).or_insert(0) += 1;

        if error.is_retryable() {
            self.retryable_errors += 1;
        }

        if severity == ErrorSeverity::Critical {
            self.critical_errors += 1;
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    /// 获取错误率
    pub fn error_rate(&self, total_operations: usize) -> f64 {
        if total_operations == 0 {
            0.0
        } else {
            self.total_errors as f64 / total_operations as f64
        }
    }
}

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 记录错误日志，级别由严重程度决定
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }

    /// 创建存储错误
    pub fn storage_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::StorageError(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let quota = TranslationError::QuotaExceeded("Quota exceeded for model".to_string());
        assert!(!quota.is_retryable());
        assert_eq!(quota.category(), ErrorCategory::Quota);

        let timeout = TranslationError::TimeoutError("10s".to_string());
        assert!(timeout.is_retryable());
        assert_eq!(timeout.severity(), ErrorSeverity::Warning);

        assert_eq!(
            TranslationError::NoTranslatableContent.category(),
            ErrorCategory::Content
        );
    }

    #[test]
    fn test_message_strips_prefix() {
        let error = TranslationError::TranslationServiceError("API key not valid".to_string());
        assert_eq!(error.message(), "API key not valid");
        assert_eq!(error.to_string(), "翻译服务错误: API key not valid");
    }

    #[test]
    fn test_with_context() {
        let error = TranslationError::StorageError("disk full".to_string()).with_context("history");
        assert_eq!(error.message(), "disk full (上下文: history)");
    }

    #[test]
    fn test_error_stats() {
        let mut stats = ErrorStats::default();
        stats.record_error(&TranslationError::NetworkError("reset".to_string()));
        stats.record_error(&TranslationError::ConfigError("no key".to_string()));

        assert_eq!(stats.total_errors, 2);
        assert_eq!(stats.retryable_errors, 1);
        assert_eq!(stats.critical_errors, 1);
        assert_eq!(stats.error_rate(4), 0.5);

        stats.reset();
        assert_eq!(stats.total_errors, 0);
    }
}
