//! 翻译客户端模块
//!
//! 客户端只提供单条文本的 `translate`，批次由控制器负责切分并逐条调用。

pub mod gemini;

use std::rc::Rc;

use async_trait::async_trait;

use crate::translation::error::{TranslationError, TranslationResult};

pub use gemini::GeminiTranslator;

/// 单条文本翻译接口
///
/// 运行在单线程协作模型中，实现不要求 `Send`。
#[async_trait(?Send)]
pub trait Translator {
    /// 翻译一段文本，成功时返回译文
    async fn translate(&self, text: &str) -> TranslationResult<String>;

    /// 客户端名称，用于日志
    fn name(&self) -> &str {
        "translator"
    }
}

#[async_trait(?Send)]
impl<T: Translator + ?Sized> Translator for Rc<T> {
    async fn translate(&self, text: &str) -> TranslationResult<String> {
        (**self).translate(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 单个单元的翻译结果，与输入序列一一对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Success {
        translated_text: String,
    },
    /// 失败时保留原文，作为展示的后备内容
    Failure {
        reason: String,
        original: String,
    },
}

impl TranslationOutcome {
    pub fn success(translated_text: impl Into<String>) -> Self {
        TranslationOutcome::Success {
            translated_text: translated_text.into(),
        }
    }

    pub fn failure(reason: impl Into<String>, original: impl Into<String>) -> Self {
        TranslationOutcome::Failure {
            reason: reason.into(),
            original: original.into(),
        }
    }

    /// 由客户端调用结果构造
    pub fn from_result(result: &TranslationResult<String>, original: &str) -> Self {
        match result {
            Ok(translated_text) => Self::success(translated_text.clone()),
            Err(e) => Self::failure(e.message(), original),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranslationOutcome::Success { .. })
    }

    /// 成功且译文非空时返回译文
    pub fn translated_text(&self) -> Option<&str> {
        match self {
            TranslationOutcome::Success { translated_text } if !translated_text.is_empty() => {
                Some(translated_text)
            }
            _ => None,
        }
    }

    /// 展示用文本：成功为译文，失败为原文
    pub fn display_text(&self) -> &str {
        match self {
            TranslationOutcome::Success { translated_text } => translated_text,
            TranslationOutcome::Failure { original, .. } => original,
        }
    }
}

/// 判断错误是否表示配额已耗尽
///
/// 只看远端返回的错误：`QuotaExceeded`，或服务错误信息中出现 `quota`、`Quota`、`429`。
/// 传输层错误（连接失败、超时）从不视为配额耗尽。
pub fn is_quota_exhausted(error: &TranslationError) -> bool {
    match error {
        TranslationError::QuotaExceeded(_) => true,
        TranslationError::TranslationServiceError(message) => is_quota_message(message),
        _ => false,
    }
}

/// 按错误文本判断配额耗尽
pub fn is_quota_message(message: &str) -> bool {
    message.contains("quota") || message.contains("Quota") || message.contains("429")
}
