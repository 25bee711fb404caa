//! 翻译模块
//!
//! 页面翻译由以下部分组成：
//! - **config**: 配置管理
//! - **pipeline**: 文本收集、过滤和批次切分
//! - **client**: 翻译客户端
//! - **core**: 应用与还原引擎、页面翻译控制器
//! - **storage**: 选中文本翻译的历史记录
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use page_translator::parsers::html::html_to_dom;
//! use page_translator::translation::{
//!     GeminiTranslator, PageCommand, PageTranslationController, TranslationConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslationConfig::default_with_lang("German");
//! let dom = html_to_dom(b"<html><body><p>Good morning</p></body></html>", "utf-8")?;
//! let translator = Rc::new(GeminiTranslator::new(&config)?);
//!
//! let controller = PageTranslationController::new(dom.document.clone(), translator, &config);
//! controller.handle(PageCommand::TogglePageTranslation).await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod storage;

pub use client::{GeminiTranslator, TranslationOutcome, Translator};
pub use config::{constants, ConfigManager, TranslationConfig};
pub use core::{
    ApplyReport, PageCommand, PageResponse, PageStats, PageTranslationController, PassState,
    TranslationEngine,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::{Batch, Extraction, TextCollector, TextFilter};
pub use storage::{HistoryEntry, HistoryStore};

/// 检查文本是否会被收集为翻译单元（使用默认最小长度）
///
/// ```rust
/// use page_translator::translation::should_translate;
///
/// assert!(should_translate("Hello World"));
/// assert!(!should_translate("123"));
/// assert!(!should_translate("ab"));
/// assert!(!should_translate("   "));
/// ```
pub fn should_translate(text: &str) -> bool {
    TextFilter::default().should_translate(text)
}
