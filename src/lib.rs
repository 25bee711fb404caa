//! # Page Translator Library
//!
//! 在 HTML 文档上就地翻译可见文本和属性，翻译状态全部保存在 DOM 标记上，可以完整还原。
//!
//! ## 模块组织
//!
//! - `core` - 页面读写和错误类型
//! - `env` - 环境变量
//! - `parsers` - HTML 解析、DOM 操作和序列化
//! - `translation` - 收集、分批、翻译、应用与还原

pub mod core;
pub mod env;
pub mod parsers;
pub mod translation;

pub use core::{Document, PageError};
