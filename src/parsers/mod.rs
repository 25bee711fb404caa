//! # 解析器模块
//!
//! HTML 文档解析、DOM 操作和序列化。翻译流水线只通过这里的函数访问 DOM。

pub mod html;

pub use html::{get_charset, get_title, html_to_dom, serialize_document};
