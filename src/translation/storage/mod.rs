//! 存储模块
//!
//! 翻译历史记录的存储。

pub mod history;

pub use history::{translate_selection, HistoryEntry, HistoryStore};
