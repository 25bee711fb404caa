//! 翻译管道模块
//!
//! 提供文本处理管道，包括收集、过滤和批次切分

pub mod batch;
pub mod collector;
pub mod filters;

pub use batch::{batch, create_batches, Batch};
pub use collector::{
    extract, AttributeUnit, CollectionStats, CollectorConfig, Extraction, TextCollector, TextUnit,
};
pub use filters::{TextFilter, TextRejection};
