//! 页面翻译核心
//!
//! - **引擎** (`engine.rs`): 把结果写回 DOM，并能完整还原
//! - **控制器** (`service.rs`): 驱动一次翻译的状态机
//! - **命令** (`command.rs`): 外部消息到控制器操作的映射
//!
//! ```text
//! PageTranslationController (service.rs)
//!     ├── TextCollector (pipeline/collector.rs)
//!     ├── create_batches (pipeline/batch.rs)
//!     ├── Translator (client/mod.rs)
//!     └── TranslationEngine (engine.rs)
//! ```

pub mod command;
pub mod engine;
pub mod service;

pub use command::{PageCommand, PageResponse};
pub use engine::{ApplyReport, PageStats, TranslationEngine};
pub use service::{
    CancelHandle, LogReporter, PageTranslationController, PassState, PassSummary,
    ProgressReporter, ProgressUpdate,
};
