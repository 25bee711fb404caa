//! 页面翻译控制器
//!
//! 控制器驱动一次完整的页面翻译：收集、分批、逐条调用翻译客户端、应用结果。
//! 同一时刻最多只有一次翻译在进行，进度在每次状态切换时上报。
//!
//! ## 状态
//!
//! ```text
//! Idle -> Analyzing -> Translating(i/n) ... -> Applying -> Done
//!                   \-> Failed                \-> Cancelled
//! ```
//!
//! 终止状态（`Done`、`Cancelled`、`Failed`）之后可以重新开始下一次翻译。
//!
//! ## 设计要点
//!
//! 1. **单线程协作**: 所有状态放在 `Cell`/`RefCell` 中，只在 `await` 点让出
//! 2. **结果对齐**: 每个收集到的单元都有且只有一个结果，失败时保留原文
//! 3. **批次隔离**: 某一批次的失败只影响该批次的条目
//! 4. **配额熔断**: 出现配额耗尽后，本次翻译剩余条目直接记为失败，不再请求
//! 5. **取消**: 只设置标志，在批次边界和应用前检查
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use page_translator::parsers::html::html_to_dom;
//! use page_translator::translation::client::GeminiTranslator;
//! use page_translator::translation::config::TranslationConfig;
//! use page_translator::translation::core::PageTranslationController;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslationConfig::default();
//! let dom = html_to_dom(b"<html><body><p>Hello world</p></body></html>", "utf-8")?;
//! let translator = Rc::new(GeminiTranslator::new(&config)?);
//!
//! let controller = PageTranslationController::new(dom.document.clone(), translator, &config);
//! if let Some(state) = controller.start().await {
//!     println!("翻译结束: {}", state);
//! }
//! # Ok(())
//! # }
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use markup5ever_rcdom::Handle;
use serde::Serialize;

use super::engine::{ApplyReport, PageStats, TranslationEngine};
use crate::translation::client::{is_quota_exhausted, TranslationOutcome, Translator};
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers::log_error, ErrorStats, TranslationError};
use crate::translation::pipeline::batch::{create_batches, Batch};
use crate::translation::pipeline::collector::CollectorConfig;

/// 配额耗尽后被跳过的条目的失败原因
pub const QUOTA_SKIPPED: &str = "quota exceeded, request skipped";

/// 一次翻译结束时的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub units: usize,
    pub batches: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// 是否因配额耗尽跳过了部分请求
    pub quota_exhausted: bool,
}

impl PassSummary {
    fn new(units: usize, batches: usize, report: ApplyReport, quota_exhausted: bool) -> Self {
        Self {
            units,
            batches,
            success_count: report.success_count,
            failure_count: report.failure_count,
            quota_exhausted,
        }
    }
}

/// 控制器状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Analyzing,
    /// 正在翻译第 `batch` 批（从 1 开始），共 `total` 批
    Translating { batch: usize, total: usize },
    Applying,
    Done(PassSummary),
    Cancelled,
    Failed(String),
}

impl PassState {
    /// 翻译是否正在进行
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            PassState::Analyzing | PassState::Translating { .. } | PassState::Applying
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PassState::Done(_) | PassState::Cancelled | PassState::Failed(_)
        )
    }
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassState::Idle => write!(f, "空闲"),
            PassState::Analyzing => write!(f, "正在分析页面"),
            PassState::Translating { batch, total } => {
                write!(f, "正在翻译 ({}/{} 批)", batch, total)
            }
            PassState::Applying => write!(f, "正在应用翻译"),
            PassState::Done(summary) if summary.failure_count > 0 => write!(
                f,
                "已翻译 {} 项 ({} 项失败)",
                summary.success_count, summary.failure_count
            ),
            PassState::Done(summary) => write!(f, "已翻译 {} 项", summary.success_count),
            PassState::Cancelled => write!(f, "翻译已取消"),
            PassState::Failed(reason) => write!(f, "翻译失败: {}", reason),
        }
    }
}

/// 进度通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub status: String,
    /// 0 到 100
    pub progress: u8,
    pub complete: bool,
    pub error: bool,
}

impl ProgressUpdate {
    fn for_state(state: &PassState, progress: u8) -> Self {
        Self {
            status: state.to_string(),
            progress,
            complete: matches!(state, PassState::Done(_)),
            error: matches!(state, PassState::Failed(_)),
        }
    }
}

/// 进度接收方
pub trait ProgressReporter {
    fn report(&self, update: &ProgressUpdate);
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressUpdate),
{
    fn report(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// 默认接收方，只写日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, update: &ProgressUpdate) {
        if update.error {
            tracing::error!("{} ({}%)", update.status, update.progress);
        } else {
            tracing::info!("{} ({}%)", update.status, update.progress);
        }
    }
}

/// 取消句柄，可以在进度回调等其它位置请求取消
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    fn reset(&self) {
        self.0.set(false);
    }
}

/// 页面翻译控制器
pub struct PageTranslationController {
    engine: TranslationEngine,
    translator: Rc<dyn Translator>,
    batch_size: usize,
    batch_delay: Duration,
    state: RefCell<PassState>,
    cancel: CancelHandle,
    reporter: Box<dyn ProgressReporter>,
    error_stats: RefCell<ErrorStats>,
}

impl PageTranslationController {
    /// 创建控制器，使用日志作为进度接收方
    pub fn new(document: Handle, translator: Rc<dyn Translator>, config: &TranslationConfig) -> Self {
        let engine =
            TranslationEngine::with_collector_config(document, CollectorConfig::from(config));

        Self {
            engine,
            translator,
            batch_size: config.batch_size,
            batch_delay: config.batch_delay(),
            state: RefCell::new(PassState::Idle),
            cancel: CancelHandle::default(),
            reporter: Box::new(LogReporter),
            error_stats: RefCell::new(ErrorStats::default()),
        }
    }

    /// 使用外部创建的取消句柄
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// 替换进度接收方
    pub fn with_reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn engine(&self) -> &TranslationEngine {
        &self.engine
    }

    /// 当前状态
    pub fn state(&self) -> PassState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// 本控制器累计的翻译错误
    pub fn error_stats(&self) -> ErrorStats {
        self.error_stats.borrow().clone()
    }

    /// 请求取消。没有翻译在进行时不做任何事
    pub fn cancel(&self) {
        if self.is_running() {
            tracing::info!("收到取消请求");
            self.cancel.cancel();
        }
    }

    pub fn is_translated(&self) -> bool {
        self.engine.is_translated()
    }

    pub fn stats(&self) -> PageStats {
        self.engine.stats()
    }

    /// 还原页面，返回还原的数量
    pub fn restore(&self) -> usize {
        self.engine.restore()
    }

    /// 开始一次页面翻译，返回终止状态
    ///
    /// 已有翻译在进行或页面已带有翻译标记时什么也不做，返回 `None`。
    pub async fn start(&self) -> Option<PassState> {
        if self.is_running() {
            tracing::debug!("已有翻译在进行，忽略本次请求");
            return None;
        }

        if self.engine.is_translated() {
            tracing::debug!("页面已翻译，忽略本次请求");
            return None;
        }

        self.cancel.reset();
        let state = self.run_pass().await;
        tracing::info!("页面翻译结束: {}", state);
        Some(state)
    }

    async fn run_pass(&self) -> PassState {
        self.enter(PassState::Analyzing, 0);

        let (extraction, collection_stats) = self.engine.extract();
        tracing::info!(
            "分析结果: {} 个文本, {} 个属性, 过滤 {} 个",
            extraction.text_units.len(),
            extraction.attribute_units.len(),
            collection_stats.total_rejected()
        );

        if extraction.is_empty() {
            let error = TranslationError::NoTranslatableContent;
            self.error_stats.borrow_mut().record_error(&error);
            return self.enter(PassState::Failed(error.to_string()), 0);
        }

        let texts = extraction.texts();
        let batches = create_batches(&texts, self.batch_size);
        let total = batches.len();
        let mut results: Vec<TranslationOutcome> = Vec::with_capacity(texts.len());
        let mut quota_exhausted = false;

        for batch in &batches {
            if self.cancel.is_cancelled() {
                return self.enter(PassState::Cancelled, 0);
            }

            let progress = percent(batch.id + 1, total);
            self.enter(
                PassState::Translating {
                    batch: batch.id + 1,
                    total,
                },
                progress,
            );

            let requests = self
                .translate_batch(batch, &mut results, &mut quota_exhausted)
                .await;
            tracing::debug!(
                "批次 {}/{} 完成: {} 项, {} 次请求",
                batch.id + 1,
                total,
                batch.len(),
                requests
            );

            if requests > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        if self.cancel.is_cancelled() {
            return self.enter(PassState::Cancelled, 0);
        }

        debug_assert_eq!(results.len(), extraction.len());

        self.enter(PassState::Applying, 100);
        let report = self.engine.apply(&extraction, &results);
        if report.detached > 0 {
            let error = TranslationError::DetachedNode(format!(
                "{} 个单元在应用前已脱离文档",
                report.detached
            ));
            log_error(&error);
            let mut stats = self.error_stats.borrow_mut();
            for _ in 0..report.detached {
                stats.record_error(&error);
            }
        }

        let summary = PassSummary::new(extraction.len(), total, report, quota_exhausted);
        self.enter(PassState::Done(summary), 100)
    }

    /// 逐条翻译一个批次，结果按顺序追加到 `results`，返回实际发出的请求数
    async fn translate_batch(
        &self,
        batch: &Batch,
        results: &mut Vec<TranslationOutcome>,
        quota_exhausted: &mut bool,
    ) -> usize {
        let mut requests = 0;

        for text in &batch.items {
            if *quota_exhausted {
                results.push(TranslationOutcome::failure(QUOTA_SKIPPED, text.as_str()));
                continue;
            }

            requests += 1;
            let result = self.translator.translate(text).await;

            if let Err(e) = &result {
                log_error(e);
                self.error_stats.borrow_mut().record_error(e);

                if is_quota_exhausted(e) {
                    tracing::warn!("配额已耗尽，跳过剩余的翻译请求");
                    *quota_exhausted = true;
                }
            }

            results.push(TranslationOutcome::from_result(&result, text));
        }

        requests
    }

    fn enter(&self, state: PassState, progress: u8) -> PassState {
        let update = ProgressUpdate::for_state(&state, progress);
        *self.state.borrow_mut() = state.clone();
        self.reporter.report(&update);
        state
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * done as f64 / total as f64).round().min(100.0) as u8
}
