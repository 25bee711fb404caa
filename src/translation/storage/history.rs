//! 翻译历史记录
//!
//! 按时间倒序保存选中文本的翻译结果，插入时截断到上限。可选地持久化为 JSON 文件。

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::translation::client::Translator;
use crate::translation::config::constants;
use crate::translation::error::{helpers::storage_error, TranslationResult};

/// 历史记录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 毫秒时间戳，同时作为唯一标识
    pub id: i64,
    pub original: String,
    pub translation: String,
    /// RFC 3339 时间
    pub timestamp: String,
}

/// 历史记录存储
pub struct HistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
    path: Option<PathBuf>,
    max_items: usize,
}

impl HistoryStore {
    /// 创建内存中的历史记录
    pub fn in_memory(max_items: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            path: None,
            max_items: max_items.max(1),
        }
    }

    /// 打开文件存储的历史记录，文件不存在时从空列表开始
    pub fn open(path: impl AsRef<Path>, max_items: usize) -> TranslationResult<Self> {
        let path = path.as_ref().to_path_buf();
        let max_items = max_items.max(1);

        let mut entries: Vec<HistoryEntry> = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        entries.truncate(max_items);

        tracing::debug!("加载历史记录: {} 条 ({})", entries.len(), path.display());

        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
            max_items,
        })
    }

    /// 添加一条记录到最前面
    pub fn add_entry(&self, original: &str, translation: &str) -> TranslationResult<HistoryEntry> {
        let now = Utc::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| storage_error("历史记录锁已损坏"))?;

        // 同一毫秒内的多次插入仍保持 id 唯一且递增
        let id = match entries.first() {
            Some(newest) if newest.id >= now.timestamp_millis() => newest.id + 1,
            _ => now.timestamp_millis(),
        };

        let entry = HistoryEntry {
            id,
            original: original.to_string(),
            translation: translation.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        // 先写文件，成功后再替换内存中的列表
        let mut updated = Vec::with_capacity(self.max_items);
        updated.push(entry.clone());
        updated.extend(entries.iter().take(self.max_items - 1).cloned());

        self.persist(&updated)?;
        *entries = updated;
        Ok(entry)
    }

    /// 按时间倒序列出记录
    pub fn list(&self) -> TranslationResult<Vec<HistoryEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| storage_error("历史记录锁已损坏"))?;
        Ok(entries.clone())
    }

    /// 清空记录
    pub fn clear(&self) -> TranslationResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| storage_error("历史记录锁已损坏"))?;
        self.persist(&[])?;
        entries.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    fn persist(&self, entries: &[HistoryEntry]) -> TranslationResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory(constants::DEFAULT_MAX_HISTORY_ITEMS)
    }
}

/// 翻译选中的文本，成功后写入历史记录
///
/// 写入历史失败只记录警告，不影响翻译结果。
pub async fn translate_selection<T: Translator + ?Sized>(
    translator: &T,
    history: &HistoryStore,
    text: &str,
) -> TranslationResult<String> {
    let translation = translator.translate(text).await?;

    if let Err(e) = history.add_entry(text, &translation) {
        tracing::warn!("写入历史记录失败: {}", e);
    }

    Ok(translation)
}
