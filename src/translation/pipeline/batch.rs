//! 翻译批次模块
//!
//! 把有序的待翻译文本切分为固定大小的批次。切分是纯函数：不重排、不去重，
//! 最后一个批次保存余数（1..=size 个元素）。
//!
//! ## 使用示例
//!
//! ```rust
//! use page_translator::translation::pipeline::batch::create_batches;
//!
//! let texts: Vec<String> = (0..23).map(|i| format!("text {i}")).collect();
//! let batches = create_batches(&texts, 10);
//!
//! assert_eq!(batches.len(), 3);
//! assert_eq!(batches[2].offset, 20);
//! assert_eq!(batches[2].len(), 3);
//! ```

/// 翻译批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 批次序号，从 0 开始
    pub id: usize,
    /// 第一个元素在整个序列中的位置
    pub offset: usize,
    /// 批次内的文本
    pub items: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 批次覆盖的序列范围
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.items.len()
    }
}

/// 按固定大小切分文本序列，只返回文本
///
/// `size` 为 0 时按 1 处理。
pub fn batch(items: &[String], size: usize) -> Vec<Vec<String>> {
    items.chunks(size.max(1)).map(|chunk| chunk.to_vec()).collect()
}

/// 按固定大小切分文本序列，附带批次序号和偏移
pub fn create_batches(items: &[String], size: usize) -> Vec<Batch> {
    let size = size.max(1);

    items
        .chunks(size)
        .enumerate()
        .map(|(id, chunk)| Batch {
            id,
            offset: id * size,
            items: chunk.to_vec(),
        })
        .collect()
}
