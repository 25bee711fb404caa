//! 应用与还原引擎
//!
//! 这个模块是唯一会根据翻译状态修改 DOM 的组件。翻译状态全部保存在 DOM 属性上：
//!
//! ## 标记
//! - 文本区域：父元素带 `data-translated="true"`，每个被替换的文本子节点的原文保存在
//!   父元素的 `data-original-text-<子节点序号>` 上
//! - 属性区域：元素带 `data-attr-translated="true"`，每个被替换的属性原值保存在
//!   `data-original-<属性名>` 上
//!
//! ## 节点有效性
//! 收集到的节点句柄在等待网络响应期间可能已经被页面替换。应用前会重新确认文本节点
//! 和父元素仍然挂在文档上，失效的单元只计为失败，不会报错。
//!
//! ## 使用示例
//! ```rust
//! use page_translator::parsers::html::html_to_dom;
//! use page_translator::translation::client::TranslationOutcome;
//! use page_translator::translation::core::TranslationEngine;
//!
//! let dom = html_to_dom(b"<html><body><p>Hello world</p></body></html>", "utf-8").unwrap();
//! let engine = TranslationEngine::new(dom.document.clone());
//!
//! let (extraction, _) = engine.extract();
//! let results = vec![TranslationOutcome::success("Merhaba dünya")];
//! let report = engine.apply(&extraction, &results);
//!
//! assert_eq!(report.success_count, 1);
//! assert!(engine.is_translated());
//! assert_eq!(engine.restore(), 1);
//! ```

use markup5ever_rcdom::{Handle, NodeData};
use serde::{Deserialize, Serialize};

use crate::parsers::html::dom::{
    child_index, collect_elements, get_body_node, get_node_attr, get_node_attr_names,
    get_parent_node, is_attached, set_node_attr, set_text_content,
};
use crate::translation::client::TranslationOutcome;
use crate::translation::config::constants;
use crate::translation::pipeline::collector::{
    AttributeUnit, CollectionStats, CollectorConfig, Extraction, TextCollector, TextUnit,
};

/// 应用结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub success_count: usize,
    pub failure_count: usize,
    /// 失败中因节点脱离文档而跳过的数量
    pub detached: usize,
}

impl ApplyReport {
    /// 合并两次应用的统计
    pub fn merge(self, other: ApplyReport) -> ApplyReport {
        ApplyReport {
            success_count: self.success_count + other.success_count,
            failure_count: self.failure_count + other.failure_count,
            detached: self.detached + other.detached,
        }
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// 页面翻译统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    /// 带标记的元素数量
    pub translated: usize,
    pub total: usize,
    /// 重新收集时仍会得到的单元数量
    pub remaining: usize,
    pub percentage: u32,
}

impl PageStats {
    pub fn new(translated: usize, remaining: usize) -> Self {
        let total = translated + remaining;
        let percentage = if total == 0 {
            0
        } else {
            (100.0 * translated as f64 / total as f64).round() as u32
        };

        Self {
            translated,
            total,
            remaining,
            percentage,
        }
    }
}

/// 元素是否带有值为 `true` 的标记
pub fn is_marked(element: &Handle, marker: &str) -> bool {
    get_node_attr(element, marker).as_deref() == Some("true")
}

/// 文本原文在父元素上的属性名
pub fn original_text_key(index: usize) -> String {
    format!("{}{}", constants::ORIGINAL_TEXT_PREFIX, index)
}

/// 属性原值的属性名
pub fn original_attr_key(attr_name: &str) -> String {
    format!("{}{}", constants::ORIGINAL_ATTR_PREFIX, attr_name)
}

/// 应用与还原引擎
///
/// 引擎只持有文档根节点。所有持久状态都写在 DOM 属性上，因此同一文档可以由不同的
/// 引擎实例还原。
pub struct TranslationEngine {
    document: Handle,
    collector_config: CollectorConfig,
}

impl TranslationEngine {
    /// 创建新的引擎
    pub fn new(document: Handle) -> Self {
        Self::with_collector_config(document, CollectorConfig::default())
    }

    pub fn with_collector_config(document: Handle, collector_config: CollectorConfig) -> Self {
        Self {
            document,
            collector_config,
        }
    }

    pub fn document(&self) -> &Handle {
        &self.document
    }

    /// 收集的起点：`<body>`，没有时使用整个文档
    pub fn root(&self) -> Handle {
        get_body_node(&self.document).unwrap_or_else(|| self.document.clone())
    }

    /// 对当前文档做一次全新的收集
    pub fn extract(&self) -> (Extraction, CollectionStats) {
        let mut collector = TextCollector::new(self.collector_config.clone());
        let extraction = collector.extract(&self.root());
        (extraction, collector.get_stats().clone())
    }

    /// 应用完整的结果序列：前半部分对应文本单元，后半部分对应属性单元
    pub fn apply(&self, extraction: &Extraction, results: &[TranslationOutcome]) -> ApplyReport {
        let split = extraction.text_units.len().min(results.len());
        let (text_results, attribute_results) = results.split_at(split);

        let text_report = self.apply_text(&extraction.text_units, text_results);
        let attribute_report = self.apply_attributes(&extraction.attribute_units, attribute_results);

        text_report.merge(attribute_report)
    }

    /// 按序号配对应用文本翻译
    ///
    /// 以下情况计为失败并跳过：没有对应结果、结果失败、译文为空、节点或父元素已脱离文档。
    /// 原文只在第一次修改时记录，父元素只标记一次。
    pub fn apply_text(&self, units: &[TextUnit], results: &[TranslationOutcome]) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (index, unit) in units.iter().enumerate() {
            let Some(translated) = results.get(index).and_then(|r| r.translated_text()) else {
                tracing::debug!("文本单元 {} 没有可用译文", index);
                report.failure_count += 1;
                continue;
            };

            if !self.apply_text_unit(unit, translated) {
                tracing::warn!("文本单元 {} 的节点已脱离文档", index);
                report.failure_count += 1;
                report.detached += 1;
                continue;
            }

            report.success_count += 1;
        }

        tracing::debug!(
            "文本应用完成: {} 成功, {} 失败",
            report.success_count,
            report.failure_count
        );
        report
    }

    fn apply_text_unit(&self, unit: &TextUnit, translated: &str) -> bool {
        if !is_attached(&unit.node, &self.document) || !is_attached(&unit.parent, &self.document) {
            return false;
        }

        // 节点可能已被移动到别的父元素下
        let same_parent = get_parent_node(&unit.node)
            .map(|parent| std::rc::Rc::ptr_eq(&parent, &unit.parent))
            .unwrap_or(false);
        if !same_parent {
            return false;
        }

        let Some(position) = child_index(&unit.parent, &unit.node) else {
            return false;
        };

        let NodeData::Text { contents } = &unit.node.data else {
            return false;
        };

        let key = original_text_key(position);
        if get_node_attr(&unit.parent, &key).is_none() {
            let original = contents.borrow().to_string();
            set_node_attr(&unit.parent, &key, Some(original));
        }

        if !is_marked(&unit.parent, constants::TRANSLATED_MARKER) {
            set_node_attr(
                &unit.parent,
                constants::TRANSLATED_MARKER,
                Some("true".to_string()),
            );
        }

        set_text_content(&unit.node, translated)
    }

    /// 按序号配对应用属性翻译
    pub fn apply_attributes(
        &self,
        units: &[AttributeUnit],
        results: &[TranslationOutcome],
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (index, unit) in units.iter().enumerate() {
            let Some(translated) = results.get(index).and_then(|r| r.translated_text()) else {
                report.failure_count += 1;
                continue;
            };

            if !is_attached(&unit.element, &self.document) {
                tracing::warn!("属性单元 {} 的元素已脱离文档", index);
                report.failure_count += 1;
                report.detached += 1;
                continue;
            }

            let key = original_attr_key(unit.attr_name);
            if get_node_attr(&unit.element, &key).is_none() {
                let original = get_node_attr(&unit.element, unit.attr_name).unwrap_or_default();
                set_node_attr(&unit.element, &key, Some(original));
            }

            if !is_marked(&unit.element, constants::ATTR_TRANSLATED_MARKER) {
                set_node_attr(
                    &unit.element,
                    constants::ATTR_TRANSLATED_MARKER,
                    Some("true".to_string()),
                );
            }

            set_node_attr(&unit.element, unit.attr_name, Some(translated.to_string()));
            report.success_count += 1;
        }

        tracing::debug!(
            "属性应用完成: {} 成功, {} 失败",
            report.success_count,
            report.failure_count
        );
        report
    }

    /// 还原所有带标记的文本和属性，返回还原的数量
    pub fn restore(&self) -> usize {
        let mut elements = Vec::new();
        collect_elements(&self.document, &mut elements);

        let mut restored = 0;

        for element in elements
            .iter()
            .filter(|e| is_marked(e, constants::TRANSLATED_MARKER))
        {
            restored += restore_text_region(element);
        }

        for element in elements
            .iter()
            .filter(|e| is_marked(e, constants::ATTR_TRANSLATED_MARKER))
        {
            restored += restore_attribute_region(element);
        }

        tracing::info!("还原完成: {} 项", restored);
        restored
    }

    /// 是否至少有一个元素带有翻译标记
    pub fn is_translated(&self) -> bool {
        let mut elements = Vec::new();
        collect_elements(&self.document, &mut elements);

        elements.iter().any(|element| {
            is_marked(element, constants::TRANSLATED_MARKER)
                || is_marked(element, constants::ATTR_TRANSLATED_MARKER)
        })
    }

    /// 当前页面的翻译统计
    pub fn stats(&self) -> PageStats {
        let mut elements = Vec::new();
        collect_elements(&self.document, &mut elements);

        let translated = elements
            .iter()
            .filter(|e| is_marked(e, constants::TRANSLATED_MARKER))
            .count()
            + elements
                .iter()
                .filter(|e| is_marked(e, constants::ATTR_TRANSLATED_MARKER))
                .count();

        let (extraction, _) = self.extract();
        PageStats::new(translated, extraction.len())
    }
}

/// 还原一个文本区域，返回还原的文本节点数
fn restore_text_region(element: &Handle) -> usize {
    let mut restored = 0;

    for name in get_node_attr_names(element) {
        let Some(position) = name
            .strip_prefix(constants::ORIGINAL_TEXT_PREFIX)
            .and_then(|index| index.parse::<usize>().ok())
        else {
            continue;
        };

        let original = get_node_attr(element, &name).unwrap_or_default();
        let child = element.children.borrow().get(position).cloned();

        match child {
            Some(child) if set_text_content(&child, &original) => restored += 1,
            _ => tracing::warn!("无法还原 {}: 子节点已不存在", name),
        }

        set_node_attr(element, &name, None);
    }

    set_node_attr(element, constants::TRANSLATED_MARKER, None);
    restored
}

/// 还原一个属性区域，返回还原的属性数
fn restore_attribute_region(element: &Handle) -> usize {
    let mut restored = 0;

    for selector in constants::TRANSLATABLE_ATTRS {
        let key = original_attr_key(selector.attr);
        if let Some(original) = get_node_attr(element, &key) {
            set_node_attr(element, selector.attr, Some(original));
            set_node_attr(element, &key, None);
            restored += 1;
        }
    }

    set_node_attr(element, constants::ATTR_TRANSLATED_MARKER, None);
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_nodes, get_text_content, html_to_dom, remove_node};
    use markup5ever_rcdom::RcDom;

    fn dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").unwrap()
    }

    fn first(dom: &RcDom, path: &[&str]) -> Handle {
        find_nodes(&dom.document, path)[0].clone()
    }

    fn text_of(element: &Handle) -> String {
        element
            .children
            .borrow()
            .iter()
            .filter_map(get_text_content)
            .collect()
    }

    #[test]
    fn test_apply_scenario() {
        let dom = dom(r#"<html><body><p>Hello world</p><input placeholder="Search"></body></html>"#);
        let engine = TranslationEngine::new(dom.document.clone());

        let (extraction, _) = engine.extract();
        assert_eq!(extraction.len(), 2);

        let report = engine.apply(
            &extraction,
            &[
                TranslationOutcome::success("Merhaba dünya"),
                TranslationOutcome::success("Ara"),
            ],
        );
        assert_eq!(report, ApplyReport { success_count: 2, failure_count: 0, detached: 0 });

        let p = first(&dom, &["html", "body", "p"]);
        let input = first(&dom, &["html", "body", "input"]);
        assert_eq!(text_of(&p), "Merhaba dünya");
        assert_eq!(get_node_attr(&input, "placeholder").as_deref(), Some("Ara"));
        assert!(is_marked(&p, constants::TRANSLATED_MARKER));
        assert!(is_marked(&input, constants::ATTR_TRANSLATED_MARKER));

        assert_eq!(
            engine.stats(),
            PageStats {
                translated: 2,
                total: 2,
                remaining: 0,
                percentage: 100
            }
        );
    }

    #[test]
    fn test_restore_is_exact_inverse() {
        let html = "<html><body><div title=\" Spaced title \">  Leading and trailing  <b>Bold words</b></div></body></html>";
        let dom = dom(html);
        let engine = TranslationEngine::new(dom.document.clone());

        let (extraction, _) = engine.extract();
        let results: Vec<TranslationOutcome> = extraction
            .texts()
            .iter()
            .map(|text| TranslationOutcome::success(format!("[{}]", text)))
            .collect();
        engine.apply(&extraction, &results);

        let div = first(&dom, &["html", "body", "div"]);
        assert_eq!(get_node_attr(&div, "title").as_deref(), Some("[Spaced title]"));

        assert_eq!(engine.restore(), 3);

        let b = first(&dom, &["html", "body", "div", "b"]);
        assert_eq!(text_of(&div), "  Leading and trailing  ");
        assert_eq!(text_of(&b), "Bold words");
        assert_eq!(get_node_attr(&div, "title").as_deref(), Some(" Spaced title "));
        assert!(get_node_attr_names(&div).iter().all(|n| !n.starts_with("data-")));
        assert!(!engine.is_translated());
        assert_eq!(engine.stats().translated, 0);
    }

    #[test]
    fn test_failures_and_missing_results() {
        let dom = dom("<html><body><p>First text</p><p>Second text</p><p>Third text</p></body></html>");
        let engine = TranslationEngine::new(dom.document.clone());
        let (extraction, _) = engine.extract();

        let report = engine.apply_text(
            &extraction.text_units,
            &[
                TranslationOutcome::success("Birinci"),
                TranslationOutcome::failure("API Error: 500", "Second text"),
            ],
        );

        assert_eq!(report.success_count, 1);
        assert_eq!(report.failure_count, 2);
        assert_eq!(engine.stats().translated, 1);
    }

    #[test]
    fn test_empty_translation_is_failure() {
        let dom = dom("<html><body><p>Some words</p></body></html>");
        let engine = TranslationEngine::new(dom.document.clone());
        let (extraction, _) = engine.extract();

        let report = engine.apply(&extraction, &[TranslationOutcome::success("")]);

        assert_eq!(report.failure_count, 1);
        assert!(!engine.is_translated());
    }

    #[test]
    fn test_detached_node_is_skipped() {
        let dom = dom("<html><body><section><p>Will vanish</p></section><p>Stays here</p></body></html>");
        let engine = TranslationEngine::new(dom.document.clone());
        let (extraction, _) = engine.extract();

        remove_node(&first(&dom, &["html", "body", "section"]));

        let report = engine.apply(
            &extraction,
            &[
                TranslationOutcome::success("Kaybolacak"),
                TranslationOutcome::success("Burada kalır"),
            ],
        );

        assert_eq!(report, ApplyReport { success_count: 1, failure_count: 1, detached: 1 });
        assert_eq!(engine.restore(), 1);
    }

    #[test]
    fn test_original_recorded_once() {
        let dom = dom("<html><body><p>Original words</p></body></html>");
        let engine = TranslationEngine::new(dom.document.clone());
        let (extraction, _) = engine.extract();

        engine.apply(&extraction, &[TranslationOutcome::success("First pass")]);
        engine.apply(&extraction, &[TranslationOutcome::success("Second pass")]);

        let p = first(&dom, &["html", "body", "p"]);
        assert_eq!(text_of(&p), "Second pass");
        assert_eq!(
            get_node_attr(&p, &original_text_key(0)).as_deref(),
            Some("Original words")
        );

        engine.restore();
        assert_eq!(text_of(&p), "Original words");
    }

    #[test]
    fn test_page_stats_rounding() {
        assert_eq!(PageStats::new(0, 0).percentage, 0);
        assert_eq!(PageStats::new(1, 2).percentage, 33);
        assert_eq!(PageStats::new(2, 1).percentage, 67);
        assert_eq!(PageStats::new(1, 1).total, 2);
    }
}
