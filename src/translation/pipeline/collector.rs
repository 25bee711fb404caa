//! 文本收集器模块
//!
//! 从 DOM 子树中找出可翻译的文本节点和属性值。收集过程只读 DOM，不做任何修改。
//!
//! 文本节点按先序遍历（文档顺序）输出，每个节点依次经过以下过滤：
//!
//! 1. 没有元素父节点
//! 2. 父元素属于注入的界面（class 前缀）
//! 3. 父元素是排除标签
//! 4. 父元素不可见
//! 5. 去除空白后长度不足
//! 6. 只有数字、空白和符号
//! 7. 父元素已经带有翻译标记
//!
//! 属性单元同样按文档顺序输出，同一元素上按 `placeholder`、`alt`、`title`、`aria-label` 的顺序
//! 每个属性名最多产生一个单元。属性值只经过 2、4、长度和已翻译检查，纯数字或符号的值照样收集。

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::dom::{
    collect_elements, get_node_attr, get_node_name, get_parent_element, has_class_prefix,
    has_node_attr,
};
use crate::parsers::html::style::is_hidden;
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::core::engine::is_marked;
use crate::translation::pipeline::filters::{TextFilter, TextRejection};

/// 可翻译的文本节点
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// 文本节点
    pub node: Handle,
    /// 渲染该文本的父元素
    pub parent: Handle,
    /// 去除首尾空白后的原文
    pub original_text: String,
}

/// 可翻译的属性值
#[derive(Debug, Clone)]
pub struct AttributeUnit {
    pub element: Handle,
    pub attr_name: &'static str,
    /// 去除首尾空白后的原值
    pub original_value: String,
}

/// 一次收集的结果
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub text_units: Vec<TextUnit>,
    pub attribute_units: Vec<AttributeUnit>,
}

impl Extraction {
    /// 单元总数
    pub fn len(&self) -> usize {
        self.text_units.len() + self.attribute_units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text_units.is_empty() && self.attribute_units.is_empty()
    }

    /// 待翻译文本序列：文本单元在前，属性单元在后
    pub fn texts(&self) -> Vec<String> {
        self.text_units
            .iter()
            .map(|unit| unit.original_text.clone())
            .chain(
                self.attribute_units
                    .iter()
                    .map(|unit| unit.original_value.clone()),
            )
            .collect()
    }
}

/// 收集器配置
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 最小文本长度（字符数）
    pub min_text_length: usize,
    /// 注入界面元素的 class 前缀
    pub ui_class_prefix: String,
    /// 跳过的元素标签
    pub skip_elements: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            min_text_length: constants::MIN_TEXT_LENGTH,
            ui_class_prefix: constants::UI_CLASS_PREFIX.to_string(),
            skip_elements: constants::SKIP_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl From<&TranslationConfig> for CollectorConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            min_text_length: config.min_text_length,
            ui_class_prefix: config.ui_class_prefix.clone(),
            ..Self::default()
        }
    }
}

/// 收集统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub text_nodes_visited: usize,
    pub rejected_no_parent: usize,
    pub rejected_ui: usize,
    pub rejected_skipped_element: usize,
    pub rejected_hidden: usize,
    pub rejected_too_short: usize,
    pub rejected_symbols_only: usize,
    pub rejected_already_translated: usize,
    pub attributes_found: usize,
    pub attributes_filtered: usize,
    pub text_units: usize,
    pub attribute_units: usize,
}

impl CollectionStats {
    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    pub fn total_units(&self) -> usize {
        self.text_units + self.attribute_units
    }

    pub fn total_rejected(&self) -> usize {
        self.rejected_no_parent
            + self.rejected_ui
            + self.rejected_skipped_element
            + self.rejected_hidden
            + self.rejected_too_short
            + self.rejected_symbols_only
            + self.rejected_already_translated
    }
}

/// 元素层面的拒绝原因
enum ElementRejection {
    Ui,
    SkippedElement,
    Hidden,
}

/// 文本收集器
pub struct TextCollector {
    config: CollectorConfig,
    filter: TextFilter,
    stats: CollectionStats,
}

impl TextCollector {
    /// 创建新的文本收集器
    pub fn new(config: CollectorConfig) -> Self {
        let filter = TextFilter::new(config.min_text_length);
        Self {
            config,
            filter,
            stats: CollectionStats::default(),
        }
    }

    /// 收集子树中的所有可翻译单元
    pub fn extract(&mut self, root: &Handle) -> Extraction {
        self.stats.reset();

        let mut extraction = Extraction::default();
        self.collect_text_units(root, &mut extraction.text_units);
        self.collect_attribute_units(root, &mut extraction.attribute_units);

        self.stats.text_units = extraction.text_units.len();
        self.stats.attribute_units = extraction.attribute_units.len();

        tracing::debug!(
            "收集完成: {} 个文本单元, {} 个属性单元, 拒绝 {} 个文本节点",
            self.stats.text_units,
            self.stats.attribute_units,
            self.stats.total_rejected()
        );

        extraction
    }

    fn collect_text_units(&mut self, node: &Handle, units: &mut Vec<TextUnit>) {
        for child in node.children.borrow().iter() {
            match child.data {
                NodeData::Text { ref contents } => {
                    let text = contents.borrow().to_string();
                    if let Some(unit) = self.check_text_node(child, &text) {
                        units.push(unit);
                    }
                }
                _ => self.collect_text_units(child, units),
            }
        }
    }

    fn check_text_node(&mut self, node: &Handle, text: &str) -> Option<TextUnit> {
        self.stats.text_nodes_visited += 1;

        let Some(parent) = get_parent_element(node) else {
            self.stats.rejected_no_parent += 1;
            return None;
        };

        match self.element_rejection(&parent, true) {
            Some(ElementRejection::Ui) => {
                self.stats.rejected_ui += 1;
                return None;
            }
            Some(ElementRejection::SkippedElement) => {
                self.stats.rejected_skipped_element += 1;
                return None;
            }
            Some(ElementRejection::Hidden) => {
                self.stats.rejected_hidden += 1;
                return None;
            }
            None => {}
        }

        match self.filter.check(text) {
            Err(TextRejection::TooShort) => {
                self.stats.rejected_too_short += 1;
                return None;
            }
            Err(TextRejection::SymbolsOnly) => {
                self.stats.rejected_symbols_only += 1;
                return None;
            }
            Ok(()) => {}
        }

        if is_marked(&parent, constants::TRANSLATED_MARKER) {
            self.stats.rejected_already_translated += 1;
            return None;
        }

        Some(TextUnit {
            node: node.clone(),
            parent,
            original_text: text.trim().to_string(),
        })
    }

    /// 元素层面的过滤（2、3、4）。`check_tag` 为 `false` 时跳过排除标签检查
    fn element_rejection(&self, element: &Handle, check_tag: bool) -> Option<ElementRejection> {
        if has_class_prefix(element, &self.config.ui_class_prefix) {
            return Some(ElementRejection::Ui);
        }

        if check_tag {
            if let Some(name) = get_node_name(element) {
                if self
                    .config
                    .skip_elements
                    .iter()
                    .any(|skip| skip.eq_ignore_ascii_case(name))
                {
                    return Some(ElementRejection::SkippedElement);
                }
            }
        }

        if is_hidden(element) {
            return Some(ElementRejection::Hidden);
        }

        None
    }

    fn collect_attribute_units(&mut self, root: &Handle, units: &mut Vec<AttributeUnit>) {
        let mut elements = Vec::new();
        collect_elements(root, &mut elements);

        for element in elements.iter() {
            let Some(name) = get_node_name(element) else {
                continue;
            };

            for selector in constants::TRANSLATABLE_ATTRS {
                if !selector.tags.is_empty() && !selector.tags.contains(&name) {
                    continue;
                }

                let Some(value) = get_node_attr(element, selector.attr) else {
                    continue;
                };
                self.stats.attributes_found += 1;

                if self.accept_attribute(element, selector.attr, &value) {
                    units.push(AttributeUnit {
                        element: element.clone(),
                        attr_name: selector.attr,
                        original_value: value.trim().to_string(),
                    });
                } else {
                    self.stats.attributes_filtered += 1;
                }
            }
        }
    }

    fn accept_attribute(&self, element: &Handle, attr_name: &str, value: &str) -> bool {
        if self.element_rejection(element, false).is_some() {
            return false;
        }

        if !self.filter.is_long_enough(value) {
            return false;
        }

        let original_key = format!("{}{}", constants::ORIGINAL_ATTR_PREFIX, attr_name);
        !has_node_attr(element, &original_key)
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> &CollectionStats {
        &self.stats
    }

    /// 重置统计信息
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl Default for TextCollector {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}

/// 便利函数：使用默认配置收集
pub fn extract(root: &Handle) -> Extraction {
    TextCollector::default().extract(root)
}
