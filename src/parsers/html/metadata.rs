//! HTML 文档元数据处理模块
//!
//! 读取字符编码声明和文档标题，供命令行读写文档时使用。

use markup5ever_rcdom::{Handle, NodeData};

use super::dom::{find_nodes, get_node_attr};

/// 从 `Content-Type` 值中取出 charset 参数
pub fn parse_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let part = part.trim();
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// 获取文档字符编码
///
/// 支持两种格式：
/// 1. HTML5 格式：`<meta charset="utf-8">`
/// 2. HTML4 格式：`<meta http-equiv="content-type" content="text/html; charset=utf-8">`
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, &["html", "head", "meta"]).iter() {
        if let Some(meta_charset_node_attr_value) = get_node_attr(meta_node, "charset") {
            return Some(meta_charset_node_attr_value);
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(content) = get_node_attr(meta_node, "content") {
                return parse_charset(&content);
            }
        }
    }

    None
}

/// 获取文档标题
pub fn get_title(node: &Handle) -> Option<String> {
    for title_node in find_nodes(node, &["html", "head", "title"]).iter() {
        for child_node in title_node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child_node.data {
                return Some(contents.borrow().trim().to_string());
            }
        }
    }

    None
}
