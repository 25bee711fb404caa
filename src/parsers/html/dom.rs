use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> std::io::Result<RcDom> {
    let s: String = if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        string.to_string()
    } else {
        String::from_utf8_lossy(data).to_string()
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();

    let Some((node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    match node.data {
        NodeData::Element { ref name, .. } if &*name.local == *node_name => {
            if rest.is_empty() {
                found_nodes.push(node.clone());
                for child_node in node.children.borrow().iter() {
                    found_nodes.append(&mut find_nodes(child_node, node_names));
                }
            } else {
                for child_node in node.children.borrow().iter() {
                    found_nodes.append(&mut find_nodes(child_node, rest));
                }
            }
        }
        _ => {
            for child_node in node.children.borrow().iter() {
                found_nodes.append(&mut find_nodes(child_node, node_names));
            }
        }
    }

    found_nodes
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取文档的 `<body>` 元素
pub fn get_body_node(document: &Handle) -> Option<Handle> {
    get_child_node_by_name(document, "html").and_then(|html| get_child_node_by_name(&html, "body"))
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取元素的全部属性名
pub fn get_node_attr_names(node: &Handle) -> Vec<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|attr| attr.name.local.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// 检查节点是否带有指定属性
pub fn has_node_attr(node: &Handle, attr_name: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .any(|attr| &*attr.name.local == attr_name),
        _ => false,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 是否为元素节点
pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// 获取父节点
///
/// `parent` 是 `Cell<Option<Weak>>`，读取时必须先取出再放回，否则会清空父引用。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 获取父元素（父节点不是元素时返回 `None`）
pub fn get_parent_element(child: &Handle) -> Option<Handle> {
    get_parent_node(child).filter(is_element)
}

/// 节点在父节点子列表中的位置
pub fn child_index(parent: &Handle, child: &Handle) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|node| Rc::ptr_eq(node, child))
}

/// 判断节点是否仍挂在文档树上
///
/// 沿父链向上走到文档根，并确认每一级父节点的子列表仍然包含当前节点。
/// 被重新渲染替换掉的节点会在某一级断开。
pub fn is_attached(node: &Handle, document: &Handle) -> bool {
    let mut current = node.clone();

    loop {
        if Rc::ptr_eq(&current, document) {
            return true;
        }

        match get_parent_node(&current) {
            Some(parent) => {
                if child_index(&parent, &current).is_none() {
                    return false;
                }
                current = parent;
            }
            None => return false,
        }
    }
}

/// 从父节点中移除节点
pub fn remove_node(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

/// 读取文本节点内容
pub fn get_text_content(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 替换文本节点内容，非文本节点返回 `false`
pub fn set_text_content(node: &Handle, text: &str) -> bool {
    match &node.data {
        NodeData::Text { contents } => {
            let mut contents = contents.borrow_mut();
            contents.clear();
            contents.push_slice(text);
            true
        }
        _ => false,
    }
}

/// 按文档顺序（先序）收集子树中的所有文本节点
pub fn collect_text_nodes(node: &Handle, found: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        match child.data {
            NodeData::Text { .. } => found.push(child.clone()),
            _ => collect_text_nodes(child, found),
        }
    }
}

/// 按文档顺序（先序）收集子树中的所有元素，包含根节点本身
pub fn collect_elements(node: &Handle, found: &mut Vec<Handle>) {
    if is_element(node) {
        found.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        collect_elements(child, found);
    }
}

/// 检查元素是否有以指定前缀开头的 class
pub fn has_class_prefix(node: &Handle, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }

    get_node_attr(node, "class")
        .map(|class| class.split_ascii_whitespace().any(|c| c.starts_with(prefix)))
        .unwrap_or(false)
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::LocalName;

    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            // Add new attribute (since originally the target node didn't have it)
            if let Some(attr_value) = attr_value {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").unwrap()
    }

    #[test]
    fn test_get_parent_node_keeps_link() {
        let dom = dom("<html><body><p>Hello there</p></body></html>");
        let p = find_nodes(&dom.document, &["html", "body", "p"])[0].clone();

        let first = get_parent_node(&p).unwrap();
        let second = get_parent_node(&p).unwrap();

        assert_eq!(get_node_name(&first), Some("body"));
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_is_attached_after_removal() {
        let dom = dom("<html><body><div><p>Hello there</p></div></body></html>");
        let div = find_nodes(&dom.document, &["html", "body", "div"])[0].clone();
        let p = find_nodes(&dom.document, &["html", "body", "div", "p"])[0].clone();

        assert!(is_attached(&p, &dom.document));

        remove_node(&div);

        assert!(!is_attached(&div, &dom.document));
        assert!(!is_attached(&p, &dom.document));
    }

    #[test]
    fn test_set_node_attr_add_update_remove() {
        let dom = dom("<html><body><input placeholder=\"Search\"></body></html>");
        let input = find_nodes(&dom.document, &["html", "body", "input"])[0].clone();

        set_node_attr(&input, "placeholder", Some("Ara".to_string()));
        assert_eq!(get_node_attr(&input, "placeholder").as_deref(), Some("Ara"));

        set_node_attr(&input, "data-original-placeholder", Some("Search".to_string()));
        assert!(has_node_attr(&input, "data-original-placeholder"));

        set_node_attr(&input, "data-original-placeholder", None);
        assert!(!has_node_attr(&input, "data-original-placeholder"));
    }

    #[test]
    fn test_has_class_prefix() {
        let dom = dom("<html><body><div class=\"card page-translator-bar\">Hi</div></body></html>");
        let div = find_nodes(&dom.document, &["html", "body", "div"])[0].clone();

        assert!(has_class_prefix(&div, "page-translator-"));
        assert!(!has_class_prefix(&div, "other-"));
        assert!(!has_class_prefix(&div, ""));
    }

    #[test]
    fn test_collect_text_nodes_document_order() {
        let dom = dom("<html><body><p>one<b>two</b></p><p>three</p></body></html>");
        let body = get_body_node(&dom.document).unwrap();
        let mut nodes = Vec::new();
        collect_text_nodes(&body, &mut nodes);

        let texts: Vec<String> = nodes.iter().filter_map(get_text_content).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }
}
