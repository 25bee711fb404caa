//! 内联样式与可见性判断
//!
//! 只读取元素自身的 `style` 属性和 `hidden` 属性，不计算样式表。

use cssparser::{Parser, ParserInput, Token};
use markup5ever_rcdom::Handle;

use super::dom::{get_node_attr, get_parent_element, has_node_attr};

/// 单条 CSS 声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    pub property: String,
    pub value: String,
}

/// 解析声明列表（`style` 属性的内容）
///
/// 属性名和值中的标识符统一转为小写，`!important` 被忽略。
pub fn parse_declarations(css: &str) -> Vec<StyleDeclaration> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    let mut declarations = Vec::new();
    let mut property: Option<String> = None;
    let mut in_value = false;
    let mut after_bang = false;
    let mut value: Vec<String> = Vec::new();

    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::Semicolon => {
                if let (Some(property), true) = (property.take(), in_value) {
                    declarations.push(StyleDeclaration {
                        property,
                        value: value.join(" "),
                    });
                }
                value.clear();
                in_value = false;
                after_bang = false;
            }
            Token::Colon if property.is_some() && !in_value => in_value = true,
            Token::Ident(ident) if !in_value => {
                property = Some(ident.to_ascii_lowercase());
            }
            Token::Ident(ident) => {
                if after_bang {
                    after_bang = false;
                } else {
                    value.push(ident.to_ascii_lowercase());
                }
            }
            Token::Delim('!') if in_value => after_bang = true,
            _ => {}
        }
    }

    if let (Some(property), true) = (property, in_value) {
        declarations.push(StyleDeclaration {
            property,
            value: value.join(" "),
        });
    }

    declarations
}

/// 读取元素的内联样式声明
pub fn inline_style(node: &Handle) -> Vec<StyleDeclaration> {
    get_node_attr(node, "style")
        .map(|style| parse_declarations(&style))
        .unwrap_or_default()
}

/// 内联样式中某个属性最后一次声明的值
pub fn inline_style_value(node: &Handle, property: &str) -> Option<String> {
    inline_style(node)
        .into_iter()
        .rev()
        .find(|declaration| declaration.property == property)
        .map(|declaration| declaration.value)
}

/// 判断元素是否不可见
///
/// - 自身 `display: none` 或带 `hidden` 属性
/// - 生效的 `visibility` 为 `hidden` 或 `collapse`（从最近声明了 `visibility` 的祖先继承）
pub fn is_hidden(element: &Handle) -> bool {
    if has_node_attr(element, "hidden") {
        return true;
    }

    if inline_style_value(element, "display").as_deref() == Some("none") {
        return true;
    }

    let mut current = Some(element.clone());
    while let Some(node) = current {
        if let Some(visibility) = inline_style_value(&node, "visibility") {
            return matches!(visibility.as_str(), "hidden" | "collapse");
        }
        current = get_parent_element(&node);
    }

    false
}
