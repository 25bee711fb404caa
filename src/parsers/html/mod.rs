//! HTML解析和DOM操作模块
//!
//! - `dom`: 基础DOM操作（查找、属性、父子关系、挂载检查）
//! - `style`: 内联样式解析和可见性判断
//! - `metadata`: 文档元数据（字符编码、标题）
//! - `serializer`: 序列化功能

pub mod dom;
pub mod metadata;
pub mod serializer;
pub mod style;

pub use dom::{
    child_index, collect_elements, collect_text_nodes, find_nodes, get_body_node,
    get_child_node_by_name, get_node_attr, get_node_attr_names, get_node_name, get_parent_element,
    get_parent_node, get_text_content, has_class_prefix, has_node_attr, html_to_dom, is_attached,
    is_element, remove_node, set_node_attr, set_text_content,
};
pub use metadata::{get_charset, get_title};
pub use serializer::serialize_document;
pub use style::{inline_style, is_hidden};
