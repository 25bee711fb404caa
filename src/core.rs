use chrono::{SecondsFormat, Utc};
use encoding_rs::Encoding;
use markup5ever_rcdom::RcDom;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::parsers::html::{get_charset, html_to_dom, serialize_document};

/// Represents errors that can occur while reading, translating or writing a page
#[derive(Debug)]
pub struct PageError {
    details: String,
}

impl PageError {
    /// Creates a new PageError with the given message
    pub fn new(msg: &str) -> PageError {
        PageError {
            details: msg.to_string(),
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for PageError {}

impl From<io::Error> for PageError {
    fn from(error: io::Error) -> Self {
        PageError::new(&error.to_string())
    }
}

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";
const DEFAULT_ENCODING: &str = "utf-8";

/// 已解析的页面及其字符编码
pub struct Document {
    pub dom: RcDom,
    pub encoding: String,
}

/// 解析 HTML 字节
///
/// 先按 UTF-8 解析，文档自己声明了有效的字符集时再按该字符集重新解析。
pub fn parse_document(data: &[u8]) -> Result<Document, PageError> {
    let mut encoding = DEFAULT_ENCODING.to_string();
    let mut dom = html_to_dom(data, &encoding)?;

    if let Some(charset) = get_charset(&dom.document) {
        if let Some(document_charset) = Encoding::for_label_no_replacement(charset.as_bytes()) {
            if document_charset != encoding_rs::UTF_8 {
                tracing::debug!("文档声明字符集: {}", document_charset.name());
                encoding = document_charset.name().to_string();
                dom = html_to_dom(data, &encoding)?;
            }
        }
    }

    Ok(Document { dom, encoding })
}

/// 从文件读取页面，路径为 `-` 时读取标准输入
pub fn read_document(path: &str) -> Result<Document, PageError> {
    let data = if path == "-" {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        buffer
    } else {
        fs::read(path).map_err(|e| PageError::new(&format!("无法读取 {}: {}", path, e)))?
    };

    parse_document(&data)
}

/// 按文档原有的字符编码输出页面，没有路径或路径为 `-` 时写到标准输出
pub fn write_document(document: &Document, path: Option<&str>) -> Result<(), PageError> {
    let data = serialize_document(&document.dom.document, &document.encoding)?;

    match path {
        Some(path) if path != "-" => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, data)
                .map_err(|e| PageError::new(&format!("无法写入 {}: {}", path, e)))?;
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// 展开输出路径中的占位符：`%title%`、`%timestamp%`、`%lang%`
pub fn format_output_path(path: &str, document_title: Option<&str>, target_lang: &str) -> String {
    let datetime: &str = &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let title = document_title.unwrap_or("");

    path.replace("%timestamp%", &datetime.replace(':', "_"))
        .replace("%title%", &sanitize_path_segment(title))
        .replace("%lang%", &sanitize_path_segment(target_lang))
}

fn sanitize_path_segment(value: &str) -> String {
    value
        .replace(['/', '\\'], "_")
        .replace('<', "[")
        .replace('>', "]")
        .replace(':', " - ")
        .replace('\"', "")
        .replace('|', "-")
        .replace('?', "")
        .trim_start_matches('.')
        .to_string()
}

/// Prints an error message to stderr
pub fn print_error_message(msg: &str) {
    eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
}

/// Prints an info message to stdout
pub fn print_info_message(msg: &str) {
    println!("{msg}");
}
