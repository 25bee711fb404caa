// 集成测试公共模块
//
// 提供测试页面、可编排的翻译客户端和断言辅助

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use markup5ever_rcdom::{Handle, RcDom};

use page_translator::parsers::html::{find_nodes, get_text_content, html_to_dom, serialize_document};
use page_translator::translation::client::Translator;
use page_translator::translation::config::TranslationConfig;
use page_translator::translation::error::{TranslationError, TranslationResult};

/// 测试配置：批次之间不等待
pub fn test_config() -> TranslationConfig {
    let mut config = TranslationConfig::default();
    config.batch_delay_ms = 0;
    config.api_key = Some("test-api-key".to_string());
    config
}

/// 测试页面辅助
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").unwrap()
    }

    pub fn serialize(dom: &RcDom) -> String {
        String::from_utf8(serialize_document(&dom.document, "utf-8").unwrap()).unwrap()
    }

    /// 包含文本、属性、排除标签和隐藏元素的页面
    pub fn create_mixed_page() -> String {
        r#"<!DOCTYPE html>
<html>
<head><title>Mixed Page</title><style>p { color: red; }</style></head>
<body>
  <div class="page-translator-bar">Injected toolbar text</div>
  <h1>Welcome to the store</h1>
  <p>Fresh bread every morning</p>
  <script>var greeting = "Hello script";</script>
  <code>let value = compute();</code>
  <p style="display: none">Hidden paragraph text</p>
  <div style="visibility:hidden"><span>Invisible span text</span></div>
  <p>2024 - 2025</p>
  <p>ok</p>
  <input type="search" placeholder="Search products">
  <img src="bread.png" alt="Loaf of bread">
  <a href="/cart" title="Open your cart" aria-label="Shopping cart">Cart items</a>
</body>
</html>"#
            .to_string()
    }

    /// `count` 个段落，文本互不相同
    pub fn create_paragraph_page(count: usize) -> String {
        let paragraphs: String = (1..=count)
            .map(|i| format!("<p>Paragraph number {} text</p>", i))
            .collect();
        format!("<html><body>{}</body></html>", paragraphs)
    }

    /// 按路径取所有元素的文本
    pub fn texts_at(dom: &RcDom, path: &[&str]) -> Vec<String> {
        find_nodes(&dom.document, path)
            .iter()
            .map(Self::text_of)
            .collect()
    }

    pub fn text_of(element: &Handle) -> String {
        element
            .children
            .borrow()
            .iter()
            .filter_map(get_text_content)
            .collect()
    }
}

/// 可编排的翻译客户端
///
/// 默认返回 `TR:<原文>`。每次调用都会让出一次执行权，便于测试并发的启动请求。
pub struct ScriptedTranslator {
    calls: RefCell<Vec<String>>,
    fail_marker: Option<String>,
    quota_after: Option<usize>,
    successes: Cell<usize>,
}

impl ScriptedTranslator {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_marker: None,
            quota_after: None,
            successes: Cell::new(0),
        }
    }

    /// 原文包含 `marker` 时返回服务错误
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    /// 成功 `count` 次之后返回配额耗尽
    pub fn with_quota_after(mut self, count: usize) -> Self {
        self.quota_after = Some(count);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn translation_of(text: &str) -> String {
        format!("TR:{}", text)
    }
}

impl Default for ScriptedTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Translator for ScriptedTranslator {
    async fn translate(&self, text: &str) -> TranslationResult<String> {
        self.calls.borrow_mut().push(text.to_string());
        tokio::task::yield_now().await;

        if let Some(limit) = self.quota_after {
            if self.successes.get() >= limit {
                return Err(TranslationError::QuotaExceeded(
                    "You exceeded your current quota".to_string(),
                ));
            }
        }

        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(TranslationError::TranslationServiceError(
                    "API Error: 500".to_string(),
                ));
            }
        }

        self.successes.set(self.successes.get() + 1);
        Ok(Self::translation_of(text))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
