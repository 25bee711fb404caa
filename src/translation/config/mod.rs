//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const DEFAULT_BATCH_SIZE: usize = 10;
    pub const BATCH_DELAY_MS: u64 = 500;

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 3;
    pub const UI_CLASS_PREFIX: &str = "page-translator-";

    // 默认API设置
    pub const DEFAULT_API_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";
    pub const DEFAULT_TARGET_LANG: &str = "Turkish";
    pub const DEFAULT_MAX_TEXT_LENGTH: usize = 5000;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_TEMPERATURE: f64 = 0.3;
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;
    pub const PLACEHOLDER_API_KEYS: &[&str] = &["YOUR_API_KEY_HERE", "YOUR_GEMINI_API_KEY_HERE"];

    // 历史记录
    pub const DEFAULT_MAX_HISTORY_ITEMS: usize = 50;

    // 跳过的元素（按直接父元素判断）
    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "iframe", "object", "embed", "code", "pre", "svg",
        "canvas", "video", "audio",
    ];

    /// 可翻译属性选择器
    pub struct AttrSelector {
        pub attr: &'static str,
        /// 允许的标签，空表示任意元素
        pub tags: &'static [&'static str],
    }

    // 顺序即提取顺序
    pub const TRANSLATABLE_ATTRS: &[AttrSelector] = &[
        AttrSelector {
            attr: "placeholder",
            tags: &["input", "textarea"],
        },
        AttrSelector {
            attr: "alt",
            tags: &["img"],
        },
        AttrSelector {
            attr: "title",
            tags: &[],
        },
        AttrSelector {
            attr: "aria-label",
            tags: &[],
        },
    ];

    // 页面上的翻译标记
    pub const TRANSLATED_MARKER: &str = "data-translated";
    pub const ATTR_TRANSLATED_MARKER: &str = "data-attr-translated";
    pub const ORIGINAL_TEXT_PREFIX: &str = "data-original-text-";
    pub const ORIGINAL_ATTR_PREFIX: &str = "data-original-";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "page-translator.toml",
        ".page-translator.toml",
        "page-translator.json",
        "~/.config/page-translator/config.toml",
        "/etc/page-translator/config.toml",
    ];

    // .env 文件搜索顺序
    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}
