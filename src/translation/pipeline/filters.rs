//! 文本过滤器模块
//!
//! 判断一段文本本身是否值得翻译。元素层面的过滤（排除标签、隐藏、已翻译标记）在收集器中完成。

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;

/// 文本被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRejection {
    /// 去除首尾空白后长度不足
    TooShort,
    /// 只有数字、空白和符号
    SymbolsOnly,
}

/// 文本过滤器
pub struct TextFilter {
    min_text_length: usize,
    symbols_regex: OnceLock<Option<Regex>>,
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new(min_text_length: usize) -> Self {
        Self {
            min_text_length,
            symbols_regex: OnceLock::new(),
        }
    }

    /// 判断文本是否需要翻译
    pub fn should_translate(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }

    /// 检查文本，返回拒绝原因
    ///
    /// 长度按字符计算，检查顺序固定：先长度后符号。
    pub fn check(&self, text: &str) -> Result<(), TextRejection> {
        let trimmed = text.trim();

        if !self.is_long_enough(trimmed) {
            return Err(TextRejection::TooShort);
        }

        if self.is_symbols_only(trimmed) {
            return Err(TextRejection::SymbolsOnly);
        }

        Ok(())
    }

    /// 只检查长度，属性值使用
    pub fn is_long_enough(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.min_text_length
    }

    /// 纯数字/空白/非单词字符
    fn is_symbols_only(&self, text: &str) -> bool {
        let regex = self
            .symbols_regex
            .get_or_init(|| Regex::new(r"^[\d\s\W]+$").ok());

        match regex {
            Some(regex) => regex.is_match(text),
            None => !text.chars().any(char::is_alphabetic),
        }
    }
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new(constants::MIN_TEXT_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_text() {
        let filter = TextFilter::default();

        assert_eq!(filter.check("OK"), Err(TextRejection::TooShort));
        assert_eq!(filter.check("   Hi \n"), Err(TextRejection::TooShort));
        assert!(filter.should_translate("Hey"));
    }

    #[test]
    fn test_rejects_symbols_and_numbers() {
        let filter = TextFilter::default();

        assert_eq!(filter.check("12:34"), Err(TextRejection::SymbolsOnly));
        assert_eq!(filter.check("-- / --"), Err(TextRejection::SymbolsOnly));
        assert_eq!(filter.check("$ 1,299.00"), Err(TextRejection::SymbolsOnly));
    }

    #[test]
    fn test_accepts_mixed_and_non_latin_text() {
        let filter = TextFilter::default();

        assert!(filter.should_translate("Hello world"));
        assert!(filter.should_translate("Page 2 of 10"));
        assert!(filter.should_translate("こんにちは"));
        assert!(filter.should_translate("Привет"));
    }

    #[test]
    fn test_length_counts_characters() {
        let filter = TextFilter::default();

        // 两个字符，但 UTF-8 字节数超过 3
        assert_eq!(filter.check("çö"), Err(TextRejection::TooShort));
        assert!(!filter.is_long_enough(" çö "));
        assert!(filter.is_long_enough("***"));
    }
}
