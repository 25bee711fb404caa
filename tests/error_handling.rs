//! 错误处理集成测试
//!
//! 客户端本地校验、错误分类、配置与历史记录的异常输入

use std::rc::Rc;

use page_translator::core::PageError;
use page_translator::translation::client::{is_quota_exhausted, GeminiTranslator, Translator};
use page_translator::translation::config::{ConfigManager, TranslationConfig};
use page_translator::translation::core::{PageTranslationController, PassState};
use page_translator::translation::error::{ErrorCategory, ErrorStats, TranslationError};
use page_translator::translation::storage::{translate_selection, HistoryStore};

mod common {
    include!("common/mod.rs");
}

use common::{test_config, HtmlTestHelper, ScriptedTranslator};

fn offline_translator(api_key: Option<&str>) -> GeminiTranslator {
    let mut config = TranslationConfig::default();
    config.api_key = api_key.map(|key| key.to_string());
    config.api_url = "http://127.0.0.1:9/generate".to_string();
    GeminiTranslator::new(&config).unwrap()
}

/// 缺失密钥时整页翻译的每个条目都失败，但页面结构不受影响
#[tokio::test]
async fn test_missing_api_key_fails_every_unit() {
    let dom = HtmlTestHelper::create_test_dom(&HtmlTestHelper::create_paragraph_page(4));
    let before = HtmlTestHelper::serialize(&dom);

    let mut config = test_config();
    config.api_key = None;
    let translator = Rc::new(offline_translator(None));
    let controller = PageTranslationController::new(dom.document.clone(), translator, &config);

    let state = controller.start().await;

    assert!(matches!(
        state,
        Some(PassState::Done(summary)) if summary.success_count == 0 && summary.failure_count == 4
    ));
    assert!(!controller.is_translated());
    assert_eq!(HtmlTestHelper::serialize(&dom), before);

    let stats = controller.error_stats();
    assert_eq!(stats.by_category.get(&ErrorCategory::Configuration), Some(&4));
}

/// 本地校验失败不会发出请求
#[tokio::test]
async fn test_local_validation_errors() {
    let translator = offline_translator(Some("test-api-key"));

    let result = translator.translate("").await;
    assert!(matches!(result, Err(TranslationError::InvalidInput(_))));

    let result = translator.translate(&"x".repeat(5001)).await;
    assert!(matches!(result, Err(TranslationError::InvalidInput(_))));

    let result = offline_translator(Some("YOUR_GEMINI_API_KEY_HERE"))
        .translate("Hello")
        .await;
    assert!(matches!(result, Err(TranslationError::ConfigError(_))));
}

/// 配额错误的识别
#[test]
fn test_quota_classification() {
    let errors = [
        TranslationError::QuotaExceeded("limit".to_string()),
        TranslationError::TranslationServiceError("Quota exceeded for metric".to_string()),
        TranslationError::TranslationServiceError("API Error: 429".to_string()),
    ];
    for error in &errors {
        assert!(is_quota_exhausted(error), "{:?}", error);
    }

    assert!(!is_quota_exhausted(&TranslationError::TranslationServiceError(
        "API Error: 500".to_string()
    )));
    assert!(!is_quota_exhausted(&TranslationError::NetworkError(
        "error sending request: Quota proxy unreachable".to_string()
    )));
}

/// 错误统计
#[test]
fn test_error_stats() {
    let mut stats = ErrorStats::default();
    stats.record_error(&TranslationError::TimeoutError("slow".to_string()));
    stats.record_error(&TranslationError::NetworkError("reset".to_string()));
    stats.record_error(&TranslationError::ConfigError("missing key".to_string()));

    assert_eq!(stats.total_errors, 3);
    assert_eq!(stats.retryable_errors, 2);
    assert_eq!(stats.critical_errors, 1);
    assert!((stats.error_rate(6) - 0.5).abs() < f64::EPSILON);

    stats.reset();
    assert_eq!(stats.total_errors, 0);
}

/// 翻译错误转换为页面错误时保留信息
#[test]
fn test_page_error_from_translation_error() {
    let error: PageError = TranslationError::NoTranslatableContent.into();
    assert_eq!(error.to_string(), "no translatable content");
}

/// 非法配置文件
#[test]
fn test_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "batch_size = \"many\"").unwrap();
    let result = ConfigManager::from_file(path.to_str().unwrap());
    assert!(matches!(result, Err(TranslationError::ConfigError(_))));

    let path = dir.path().join("zero.json");
    std::fs::write(&path, r#"{"batch_size": 0}"#).unwrap();
    let result = ConfigManager::from_file(path.to_str().unwrap());
    assert!(matches!(result, Err(TranslationError::ConfigError(_))));

    let result = ConfigManager::from_file("/nonexistent/page-translator.toml");
    assert!(result.is_err());
}

/// 损坏的历史文件
#[test]
fn test_corrupted_history_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(HistoryStore::open(&path, 10).is_err());
}

/// 选中文本翻译失败时不写历史
#[tokio::test]
async fn test_failed_selection_is_not_recorded() {
    let translator = ScriptedTranslator::new().failing_on("Broken");
    let history = HistoryStore::in_memory(10);

    let result = translate_selection(&translator, &history, "Broken sentence").await;
    assert!(matches!(
        result,
        Err(TranslationError::TranslationServiceError(_))
    ));
    assert!(history.is_empty());

    let translation = translate_selection(&translator, &history, "Good sentence")
        .await
        .unwrap();
    assert_eq!(translation, "TR:Good sentence");
    assert_eq!(history.list().unwrap()[0].original, "Good sentence");
}

/// 历史文件在重新打开后保留
#[test]
fn test_history_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/history.json");

    {
        let history = HistoryStore::open(&path, 2).unwrap();
        history.add_entry("one", "bir").unwrap();
        history.add_entry("two", "iki").unwrap();
        history.add_entry("three", "üç").unwrap();
    }

    let history = HistoryStore::open(&path, 2).unwrap();
    let entries = history.list().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].translation, "üç");
    assert_eq!(entries[1].translation, "iki");
    assert!(entries[0].id > entries[1].id);
}
