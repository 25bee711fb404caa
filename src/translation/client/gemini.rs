//! Gemini 翻译客户端
//!
//! 调用 `generateContent` 接口，每次请求翻译一段文本。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{is_quota_message, Translator};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{helpers::validation_error, TranslationError, TranslationResult};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini 翻译客户端
pub struct GeminiTranslator {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    target_lang: String,
    max_text_length: usize,
    timeout: Duration,
    temperature: f64,
    max_output_tokens: u32,
}

impl GeminiTranslator {
    /// 根据配置创建客户端
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            target_lang: config.target_lang.clone(),
            max_text_length: config.max_text_length,
            timeout: config.request_timeout(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    /// 本地校验：空文本、超长文本、缺失密钥。校验失败时不发起网络请求
    pub fn validate(&self, text: &str) -> TranslationResult<&str> {
        if text.trim().is_empty() {
            return Err(validation_error("text must not be empty"));
        }

        if text.chars().count() > self.max_text_length {
            return Err(validation_error(format!(
                "text too long (max {} characters)",
                self.max_text_length
            )));
        }

        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() && !constants::PLACEHOLDER_API_KEYS.contains(&key) => {
                Ok(key)
            }
            _ => Err(TranslationError::ConfigError(
                "API key is not configured".to_string(),
            )),
        }
    }

    fn build_prompt(&self, text: &str) -> String {
        format!(
            "Translate the following text into {lang}. Reply with the translation only, \
             without any explanation. If the text is already in {lang}, return it unchanged.\n\n\
             Text: \"{text}\"",
            lang = self.target_lang,
            text = text
        )
    }

    async fn send(&self, api_key: &str, text: &str) -> TranslationResult<String> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: self.build_prompt(text),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        tracing::debug!("Gemini 请求: {} 个字符", text.chars().count());

        // 密钥只放在请求头中，错误信息里的 URL 不会带上它
        let response = self
            .client
            .post(&self.api_url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(serde_json::to_string(&request)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<GeminiError>(&body) {
                Ok(e) if !e.error.message.is_empty() => e.error.message,
                _ => format!("API Error: {}", status.as_u16()),
            };

            return Err(if status.as_u16() == 429 || is_quota_message(&message) {
                TranslationError::QuotaExceeded(message)
            } else {
                TranslationError::TranslationServiceError(message)
            });
        }

        parse_translation(&body)
    }
}

/// 从响应中取出第一个候选的文本
fn parse_translation(body: &str) -> TranslationResult<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| TranslationError::ParseError(format!("无法解析翻译响应: {}", e)))?;

    let translation = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    if translation.is_empty() {
        return Err(TranslationError::TranslationServiceError(
            "no translation returned".to_string(),
        ));
    }

    Ok(translation)
}

#[async_trait(?Send)]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str) -> TranslationResult<String> {
        let api_key = self.validate(text)?;

        match tokio::time::timeout(self.timeout, self.send(api_key, text)).await {
            Ok(result) => result,
            Err(_) => Err(TranslationError::TimeoutError(format!(
                "translation timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::client::is_quota_exhausted;

    fn translator(api_key: Option<&str>) -> GeminiTranslator {
        let mut config = TranslationConfig::default();
        config.api_key = api_key.map(|key| key.to_string());
        // 不可路由的地址，确保测试不会真正访问网络
        config.api_url = "http://127.0.0.1:9/generate".to_string();
        GeminiTranslator::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_empty_text() {
        let result = translator(Some("test-api-key")).translate("   ").await;
        assert!(matches!(result, Err(TranslationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_rejects_long_text_locally() {
        let text = "a".repeat(5001);
        let result = translator(Some("test-api-key")).translate(&text).await;
        assert!(matches!(result, Err(TranslationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_requires_api_key() {
        let result = translator(None).translate("Hello").await;
        assert!(matches!(result, Err(TranslationError::ConfigError(_))));

        let result = translator(Some("YOUR_API_KEY_HERE")).translate("Hello").await;
        assert!(matches!(result, Err(TranslationError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_transport_error_hides_key_and_is_not_quota() {
        let result = translator(Some("SECRETkey429xyz"))
            .translate("Hello world")
            .await;

        let error = result.unwrap_err();
        assert!(
            matches!(
                error,
                TranslationError::NetworkError(_) | TranslationError::TimeoutError(_)
            ),
            "{:?}",
            error
        );
        assert!(!error.to_string().contains("SECRETkey429xyz"));
        assert!(!is_quota_exhausted(&error));
    }

    #[test]
    fn test_parse_translation() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"  Merhaba dünya \n"}]}}]}"#;
        assert_eq!(parse_translation(body).unwrap(), "Merhaba dünya");

        let empty = r#"{"candidates":[]}"#;
        assert!(matches!(
            parse_translation(empty),
            Err(TranslationError::TranslationServiceError(_))
        ));

        assert!(matches!(
            parse_translation("not json"),
            Err(TranslationError::ParseError(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: "hi".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 1000,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1000);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_prompt_names_target_language() {
        let prompt = translator(Some("test-api-key")).build_prompt("Hello");
        assert!(prompt.contains("Turkish"));
        assert!(prompt.ends_with("Text: \"Hello\""));
    }
}
