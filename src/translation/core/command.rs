//! 页面命令
//!
//! 外部（快捷键、弹出菜单）通过 JSON 消息驱动控制器：
//!
//! ```json
//! {"action": "toggle-page-translation"}
//! ```

use serde::{Deserialize, Serialize};

use super::engine::PageStats;
use super::service::PageTranslationController;

/// 控制器接受的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PageCommand {
    TranslatePage,
    TogglePageTranslation,
    CancelTranslation,
    GetPageTranslationStatus,
}

/// 命令的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageResponse {
    Ack {
        success: bool,
    },
    #[serde(rename_all = "camelCase")]
    Status {
        is_translated: bool,
        stats: PageStats,
    },
    Restored {
        success: bool,
        restored: usize,
    },
}

impl PageResponse {
    fn ack() -> Self {
        PageResponse::Ack { success: true }
    }
}

impl PageTranslationController {
    /// 处理一条命令
    ///
    /// 翻译类命令会等待本次翻译结束后才返回；翻译被忽略时同样返回确认。
    pub async fn handle(&self, command: PageCommand) -> PageResponse {
        tracing::debug!("处理命令: {:?}", command);

        match command {
            PageCommand::TranslatePage => {
                self.start().await;
                PageResponse::ack()
            }
            PageCommand::TogglePageTranslation => {
                if self.is_translated() {
                    let restored = self.restore();
                    PageResponse::Restored {
                        success: true,
                        restored,
                    }
                } else {
                    self.start().await;
                    PageResponse::ack()
                }
            }
            PageCommand::CancelTranslation => {
                self.cancel();
                PageResponse::ack()
            }
            PageCommand::GetPageTranslationStatus => PageResponse::Status {
                is_translated: self.is_translated(),
                stats: self.stats(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let command: PageCommand =
            serde_json::from_str(r#"{"action":"get-page-translation-status"}"#).unwrap();
        assert_eq!(command, PageCommand::GetPageTranslationStatus);

        let json = serde_json::to_string(&PageCommand::TogglePageTranslation).unwrap();
        assert_eq!(json, r#"{"action":"toggle-page-translation"}"#);

        assert!(serde_json::from_str::<PageCommand>(r#"{"action":"translate-everything"}"#).is_err());
    }

    #[test]
    fn test_status_response_shape() {
        let response = PageResponse::Status {
            is_translated: true,
            stats: PageStats::new(3, 1),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isTranslated"], true);
        assert_eq!(json["stats"]["translated"], 3);
        assert_eq!(json["stats"]["percentage"], 75);
    }
}
