//! 开关控制消息

use serde::{Deserialize, Serialize};

/// 控制信号，只有一种：开 / 关自动投递
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlSignal {
    ToggleAutoRunner { enabled: bool },
}

/// 控制信号的回复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_wire_format() {
        let signal: ControlSignal =
            serde_json::from_str(r#"{"type":"TOGGLE_AUTO_RUNNER","enabled":true}"#).unwrap();
        assert_eq!(signal, ControlSignal::ToggleAutoRunner { enabled: true });

        let json = serde_json::to_string(&ControlResponse::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
