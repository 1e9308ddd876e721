use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器 / CDP 错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {message}")]
    ConnectionFailed { port: u16, message: String },

    /// 持久化存储读写失败
    #[error("存储错误 (键: {key}): {message}")]
    Storage { key: String, message: String },

    /// 控制信号无法送达
    #[error("控制信号发送失败: {0}")]
    Transport(String),

    /// 当前页面不是受支持的平台
    #[error("当前页面不是受支持的平台: {0}")]
    UnsupportedPlatform(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 文件读写失败
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建存储错误
    pub fn storage(key: impl Into<String>, source: impl std::fmt::Display) -> Self {
        AppError::Storage {
            key: key.into(),
            message: source.to_string(),
        }
    }

    /// 创建浏览器连接错误
    pub fn connection_failed(port: u16, source: impl std::fmt::Display) -> Self {
        AppError::ConnectionFailed {
            port,
            message: source.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_message() {
        let err = AppError::storage("formAnswers", "disk full");
        assert_eq!(err.to_string(), "存储错误 (键: formAnswers): disk full");
    }
}
