//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// サービスに到達できない（接続拒否、タイムアウト等）
    #[error("Transport error: {0}")]
    Transport(String),

    /// 2xx以外のステータス
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// レスポンス内の error フィールド
    #[error("Service error: {0}")]
    Service(String),

    /// レスポンスがスキーマに合わない
    #[error("Schema error: {0}")]
    Schema(String),
}

impl Error {
    /// ログ用の分類名
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) | Error::Status(_) => "transport",
            Error::Service(_) => "service",
            Error::Schema(_) => "schema",
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_transport() {
        let error = Error::Transport("connection refused".to_string());
        let display = format!("{}", error);
        assert!(display.contains("Transport error"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn test_error_display_status() {
        let error = Error::Status(503);
        assert_eq!(format!("{}", error), "Unexpected status: 503");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::Transport("x".into()).kind(), "transport");
        assert_eq!(Error::Status(500).kind(), "transport");
        assert_eq!(Error::Service("x".into()).kind(), "service");
        assert_eq!(Error::Schema("x".into()).kind(), "schema");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Service("テスト".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Service"));
        assert!(debug.contains("テスト"));
    }
}
