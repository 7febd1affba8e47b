//! 解析ワークフローの型定義
//!
//! CLIとライブラリで共有される型:
//! - AnalysisResponse: 解析サービスのレスポンス（ワイヤ形式）
//! - AnalysisResult: レスポンスから導出した最終結果
//! - ImageFile: 選択された写真（不変、差し替え時は丸ごと置換）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 車種が見つからない場合の既定値
pub const UNKNOWN_VEHICLE: &str = "Unknown Vehicle";

/// 車種行のプレフィックス
pub const IDENTIFIED_PREFIX: &str = "Identified as: ";

/// ワークフローの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    /// 写真未選択
    #[default]
    Upload,
    /// 写真選択済み、解析待ち
    Ready,
    /// 解析中
    Analyzing,
    /// 結果表示
    Result,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Upload => "upload",
            Step::Ready => "ready",
            Step::Analyzing => "analyzing",
            Step::Result => "result",
        }
    }

    /// 進捗表示用の番号 (1: Upload, 2: Analyze, 3: Results)
    pub fn ordinal(&self) -> u8 {
        match self {
            Step::Upload => 1,
            Step::Ready | Step::Analyzing => 2,
            Step::Result => 3,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 選択ごとに払い出される識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

/// 送信ごとに払い出される識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// 選択された写真
///
/// バイト列は `Arc` で共有するため、送信タスクへのクローンは安価。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    /// SHA-256（16進）。ログと証明書出力に使用
    pub digest: String,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            digest: digest.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIMEタイプから拡張子を推定
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            _ => "jpg",
        }
    }
}

/// ワークフローが保持する選択状態（写真 + 識別子）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: FileId,
    pub file: ImageFile,
}

/// 解析サービスのレスポンス
///
/// `error` は任意のJSON値。truthyなら失敗扱い。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub is_legal: Option<bool>,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub details: Option<Vec<String>>,

    /// サービス側の判定ラベル（"Road Legal", "Severe Damage" など）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl AnalysisResponse {
    /// 正常系レスポンスを組み立てる（テスト・モック用）
    pub fn success(is_legal: bool, confidence: f64, details: &[&str]) -> Self {
        Self {
            is_legal: Some(is_legal),
            confidence: Some(confidence),
            details: Some(details.iter().map(|d| d.to_string()).collect()),
            verdict: None,
            error: None,
        }
    }

    /// `error` フィールドがtruthyか
    ///
    /// JavaScriptの真偽判定に合わせる: null / false / 0 / "" はfalsy。
    pub fn error_message(&self) -> Option<String> {
        use serde_json::Value;

        match self.error.as_ref()? {
            Value::Null => None,
            Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// 判定区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    RoadLegal,
    ActionRequired,
}

impl Verdict {
    pub fn from_legal(is_legal: bool) -> Self {
        if is_legal {
            Verdict::RoadLegal
        } else {
            Verdict::ActionRequired
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::RoadLegal => "Road Legal",
            Verdict::ActionRequired => "Strict Action Required",
        }
    }
}

/// 解析結果（構築後は不変）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub is_legal: bool,

    /// 0.0〜1.0
    pub confidence: f64,

    pub vehicle_type: String,

    /// 車種行を除いた所見（元の順序）
    pub observations: Vec<String>,

    /// レスポンスの details そのまま
    pub raw_details: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_verdict: Option<String>,
}

impl AnalysisResult {
    pub fn verdict(&self) -> Verdict {
        Verdict::from_legal(self.is_legal)
    }

    /// 信頼度を整数パーセントで返す（0.92 → 92）
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
