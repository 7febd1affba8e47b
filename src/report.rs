//! 結果出力モジュール
//!
//! - ターミナル表示（判定・信頼度・車種・所見）
//! - 判定証明書のJSON出力

use crate::error::Result;
use autosafe_common::{AnalysisResult, ImageFile, Verdict};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 判定証明書
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub file_name: String,
    pub digest: String,
    pub endpoint: String,
    pub issued_at: String,
    pub verdict: String,
    pub result: AnalysisResult,
}

impl Certificate {
    pub fn new(file: &ImageFile, endpoint: &str, result: &AnalysisResult) -> Self {
        Self {
            file_name: file.file_name.clone(),
            digest: file.digest.clone(),
            endpoint: endpoint.to_string(),
            issued_at: chrono::Local::now().to_rfc3339(),
            verdict: result.verdict().label().to_string(),
            result: result.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// ターミナル表示用の文字列
pub fn render_result(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let mark = match result.verdict() {
        Verdict::RoadLegal => "✅",
        Verdict::ActionRequired => "⛔",
    };
    out.push_str(&format!(
        "{} {}  ({}%)\n",
        mark,
        result.verdict().label(),
        result.confidence_percent()
    ));

    if let Some(service_verdict) = &result.service_verdict {
        out.push_str(&format!("  サービス判定: {}\n", service_verdict));
    }

    out.push_str(&format!("  車種: {}\n", result.vehicle_type));
    out.push_str(&format!("  AI信頼度: {}%\n", result.confidence_percent()));

    if result.observations.is_empty() {
        out.push_str("  所見: なし\n");
    } else {
        out.push_str("  所見:\n");
        for item in &result.observations {
            out.push_str(&format!("    - {}\n", item));
        }
    }

    out
}
