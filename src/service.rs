//! 解析サービス連携モジュール
//!
//! POST {endpoint}/analyze に写真をmultipart（フィールド名 `file`）で送信し、
//! JSONレスポンスをデコードする。変換（車種抽出など）はワークフロー側で行う。

use crate::error::Result;
use async_trait::async_trait;
use autosafe_common::{parse_analysis_response, AnalysisResponse, Error, ImageFile};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// multipartのフィールド名
pub const UPLOAD_FIELD: &str = "file";

/// 解析サービス
///
/// 1回の呼び出しで1回だけリクエストを送る。リトライはしない。
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, image: &ImageFile) -> autosafe_common::Result<AnalysisResponse>;
}

/// GET / のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub status: String,
}

/// HTTP実装
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn analyze_url(&self) -> String {
        format!("{}/analyze", self.endpoint)
    }

    /// 稼働確認（GET /）
    pub async fn health(&self) -> autosafe_common::Result<ServiceStatus> {
        let url = format!("{}/", self.endpoint);
        let response = self.client.get(&url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(transport)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Schema(format!("ステータスJSONパースエラー: {}", e)))
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(&self, image: &ImageFile) -> autosafe_common::Result<AnalysisResponse> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(transport)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let url = self.analyze_url();
        debug!(url = %url, file = %image.file_name, bytes = image.len(), "analyze: sending");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(transport)?;
        debug!(status = status.as_u16(), body_len = body.len(), "analyze: response received");

        parse_analysis_response(&body)
    }
}

fn transport(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash() {
        let service = HttpAnalysisService::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(service.endpoint(), "http://localhost:8000");
        assert_eq!(service.analyze_url(), "http://localhost:8000/analyze");
    }
}
