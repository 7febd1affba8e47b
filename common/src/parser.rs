//! APIレスポンスパーサー
//!
//! 解析サービスのレスポンスをデコードし、AnalysisResultへ変換する。
//! 判定・信頼度・所見の生成はすべてサービス側の責務で、ここでは並べ替えと抽出のみ行う。

use crate::error::{Error, Result};
use crate::types::{AnalysisResponse, AnalysisResult, IDENTIFIED_PREFIX, UNKNOWN_VEHICLE};

/// レスポンス本文をデコード
///
/// # Arguments
/// * `body` - HTTPレスポンス本文
///
/// # Returns
/// * `Ok(AnalysisResponse)` - デコード成功（フィールドの有無は未検証）
/// * `Err(Error::Schema)` - JSONでない、またはオブジェクトでない
pub fn parse_analysis_response(body: &str) -> Result<AnalysisResponse> {
    let value: serde_json::Value = serde_json::from_str(body.trim())
        .map_err(|e| Error::Schema(format!("レスポンスJSONパースエラー: {}", e)))?;

    // 配列は位置で構造体に読めてしまうため、オブジェクト以外は拒否
    if !value.is_object() {
        return Err(Error::Schema("レスポンスがJSONオブジェクトではありません".into()));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::Schema(format!("レスポンスJSONパースエラー: {}", e)))
}

/// details から車種を抽出
///
/// 最初の "Identified as: " 行の残りをトリムして返す。なければ "Unknown Vehicle"。
///
/// # Examples
/// ```
/// use autosafe_common::extract_vehicle_type;
///
/// let details = vec!["Cracked windshield".to_string(), "Identified as: Pickup Truck".to_string()];
/// assert_eq!(extract_vehicle_type(&details), "Pickup Truck");
/// ```
pub fn extract_vehicle_type(details: &[String]) -> String {
    details
        .iter()
        .find_map(|d| d.strip_prefix(IDENTIFIED_PREFIX))
        .map(|rest| rest.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_VEHICLE.to_string())
}

/// 車種行を除いた所見を返す
///
/// プレフィックスに一致する行はすべて除外する（最初の1行だけではない）。
pub fn collect_observations(details: &[String]) -> Vec<String> {
    details
        .iter()
        .filter(|d| !d.starts_with(IDENTIFIED_PREFIX))
        .cloned()
        .collect()
}

/// レスポンスをAnalysisResultへ変換
///
/// # Returns
/// * `Err(Error::Service)` - `error` がtruthy
/// * `Err(Error::Schema)` - 必須フィールド欠落、信頼度が範囲外
pub fn map_response(response: AnalysisResponse) -> Result<AnalysisResult> {
    if let Some(message) = response.error_message() {
        return Err(Error::Service(message));
    }

    let is_legal = response
        .is_legal
        .ok_or_else(|| Error::Schema("is_legal がありません".into()))?;
    let confidence = response
        .confidence
        .ok_or_else(|| Error::Schema("confidence がありません".into()))?;
    let details = response
        .details
        .ok_or_else(|| Error::Schema("details がありません".into()))?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(Error::Schema(format!("confidence が範囲外: {}", confidence)));
    }

    Ok(AnalysisResult {
        is_legal,
        confidence,
        vehicle_type: extract_vehicle_type(&details),
        observations: collect_observations(&details),
        raw_details: details,
        service_verdict: response.verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_map_response_vehicle_first() {
        let resp = AnalysisResponse::success(
            true,
            0.92,
            &["Identified as: Sedan", "Headlights functional", "Tires within legal tread depth"],
        );
        let result = map_response(resp).unwrap();

        assert!(result.is_legal);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.vehicle_type, "Sedan");
        assert_eq!(
            result.observations,
            strings(&["Headlights functional", "Tires within legal tread depth"])
        );
    }

    #[test]
    fn test_map_response_vehicle_last() {
        let resp = AnalysisResponse::success(
            false,
            0.41,
            &["Cracked windshield", "Identified as: Pickup Truck"],
        );
        let result = map_response(resp).unwrap();

        assert!(!result.is_legal);
        assert_eq!(result.vehicle_type, "Pickup Truck");
        assert_eq!(result.observations, strings(&["Cracked windshield"]));
    }

    #[test]
    fn test_map_response_unknown_vehicle() {
        let details = ["Detected: tabby cat", "Please upload a clear car photo"];
        let result = map_response(AnalysisResponse::success(false, 0.3, &details)).unwrap();

        assert_eq!(result.vehicle_type, UNKNOWN_VEHICLE);
        assert_eq!(result.observations, strings(&details));
    }

    #[test]
    fn test_map_response_multiple_identified_lines() {
        // 車種は最初の行、所見からは全行除外
        let resp = AnalysisResponse::success(
            true,
            0.8,
            &["Identified as: minivan", "Glass intact", "Identified as: cab"],
        );
        let result = map_response(resp).unwrap();

        assert_eq!(result.vehicle_type, "minivan");
        assert_eq!(result.observations, strings(&["Glass intact"]));
    }

    #[test]
    fn test_vehicle_type_trimmed() {
        let details = strings(&["Identified as:   sports car  "]);
        assert_eq!(extract_vehicle_type(&details), "sports car");
    }

    #[test]
    fn test_prefix_without_space_is_observation() {
        // "Identified as:" の直後に空白がなければ車種行ではない
        let details = strings(&["Identified as:Sedan"]);
        assert_eq!(extract_vehicle_type(&details), UNKNOWN_VEHICLE);
        assert_eq!(collect_observations(&details), details);
    }

    #[test]
    fn test_raw_details_preserved() {
        let details = ["Bumper detached", "Identified as: jeep", "Headlight assembly broken"];
        let result = map_response(AnalysisResponse::success(false, 0.66, &details)).unwrap();
        assert_eq!(result.raw_details, strings(&details));
    }

    #[test]
    fn test_map_response_error_field() {
        let resp = parse_analysis_response(r#"{"error": "backend failure"}"#).unwrap();
        let err = map_response(resp).unwrap_err();
        assert!(matches!(err, Error::Service(ref m) if m == "backend failure"));
    }

    #[test]
    fn test_map_response_error_with_fields() {
        // 正常フィールドがあっても error が優先
        let body = r#"{"is_legal": true, "confidence": 0.9, "details": [], "error": "oops"}"#;
        let err = map_response(parse_analysis_response(body).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[test]
    fn test_map_response_falsy_error_ignored() {
        let body = r#"{"is_legal": true, "confidence": 0.9, "details": [], "error": null}"#;
        let result = map_response(parse_analysis_response(body).unwrap()).unwrap();
        assert!(result.is_legal);
        assert!(result.observations.is_empty());
    }

    #[test]
    fn test_map_response_missing_fields() {
        let resp = parse_analysis_response(r#"{"confidence": 0.5, "details": []}"#).unwrap();
        assert!(matches!(map_response(resp), Err(Error::Schema(_))));

        let resp = parse_analysis_response(r#"{"is_legal": true, "details": []}"#).unwrap();
        assert!(matches!(map_response(resp), Err(Error::Schema(_))));

        let resp = parse_analysis_response(r#"{"is_legal": true, "confidence": 0.5}"#).unwrap();
        assert!(matches!(map_response(resp), Err(Error::Schema(_))));
    }

    #[test]
    fn test_map_response_confidence_out_of_range() {
        let resp = AnalysisResponse::success(true, 1.5, &[]);
        assert!(matches!(map_response(resp), Err(Error::Schema(_))));
    }

    #[test]
    fn test_parse_wrong_types() {
        let body = r#"{"is_legal": "yes", "confidence": 0.5, "details": []}"#;
        assert!(matches!(parse_analysis_response(body), Err(Error::Schema(_))));
    }

    #[test]
    fn test_parse_array_body_rejected() {
        let body = r#"[true, 0.9, ["Identified as: Sedan"]]"#;
        assert!(matches!(parse_analysis_response(body), Err(Error::Schema(_))));
    }

    #[test]
    fn test_parse_scalar_body_rejected() {
        assert!(matches!(parse_analysis_response("null"), Err(Error::Schema(_))));
        assert!(matches!(parse_analysis_response("\"ok\""), Err(Error::Schema(_))));
    }

    #[test]
    fn test_parse_not_json() {
        let result = parse_analysis_response("<html>Internal Server Error</html>");
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_parse_service_verdict() {
        let body = r#"{
            "is_legal": false,
            "confidence": 0.77,
            "verdict": "Severe Damage",
            "details": ["Structural frame damage detected", "Identified as: convertible"]
        }"#;
        let result = map_response(parse_analysis_response(body).unwrap()).unwrap();
        assert_eq!(result.service_verdict.as_deref(), Some("Severe Damage"));
        assert_eq!(result.vehicle_type, "convertible");
    }
}
