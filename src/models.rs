//! Analysis result data model and the wire format returned by the service

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

/// Epoch values above this are read as milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// One candidate insertion point returned by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    start: f64,
    end: f64,
    meme_file: String,
    description: String,
    confidence: f64,
}

impl Suggestion {
    /// Create a suggestion, rejecting values outside the service contract
    pub fn new(
        start: f64,
        end: f64,
        meme_file: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
    ) -> Result<Self> {
        if !start.is_finite() || start < 0.0 {
            return Err(AnalyzerError::MalformedResponse(format!(
                "timestamp must be a non-negative number, got {}",
                start
            )));
        }
        if !end.is_finite() || end < start {
            return Err(AnalyzerError::MalformedResponse(format!(
                "end_timestamp {} is before timestamp {}",
                end, start
            )));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AnalyzerError::MalformedResponse(format!(
                "confidence must be within [0, 1], got {}",
                confidence
            )));
        }

        Ok(Self {
            start,
            end,
            meme_file: meme_file.into(),
            description: description.into(),
            confidence,
        })
    }

    /// Start of the suggested range in seconds
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End of the suggested range in seconds
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Reference image identifier, e.g. `success_kid.jpg`
    pub fn meme_file(&self) -> &str {
        &self.meme_file
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Service certainty in `[0, 1]`
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// A complete, successful analysis of one uploaded video.
///
/// Built only from a successful response and replaced wholesale by the next
/// one. Suggestions keep the order the service sent them in.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    video_file: String,
    processed_at: DateTime<Utc>,
    suggestions: Vec<Suggestion>,
    file_id: Option<String>,
}

impl AnalysisResult {
    pub fn new(
        video_file: impl Into<String>,
        processed_at: DateTime<Utc>,
        suggestions: Vec<Suggestion>,
    ) -> Self {
        Self {
            video_file: video_file.into(),
            processed_at,
            suggestions,
            file_id: None,
        }
    }

    /// Parse a response body. `received_at` stamps results whose body
    /// carries no `processed_at`.
    pub fn from_json(body: &[u8], received_at: DateTime<Utc>) -> Result<Self> {
        let response: AnalysisResponse = serde_json::from_slice(body)
            .map_err(|e| AnalyzerError::MalformedResponse(e.to_string()))?;
        response.into_result(received_at)
    }

    /// Source file name as reported by the service
    pub fn video_file(&self) -> &str {
        &self.video_file
    }

    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Identifier under which the service stored this result, if it said
    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }
}

/// Suggestion as it appears on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionPayload {
    pub timestamp: f64,
    pub end_timestamp: f64,
    pub meme_file: String,
    pub description: String,
    pub confidence: f64,
}

/// `processed_at` is sent either as ISO-8601 text or as an epoch number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProcessedAt {
    Epoch(f64),
    Text(String),
}

/// Response body of `POST /upload` and `GET /results/<file_id>`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResponse {
    pub video_file: String,
    #[serde(default)]
    pub processed_at: Option<ProcessedAt>,
    pub suggestions: Vec<SuggestionPayload>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub result_file: Option<String>,
}

impl AnalysisResponse {
    /// Validate the payload and convert it into an [`AnalysisResult`]
    pub fn into_result(self, received_at: DateTime<Utc>) -> Result<AnalysisResult> {
        if self.success == Some(false) {
            return Err(AnalyzerError::MalformedResponse(
                "service reported success: false".to_string(),
            ));
        }

        let processed_at = match self.processed_at {
            Some(value) => value.to_utc()?,
            None => received_at,
        };

        let suggestions = self
            .suggestions
            .into_iter()
            .map(|s| Suggestion::new(s.timestamp, s.end_timestamp, s.meme_file, s.description, s.confidence))
            .collect::<Result<Vec<_>>>()?;

        Ok(AnalysisResult {
            video_file: self.video_file,
            processed_at,
            suggestions,
            file_id: self.file_id,
        })
    }
}

impl ProcessedAt {
    /// Resolve to an instant. Text without an offset is local time.
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        match self {
            ProcessedAt::Epoch(value) => {
                if !value.is_finite() || *value < 0.0 {
                    return Err(AnalyzerError::MalformedResponse(format!(
                        "invalid epoch timestamp {}",
                        value
                    )));
                }
                let millis = if *value > EPOCH_MILLIS_THRESHOLD {
                    *value
                } else {
                    *value * 1000.0
                };
                Utc.timestamp_millis_opt(millis as i64).single().ok_or_else(|| {
                    AnalyzerError::MalformedResponse(format!("epoch timestamp out of range: {}", value))
                })
            }
            ProcessedAt::Text(text) => {
                if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                    return Ok(parsed.with_timezone(&Utc));
                }
                let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .map_err(|e| AnalyzerError::MalformedResponse(format!("invalid processed_at '{}': {}", text, e)))?;
                Local
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|local| local.with_timezone(&Utc))
                    .ok_or_else(|| AnalyzerError::MalformedResponse(format!("nonexistent local time '{}'", text)))
            }
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_full_response() {
        let body = br#"{
            "video_file": "clip.mp4",
            "processed_at": "2024-01-01T00:00:00Z",
            "suggestions": [
                {"timestamp": 12.5, "end_timestamp": 15.0, "meme_file": "success_kid.jpg", "description": "win", "confidence": 0.9}
            ]
        }"#;

        let result = AnalysisResult::from_json(body, received()).unwrap();
        assert_eq!(result.video_file(), "clip.mp4");
        assert_eq!(result.processed_at(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(result.suggestions().len(), 1);

        let suggestion = &result.suggestions()[0];
        assert_eq!(suggestion.start(), 12.5);
        assert_eq!(suggestion.end(), 15.0);
        assert_eq!(suggestion.meme_file(), "success_kid.jpg");
        assert_eq!(suggestion.description(), "win");
        assert_eq!(suggestion.confidence(), 0.9);
    }

    #[test]
    fn test_upload_response_without_processed_at() {
        let body = br#"{
            "success": true,
            "file_id": "4f1c",
            "result_file": "result_4f1c.json",
            "video_file": "4f1c_clip.mp4",
            "suggestions": []
        }"#;

        let result = AnalysisResult::from_json(body, received()).unwrap();
        assert_eq!(result.processed_at(), received());
        assert_eq!(result.file_id(), Some("4f1c"));
        assert!(result.suggestions().is_empty());
    }

    #[test]
    fn test_suggestion_order_is_preserved() {
        let body = br#"{
            "video_file": "clip.mp4",
            "processed_at": 1704067200,
            "suggestions": [
                {"timestamp": 30.0, "end_timestamp": 35.0, "meme_file": "b.jpg", "description": "b", "confidence": 0.8},
                {"timestamp": 5.0, "end_timestamp": 10.0, "meme_file": "a.jpg", "description": "a", "confidence": 0.7},
                {"timestamp": 5.0, "end_timestamp": 10.0, "meme_file": "a.jpg", "description": "a", "confidence": 0.7}
            ]
        }"#;

        let result = AnalysisResult::from_json(body, received()).unwrap();
        let files: Vec<&str> = result.suggestions().iter().map(|s| s.meme_file()).collect();
        assert_eq!(files, vec!["b.jpg", "a.jpg", "a.jpg"]);
        assert_eq!(result.processed_at(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_processed_at_variants() {
        let millis = ProcessedAt::Epoch(1_704_067_200_000.0).to_utc().unwrap();
        assert_eq!(millis, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let offset = ProcessedAt::Text("2024-01-01T02:00:00+02:00".to_string()).to_utc().unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let naive = ProcessedAt::Text("2024-01-01T10:30:00.123456".to_string()).to_utc();
        assert!(naive.is_ok());

        assert!(ProcessedAt::Text("yesterday".to_string()).to_utc().is_err());
        assert!(ProcessedAt::Epoch(-1.0).to_utc().is_err());
    }

    #[test]
    fn test_malformed_bodies() {
        let cases: [&[u8]; 5] = [
            b"not json",
            br#"{"suggestions": []}"#,
            br#"{"video_file": "a.mp4", "suggestions": [{"timestamp": "soon"}]}"#,
            br#"{"video_file": "a.mp4", "suggestions": [{"timestamp": 5.0, "end_timestamp": 1.0, "meme_file": "x.jpg", "description": "x", "confidence": 0.5}]}"#,
            br#"{"video_file": "a.mp4", "suggestions": [{"timestamp": 1.0, "end_timestamp": 2.0, "meme_file": "x.jpg", "description": "x", "confidence": 1.5}]}"#,
        ];

        for body in cases {
            let err = AnalysisResult::from_json(body, received()).unwrap_err();
            assert!(matches!(err, AnalyzerError::MalformedResponse(_)), "unexpected error: {:?}", err);
        }
    }

    #[test]
    fn test_explicit_failure_flag_is_rejected() {
        let body = br#"{"success": false, "video_file": "a.mp4", "suggestions": []}"#;
        assert!(AnalysisResult::from_json(body, received()).is_err());
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus =
            serde_json::from_str(r#"{"status": "healthy", "timestamp": "2024-01-01T00:00:00"}"#).unwrap();
        assert!(health.is_healthy());
    }
}
