//! HTTP client for the meme analysis service

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{AnalyzerError, Result};
use crate::models::{AnalysisResult, HealthStatus};
use crate::selection::SelectedFile;

/// Multipart field carrying the video bytes
pub const VIDEO_FIELD: &str = "video";

/// The remote analysis engine, reached through one upload call
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Upload a video and return the analysis. Performs exactly one request.
    async fn analyze(&self, file: &SelectedFile) -> Result<AnalysisResult>;
}

/// HTTP client for the analysis service
pub struct HttpAnalysisClient {
    config: ServiceConfig,
    client: reqwest::Client,
    upload_url: Url,
}

impl HttpAnalysisClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let upload_url = config
            .upload_url()
            .map_err(|e| AnalyzerError::Config(e.to_string()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AnalyzerError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            upload_url,
        })
    }

    /// Fetch a result the service stored for an earlier upload
    pub async fn fetch_result(&self, file_id: &str) -> Result<AnalysisResult> {
        let url = self
            .config
            .result_url(file_id)
            .map_err(|e| AnalyzerError::Config(e.to_string()))?;

        info!("📥 Fetching stored analysis: {}", url);
        let response = self.client.get(url).send().await?;
        Self::read_result(response).await
    }

    /// Probe the service health endpoint
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self
            .config
            .health_url()
            .map_err(|e| AnalyzerError::Config(e.to_string()))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Server { status: status.as_u16() });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| AnalyzerError::MalformedResponse(e.to_string()))
    }

    async fn read_result(response: reqwest::Response) -> Result<AnalysisResult> {
        let status = response.status();
        if !status.is_success() {
            // The error body is not part of the contract; only log it
            let text = response.text().await.unwrap_or_default();
            warn!("Analysis service error {}: {}", status, text.chars().take(200).collect::<String>());
            return Err(AnalyzerError::Server { status: status.as_u16() });
        }

        let body = response.bytes().await?;
        debug!("📊 Response size: {} bytes", body.len());
        AnalysisResult::from_json(&body, Utc::now())
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, file: &SelectedFile) -> Result<AnalysisResult> {
        info!("🌐 Uploading {} to {}", file.name(), self.upload_url);

        let video_data = tokio::fs::read(file.path()).await?;
        debug!("📦 Read {} bytes from {}", video_data.len(), file.path().display());

        let part = Part::bytes(video_data)
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|e| AnalyzerError::Transport(format!("invalid content type {}: {}", file.mime(), e)))?;
        let form = Form::new().part(VIDEO_FIELD, part);

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await?;

        let result = Self::read_result(response).await?;
        info!(
            "✅ Analysis completed for {}: {} suggestions",
            result.video_file(),
            result.suggestions().len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_client_creation() {
        let config = ConfigBuilder::new().with_endpoint("http://127.0.0.1:5050").build();
        let client = HttpAnalysisClient::new(config.service).unwrap();
        assert_eq!(client.upload_url.as_str(), "http://127.0.0.1:5050/upload");
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let config = ConfigBuilder::new().with_endpoint("::nope::").build();
        let err = HttpAnalysisClient::new(config.service).err().unwrap();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_sending() {
        let config = ConfigBuilder::new().with_endpoint("http://127.0.0.1:9").build();
        let client = HttpAnalysisClient::new(config.service).unwrap();
        let file = SelectedFile::new("/definitely/not/here.mp4", "here.mp4", "video/mp4");

        let err = client.analyze(&file).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Io(_)));
    }
}
