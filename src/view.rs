//! Screen composition
//!
//! What is visible is a pure function of the upload controller: the
//! controller is first reduced to a [`ViewState`], which the [`Screen`]
//! renders as text.

use chrono::Local;
use std::fmt;

use crate::library::REFERENCE_LIBRARY;
use crate::models::AnalysisResult;
use crate::selection::{PreviewSource, SelectedFile};
use crate::timeline::{AssetResolver, SuggestionTimeline};
use crate::upload::{Notice, UploadController, UploadStatus};

const TITLE: &str = "AI Video Meme Analyzer";
const RULE_WIDTH: usize = 48;

/// Visible state of the application
#[derive(Debug, Clone, Copy)]
pub enum ViewState<'a> {
    /// Only the upload control
    NoFile,
    /// A file is chosen and may be submitted
    FileSelected {
        file: &'a SelectedFile,
        preview: Option<&'a PreviewSource>,
        notice: Option<&'a Notice>,
    },
    /// Submission disabled until the outstanding upload completes
    Uploading {
        file: &'a SelectedFile,
        /// File being sent; not `file` when a new one was chosen mid-upload
        uploading: &'a SelectedFile,
        preview: Option<&'a PreviewSource>,
    },
    /// A successful analysis is on screen
    ResultsShown {
        file: Option<&'a SelectedFile>,
        preview: Option<&'a PreviewSource>,
        result: &'a AnalysisResult,
        notice: Option<&'a Notice>,
    },
}

impl<'a> ViewState<'a> {
    pub fn of(controller: &'a UploadController) -> Self {
        let file = controller.selected();
        let preview = controller.preview();
        let notice = controller.notice();

        match (controller.status(), file, controller.result()) {
            (UploadStatus::InFlight, Some(file), _) => ViewState::Uploading {
                file,
                uploading: controller.uploading().unwrap_or(file),
                preview,
            },
            (_, _, Some(result)) => ViewState::ResultsShown {
                file,
                preview,
                result,
                notice,
            },
            (_, Some(file), None) => ViewState::FileSelected { file, preview, notice },
            (_, None, None) => ViewState::NoFile,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewState::NoFile => "NoFile",
            ViewState::FileSelected { .. } => "FileSelected",
            ViewState::Uploading { .. } => "Uploading",
            ViewState::ResultsShown { .. } => "ResultsShown",
        }
    }

    /// Whether the analyze action is enabled
    pub fn can_submit(&self) -> bool {
        match self {
            ViewState::FileSelected { .. } => true,
            ViewState::ResultsShown { file, .. } => file.is_some(),
            ViewState::NoFile | ViewState::Uploading { .. } => false,
        }
    }

    pub fn file(&self) -> Option<&'a SelectedFile> {
        match *self {
            ViewState::NoFile => None,
            ViewState::FileSelected { file, .. } | ViewState::Uploading { file, .. } => Some(file),
            ViewState::ResultsShown { file, .. } => file,
        }
    }

    pub fn preview(&self) -> Option<&'a PreviewSource> {
        match *self {
            ViewState::NoFile => None,
            ViewState::FileSelected { preview, .. }
            | ViewState::Uploading { preview, .. }
            | ViewState::ResultsShown { preview, .. } => preview,
        }
    }

    pub fn notice(&self) -> Option<&'a Notice> {
        match *self {
            ViewState::FileSelected { notice, .. } | ViewState::ResultsShown { notice, .. } => notice,
            ViewState::NoFile | ViewState::Uploading { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&'a AnalysisResult> {
        match *self {
            ViewState::ResultsShown { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Text rendering of one [`ViewState`]
pub struct Screen<'a> {
    state: ViewState<'a>,
    assets: &'a AssetResolver,
}

impl<'a> Screen<'a> {
    pub fn new(state: ViewState<'a>, assets: &'a AssetResolver) -> Self {
        Self { state, assets }
    }

    pub fn state(&self) -> &ViewState<'a> {
        &self.state
    }

    /// Timeline for the current result, if any
    pub fn timeline(&self) -> Option<SuggestionTimeline> {
        self.state
            .result()
            .map(|result| SuggestionTimeline::render(result, self.assets))
    }

    fn write_upload_area(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Upload")?;
        writeln!(f, "  Type 'open <path>' to choose a video")?;
        writeln!(f, "  MP4, AVI, MOV files supported")?;

        let Some(file) = self.state.file() else {
            return Ok(());
        };

        match self.state {
            ViewState::Uploading { uploading, .. } if uploading == file => {
                writeln!(f, "  File: {}  [Processing...] (busy)", file.name())?;
            }
            ViewState::Uploading { uploading, .. } => {
                writeln!(f, "  File: {}  [Analyze Video] (disabled)", file.name())?;
                writeln!(f, "  [Processing...] previous upload {} (busy)", uploading.name())?;
            }
            _ if self.state.can_submit() => writeln!(f, "  File: {}  [Analyze Video]", file.name())?,
            _ => writeln!(f, "  File: {}  [Analyze Video] (disabled)", file.name())?,
        }
        Ok(())
    }

    fn write_player(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(preview) = self.state.preview() {
            writeln!(f)?;
            writeln!(f, "Video Player")?;
            writeln!(f, "  {} ({})", preview.name(), preview.reference())?;
        }
        Ok(())
    }

    fn write_timeline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(timeline) = self.timeline() else {
            return Ok(());
        };

        writeln!(f)?;
        writeln!(f, "AI Suggestions")?;
        for entry in timeline.entries() {
            writeln!(
                f,
                "  [{}] {}  {}  {}",
                entry.index + 1,
                entry.time_range,
                entry.title,
                entry.confidence_label()
            )?;
            writeln!(f, "      {}", entry.description)?;
            writeln!(f, "      image: {}", entry.image_url)?;
        }
        Ok(())
    }

    fn write_library(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Meme Library")?;
        for entry in REFERENCE_LIBRARY.iter() {
            writeln!(f, "  {:<16} {:<24} [{}]", entry.name, entry.description, entry.mood)?;
        }

        if let Some(result) = self.state.result() {
            writeln!(f)?;
            writeln!(f, "Analysis Complete")?;
            writeln!(f, "  File: {}", result.video_file())?;
            writeln!(f, "  Suggestions: {}", result.suggestions().len())?;
            writeln!(
                f,
                "  Processed: {}",
                result.processed_at().with_timezone(&Local).format("%H:%M:%S")
            )?;
            if let Some(file_id) = result.file_id() {
                writeln!(f, "  Result ID: {}", file_id)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Screen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(f, "{}", "─".repeat(RULE_WIDTH))?;

        self.write_upload_area(f)?;

        if let Some(notice) = self.state.notice() {
            writeln!(f)?;
            writeln!(f, "! {} (type 'dismiss' to close)", notice.message)?;
        }

        if let Some(result) = self.state.result() {
            writeln!(f)?;
            writeln!(
                f,
                "✓ Processing completed! Found {} meme suggestions.",
                result.suggestions().len()
            )?;
        }

        self.write_player(f)?;
        self.write_timeline(f)?;
        self.write_library(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AnalysisService;
    use crate::error::{AnalyzerError, Result};
    use crate::models::Suggestion;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct CannedService(fn() -> Result<AnalysisResult>);

    #[async_trait]
    impl AnalysisService for CannedService {
        async fn analyze(&self, _file: &SelectedFile) -> Result<AnalysisResult> {
            (self.0)()
        }
    }

    fn success() -> Result<AnalysisResult> {
        Ok(AnalysisResult::new(
            "clip.mp4",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            vec![Suggestion::new(12.5, 15.0, "success_kid.jpg", "win", 0.9).unwrap()],
        ))
    }

    fn refused() -> Result<AnalysisResult> {
        Err(AnalyzerError::Transport("connection refused".to_string()))
    }

    fn clip() -> SelectedFile {
        SelectedFile::new("/videos/clip.mp4", "clip.mp4", "video/mp4")
    }

    fn render(controller: &UploadController) -> String {
        let assets = AssetResolver::default();
        Screen::new(ViewState::of(controller), &assets).to_string()
    }

    #[test]
    fn test_no_file_state() {
        let controller = UploadController::default();
        let state = ViewState::of(&controller);
        assert_eq!(state.name(), "NoFile");
        assert!(!state.can_submit());

        let text = render(&controller);
        assert!(text.contains("open <path>"));
        assert!(!text.contains("File:"));
        assert!(!text.contains("Video Player"));
        assert!(!text.contains("AI Suggestions"));
        // Library is always visible
        assert!(text.contains("Success Kid"));
        assert!(text.contains("Satisfied Frog"));
    }

    #[test]
    fn test_file_selected_state() {
        let mut controller = UploadController::default();
        controller.select_file(clip()).unwrap();

        let state = ViewState::of(&controller);
        assert_eq!(state.name(), "FileSelected");
        assert!(state.can_submit());

        let text = render(&controller);
        assert!(text.contains("File: clip.mp4  [Analyze Video]"));
        assert!(text.contains("Video Player"));
        assert!(!text.contains("Processing completed"));
    }

    #[test]
    fn test_uploading_state() {
        let mut controller = UploadController::default();
        controller.select_file(clip()).unwrap();
        let _pending = controller.submit().unwrap();

        let state = ViewState::of(&controller);
        assert_eq!(state.name(), "Uploading");
        assert!(!state.can_submit());
        assert!(render(&controller).contains("[Processing...]"));
    }

    #[test]
    fn test_new_file_during_upload_names_the_busy_file() {
        let mut controller = UploadController::default();
        controller.select_file(clip()).unwrap();
        let _pending = controller.submit().unwrap();
        controller
            .select_file(SelectedFile::new("/videos/next.mp4", "next.mp4", "video/mp4"))
            .unwrap();

        assert_eq!(ViewState::of(&controller).name(), "Uploading");
        let text = render(&controller);
        assert!(text.contains("File: next.mp4  [Analyze Video] (disabled)"));
        assert!(text.contains("[Processing...] previous upload clip.mp4 (busy)"));
        assert!(!text.contains("File: next.mp4  [Processing...]"));
    }

    #[tokio::test]
    async fn test_results_shown_state() {
        let mut controller = UploadController::default();
        controller.select_file(clip()).unwrap();
        controller.submit_and_wait(&CannedService(success)).await;

        let state = ViewState::of(&controller);
        assert_eq!(state.name(), "ResultsShown");
        assert!(state.can_submit());

        let text = render(&controller);
        assert!(text.contains("Found 1 meme suggestions"));
        assert!(text.contains("0:12-0:15"));
        assert!(text.contains("success_kid Meme"));
        assert!(text.contains("90% match"));
        assert!(text.contains("image: /memes/success_kid.jpg"));
        assert!(text.contains("Analysis Complete"));
        assert!(text.contains("  Suggestions: 1"));
        assert!(text.contains("  File: clip.mp4"));
        assert!(text.contains("Processed: "));
    }

    #[tokio::test]
    async fn test_failure_notice_over_previous_results() {
        let mut controller = UploadController::default();
        controller.select_file(clip()).unwrap();
        controller.submit_and_wait(&CannedService(success)).await;
        controller.submit_and_wait(&CannedService(refused)).await;

        let state = ViewState::of(&controller);
        assert_eq!(state.name(), "ResultsShown");

        let text = render(&controller);
        assert!(text.contains("! Upload failed. Please check if the backend server is running."));
        assert!(text.contains("Found 1 meme suggestions"));

        controller.dismiss_notice();
        assert!(!render(&controller).contains("Upload failed"));
    }

    #[tokio::test]
    async fn test_failure_without_results_returns_to_file_selected() {
        let mut controller = UploadController::default();
        controller.select_file(clip()).unwrap();
        controller.submit_and_wait(&CannedService(refused)).await;

        let state = ViewState::of(&controller);
        assert_eq!(state.name(), "FileSelected");
        assert!(state.can_submit());
        assert!(state.notice().is_some());
    }

    #[tokio::test]
    async fn test_new_file_after_results() {
        let mut controller = UploadController::default();
        controller.select_file(clip()).unwrap();
        controller.submit_and_wait(&CannedService(success)).await;
        controller
            .select_file(SelectedFile::new("/videos/next.mp4", "next.mp4", "video/mp4"))
            .unwrap();

        assert_eq!(ViewState::of(&controller).name(), "FileSelected");
        assert!(!render(&controller).contains("AI Suggestions"));
    }

    #[test]
    fn test_stored_result_without_player() {
        let mut controller = UploadController::default();
        let result = success().unwrap();
        controller.show_result(result);

        let state = ViewState::of(&controller);
        assert_eq!(state.name(), "ResultsShown");
        assert!(!state.can_submit());

        let text = render(&controller);
        assert!(!text.contains("Video Player"));
        assert!(text.contains("AI Suggestions"));
    }
}
