//! Upload workflow: file selection, submission and result handling
//!
//! The controller is driven by discrete events. [`UploadController::submit`]
//! hands out a [`PendingUpload`] that performs the one network call; its
//! [`UploadCompletion`] is fed back through [`UploadController::complete`].
//! Completions for anything other than the outstanding upload are dropped.

use tracing::{debug, info, warn};

use crate::client::AnalysisService;
use crate::error::{AnalyzerError, FailureKind, Result};
use crate::models::AnalysisResult;
use crate::selection::{PreviewRegistry, PreviewSource, SelectedFile};

/// Upload lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Blocking, dismissible message shown after a failed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: FailureKind,
    pub message: String,
}

impl Notice {
    fn for_failure(error: &AnalyzerError) -> Self {
        let kind = error.failure_kind();
        let message = match kind {
            FailureKind::Transport => "Upload failed. Please check if the backend server is running.",
            FailureKind::Server | FailureKind::MalformedResponse => "Upload failed. Please try again.",
        };
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

/// An accepted submit, ready to run
#[derive(Debug)]
pub struct PendingUpload {
    ticket: u64,
    file: SelectedFile,
}

impl PendingUpload {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    /// Perform the upload. Exactly one service call, no retry.
    pub async fn run(self, service: &dyn AnalysisService) -> UploadCompletion {
        let outcome = service.analyze(&self.file).await;
        UploadCompletion {
            ticket: self.ticket,
            outcome,
        }
    }
}

/// Outcome of a [`PendingUpload`]
#[derive(Debug)]
pub struct UploadCompletion {
    pub ticket: u64,
    pub outcome: Result<AnalysisResult>,
}

/// What [`UploadController::complete`] did with a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    Stored,
    Failed,
    /// Late, duplicate or superseded response
    Discarded,
}

/// Owns the selected file, its preview and the latest analysis result
#[derive(Debug)]
pub struct UploadController {
    previews: PreviewRegistry,
    selected: Option<SelectedFile>,
    preview: Option<PreviewSource>,
    status: UploadStatus,
    result: Option<AnalysisResult>,
    notice: Option<Notice>,
    next_ticket: u64,
    outstanding: Option<u64>,
    // Ticket whose response may still be stored; cleared when the file
    // changes under an outstanding upload.
    accepting: Option<u64>,
    uploading: Option<SelectedFile>,
}

impl UploadController {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            previews,
            selected: None,
            preview: None,
            status: UploadStatus::Idle,
            result: None,
            notice: None,
            next_ticket: 0,
            outstanding: None,
            accepting: None,
            uploading: None,
        }
    }

    /// Select a video. Non-video input is rejected and changes nothing.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<()> {
        if !file.is_video() {
            debug!("Ignoring non-video selection: {} ({})", file.name(), file.mime());
            return Err(AnalyzerError::InvalidSelection {
                name: file.name().to_string(),
                mime: file.mime().to_string(),
            });
        }

        if let Some(previous) = self.preview.take() {
            previous.release();
        }
        self.preview = Some(self.previews.create(&file));
        info!("🎬 Selected {} ({})", file.name(), file.mime());

        self.selected = Some(file);
        self.result = None;
        self.notice = None;

        if self.outstanding.is_some() {
            // Upload keeps running but its response no longer applies
            self.accepting = None;
        } else {
            self.status = UploadStatus::Idle;
        }
        Ok(())
    }

    /// Start an upload of the selected file.
    ///
    /// Returns `None` when nothing is selected or an upload is in flight.
    pub fn submit(&mut self) -> Option<PendingUpload> {
        let Some(file) = self.selected.clone() else {
            debug!("Submit ignored: no file selected");
            return None;
        };
        if self.status == UploadStatus::InFlight {
            debug!("Submit ignored: upload already in flight");
            return None;
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.outstanding = Some(ticket);
        self.accepting = Some(ticket);
        self.uploading = Some(file.clone());
        self.status = UploadStatus::InFlight;
        self.notice = None;
        info!("📤 Upload #{} started for {}", ticket, file.name());

        Some(PendingUpload { ticket, file })
    }

    /// Apply the outcome of an upload
    pub fn complete(&mut self, completion: UploadCompletion) -> CompletionEffect {
        if self.outstanding != Some(completion.ticket) {
            warn!("Discarding response for upload #{} (not outstanding)", completion.ticket);
            return CompletionEffect::Discarded;
        }
        self.outstanding = None;
        self.uploading = None;

        if self.accepting.take() != Some(completion.ticket) {
            info!("Discarding response for upload #{}: file was replaced", completion.ticket);
            self.status = UploadStatus::Idle;
            return CompletionEffect::Discarded;
        }

        match completion.outcome {
            Ok(result) => {
                info!(
                    "✅ Upload #{} succeeded: {} suggestions",
                    completion.ticket,
                    result.suggestions().len()
                );
                self.result = Some(result);
                self.status = UploadStatus::Succeeded;
                CompletionEffect::Stored
            }
            Err(e) => {
                warn!("❌ Upload #{} failed: {}", completion.ticket, e);
                self.notice = Some(Notice::for_failure(&e));
                self.status = UploadStatus::Failed;
                CompletionEffect::Failed
            }
        }
    }

    /// Submit and wait for the outcome in one step
    pub async fn submit_and_wait(&mut self, service: &dyn AnalysisService) -> Option<CompletionEffect> {
        let pending = self.submit()?;
        let completion = pending.run(service).await;
        Some(self.complete(completion))
    }

    /// Show a result obtained outside the upload flow, e.g. a stored one.
    /// Ignored while an upload is in flight.
    pub fn show_result(&mut self, result: AnalysisResult) -> bool {
        if self.status == UploadStatus::InFlight {
            return false;
        }
        self.result = Some(result);
        self.status = UploadStatus::Succeeded;
        self.notice = None;
        true
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Release the preview and forget the selection
    pub fn teardown(&mut self) {
        if let Some(preview) = self.preview.take() {
            preview.release();
        }
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    /// File whose bytes the outstanding upload is sending. Differs from
    /// [`UploadController::selected`] once a new file is chosen mid-upload.
    pub fn uploading(&self) -> Option<&SelectedFile> {
        self.uploading.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewSource> {
        self.preview.as_ref()
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new(PreviewRegistry::new())
    }
}
