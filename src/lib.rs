//! AI Video Meme Analyzer - client library
//!
//! Uploads a video to the meme analysis service and turns the returned
//! suggestions into a navigable timeline bound to a video player.

pub mod client;
pub mod config;
pub mod error;
pub mod library;
pub mod models;
pub mod playback;
pub mod selection;
pub mod session;
pub mod time_format;
pub mod timeline;
pub mod upload;
pub mod view;

// Re-export main types for easy access
pub use crate::client::{AnalysisService, HttpAnalysisClient};
pub use crate::config::Config;
pub use crate::error::{AnalyzerError, FailureKind, Result};
pub use crate::models::{AnalysisResult, Suggestion};
pub use crate::playback::{MediaElement, PlaybackController};
pub use crate::selection::{PreviewRegistry, PreviewSource, SelectedFile};
pub use crate::session::Session;
pub use crate::time_format::format_time;
pub use crate::timeline::{AssetResolver, SuggestionTimeline, TimelineEntry};
pub use crate::upload::{UploadController, UploadStatus};
pub use crate::view::{Screen, ViewState};
