//! Suggestion timeline: display entries derived from an analysis result

use tracing::warn;
use url::Url;

use crate::config::AssetConfig;
use crate::models::{AnalysisResult, Suggestion};
use crate::playback::PlaybackController;
use crate::time_format::format_time_range;

/// Image extensions stripped when deriving a title
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Word appended to derived titles
const TITLE_SUFFIX: &str = "Meme";

/// Resolves meme image identifiers to `/<assets-root>/<meme_file>`
#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: String,
    base_url: Option<Url>,
}

impl AssetResolver {
    pub fn new(root: &str, base_url: Option<Url>) -> Self {
        Self {
            root: root.trim_matches('/').to_string(),
            base_url,
        }
    }

    /// Build a resolver from configuration. An unparseable base URL is
    /// logged and paths stay relative.
    pub fn from_config(config: &AssetConfig) -> Self {
        let base_url = config.base_url.as_deref().and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Ignoring invalid assets base_url '{}': {}", raw, e);
                None
            }
        });
        Self::new(&config.assets_root, base_url)
    }

    /// Location of a meme image
    pub fn resolve(&self, meme_file: &str) -> String {
        let path = format!("/{}/{}", self.root, urlencoding::encode(meme_file));
        match &self.base_url {
            Some(base) => base
                .join(&path)
                .map(|url| url.to_string())
                .unwrap_or(path),
            None => path,
        }
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new("memes", None)
    }
}

/// Display title for a meme image: `success_kid.jpg` becomes `success_kid Meme`
pub fn meme_title(meme_file: &str) -> String {
    let lower = meme_file.to_ascii_lowercase();
    let stem = IMAGE_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| &meme_file[..meme_file.len() - ext.len()])
        .unwrap_or(meme_file);

    format!("{} {}", stem, TITLE_SUFFIX)
}

/// Confidence as a whole percentage, `round(confidence * 100)`
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence * 100.0).round().clamp(0.0, 100.0) as u32
}

/// One rendered suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    /// Position in the service-supplied order, 0-based
    pub index: usize,
    /// Seek target in seconds
    pub start: f64,
    pub time_range: String,
    pub title: String,
    pub description: String,
    pub confidence_percent: u32,
    pub image_url: String,
}

impl TimelineEntry {
    fn from_suggestion(index: usize, suggestion: &Suggestion, assets: &AssetResolver) -> Self {
        Self {
            index,
            start: suggestion.start(),
            time_range: format_time_range(suggestion.start(), suggestion.end()),
            title: meme_title(suggestion.meme_file()),
            description: suggestion.description().to_string(),
            confidence_percent: confidence_percent(suggestion.confidence()),
            image_url: assets.resolve(suggestion.meme_file()),
        }
    }

    /// e.g. `87% match`
    pub fn confidence_label(&self) -> String {
        format!("{}% match", self.confidence_percent)
    }
}

/// Ordered entries for every suggestion in a result, in the order received
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionTimeline {
    entries: Vec<TimelineEntry>,
}

impl SuggestionTimeline {
    pub fn render(result: &AnalysisResult, assets: &AssetResolver) -> Self {
        let entries = result
            .suggestions()
            .iter()
            .enumerate()
            .map(|(index, suggestion)| TimelineEntry::from_suggestion(index, suggestion, assets))
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activate the entry at `index`: seek the player to its start.
    ///
    /// Returns `false` when the index is out of range or no player is bound.
    pub fn click(&self, index: usize, playback: &PlaybackController) -> bool {
        match self.entries.get(index) {
            Some(entry) => playback.seek_and_play(entry.start),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{MediaElement, SharedMedia};
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    struct PositionOnly(f64);

    impl MediaElement for PositionOnly {
        fn set_current_time(&mut self, seconds: f64) {
            self.0 = seconds;
        }

        fn current_time(&self) -> f64 {
            self.0
        }

        fn play(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn three_suggestions() -> AnalysisResult {
        AnalysisResult::new(
            "clip.mp4",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            vec![
                Suggestion::new(42.0, 47.0, "sad_cat.jpg", "loss", 0.873).unwrap(),
                Suggestion::new(3.25, 8.25, "success_kid.jpg", "win", 0.9).unwrap(),
                Suggestion::new(125.0, 130.0, "angry baby.png", "rage", 0.713).unwrap(),
            ],
        )
    }

    #[test]
    fn test_meme_title() {
        assert_eq!(meme_title("success_kid.jpg"), "success_kid Meme");
        assert_eq!(meme_title("meme_1.JPG"), "meme_1 Meme");
        assert_eq!(meme_title("cat.png"), "cat Meme");
        assert_eq!(meme_title("frog"), "frog Meme");
    }

    #[test]
    fn test_confidence_percent() {
        assert_eq!(confidence_percent(0.873), 87);
        assert_eq!(confidence_percent(0.9), 90);
        assert_eq!(confidence_percent(0.875), 88);
        assert_eq!(confidence_percent(0.0), 0);
        assert_eq!(confidence_percent(1.0), 100);
    }

    #[test]
    fn test_render_preserves_order() {
        let timeline = SuggestionTimeline::render(&three_suggestions(), &AssetResolver::default());
        assert_eq!(timeline.len(), 3);

        let titles: Vec<&str> = timeline.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["sad_cat Meme", "success_kid Meme", "angry baby Meme"]);

        let first = &timeline.entries()[0];
        assert_eq!(first.time_range, "0:42-0:47");
        assert_eq!(first.confidence_label(), "87% match");
        assert_eq!(first.description, "loss");
        assert_eq!(first.image_url, "/memes/sad_cat.jpg");

        let last = &timeline.entries()[2];
        assert_eq!(last.time_range, "2:05-2:10");
        assert_eq!(last.confidence_label(), "71% match");
        assert_eq!(last.image_url, "/memes/angry%20baby.png");
    }

    #[test]
    fn test_asset_resolution() {
        let relative = AssetResolver::new("/static/memes/", None);
        assert_eq!(relative.resolve("cat.jpg"), "/static/memes/cat.jpg");

        let hosted = AssetResolver::new("memes", Some(Url::parse("http://localhost:5050").unwrap()));
        assert_eq!(hosted.resolve("cat.jpg"), "http://localhost:5050/memes/cat.jpg");

        let config = AssetConfig {
            assets_root: "memes".to_string(),
            base_url: Some("not a url".to_string()),
        };
        assert_eq!(AssetResolver::from_config(&config).resolve("cat.jpg"), "/memes/cat.jpg");
    }

    #[test]
    fn test_click_seeks_to_entry_start() {
        let timeline = SuggestionTimeline::render(&three_suggestions(), &AssetResolver::default());
        let media: SharedMedia = Arc::new(Mutex::new(PositionOnly(0.0)));
        let mut playback = PlaybackController::new();

        // Nothing mounted yet
        assert!(!timeline.click(1, &playback));

        playback.bind(&media);
        assert!(timeline.click(1, &playback));
        assert_eq!(media.lock().unwrap().current_time(), 3.25);

        assert!(!timeline.click(3, &playback));
        assert_eq!(media.lock().unwrap().current_time(), 3.25);
    }
}
