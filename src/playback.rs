//! Video playback: the media element seam and the controller that seeks it

use anyhow::{anyhow, Result};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::selection::{PreviewRegistry, PreviewSource};

/// A mounted video player
pub trait MediaElement: Send {
    /// Move the playback position
    fn set_current_time(&mut self, seconds: f64);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Start playing from the current position
    fn play(&mut self) -> Result<()>;
}

/// Shared handle to the mounted media element
pub type SharedMedia = Arc<Mutex<dyn MediaElement>>;

/// Seeks the currently mounted media element.
///
/// Holds a weak reference only: once the element is unmounted every call
/// becomes a no-op.
#[derive(Default)]
pub struct PlaybackController {
    handle: Option<Weak<Mutex<dyn MediaElement>>>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate with the mounted element
    pub fn bind(&mut self, media: &SharedMedia) {
        self.handle = Some(Arc::downgrade(media));
        debug!("Playback bound to media element");
    }

    pub fn unbind(&mut self) {
        self.handle = None;
    }

    /// Whether an element is bound and still mounted
    pub fn is_bound(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Seek to `timestamp` seconds and start playing.
    ///
    /// Returns `false` without side effects when nothing is mounted. Player
    /// errors are logged, never propagated.
    pub fn seek_and_play(&self, timestamp: f64) -> bool {
        let Some(media) = self.handle.as_ref().and_then(|weak| weak.upgrade()) else {
            debug!("Seek to {:.2}s ignored: no video loaded", timestamp);
            return false;
        };

        let mut media = media.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        media.set_current_time(timestamp);
        info!("▶️  Seeking to {:.2}s", timestamp);
        if let Err(e) = media.play() {
            warn!("Playback failed: {}", e);
        }
        true
    }
}

/// Plays a preview in an external player process.
///
/// The preview reference is resolved at play time, so a released preview
/// is never played.
pub struct ExternalPlayer {
    previews: PreviewRegistry,
    reference: String,
    command: String,
    args: Vec<String>,
    position: f64,
    child: Option<Child>,
}

impl ExternalPlayer {
    /// Mount a player for the given preview
    pub fn mount(config: &PlayerConfig, previews: &PreviewRegistry, preview: &PreviewSource) -> SharedMedia {
        Arc::new(Mutex::new(Self {
            previews: previews.clone(),
            reference: preview.reference(),
            command: config.command.clone(),
            args: config.args.clone(),
            position: 0.0,
            child: None,
        }))
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Player process already exited: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl MediaElement for ExternalPlayer {
    fn set_current_time(&mut self, seconds: f64) {
        self.position = seconds.max(0.0);
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn play(&mut self) -> Result<()> {
        let path = self
            .previews
            .resolve(&self.reference)
            .ok_or_else(|| anyhow!("preview {} has been released", self.reference))?;

        self.stop();

        let start = format!("{:.3}", self.position);
        let path = path.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace("{start}", &start).replace("{path}", &path))
            .collect();

        debug!("Launching player: {} {}", self.command, args.join(" "));
        let child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow!("cannot start player '{}': {}", self.command, e))?;
        self.child = Some(child);
        Ok(())
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
