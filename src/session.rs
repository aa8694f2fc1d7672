//! Interactive session: typed commands and upload completions drive one
//! [`UploadController`], the mounted player and the screen.

use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::AnalysisService;
use crate::error::AnalyzerError;
use crate::playback::{PlaybackController, SharedMedia};
use crate::selection::{PreviewRegistry, PreviewSource, SelectedFile};
use crate::timeline::{AssetResolver, SuggestionTimeline};
use crate::upload::{CompletionEffect, UploadCompletion, UploadController, UploadStatus};
use crate::view::{Screen, ViewState};

const HELP: &str = "\
Commands:
  open <path>   choose a video file
  analyze       upload the chosen video for analysis
  play <n>      jump the player to suggestion n
  dismiss       close the failure notice
  show          redraw the screen
  help          show this help
  quit          exit";

/// A user event
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Open(PathBuf),
    Analyze,
    Play(usize),
    Dismiss,
    Show,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "open" | "o" if !rest.is_empty() => Ok(SessionCommand::Open(PathBuf::from(rest))),
            "open" | "o" => Err("Usage: open <path>".to_string()),
            "analyze" | "a" => Ok(SessionCommand::Analyze),
            "play" | "p" => rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(SessionCommand::Play)
                .ok_or_else(|| "Usage: play <n> (n starts at 1)".to_string()),
            "dismiss" | "d" => Ok(SessionCommand::Dismiss),
            "show" | "s" => Ok(SessionCommand::Show),
            "help" | "h" | "?" => Ok(SessionCommand::Help),
            "quit" | "q" | "exit" => Ok(SessionCommand::Quit),
            _ => Err(format!("Unknown command '{}'. Type 'help' for commands.", word)),
        }
    }
}

/// Whether the session keeps reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Mounts a media element for a preview
pub type PlayerFactory = Box<dyn Fn(&PreviewRegistry, &PreviewSource) -> SharedMedia + Send>;

struct MountedPlayer {
    reference: String,
    media: SharedMedia,
}

/// One user session
pub struct Session {
    controller: UploadController,
    playback: PlaybackController,
    player: Option<MountedPlayer>,
    service: Arc<dyn AnalysisService>,
    assets: AssetResolver,
    player_factory: PlayerFactory,
    completions_tx: mpsc::UnboundedSender<UploadCompletion>,
    completions_rx: mpsc::UnboundedReceiver<UploadCompletion>,
}

impl Session {
    pub fn new(service: Arc<dyn AnalysisService>, assets: AssetResolver, player_factory: PlayerFactory) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            controller: UploadController::default(),
            playback: PlaybackController::new(),
            player: None,
            service,
            assets,
            player_factory,
            completions_tx,
            completions_rx,
        }
    }

    pub fn controller(&self) -> &UploadController {
        &self.controller
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// The mounted media element, present while a preview exists
    pub fn player(&self) -> Option<&SharedMedia> {
        self.player.as_ref().map(|player| &player.media)
    }

    /// Handle one user event
    pub fn handle<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> Result<Flow> {
        debug!("Command: {:?}", command);
        match command {
            SessionCommand::Open(path) => {
                self.open(&path, out)?;
            }
            SessionCommand::Analyze => match self.controller.submit() {
                Some(pending) => {
                    let service = Arc::clone(&self.service);
                    let completions = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let completion = pending.run(service.as_ref()).await;
                        // Receiver only goes away with the session
                        let _ = completions.send(completion);
                    });
                    self.render(out)?;
                }
                None if self.controller.status() == UploadStatus::InFlight => {
                    writeln!(out, "An upload is already in progress.")?;
                }
                None => {
                    writeln!(out, "Choose a video first: open <path>")?;
                }
            },
            SessionCommand::Play(number) => self.play(number, out)?,
            SessionCommand::Dismiss => {
                self.controller.dismiss_notice();
                self.render(out)?;
            }
            SessionCommand::Show => self.render(out)?,
            SessionCommand::Help => writeln!(out, "{}", HELP)?,
            SessionCommand::Quit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    /// Apply an upload completion and redraw
    pub fn apply_completion<W: Write>(&mut self, completion: UploadCompletion, out: &mut W) -> Result<CompletionEffect> {
        let effect = self.controller.complete(completion);
        if effect != CompletionEffect::Discarded || self.controller.status() == UploadStatus::Idle {
            self.render(out)?;
        }
        Ok(effect)
    }

    /// Draw the current screen
    pub fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        let screen = Screen::new(ViewState::of(&self.controller), &self.assets);
        write!(out, "{}", screen)?;
        out.flush()?;
        Ok(())
    }

    /// Read commands until `quit` or end of input. An outstanding upload is
    /// awaited before returning.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        self.render(out)?;
        writeln!(out, "Type 'help' for commands.")?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<SessionCommand>() {
                        Ok(command) => {
                            if self.handle(command, out)? == Flow::Exit {
                                break;
                            }
                        }
                        Err(message) => writeln!(out, "{}", message)?,
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.apply_completion(completion, out)?;
                }
            }
        }

        // No cancellation: an in-flight upload runs to completion
        self.wait_for_upload(out).await?;
        self.shutdown();
        Ok(())
    }

    /// Block until no upload is outstanding, applying completions as they
    /// arrive
    pub async fn wait_for_upload<W: Write>(&mut self, out: &mut W) -> Result<()> {
        while self.controller.status() == UploadStatus::InFlight {
            info!("⏳ Waiting for the outstanding upload to finish");
            match self.completions_rx.recv().await {
                Some(completion) => {
                    self.apply_completion(completion, out)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Unmount the player and release the preview
    pub fn shutdown(&mut self) {
        self.playback.unbind();
        self.player = None;
        self.controller.teardown();
    }

    fn open<W: Write>(&mut self, path: &Path, out: &mut W) -> Result<()> {
        let file = match SelectedFile::from_path(path) {
            Ok(file) => file,
            Err(e) => {
                writeln!(out, "Cannot open {}: {}", path.display(), e)?;
                return Ok(());
            }
        };

        match self.controller.select_file(file) {
            Ok(()) => {
                self.sync_player();
                self.render(out)?;
            }
            Err(AnalyzerError::InvalidSelection { name, mime }) => {
                writeln!(out, "{} is not a video ({}); choose a video file.", name, mime)?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn play<W: Write>(&mut self, number: usize, out: &mut W) -> Result<()> {
        let Some(result) = self.controller.result() else {
            writeln!(out, "No suggestions yet. Analyze a video first.")?;
            return Ok(());
        };

        let timeline = SuggestionTimeline::render(result, &self.assets);
        // Entries are numbered from 1 on screen
        let Some((index, entry)) = number
            .checked_sub(1)
            .and_then(|index| timeline.entries().get(index).map(|entry| (index, entry)))
        else {
            writeln!(out, "No suggestion #{} (1-{})", number, timeline.len())?;
            return Ok(());
        };

        if timeline.click(index, &self.playback) {
            writeln!(out, "▶ Playing from {} ({})", entry.time_range, entry.title)?;
        } else {
            writeln!(out, "No video loaded.")?;
        }
        Ok(())
    }

    /// Keep the mounted player in step with the current preview
    fn sync_player(&mut self) {
        let wanted = self.controller.preview().map(|preview| preview.reference());
        let current = self.player.as_ref().map(|player| player.reference.clone());
        if wanted == current {
            return;
        }

        self.playback.unbind();
        self.player = None;

        if let Some(preview) = self.controller.preview() {
            let media = (self.player_factory)(self.controller.previews(), preview);
            self.playback.bind(&media);
            self.player = Some(MountedPlayer {
                reference: preview.reference(),
                media,
            });
            debug!("Mounted player for {}", preview.reference());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Select, upload and render one file without interaction
pub async fn analyze_once<W: Write>(
    service: &dyn AnalysisService,
    assets: &AssetResolver,
    path: &Path,
    out: &mut W,
) -> Result<UploadStatus> {
    let mut controller = UploadController::default();
    controller.select_file(SelectedFile::from_path(path)?)?;
    controller.submit_and_wait(service).await;

    let screen = Screen::new(ViewState::of(&controller), assets);
    write!(out, "{}", screen)?;
    out.flush()?;

    let status = controller.status();
    controller.teardown();
    Ok(status)
}
