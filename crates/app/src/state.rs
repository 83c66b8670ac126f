use anyhow::Context;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use treeshift_core::palette::Rgb;
use treeshift_core::transition::{MotionKind, Timing};
use treeshift_core::{source, Config, Frame, Identity, Playback, Rect, Series};

pub enum LoadMsg {
    Done(Series, Config),
    Error(String),
}

/// A leaf cell moving between two rectangles.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub identity: Identity,
    pub from: Rect,
    pub to: Rect,
    pub color: Rgb,
    pub exiting: bool,
}

/// A domain group box; headers carry the domain label.
#[derive(Debug, Clone)]
pub struct GroupSprite {
    pub key: String,
    pub from: Rect,
    pub to: Rect,
    pub color: Rgb,
}

pub struct AppState {
    pub source: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub load_rx: Option<Receiver<LoadMsg>>,
    pub playback: Option<Playback>,
    pub sprites: Vec<Sprite>,
    pub groups: Vec<GroupSprite>,
    pub label: String,
    pub timing: Option<Timing>,
    pub started: Instant,
    pub status: Option<String>,
}

impl AppState {
    pub fn new(source: Option<PathBuf>, config_path: Option<PathBuf>) -> Self {
        Self {
            source,
            config_path,
            load_rx: None,
            playback: None,
            sprites: Vec::new(),
            groups: Vec::new(),
            label: String::new(),
            timing: None,
            started: Instant::now(),
            status: None,
        }
    }

    pub fn start_load(&mut self, data: PathBuf) {
        self.source = Some(data.clone());
        self.playback = None;
        self.sprites.clear();
        self.groups.clear();
        self.label.clear();
        self.status = Some(format!("Loading {}", data.display()));

        let (tx, rx): (Sender<LoadMsg>, Receiver<LoadMsg>) = unbounded();
        self.load_rx = Some(rx);
        let config_path = self.config_path.clone();
        std::thread::spawn(move || {
            let msg = match load(&data, config_path.as_deref()) {
                Ok((series, config)) => LoadMsg::Done(series, config),
                Err(e) => LoadMsg::Error(format!("{e:#}")),
            };
            let _ = tx.send(msg);
        });
    }

    /// Builds the playback for a freshly loaded series, shows its latest
    /// slice and starts cycling.
    pub fn finish_load(&mut self, series: Series, config: Config, now: Instant) {
        let mut playback = match Playback::new(series, config) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "cannot play series");
                self.status = Some(e.to_string());
                return;
            }
        };
        match playback.initial_frame() {
            Ok(frame) => self.apply_frame(&frame, now),
            Err(e) => self.status = Some(e.to_string()),
        }
        playback.start(now);
        self.playback = Some(playback);
    }

    pub fn toggle_playing(&mut self, now: Instant) {
        if let Some(playback) = &mut self.playback {
            if playback.is_running() {
                playback.pause();
            } else {
                playback.start(now);
            }
        }
    }

    /// Jumps back to the latest slice; every cell grows in again.
    pub fn restart(&mut self, now: Instant) {
        let Some(playback) = &mut self.playback else {
            return;
        };
        let frame = playback.rewind();
        if playback.is_running() {
            playback.start(now);
        }
        match frame {
            Ok(frame) => {
                self.groups.clear();
                self.apply_frame(&frame, now);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Advances playback; returns true when a new frame arrived.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(playback) = &mut self.playback else {
            return false;
        };
        match playback.poll(now) {
            Some(Ok(frame)) => {
                self.apply_frame(&frame, now);
                true
            }
            Some(Err(e)) => {
                self.status = Some(e.to_string());
                false
            }
            None => false,
        }
    }

    /// Replaces the on-screen sprites with the motions of `frame`. Exited
    /// cells keep animating until they vanish.
    pub fn apply_frame(&mut self, frame: &Frame, now: Instant) {
        let fallback = Rgb { r: 128, g: 128, b: 128 };
        self.sprites = frame
            .plan
            .motions()
            .map(|m| Sprite {
                identity: m.identity.clone(),
                from: m.from,
                to: m.to,
                color: frame.color_of(&m.identity.domain).unwrap_or(fallback),
                exiting: m.kind == MotionKind::Exit,
            })
            .collect();

        let previous: HashMap<String, Rect> = self
            .groups
            .drain(..)
            .map(|g| (g.key, g.to))
            .collect();
        self.groups = frame
            .domains
            .iter()
            .map(|d| GroupSprite {
                key: d.key.clone(),
                from: previous.get(&d.key).copied().unwrap_or_else(|| d.rect.collapsed()),
                to: d.rect,
                color: d.color,
            })
            .collect();

        self.label = frame.label.clone();
        self.timing = Some(frame.plan.timing);
        self.started = now;
        self.status = None;
    }

    pub fn progress(&self, now: Instant) -> f64 {
        self.timing
            .map_or(1.0, |t| t.progress(now.saturating_duration_since(self.started)))
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.timing
            .map_or(false, |t| !t.is_done(now.saturating_duration_since(self.started)))
    }

    /// Sprites still visible at `now`, with their current rectangles.
    pub fn visible(&self, now: Instant) -> impl Iterator<Item = (&Sprite, Rect)> + '_ {
        let t = self.progress(now);
        let done = !self.is_animating(now);
        self.sprites
            .iter()
            .filter(move |s| !(done && s.exiting))
            .map(move |s| (s, s.from.lerp(&s.to, t)))
    }

    pub fn visible_groups(&self, now: Instant) -> impl Iterator<Item = (&GroupSprite, Rect)> + '_ {
        let t = self.progress(now);
        self.groups.iter().map(move |g| (g, g.from.lerp(&g.to, t)))
    }

    pub fn poll_load(&mut self, now: Instant) -> bool {
        let Some(rx) = self.load_rx.take() else {
            return false;
        };
        match rx.try_recv() {
            Ok(LoadMsg::Done(series, config)) => {
                self.finish_load(series, config, now);
                true
            }
            Ok(LoadMsg::Error(e)) => {
                tracing::error!(error = %e, "load failed");
                self.status = Some(e);
                true
            }
            Err(crossbeam_channel::TryRecvError::Empty) => {
                self.load_rx = Some(rx);
                false
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                self.status = Some("loader stopped unexpectedly".to_string());
                true
            }
        }
    }
}

fn load(data: &Path, config: Option<&Path>) -> anyhow::Result<(Series, Config)> {
    let series =
        source::load_series(data).with_context(|| format!("reading {}", data.display()))?;
    let config = match config {
        Some(path) => {
            Config::load(path).with_context(|| format!("reading config {}", path.display()))?
        }
        None => Config::default(),
    };
    Ok((series, config))
}
