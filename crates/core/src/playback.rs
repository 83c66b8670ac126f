use crate::config::Config;
use crate::ease::Ease;
use crate::error::{Error, Result};
use crate::hierarchy::Hierarchy;
use crate::model::{Rect, Series};
use crate::palette::{PaletteStore, Rgb};
use crate::transition::{Timing, TransitionPlan, TransitionScheduler};
use crate::treemap::Tiler;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainHeader {
    pub key: String,
    pub rect: Rect,
    pub color: Rgb,
}

/// Everything the renderer needs for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub slice_index: usize,
    /// Slice timestamp formatted with the configured date format.
    pub label: String,
    pub bounds: Rect,
    pub domains: Vec<DomainHeader>,
    pub plan: TransitionPlan,
}

impl Frame {
    pub fn color_of(&self, domain: &str) -> Option<Rgb> {
        self.domains.iter().find(|d| d.key == domain).map(|d| d.color)
    }
}

/// Cycles through a series, one layout + diff per tick. The cursor moves
/// from the oldest slice toward index 0 and wraps.
pub struct Playback {
    series: Series,
    config: Config,
    store: PaletteStore,
    tiler: Tiler,
    scheduler: TransitionScheduler,
    cursor: usize,
    running: bool,
    last_tick: Option<Instant>,
}

impl Playback {
    pub fn new(series: Series, config: Config) -> Result<Self> {
        config.validate()?;
        if series.is_empty() {
            return Err(Error::EmptySeries);
        }
        let mut store = PaletteStore::new(config.palette_rgb()?)?;
        store.prime(&series);
        tracing::info!(
            slices = series.len(),
            domains = store.len(),
            "playback ready"
        );
        let timing = Timing::new(config.transition_duration(), Ease::InOutQuad);
        Ok(Self {
            cursor: series.len() - 1,
            tiler: Tiler::from_config(&config),
            scheduler: TransitionScheduler::new(timing),
            series,
            config,
            store,
            running: false,
            last_tick: None,
        })
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn palette(&self) -> &PaletteStore {
        &self.store
    }

    /// Slice the next tick will render.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts playing. The first tick comes one interval after `now`, so
    /// whatever is on screen stays up for a full interval.
    pub fn start(&mut self, now: Instant) {
        self.running = true;
        self.last_tick = Some(now);
    }

    /// Stops scheduling ticks; transitions already handed out keep playing.
    pub fn pause(&mut self) {
        self.running = false;
        self.last_tick = None;
    }

    /// Treemap area: the canvas minus its margins.
    pub fn bounds(&self) -> Rect {
        let c = &self.config;
        Rect::new(
            c.margin.left,
            c.margin.top,
            c.canvas_width - c.margin.right,
            c.canvas_height - c.margin.bottom,
        )
    }

    /// Frame for the latest slice, shown before playback starts.
    pub fn initial_frame(&mut self) -> Result<Frame> {
        self.render(0)
    }

    /// Back to the latest slice with no history: the returned frame is all
    /// enters and the tiler squarifies from scratch.
    pub fn rewind(&mut self) -> Result<Frame> {
        self.cursor = self.series.len() - 1;
        self.scheduler.reset();
        self.tiler.forget();
        self.initial_frame()
    }

    /// Renders the slice under the cursor and advances it. The cursor moves
    /// on even when the slice fails, so one bad slice never stalls playback.
    pub fn tick(&mut self) -> Result<Frame> {
        let index = self.cursor;
        self.cursor = if index == 0 {
            self.series.len() - 1
        } else {
            index - 1
        };
        let frame = self.render(index);
        if let Err(e) = &frame {
            tracing::warn!(slice = index, error = %e, "skipping tick");
        }
        frame
    }

    /// Runs a tick when playing and at least one interval has passed since
    /// the previous one.
    pub fn poll(&mut self, now: Instant) -> Option<Result<Frame>> {
        if !self.running {
            return None;
        }
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < self.config.tick_interval() {
                return None;
            }
        }
        self.last_tick = Some(now);
        Some(self.tick())
    }

    /// Drives `ticks` ticks back to back, sleeping one interval between them
    /// when `realtime` is set.
    pub fn run_for<F>(&mut self, ticks: usize, realtime: bool, mut sink: F)
    where
        F: FnMut(Result<Frame>),
    {
        self.start(Instant::now());
        for n in 0..ticks {
            if !self.running {
                break;
            }
            if realtime && n > 0 {
                std::thread::sleep(self.config.tick_interval());
            }
            sink(self.tick());
        }
        self.pause();
    }

    fn render(&mut self, index: usize) -> Result<Frame> {
        let slice = self.series.get(index).ok_or(Error::SliceOutOfRange {
            index,
            len: self.series.len(),
        })?;
        let bounds = self.bounds();
        let hierarchy = Hierarchy::build(slice, index, &self.config.size_mode, &mut self.store)?;
        let layout = self.tiler.layout(&hierarchy, bounds)?;
        let plan = self.scheduler.plan(&layout.leaves)?;

        let domains = layout
            .domains
            .iter()
            .map(|d| DomainHeader {
                key: d.key.clone(),
                rect: d.rect,
                color: self.store.assign(&d.key).color,
            })
            .collect();
        let label = slice
            .first()
            .map(|item| item.when.format(&self.config.date_format).to_string())
            .unwrap_or_default();

        tracing::debug!(slice = index, label = %label, actions = plan.len(), "rendered frame");
        Ok(Frame {
            slice_index: index,
            label,
            bounds: layout.bounds,
            domains,
            plan,
        })
    }
}
