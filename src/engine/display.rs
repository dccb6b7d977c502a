use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use log::{error, info, warn};

use super::assignment::OwnerAssignment;
use super::barrier::SyncBarrier;
use super::dispatcher::Dispatcher;
use super::renderer::{Canvas, DisplayEvent, Renderer};
use super::state::DisplayState;
use super::surface::SharedSurface;
use super::worker::{WorkerContext, WorkerSettings};
use super::worker_pool::WorkerPool;
use crate::buffers::FrontBlock;
use crate::config::{clamp_refresh_interval, DisplayConfig};
use crate::core::{DataFrame, SourceMetadata};
use crate::error::DisplayError;
use crate::observability::{DisplayMetrics, DisplayMonitor};

/// Events queued for the host before new ones are dropped
const EVENT_CAPACITY: usize = 1024;

/// Per-channel parameters of one grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub gains: Vec<f64>,
    /// Channels scaled to fit their data regardless of the global setting
    pub autoscaled: Vec<bool>,
}

impl GridSpec {
    pub fn uniform(channel_count: usize) -> Self {
        Self {
            gains: vec![1.0; channel_count],
            autoscaled: vec![false; channel_count],
        }
    }

    pub fn from_metadata(metadata: &SourceMetadata) -> Self {
        let kind = metadata.array_kind();
        Self {
            gains: (0..metadata.channel_count)
                .map(|c| metadata.gain(c))
                .collect(),
            autoscaled: (0..metadata.channel_count)
                .map(|c| kind.is_autoscaled(c))
                .collect(),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.gains.len()
    }
}

struct Grid {
    generation: u64,
    dispatcher: Dispatcher,
    pool: WorkerPool,
    renderer: Renderer,
    surface: Arc<SharedSurface>,
    barrier: Arc<SyncBarrier>,
}

/// Host-facing entry point: owns the current channel grid, its transfer
/// workers and its render thread
pub struct LiveDisplay {
    config: DisplayConfig,
    state: DisplayState,
    grid: Option<Grid>,
    canvas: Option<Box<dyn Canvas>>,
    events_tx: Sender<DisplayEvent>,
    events_rx: Receiver<DisplayEvent>,
    metrics: Arc<DisplayMetrics>,
    generation: u64,
}

impl LiveDisplay {
    pub fn new(config: DisplayConfig, canvas: Box<dyn Canvas>) -> Result<Self> {
        config.validate()?;
        let (events_tx, events_rx) = bounded(EVENT_CAPACITY);
        Ok(Self {
            config,
            state: DisplayState::Idle,
            grid: None,
            canvas: Some(canvas),
            events_tx,
            events_rx,
            metrics: Arc::new(DisplayMetrics::new()),
            generation: 0,
        })
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size()
    }

    pub fn channel_count(&self) -> usize {
        self.grid
            .as_ref()
            .map(|grid| grid.dispatcher.channel_count())
            .unwrap_or(0)
    }

    pub fn is_accepting(&self) -> bool {
        self.grid
            .as_ref()
            .map(|grid| grid.dispatcher.is_accepting())
            .unwrap_or(false)
    }

    /// Receiver for render-complete and cleared notifications
    pub fn events(&self) -> Receiver<DisplayEvent> {
        self.events_rx.clone()
    }

    pub fn metrics(&self) -> Arc<DisplayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn monitor(&self) -> DisplayMonitor {
        DisplayMonitor::new(self.metrics())
    }

    /// Render rounds triggered on the current grid
    pub fn render_rounds(&self) -> u64 {
        self.grid
            .as_ref()
            .map(|grid| grid.barrier.rounds())
            .unwrap_or(0)
    }

    /// (Re)build the grid with unit gains and no forced autoscaling
    pub fn setup(&mut self, channel_count: usize, assignment: OwnerAssignment) -> Result<()> {
        self.setup_grid(GridSpec::uniform(channel_count), assignment)
    }

    /// Tear down any current grid, then build buffers, workers and the
    /// render thread for `grid`
    pub fn setup_grid(&mut self, grid: GridSpec, assignment: OwnerAssignment) -> Result<()> {
        let channel_count = grid.channel_count();
        if assignment.channel_count() != channel_count {
            return Err(DisplayError::InvalidAssignment(format!(
                "assignment covers {} channels, grid has {}",
                assignment.channel_count(),
                channel_count
            ))
            .into());
        }
        assignment.validate()?;

        self.teardown()?;

        let canvas = self
            .canvas
            .take()
            .ok_or_else(|| anyhow!("No canvas available; the render thread was lost"))?;

        let (surface, writers) = SharedSurface::with_writers(channel_count);
        let (render_tx, render_rx) = unbounded();
        let barrier = Arc::new(SyncBarrier::new(channel_count, render_tx.clone()));
        let context = WorkerContext {
            surface: Arc::clone(&surface),
            barrier: Arc::clone(&barrier),
            metrics: self.metrics(),
            cancelled: Arc::new(AtomicBool::new(false)),
        };

        let pool = match WorkerPool::spawn(
            &assignment,
            writers,
            &grid.autoscaled,
            self.worker_settings(),
            context,
        ) {
            Ok(pool) => pool,
            Err(e) => {
                self.canvas = Some(canvas);
                return Err(e);
            }
        };

        let renderer = match Renderer::spawn(
            canvas,
            Arc::clone(&surface),
            Arc::clone(&barrier),
            (render_tx, render_rx),
            self.events_tx.clone(),
            self.metrics(),
        ) {
            Ok(renderer) => renderer,
            Err(e) => {
                let _ = pool.shutdown();
                return Err(e);
            }
        };

        let dispatcher = Dispatcher::new(&assignment, pool.inboxes(), grid.gains, self.metrics());

        self.generation += 1;
        let generation = self.generation;
        self.transition_to(DisplayState::Running {
            generation,
            channels: channel_count,
        })?;
        self.grid = Some(Grid {
            generation,
            dispatcher,
            pool,
            renderer,
            surface,
            barrier,
        });

        info!(
            "Grid {} ready: {} channels, block size {}",
            generation,
            channel_count,
            self.block_size()
        );
        Ok(())
    }

    /// Hand a frame to the dispatcher. Non-blocking.
    pub fn submit_frame(&mut self, frame: DataFrame) -> Result<usize> {
        let Some(grid) = self.grid.as_mut() else {
            self.metrics.record_frame_rejected();
            return Err(DisplayError::NotRunning.into());
        };
        let sent = grid.dispatcher.dispatch(&frame)?;
        Ok(sent)
    }

    /// Release the current grid: refuse new frames, have every worker drop
    /// its buffers and confirm, stop the renderer, then free the surface
    pub fn teardown(&mut self) -> Result<()> {
        let Some(grid) = self.grid.take() else {
            return Ok(());
        };
        let Grid {
            generation,
            mut dispatcher,
            pool,
            renderer,
            surface,
            barrier,
        } = grid;

        self.transition_to(DisplayState::TearingDown { generation })?;
        dispatcher.stop_accepting();

        let acks = pool.shutdown();
        let canvas = renderer.shutdown();

        drop(dispatcher);
        drop(barrier);
        drop(surface);

        let restored = match canvas {
            Ok(canvas) => {
                self.canvas = Some(canvas);
                Ok(())
            }
            Err(e) => {
                error!("Grid {}: {}", generation, e);
                Err(e)
            }
        };

        self.transition_to(DisplayState::Idle)?;
        self.notify(DisplayEvent::Cleared { generation });

        let acks = acks?;
        let released: usize = acks.iter().map(|ack| ack.released_channels).sum();
        info!(
            "Grid {} torn down: {} workers released {} channels",
            generation,
            acks.len(),
            released
        );
        restored
    }

    /// Last drawn block of a channel, for inspector views
    pub fn inspect(&self, channel: usize) -> Option<Arc<FrontBlock>> {
        self.grid
            .as_ref()
            .and_then(|grid| grid.surface.inspect(channel))
    }

    /// Toggle the highlight of a channel; takes effect at its next swap
    pub fn toggle_selected(&mut self, channel: usize) -> Option<bool> {
        self.grid
            .as_mut()
            .and_then(|grid| grid.dispatcher.toggle_selected(channel))
    }

    /// Returns the interval actually applied after clamping
    pub fn set_refresh_interval(&mut self, seconds: f64) -> Result<f64> {
        if !seconds.is_finite() {
            return Err(DisplayError::InvalidConfig(format!(
                "refresh interval must be finite, got {}",
                seconds
            ))
            .into());
        }
        let mut next = self.config.clone();
        next.refresh_interval = clamp_refresh_interval(seconds);
        next.validate()?;
        let applied = next.refresh_interval;
        self.config = next;
        self.push_settings();
        Ok(applied)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        let mut next = self.config.clone();
        next.sample_rate = sample_rate;
        next.validate()?;
        self.config = next;
        self.push_settings();
        Ok(())
    }

    pub fn set_autoscale(&mut self, autoscale: bool) {
        self.config.autoscale = autoscale;
        self.push_settings();
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        let mut next = self.config.clone();
        next.scale = scale;
        next.validate()?;
        self.config = next;
        self.push_settings();
        Ok(())
    }

    fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            refresh_interval: self.config.refresh_interval,
            sample_rate: self.config.sample_rate,
            format: self.config.format_settings(),
        }
    }

    fn push_settings(&self) {
        if let Some(grid) = &self.grid {
            grid.pool.reconfigure(self.worker_settings());
        }
    }

    fn notify(&self, event: DisplayEvent) {
        if let Err(TrySendError::Full(_)) = self.events_tx.try_send(event) {
            self.metrics.record_dropped_event();
        }
    }

    fn transition_to(&mut self, next: DisplayState) -> Result<()> {
        if !self.state.can_transition_to(&next) {
            return Err(anyhow!(
                "Invalid state transition: {} -> {}",
                self.state.name(),
                next.name()
            ));
        }
        self.state = next;
        Ok(())
    }
}

impl Drop for LiveDisplay {
    fn drop(&mut self) {
        if self.grid.is_some() {
            if let Err(e) = self.teardown() {
                warn!("Teardown on drop failed: {}", e);
            }
        }
    }
}
