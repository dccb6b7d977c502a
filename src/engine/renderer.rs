use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, warn};

use super::barrier::SyncBarrier;
use super::surface::SharedSurface;
use crate::buffers::FrontBlock;
use crate::error::DisplayError;
use crate::observability::DisplayMetrics;

/// The drawing backend. Whatever it does with the blocks is opaque to the
/// core; it only has to report whether the draw succeeded.
pub trait Canvas: Send {
    fn draw(&mut self, blocks: &[Arc<FrontBlock>]) -> Result<()>;
}

/// Messages to the render thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCommand {
    Render { round: u64 },
    Shutdown,
}

/// Notifications for the host application
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// One draw finished. `error` is set when the canvas failed; the
    /// barrier is reset either way so the next round can proceed.
    RenderComplete {
        round: u64,
        sample_count: usize,
        error: Option<String>,
    },
    /// A grid generation was torn down and its buffers released
    Cleared { generation: u64 },
}

impl DisplayEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, DisplayEvent::RenderComplete { error: Some(_), .. })
    }
}

/// Dedicated render thread
pub struct Renderer {
    commands: Sender<RenderCommand>,
    handle: JoinHandle<Box<dyn Canvas>>,
}

impl Renderer {
    pub fn spawn(
        mut canvas: Box<dyn Canvas>,
        surface: Arc<SharedSurface>,
        barrier: Arc<SyncBarrier>,
        commands: (Sender<RenderCommand>, Receiver<RenderCommand>),
        events: Sender<DisplayEvent>,
        metrics: Arc<DisplayMetrics>,
    ) -> Result<Self> {
        let (tx, rx) = commands;
        let handle = thread::Builder::new()
            .name("meaview-render".to_string())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        RenderCommand::Render { round } => render_round(
                            round,
                            canvas.as_mut(),
                            &surface,
                            &barrier,
                            &events,
                            &metrics,
                        ),
                        RenderCommand::Shutdown => break,
                    }
                }
                canvas
            })?;

        Ok(Self {
            commands: tx,
            handle,
        })
    }

    /// Finish queued rounds, stop the thread and hand back the canvas
    pub fn shutdown(self) -> Result<Box<dyn Canvas>> {
        let _ = self.commands.send(RenderCommand::Shutdown);
        self.handle
            .join()
            .map_err(|_| anyhow!("Render thread panicked"))
    }
}

fn render_round(
    round: u64,
    canvas: &mut dyn Canvas,
    surface: &SharedSurface,
    barrier: &SyncBarrier,
    events: &Sender<DisplayEvent>,
    metrics: &DisplayMetrics,
) {
    let start = metrics.start_render();
    let mut guard = surface.write();
    let blocks = guard.fronts();
    let sample_count = blocks.first().map(|block| block.len()).unwrap_or(0);

    let error = match draw_contained(canvas, &blocks) {
        Ok(()) => {
            guard.mark_drawn(&blocks);
            None
        }
        Err(e) => {
            let failure = DisplayError::RenderFailed(e.to_string());
            warn!("Render round {}: {}", round, failure);
            metrics.record_render_failure();
            Some(failure.to_string())
        }
    };
    barrier.reset(&guard);

    let event = DisplayEvent::RenderComplete {
        round,
        sample_count,
        error,
    };
    match events.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            metrics.record_dropped_event();
            debug!("Event queue full, render round {} not reported", round);
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
    drop(guard);

    metrics.finish_render(start);
}

/// A panicking canvas counts as a failed draw, so the barrier still resets
fn draw_contained(canvas: &mut dyn Canvas, blocks: &[Arc<FrontBlock>]) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| canvas.draw(blocks))) {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("canvas panicked: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
