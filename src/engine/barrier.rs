use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crossbeam_channel::Sender;
use log::warn;

use super::renderer::RenderCommand;
use super::surface::{RenderGuard, SwapGuard};

/// Result of raising one channel's ready bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Bit set, other channels still outstanding
    Pending { ready: usize, total: usize },
    /// Bit was already set for this round
    AlreadyReady,
    /// This call completed the set and triggered render `round`
    Completed { round: u64 },
    /// Channel index outside the grid
    Unknown,
}

/// Per-channel ready bits gating the renderer.
///
/// Bits are raised by workers while they hold a [`SwapGuard`] and cleared all
/// together by the renderer while it holds the [`RenderGuard`], so a clear
/// can never race with a swap. The call that moves the counter onto the
/// channel count is the only one that triggers a render; the counter then
/// stays saturated until the clear.
pub struct SyncBarrier {
    bits: Box<[AtomicBool]>,
    ready: AtomicUsize,
    rounds: AtomicU64,
    trigger: Sender<RenderCommand>,
}

impl SyncBarrier {
    pub fn new(channel_count: usize, trigger: Sender<RenderCommand>) -> Self {
        Self {
            bits: (0..channel_count).map(|_| AtomicBool::new(false)).collect(),
            ready: AtomicUsize::new(0),
            rounds: AtomicU64::new(0),
            trigger,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.bits.len()
    }

    pub fn ready_count(&self) -> usize {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_ready(&self, channel: usize) -> bool {
        self.bits
            .get(channel)
            .map(|bit| bit.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Rounds triggered so far
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::Acquire)
    }

    pub fn mark_ready(&self, channel: usize, _swap: &SwapGuard<'_>) -> ReadyOutcome {
        let Some(bit) = self.bits.get(channel) else {
            warn!("Ready bit raised for unknown channel {}", channel);
            return ReadyOutcome::Unknown;
        };
        if bit.swap(true, Ordering::AcqRel) {
            return ReadyOutcome::AlreadyReady;
        }

        let total = self.bits.len();
        let ready = self.ready.fetch_add(1, Ordering::AcqRel) + 1;
        if ready < total {
            return ReadyOutcome::Pending { ready, total };
        }

        let round = self.rounds.fetch_add(1, Ordering::AcqRel) + 1;
        if self.trigger.send(RenderCommand::Render { round }).is_err() {
            warn!("Renderer gone, render round {} dropped", round);
        }
        ReadyOutcome::Completed { round }
    }

    /// Clear every bit at once after a draw
    pub fn reset(&self, _render: &RenderGuard<'_>) {
        for bit in self.bits.iter() {
            bit.store(false, Ordering::Release);
        }
        self.ready.store(0, Ordering::Release);
    }
}
