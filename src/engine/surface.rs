//! The shared render surface and the one reader/writer lock guarding it.
//!
//! Lock discipline:
//! - a worker publishes a new front block for one of its channels while
//!   holding a read guard; many workers may do so at once because each
//!   writes only the slots it owns (held through a unique [`FrontWriter`])
//! - the renderer reads every slot while holding the write guard, so no
//!   publish can be in flight
//! - inspectors read the last drawn blocks under a read guard; those live
//!   inside the lock and are only replaced by the renderer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::atomic::AtomicCell;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::buffers::FrontBlock;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Exclusive right to publish front blocks for one channel
#[derive(Debug)]
pub struct FrontWriter {
    surface_id: u64,
    channel: usize,
}

impl FrontWriter {
    pub fn channel(&self) -> usize {
        self.channel
    }
}

/// Current front block of one channel; swapped atomically by its writer
type FrontSlot = AtomicCell<Option<Arc<FrontBlock>>>;

/// State that only changes while the write lock is held
#[derive(Debug, Default)]
pub struct SurfaceState {
    drawn: Vec<Option<Arc<FrontBlock>>>,
    draws: u64,
}

pub struct SharedSurface {
    id: u64,
    lock: RwLock<SurfaceState>,
    fronts: Box<[FrontSlot]>,
}

impl SharedSurface {
    /// Create a surface for `channel_count` channels together with the one
    /// writer handle per channel
    pub fn with_writers(channel_count: usize) -> (Arc<Self>, Vec<FrontWriter>) {
        let id = NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed);
        let fronts = (0..channel_count)
            .map(|_| FrontSlot::new(None))
            .collect();
        let surface = Arc::new(Self {
            id,
            lock: RwLock::new(SurfaceState {
                drawn: vec![None; channel_count],
                draws: 0,
            }),
            fronts,
        });
        let writers = (0..channel_count)
            .map(|channel| FrontWriter {
                surface_id: id,
                channel,
            })
            .collect();
        (surface, writers)
    }

    pub fn channel_count(&self) -> usize {
        self.fronts.len()
    }

    pub fn read(&self) -> SwapGuard<'_> {
        SwapGuard {
            surface: self,
            _guard: self.lock.read(),
        }
    }

    pub fn try_read(&self) -> Option<SwapGuard<'_>> {
        self.lock.try_read().map(|guard| SwapGuard {
            surface: self,
            _guard: guard,
        })
    }

    pub fn write(&self) -> RenderGuard<'_> {
        RenderGuard {
            surface: self,
            state: self.lock.write(),
        }
    }

    /// Last block drawn for `channel`. The handle stays valid for as long as
    /// the caller keeps it, even across later renders.
    pub fn inspect(&self, channel: usize) -> Option<Arc<FrontBlock>> {
        let state = self.lock.read();
        state.drawn.get(channel).cloned().flatten()
    }

    /// Completed draws on this surface
    pub fn draws(&self) -> u64 {
        self.lock.read().draws
    }
}

/// Read acquisition held by a worker for the duration of one swap
pub struct SwapGuard<'a> {
    surface: &'a SharedSurface,
    _guard: RwLockReadGuard<'a, SurfaceState>,
}

impl SwapGuard<'_> {
    /// Make `block` the visible front of the writer's channel. Returns the
    /// handle it replaced.
    pub fn publish(
        &self,
        writer: &mut FrontWriter,
        block: Arc<FrontBlock>,
    ) -> Option<Arc<FrontBlock>> {
        if writer.surface_id != self.surface.id {
            log::error!(
                "Front writer for channel {} belongs to another surface",
                writer.channel
            );
            return None;
        }
        let slot = self.surface.fronts.get(writer.channel)?;
        slot.swap(Some(block))
    }
}

/// Write acquisition held by the renderer for one draw
pub struct RenderGuard<'a> {
    surface: &'a SharedSurface,
    state: RwLockWriteGuard<'a, SurfaceState>,
}

impl RenderGuard<'_> {
    /// Current front block of every channel that has swapped at least once
    pub fn fronts(&self) -> Vec<Arc<FrontBlock>> {
        // No publisher runs while the write guard is held
        self.surface
            .fronts
            .iter()
            .filter_map(|slot| {
                let current = slot.take();
                let snapshot = current.clone();
                slot.store(current);
                snapshot
            })
            .collect()
    }

    /// Record the blocks that made it onto the surface
    pub fn mark_drawn(&mut self, blocks: &[Arc<FrontBlock>]) {
        for block in blocks {
            if let Some(entry) = self.state.drawn.get_mut(block.channel) {
                *entry = Some(Arc::clone(block));
            }
        }
        self.state.draws += 1;
    }
}
