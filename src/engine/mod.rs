pub mod assignment;
pub mod barrier;
pub mod dispatcher;
pub mod display;
pub mod renderer;
pub mod state;
pub mod surface;
pub mod worker;
pub mod worker_pool;

pub use assignment::{default_worker_count, OwnerAssignment, WorkerId};
pub use barrier::{ReadyOutcome, SyncBarrier};
pub use dispatcher::Dispatcher;
pub use display::{GridSpec, LiveDisplay};
pub use renderer::{Canvas, DisplayEvent, RenderCommand, Renderer};
pub use state::DisplayState;
pub use surface::{FrontWriter, RenderGuard, SharedSurface, SwapGuard};
pub use worker::{ChannelWorker, TransferOutcome, WorkerAck, WorkerContext, WorkerMessage, WorkerSettings};
pub use worker_pool::WorkerPool;
