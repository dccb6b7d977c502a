use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Sender};
use log::{info, warn};

use super::assignment::{OwnerAssignment, WorkerId};
use super::surface::FrontWriter;
use super::worker::{ChannelWorker, WorkerAck, WorkerContext, WorkerMessage, WorkerSettings};
use crate::buffers::ChannelBuffer;
use crate::config;

/// How long teardown waits for each worker to confirm
const ACK_TIMEOUT: Duration = Duration::from_secs(10);

struct WorkerHandle {
    id: WorkerId,
    inbox: Sender<WorkerMessage>,
    thread: JoinHandle<()>,
}

/// Fixed set of transfer threads, one inbox each
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    context: WorkerContext,
}

impl WorkerPool {
    /// Build each channel's buffer, hand it with its writer to the owning
    /// worker and start the worker threads
    pub fn spawn(
        assignment: &OwnerAssignment,
        writers: Vec<FrontWriter>,
        autoscaled: &[bool],
        settings: WorkerSettings,
        context: WorkerContext,
    ) -> Result<Self> {
        let block_size = config::block_size(settings.refresh_interval, settings.sample_rate);
        let mut per_worker: Vec<Vec<(ChannelBuffer, FrontWriter)>> =
            (0..assignment.worker_count()).map(|_| Vec::new()).collect();

        for writer in writers {
            let channel = writer.channel();
            let owner = assignment
                .owner_of(channel)
                .ok_or_else(|| anyhow!("Channel {} has no owner", channel))?;
            let buffer = ChannelBuffer::new(channel, block_size)
                .with_autoscale(autoscaled.get(channel).copied().unwrap_or(false));
            per_worker
                .get_mut(owner)
                .ok_or_else(|| anyhow!("Channel {} assigned to missing worker {}", channel, owner))?
                .push((buffer, writer));
        }

        let mut workers = Vec::with_capacity(per_worker.len());
        for (id, buffers) in per_worker.into_iter().enumerate() {
            let (tx, rx) = unbounded();
            let worker = ChannelWorker::new(id, buffers, context.clone(), settings.format);
            let thread = thread::Builder::new()
                .name(format!("meaview-transfer-{}", id))
                .spawn(move || worker.run(rx))?;
            workers.push(WorkerHandle {
                id,
                inbox: tx,
                thread,
            });
        }

        info!(
            "Started {} transfer workers for {} channels (block size {})",
            workers.len(),
            assignment.channel_count(),
            block_size
        );
        Ok(Self { workers, context })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Inbox senders indexed by worker id
    pub fn inboxes(&self) -> Vec<Sender<WorkerMessage>> {
        self.workers.iter().map(|w| w.inbox.clone()).collect()
    }

    pub fn reconfigure(&self, settings: WorkerSettings) {
        for worker in &self.workers {
            if worker.inbox.send(WorkerMessage::Reconfigure(settings)).is_err() {
                warn!("Worker {} is gone, settings not delivered", worker.id);
            }
        }
    }

    /// Stop every worker: cancel queued slices, ask each to release its
    /// buffers, wait for every acknowledgement, then join the threads
    pub fn shutdown(self) -> Result<Vec<WorkerAck>> {
        self.context.cancelled.store(true, Ordering::Release);

        let expected = self.workers.len();
        let (ack_tx, ack_rx) = unbounded();
        for worker in &self.workers {
            if worker
                .inbox
                .send(WorkerMessage::Shutdown { ack: ack_tx.clone() })
                .is_err()
            {
                warn!("Worker {} exited before shutdown", worker.id);
            }
        }
        drop(ack_tx);

        let mut acks = Vec::with_capacity(expected);
        while acks.len() < expected {
            match ack_rx.recv_timeout(ACK_TIMEOUT) {
                Ok(ack) => acks.push(ack),
                Err(_) => break,
            }
        }

        let mut panicked = 0;
        for worker in self.workers {
            drop(worker.inbox);
            if worker.thread.join().is_err() {
                panicked += 1;
            }
        }

        if panicked > 0 {
            return Err(anyhow!("{} transfer workers panicked", panicked));
        }
        if acks.len() < expected {
            warn!(
                "Only {} of {} workers acknowledged shutdown",
                acks.len(),
                expected
            );
        }
        acks.sort_by_key(|ack| ack.worker);
        Ok(acks)
    }
}
