use serde::{Deserialize, Serialize};

use crate::error::DisplayError;

pub type WorkerId = usize;

/// One less than the hardware concurrency, never below one; the remaining
/// core is left for the renderer
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Static channel -> worker ownership. Every channel has exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAssignment")]
pub struct OwnerAssignment {
    owners: Vec<WorkerId>,
    workers: usize,
}

impl OwnerAssignment {
    /// Channel i goes to worker i mod `workers`
    pub fn round_robin(channel_count: usize, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            owners: (0..channel_count).map(|c| c % workers).collect(),
            workers,
        }
    }

    /// Explicit owner per channel, indexed by channel
    pub fn from_owners(owners: Vec<WorkerId>, workers: usize) -> Result<Self, DisplayError> {
        let assignment = Self { owners, workers };
        assignment.validate()?;
        Ok(assignment)
    }

    /// Every owner must name one of the `workers` workers
    pub fn validate(&self) -> Result<(), DisplayError> {
        let workers = self.workers;
        if workers == 0 {
            return Err(DisplayError::InvalidAssignment(
                "at least one worker is required".to_string(),
            ));
        }
        if let Some((channel, owner)) = self.owners.iter().enumerate().find(|(_, &w)| w >= workers) {
            return Err(DisplayError::InvalidAssignment(format!(
                "channel {} assigned to worker {} but only {} workers exist",
                channel, owner, workers
            )));
        }
        Ok(())
    }

    pub fn owner_of(&self, channel: usize) -> Option<WorkerId> {
        self.owners.get(channel).copied()
    }

    pub fn channels_for(&self, worker: WorkerId) -> Vec<usize> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, &owner)| owner == worker)
            .map(|(channel, _)| channel)
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.owners.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn owners(&self) -> &[WorkerId] {
        &self.owners
    }
}

#[derive(Deserialize)]
struct RawAssignment {
    owners: Vec<WorkerId>,
    workers: usize,
}

impl TryFrom<RawAssignment> for OwnerAssignment {
    type Error = DisplayError;

    fn try_from(raw: RawAssignment) -> Result<Self, Self::Error> {
        Self::from_owners(raw.owners, raw.workers)
    }
}
