use crate::feedback::Feedback;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    Starting,
    Running,
    PausedOnFault,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: LoopState,
    pub feedback: Feedback,
}

impl Snapshot {
    pub fn new(state: LoopState, feedback: Feedback) -> Self {
        Self { state, feedback }
    }

    pub fn starting() -> Self {
        Self::new(LoopState::Starting, Feedback::initializing())
    }
}

/// Single-slot latest-value exchange between one writer and any readers.
/// Publishing overwrites whatever has not been read yet.
#[derive(Debug)]
pub struct LatestSlot<T> {
    inner: Mutex<Option<(u64, T)>>,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<(u64, T)>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` and returns its generation.
    pub fn publish(&self, value: T) -> u64 {
        let mut slot = self.lock();
        let generation = slot.as_ref().map_or(1, |(g, _)| g + 1);
        *slot = Some((generation, value));
        generation
    }

    pub fn latest(&self) -> Option<T> {
        self.lock().as_ref().map(|(_, v)| v.clone())
    }

    /// Value published after `seen`, updating `seen` when one is returned.
    pub fn newer_than(&self, seen: &mut u64) -> Option<T> {
        let slot = self.lock();
        match slot.as_ref() {
            Some((generation, value)) if *generation > *seen => {
                *seen = *generation;
                Some(value.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_overwrites_unread_value() {
        let slot = LatestSlot::new();
        let mut seen = 0;
        slot.publish(1);
        slot.publish(2);
        assert_eq!(slot.newer_than(&mut seen), Some(2));
        assert_eq!(seen, 2);
        assert_eq!(slot.newer_than(&mut seen), None);
        assert_eq!(slot.latest(), Some(2));
    }
}
