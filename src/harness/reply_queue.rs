//! Ordered holding area for replies the test has not asserted on yet

use crate::activity::Activity;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO of outbound activities, safe for concurrent append and drain
#[derive(Debug, Default)]
pub struct ReplyQueue {
    entries: Mutex<VecDeque<Activity>>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Activity>> {
        // A panicking test thread must not wedge every later assertion
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append at the tail
    pub fn push(&self, activity: Activity) {
        self.lock().push_back(activity);
    }

    /// Remove and return the head
    pub fn pop(&self) -> Option<Activity> {
        self.lock().pop_front()
    }

    /// Replace the first entry whose id matches, keeping its position
    pub fn replace(&self, id: &str, activity: Activity) -> bool {
        let mut entries = self.lock();
        match entries.iter_mut().find(|a| a.id.as_deref() == Some(id)) {
            Some(slot) => {
                *slot = activity;
                true
            }
            None => false,
        }
    }

    /// Remove the first entry whose id matches
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.lock();
        match entries.iter().position(|a| a.id.as_deref() == Some(id)) {
            Some(index) => entries.remove(index).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents, head first
    pub fn snapshot(&self) -> Vec<Activity> {
        self.lock().iter().cloned().collect()
    }
}
