//! Bounded track queue with a movable cursor
//!
//! A doubly linked chain of tracks between a front and a rear end:
//!
//! ```text
//!  front                                   rear
//!  [A] <-prev- [B] <-prev- [C] <-prev- [D]
//!  [A] -next-> ...  (next points toward the front)
//!               ^
//!            current
//! ```
//!
//! Nodes live in an arena of slots and link to each other by slot index, so
//! the back-links never own anything.

use crate::error::QueueError;
use crate::types::Track;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Node {
    track: Track,
    /// Neighbour toward the front
    next: Option<usize>,
    /// Neighbour toward the rear
    prev: Option<usize>,
}

/// Capacity-bounded bidirectional track list
#[derive(Debug, Clone)]
pub struct TrackQueue {
    /// Node arena; `None` marks a free slot
    slots: Vec<Option<Node>>,

    /// Free slot indices for reuse
    free: Vec<usize>,

    /// Track id to slot
    index: HashMap<String, usize>,

    front: Option<usize>,
    rear: Option<usize>,
    current: Option<usize>,

    capacity: usize,
}

impl TrackQueue {
    /// Create new empty queue holding at most `capacity` tracks
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            front: None,
            rear: None,
            current: None,
            capacity,
        }
    }

    // ===== Insertion =====

    /// Add track at the front end
    ///
    /// The cursor only moves when this creates the first node.
    pub fn add_to_front(&mut self, track: Track) -> Result<(), QueueError> {
        let slot = self.allocate(track)?;
        match self.front {
            None => self.attach_first(slot),
            Some(front) => {
                if let Some(node) = self.node_mut(front) {
                    node.next = Some(slot);
                }
                if let Some(node) = self.node_mut(slot) {
                    node.prev = Some(front);
                }
                self.front = Some(slot);
            }
        }
        Ok(())
    }

    /// Add track at the rear end
    pub fn add_to_rear(&mut self, track: Track) -> Result<(), QueueError> {
        let slot = self.allocate(track)?;
        match self.rear {
            None => self.attach_first(slot),
            Some(rear) => {
                if let Some(node) = self.node_mut(rear) {
                    node.prev = Some(slot);
                }
                if let Some(node) = self.node_mut(slot) {
                    node.next = Some(rear);
                }
                self.rear = Some(slot);
            }
        }
        Ok(())
    }

    // ===== Removal =====

    /// Detach the front node
    ///
    /// If the cursor was on it, the cursor moves to the new front.
    pub fn remove_front(&mut self) -> Option<Track> {
        let slot = self.front?;
        let node = self.release(slot)?;

        match node.prev {
            Some(new_front) => {
                if let Some(neighbour) = self.node_mut(new_front) {
                    neighbour.next = None;
                }
                self.front = Some(new_front);
                if self.current == Some(slot) {
                    self.current = Some(new_front);
                }
            }
            None => self.clear(),
        }
        Some(node.track)
    }

    /// Detach the rear node
    ///
    /// If the cursor was on it, the cursor moves to the new rear.
    pub fn remove_rear(&mut self) -> Option<Track> {
        let slot = self.rear?;
        let node = self.release(slot)?;

        match node.next {
            Some(new_rear) => {
                if let Some(neighbour) = self.node_mut(new_rear) {
                    neighbour.prev = None;
                }
                self.rear = Some(new_rear);
                if self.current == Some(slot) {
                    self.current = Some(new_rear);
                }
            }
            None => self.clear(),
        }
        Some(node.track)
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.front = None;
        self.rear = None;
        self.current = None;
    }

    // ===== Cursor =====

    /// Move the cursor up to `by` steps toward the front
    ///
    /// Stops early at the front end. Returns the resulting current track.
    pub fn move_current_forward(&mut self, by: usize) -> Option<&Track> {
        for _ in 0..by {
            match self.current.and_then(|slot| self.node(slot)?.next) {
                Some(next) => self.current = Some(next),
                None => break,
            }
        }
        self.current_track()
    }

    /// Move the cursor up to `by` steps toward the rear
    pub fn move_current_back(&mut self, by: usize) -> Option<&Track> {
        for _ in 0..by {
            match self.current.and_then(|slot| self.node(slot)?.prev) {
                Some(prev) => self.current = Some(prev),
                None => break,
            }
        }
        self.current_track()
    }

    /// Put the cursor on the track with `id`
    ///
    /// Returns `None` and leaves the cursor alone if no such track is queued.
    pub fn move_current_to(&mut self, id: &str) -> Option<&Track> {
        let slot = *self.index.get(id)?;
        self.current = Some(slot);
        self.current_track()
    }

    // ===== Lookup =====

    /// Track under the cursor
    pub fn current_track(&self) -> Option<&Track> {
        self.track_at(self.current)
    }

    pub fn front_track(&self) -> Option<&Track> {
        self.track_at(self.front)
    }

    pub fn rear_track(&self) -> Option<&Track> {
        self.track_at(self.rear)
    }

    pub fn is_front(&self, id: &str) -> bool {
        self.front_track().is_some_and(|track| track.id == id)
    }

    pub fn is_rear(&self, id: &str) -> bool {
        self.rear_track().is_some_and(|track| track.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.index.get(id).and_then(|slot| self.track_at(Some(*slot)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Tracks in chain order, front to rear
    pub fn iter(&self) -> impl Iterator<Item = &Track> + '_ {
        std::iter::successors(self.front.and_then(|slot| self.node(slot)), move |node| {
            node.prev.and_then(|slot| self.node(slot))
        })
        .map(|node| &node.track)
    }

    /// Number of queued tracks
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether insertion would fail with [`QueueError::Full`]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // ===== Internal =====

    fn allocate(&mut self, track: Track) -> Result<usize, QueueError> {
        if self.is_full() {
            warn!(capacity = self.capacity, id = %track.id, "Queue full, rejecting track");
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        if self.index.contains_key(&track.id) {
            warn!(id = %track.id, "Track already queued, rejecting duplicate");
            return Err(QueueError::DuplicateTrack(track.id));
        }

        debug!(id = %track.id, "Queueing track");
        let id = track.id.clone();
        let node = Node {
            track,
            next: None,
            prev: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        Ok(slot)
    }

    fn attach_first(&mut self, slot: usize) {
        self.front = Some(slot);
        self.rear = Some(slot);
        self.current = Some(slot);
    }

    fn release(&mut self, slot: usize) -> Option<Node> {
        let node = self.slots.get_mut(slot)?.take()?;
        self.index.remove(&node.track.id);
        self.free.push(slot);
        Some(node)
    }

    fn node(&self, slot: usize) -> Option<&Node> {
        self.slots.get(slot)?.as_ref()
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node> {
        self.slots.get_mut(slot)?.as_mut()
    }

    fn track_at(&self, slot: Option<usize>) -> Option<&Track> {
        slot.and_then(|slot| self.node(slot)).map(|node| &node.track)
    }
}
