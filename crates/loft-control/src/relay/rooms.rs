//! Broadcast group membership for live log observers.
//!
//! [`Rooms`] is the only mutable shared state in the control plane: a
//! concurrent multimap from log topic to the set of observers currently
//! registered for it. Fan-out iterates a snapshot of the group, so a join or
//! leave during delivery cannot corrupt iteration, and each delivery is an
//! independent non-blocking `try_send` — one slow observer never delays or
//! drops delivery to the others.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

/// How many log lines an observer may lag behind before deliveries to it
/// are dropped.
pub const OBSERVER_BUFFER: usize = 256;

/// Identifier for one observer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(uuid::Uuid);

impl ObserverId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A log line delivered to an observer, tagged with its concrete topic.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// The topic the line arrived on (`logs:<project>`).
    pub topic: Arc<str>,
    /// The raw line payload.
    pub line: Arc<str>,
}

/// Outcome of fanning one message out to a topic's broadcast group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    /// Observers the message was handed to.
    pub delivered: usize,
    /// Observers skipped because their buffer was full or closed.
    pub dropped: usize,
}

/// Concurrent topic → observer multimap.
#[derive(Debug, Default)]
pub struct Rooms {
    groups: DashMap<String, HashMap<ObserverId, mpsc::Sender<LogEvent>>>,
}

impl Rooms {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer connection.
    ///
    /// The returned guard is the observer's only handle for joining topics;
    /// dropping it removes the observer from every group it joined, on
    /// every exit path.
    #[must_use]
    pub fn register(self: &Arc<Self>, sender: mpsc::Sender<LogEvent>) -> RoomGuard {
        RoomGuard {
            rooms: Arc::clone(self),
            id: ObserverId::generate(),
            sender,
            joined: HashSet::new(),
        }
    }

    /// Deliver one message to every observer of `topic`.
    ///
    /// Iterates a snapshot of the group so concurrent joins and leaves are
    /// safe, then `try_send`s each observer independently. A publish to a
    /// topic with no observers is a silent no-op.
    pub fn fan_out(&self, topic: &str, line: &str) -> FanOut {
        let snapshot: Vec<(ObserverId, mpsc::Sender<LogEvent>)> = match self.groups.get(topic) {
            Some(group) => group.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
            None => return FanOut::default(),
        };

        let event = LogEvent {
            topic: Arc::from(topic),
            line: Arc::from(line),
        };

        let mut stats = FanOut::default();
        for (id, tx) in snapshot {
            match tx.try_send(event.clone()) {
                Ok(()) => stats.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(observer = %id, topic, "observer lagging, dropping line");
                    stats.dropped += 1;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Guard drop will remove the registration shortly.
                    stats.dropped += 1;
                }
            }
        }
        stats
    }

    /// Number of observers currently joined to `topic`.
    #[must_use]
    pub fn observer_count(&self, topic: &str) -> usize {
        self.groups.get(topic).map_or(0, |group| group.len())
    }

    fn insert(&self, topic: &str, id: ObserverId, sender: mpsc::Sender<LogEvent>) {
        self.groups
            .entry(topic.to_owned())
            .or_default()
            .insert(id, sender);
    }

    fn remove(&self, topic: &str, id: ObserverId) {
        if let Some(mut group) = self.groups.get_mut(topic) {
            group.remove(&id);
        }
        self.groups.remove_if(topic, |_, group| group.is_empty());
    }
}

/// Deregistration capability for one observer connection.
///
/// Runs exactly once when the connection lifecycle ends: dropping the guard
/// removes the observer from every topic it joined.
#[derive(Debug)]
pub struct RoomGuard {
    rooms: Arc<Rooms>,
    id: ObserverId,
    sender: mpsc::Sender<LogEvent>,
    joined: HashSet<String>,
}

impl RoomGuard {
    /// Join the broadcast group for `topic`.
    ///
    /// Idempotent: re-joining an already-joined topic is a no-op. Returns
    /// whether the observer was newly added.
    pub fn join(&mut self, topic: &str) -> bool {
        if self.joined.contains(topic) {
            return false;
        }
        self.rooms.insert(topic, self.id, self.sender.clone());
        self.joined.insert(topic.to_owned());
        true
    }

    /// This observer's identifier.
    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        for topic in &self.joined {
            self.rooms.remove(topic, self.id);
        }
    }
}
