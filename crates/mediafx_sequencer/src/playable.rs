// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playable units, their settlement signal, and animation targets.

use crate::error::MediaError;
use crate::keyframe::PropertyMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Future resolving when a playable settles
pub type Finished = BoxFuture<'static, Result<(), MediaError>>;

/// Anything the sequencer can start, pause and tear down
pub trait Playable: Send {
    /// Start or resume; no-op when already playing
    fn play(&mut self);

    /// Pause; no-op when already paused
    fn pause(&mut self);

    /// Release resources and settle [`Playable::finished`] with
    /// [`MediaError::Cancelled`]. Safe to call repeatedly.
    fn cancel(&mut self);

    /// Resolves on natural completion, rejects on cancellation or failure
    fn finished(&self) -> Finished;

    /// Advance the playable's own clock from a host timestamp (ms)
    fn set_animation_time(&mut self, timestamp: f64);
}

/// Settlement state of a [`Completion`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Settlement {
    /// Not settled yet
    #[default]
    Pending,
    /// Completed normally
    Finished,
    /// Cancelled or failed
    Failed(MediaError),
}

/// One-shot, multi-waiter settlement signal.
///
/// The first settlement wins; later ones are ignored. Dropping the
/// completion settles all waiters with [`MediaError::Cancelled`].
#[derive(Debug)]
pub struct Completion {
    tx: watch::Sender<Settlement>,
}

impl Completion {
    /// Create a pending completion
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Settlement::Pending);
        Self { tx }
    }

    /// Settle successfully
    pub fn finish(&self) -> bool {
        self.settle(Settlement::Finished)
    }

    /// Settle with an error
    pub fn fail(&self, error: MediaError) -> bool {
        self.settle(Settlement::Failed(error))
    }

    /// Settle with [`MediaError::Cancelled`]
    pub fn cancel(&self) -> bool {
        self.fail(MediaError::Cancelled)
    }

    fn settle(&self, settlement: Settlement) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == Settlement::Pending {
                *current = settlement;
                true
            } else {
                false
            }
        })
    }

    /// Current settlement
    pub fn settlement(&self) -> Settlement {
        self.tx.borrow().clone()
    }

    /// Whether the completion has settled
    pub fn is_settled(&self) -> bool {
        *self.tx.borrow() != Settlement::Pending
    }

    /// Future observing the settlement
    pub fn wait(&self) -> Finished {
        let mut rx = self.tx.subscribe();
        async move {
            loop {
                let settlement = rx.borrow_and_update().clone();
                match settlement {
                    Settlement::Finished => return Ok(()),
                    Settlement::Failed(error) => return Err(error),
                    Settlement::Pending => {}
                }
                if rx.changed().await.is_err() {
                    return Err(MediaError::Cancelled);
                }
            }
        }
        .boxed()
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an animation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub Uuid);

impl TargetId {
    /// Create a new random target ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared property sink that animations write into and the host reads from
#[derive(Debug, Clone)]
pub struct AnimationTarget {
    id: TargetId,
    label: String,
    properties: Arc<RwLock<PropertyMap>>,
}

impl AnimationTarget {
    /// Create an empty target
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: TargetId::new(),
            label: label.into(),
            properties: Arc::new(RwLock::new(PropertyMap::new())),
        }
    }

    /// Target ID
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Human readable label, used in logs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Merge sampled values into the target
    pub fn apply(&self, values: &PropertyMap) {
        if values.is_empty() {
            return;
        }
        let mut properties = self.properties.write();
        for (name, &value) in values {
            properties.insert(name.clone(), value);
        }
    }

    /// Remove properties, restoring the host's defaults for them
    pub fn remove<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        let mut properties = self.properties.write();
        for name in names {
            properties.shift_remove(name);
        }
    }

    /// Snapshot of the current values
    pub fn properties(&self) -> PropertyMap {
        self.properties.read().clone()
    }

    /// Current value of one property
    pub fn get(&self, name: &str) -> Option<f64> {
        self.properties.read().get(name).copied()
    }

    /// Remove all values
    pub fn clear(&self) {
        self.properties.write().clear();
    }
}
