#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Lifecycle registry for transient targets.
//!
//! The registry owns every live target record, its expiry deadline and the
//! delayed removal that follows a hit. Each record honours at most one
//! resolution: a hit and an expiry landing on the same tick resolve the target
//! once, and every later report for it is ignored.

use std::{collections::BTreeMap, time::Duration};

use shooting_gallery_core::{Resolution, TargetId};
use tracing::debug;

/// Lifecycle state of a single target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetState {
    /// Accepting hits until its lifetime runs out.
    Alive,
    /// No longer accepting hits; waiting to be removed from the scene.
    Resolved {
        /// Reason the target was resolved.
        resolution: Resolution,
        /// Registry time at which the target is removed.
        despawn_at: Duration,
    },
}

/// Immutable view of a tracked target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetRecord {
    /// Identifier allocated by the registry.
    pub id: TargetId,
    /// Registry time at which the target spawned.
    pub spawned_at: Duration,
    /// Time the target stays alive when left unhit.
    pub lifetime: Duration,
    /// Current lifecycle state.
    pub state: TargetState,
}

impl TargetRecord {
    /// Registry time at which the target expires if still alive.
    #[must_use]
    pub fn expires_at(&self) -> Duration {
        self.spawned_at.saturating_add(self.lifetime)
    }

    /// Reports whether the target still accepts hits.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self.state, TargetState::Alive)
    }
}

/// Notifications produced while resolving and removing targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetEvent {
    /// A target stopped accepting hits.
    Resolved {
        /// Identifier of the resolved target.
        target: TargetId,
        /// Reason the target was resolved.
        resolution: Resolution,
    },
    /// A resolved target should be removed from the scene.
    Despawned {
        /// Identifier of the removed target.
        target: TargetId,
    },
}

/// Registry that owns every target record of a session.
#[derive(Debug)]
pub struct TargetRegistry {
    destroy_delay: Duration,
    now: Duration,
    next_id: u32,
    records: BTreeMap<TargetId, TargetRecord>,
}

impl TargetRegistry {
    /// Creates an empty registry that removes hit targets after `destroy_delay`.
    #[must_use]
    pub fn new(destroy_delay: Duration) -> Self {
        Self {
            destroy_delay,
            now: Duration::ZERO,
            next_id: 0,
            records: BTreeMap::new(),
        }
    }

    /// Time accumulated by the registry clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Creates an alive target that expires after `lifetime`.
    pub fn spawn(&mut self, lifetime: Duration) -> TargetId {
        self.spawn_aged(lifetime, Duration::ZERO)
    }

    /// Creates an alive target that appeared `age` before the current clock.
    ///
    /// A target whose age already covers its lifetime expires on the next
    /// [`advance`](Self::advance).
    pub fn spawn_aged(&mut self, lifetime: Duration, age: Duration) -> TargetId {
        let id = TargetId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let record = TargetRecord {
            id,
            spawned_at: self.now.saturating_sub(age),
            lifetime,
            state: TargetState::Alive,
        };
        let previous = self.records.insert(id, record);
        debug_assert!(previous.is_none(), "target identifiers must be unique");

        debug!(target_id = id.get(), ?lifetime, alive = self.alive_count(), "target spawned");
        id
    }

    /// Resolves a target because the player hit it.
    ///
    /// Returns `true` only when the target was alive; hits on resolved or
    /// unknown targets are ignored.
    pub fn resolve_by_hit(&mut self, id: TargetId, out: &mut Vec<TargetEvent>) -> bool {
        self.resolve(id, Resolution::Hit, self.destroy_delay, out)
    }

    /// Resolves a target because its lifetime ran out.
    ///
    /// Expired targets are removed immediately. Returns `true` only when the
    /// target was alive.
    pub fn on_expiry(&mut self, id: TargetId, out: &mut Vec<TargetEvent>) -> bool {
        self.resolve(id, Resolution::Expired, Duration::ZERO, out)
    }

    /// Advances the registry clock, expiring overdue targets and removing
    /// resolved targets whose destroy delay elapsed.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<TargetEvent>) {
        self.now = self.now.saturating_add(dt);

        let expired: Vec<TargetId> = self
            .records
            .values()
            .filter(|record| record.is_alive() && record.expires_at() <= self.now)
            .map(|record| record.id)
            .collect();
        for id in expired {
            let _ = self.on_expiry(id, out);
        }

        let due: Vec<TargetId> = self
            .records
            .values()
            .filter(|record| match record.state {
                TargetState::Resolved { despawn_at, .. } => despawn_at <= self.now,
                TargetState::Alive => false,
            })
            .map(|record| record.id)
            .collect();
        for id in due {
            if self.records.remove(&id).is_some() {
                out.push(TargetEvent::Despawned { target: id });
            }
        }
    }

    /// Removes every record without resolving it, returning the removed
    /// identifiers so the host can destroy them.
    pub fn reset_all(&mut self, out: &mut Vec<TargetId>) {
        let cleared = self.records.len();
        out.extend(self.records.keys().copied());
        self.records.clear();
        debug!(cleared, "registry cleared");
    }

    /// Looks up a tracked target.
    #[must_use]
    pub fn record(&self, id: TargetId) -> Option<&TargetRecord> {
        self.records.get(&id)
    }

    /// Iterator over tracked targets in identifier order.
    pub fn records(&self) -> impl Iterator<Item = &TargetRecord> {
        self.records.values()
    }

    /// Number of targets still accepting hits.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.records.values().filter(|record| record.is_alive()).count()
    }

    fn resolve(
        &mut self,
        id: TargetId,
        resolution: Resolution,
        delay: Duration,
        out: &mut Vec<TargetEvent>,
    ) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        if !record.is_alive() {
            return false;
        }

        let despawn_at = self.now.saturating_add(delay);
        record.state = TargetState::Resolved {
            resolution,
            despawn_at,
        };
        out.push(TargetEvent::Resolved {
            target: id,
            resolution,
        });
        debug!(target_id = id.get(), ?resolution, "target resolved");

        if delay.is_zero() && self.records.remove(&id).is_some() {
            out.push(TargetEvent::Despawned { target: id });
        }
        true
    }
}
