//! Exclusive ownership of a shared resource
//!
//! Several timed effects want the shield flag. Whoever holds it keeps it until
//! its own timer runs out or it lets go; everyone else is turned away. An
//! expiry arriving from a source that no longer owns the resource changes
//! nothing.

use serde::{Deserialize, Serialize};

use super::timer::{Scheduler, TimerHandle};

/// Sources that can hold the shield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShieldOwner {
    /// Shield power-up pickup
    ShieldPowerUp,
    /// Invincibility granted by an effect synergy
    SynergyBarrier,
    /// Heightened (fever) mode
    Heightened,
}

/// Outcome of an ownership request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Resource was free and is now owned
    Acquired,
    /// Requester already owned it; its timer was replaced
    Renewed,
    /// Someone else holds it; nothing changed
    Rejected,
}

impl Grant {
    pub fn granted(self) -> bool {
        !matches!(self, Grant::Rejected)
    }
}

/// Ownership transition, reported so callers can emit change events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerChange<O> {
    pub from: Option<O>,
    pub to: Option<O>,
}

/// Ownership state machine: `None` or `Owned(owner)` with the owner's timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arbiter<O> {
    owner: Option<O>,
    timer: Option<TimerHandle>,
}

impl<O> Default for Arbiter<O> {
    fn default() -> Self {
        Self {
            owner: None,
            timer: None,
        }
    }
}

impl<O: Copy + Eq> Arbiter<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<O> {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_owned_by(&self, owner: O) -> bool {
        self.owner == Some(owner)
    }

    /// Ask for the resource for `duration` seconds. `task` is scheduled to fire
    /// when the duration ends and should route back into [`Arbiter::expire`].
    pub fn request<T>(
        &mut self,
        owner: O,
        duration: f32,
        sched: &mut Scheduler<T>,
        task: T,
    ) -> Grant {
        let grant = match self.owner {
            None => Grant::Acquired,
            Some(current) if current == owner => Grant::Renewed,
            Some(_) => return Grant::Rejected,
        };
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }
        self.timer = Some(sched.schedule(duration, task));
        self.owner = Some(owner);
        grant
    }

    /// Timer callback. Clears ownership only if `owner` still holds it.
    ///
    /// A timer still pending for the owner is cancelled, so an expiry that
    /// arrives early can't leave a task behind to end a later hold.
    pub fn expire<T>(
        &mut self,
        owner: O,
        sched: &mut Scheduler<T>,
    ) -> Option<OwnerChange<O>> {
        if self.owner != Some(owner) {
            return None;
        }
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }
        self.owner = None;
        Some(OwnerChange {
            from: Some(owner),
            to: None,
        })
    }

    /// Owner gives the resource up before its timer ends
    pub fn force_release<T>(
        &mut self,
        owner: O,
        sched: &mut Scheduler<T>,
    ) -> Option<OwnerChange<O>> {
        if self.owner != Some(owner) {
            return None;
        }
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }
        self.owner = None;
        Some(OwnerChange {
            from: Some(owner),
            to: None,
        })
    }

    /// Seconds left on the current owner's timer
    pub fn remaining<T>(&self, sched: &Scheduler<T>) -> Option<f32> {
        self.timer.and_then(|h| sched.remaining(h))
    }
}

/// The shield/invincibility flag
pub type ShieldArbiter = Arbiter<ShieldOwner>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_resource_is_granted() {
        let mut sched = Scheduler::new();
        let mut shield = ShieldArbiter::new();
        let grant =
            shield.request(ShieldOwner::ShieldPowerUp, 5.0, &mut sched, ShieldOwner::ShieldPowerUp);
        assert_eq!(grant, Grant::Acquired);
        assert!(shield.is_active());
        assert!(shield.is_owned_by(ShieldOwner::ShieldPowerUp));
    }

    #[test]
    fn test_other_owner_is_rejected() {
        let mut sched = Scheduler::new();
        let mut shield = ShieldArbiter::new();
        shield.request(ShieldOwner::Heightened, 5.0, &mut sched, ShieldOwner::Heightened);
        let owner = ShieldOwner::ShieldPowerUp;
        let grant = shield.request(owner, 10.0, &mut sched, owner);
        assert_eq!(grant, Grant::Rejected);
        assert_eq!(shield.owner(), Some(ShieldOwner::Heightened));
        // Rejected request scheduled nothing
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn test_renewal_replaces_timer() {
        let mut sched = Scheduler::new();
        let mut shield = ShieldArbiter::new();
        shield.request(ShieldOwner::ShieldPowerUp, 5.0, &mut sched, ShieldOwner::ShieldPowerUp);
        sched.advance(4.0);
        let grant =
            shield.request(ShieldOwner::ShieldPowerUp, 5.0, &mut sched, ShieldOwner::ShieldPowerUp);
        assert_eq!(grant, Grant::Renewed);
        assert_eq!(sched.len(), 1);

        // Old timer would have fired at t=5
        assert!(sched.advance(2.0).is_empty());
        assert!(shield.is_active());
        let fired = sched.advance(3.0);
        assert_eq!(fired, vec![ShieldOwner::ShieldPowerUp]);
        assert!(shield.expire(fired[0], &mut sched).is_some());
        assert!(!shield.is_active());
    }

    #[test]
    fn test_stale_expire_is_noop() {
        let mut sched = Scheduler::new();
        let mut shield = ShieldArbiter::new();
        shield.request(ShieldOwner::SynergyBarrier, 3.0, &mut sched, ShieldOwner::SynergyBarrier);
        assert!(shield.expire(ShieldOwner::ShieldPowerUp, &mut sched).is_none());
        assert_eq!(shield.owner(), Some(ShieldOwner::SynergyBarrier));
    }

    #[test]
    fn test_force_release_cancels_timer() {
        let mut sched = Scheduler::new();
        let mut shield = ShieldArbiter::new();
        shield.request(ShieldOwner::Heightened, 6.0, &mut sched, ShieldOwner::Heightened);
        assert!(shield.force_release(ShieldOwner::ShieldPowerUp, &mut sched).is_none());

        let change = shield.force_release(ShieldOwner::Heightened, &mut sched).unwrap();
        assert_eq!(change.from, Some(ShieldOwner::Heightened));
        assert_eq!(change.to, None);
        assert!(sched.is_empty());
        assert!(shield.remaining(&sched).is_none());
    }

    #[test]
    fn test_early_expire_does_not_cut_next_hold() {
        let mut sched = Scheduler::new();
        let mut shield = ShieldArbiter::new();
        let owner = ShieldOwner::ShieldPowerUp;
        shield.request(owner, 5.0, &mut sched, owner);
        sched.advance(1.0);
        assert!(shield.expire(owner, &mut sched).is_some());
        assert!(sched.is_empty());

        sched.advance(1.0);
        assert_eq!(shield.request(owner, 10.0, &mut sched, owner), Grant::Acquired);
        assert_eq!(sched.len(), 1);

        // The first hold's timer would have fired at t=5
        assert!(sched.advance(4.0).is_empty());
        assert!(shield.is_owned_by(owner));
        let fired = sched.advance(6.0);
        assert_eq!(fired, vec![owner]);
        assert!(shield.expire(owner, &mut sched).is_some());
        assert!(!shield.is_active());
    }
}
