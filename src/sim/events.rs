//! Frame events and observer registration
//!
//! The tick loop collects events while it runs and hands the whole batch to
//! the registered handlers once, after every component has settled. Handlers
//! observe; they must not drive the simulation from inside a callback.

use serde::{Deserialize, Serialize};

use super::arbiter::ShieldOwner;
use super::effects::EffectKind;
use super::entity::{EntityId, PickupKind};
use super::scoring::ScoreSource;
use super::style::StyleKind;

/// Something observable that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: u64, delta: f64, source: ScoreSource },
    ComboChanged { streak: u32, multiplier: f64 },
    ComboBroken { streak: u32 },
    StyleBonus { kind: StyleKind, points: f64 },
    PhaseChanged { from: String, to: String, index: usize },
    EnemyDeath { id: EntityId, x: f32, y: f32, elite: bool, boss: bool },
    PickupCollected { kind: PickupKind, value: f64 },
    PowerUpCollected { effect: EffectKind },
    EffectExpired { effect: EffectKind },
    ShieldOwnerChanged { from: Option<ShieldOwner>, to: Option<ShieldOwner> },
    EffectComboActivated { rule: String },
    EffectComboDeactivated { rule: String },
    HeightenedStage { stage: usize, multiplier: f64 },
    HeightenedEnded { early: bool },
    PlayerHit { hp: u32 },
    BossSpawned { id: EntityId },
    MissionComplete { id: String },
    GameOver { score: u64 },
}

type Handler = Box<dyn FnMut(&GameEvent)>;

/// Registered observers
#[derive(Default)]
pub struct EventHandlers {
    handlers: Vec<Handler>,
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Every event
    pub fn on_any(&mut self, f: impl FnMut(&GameEvent) + 'static) {
        self.handlers.push(Box::new(f));
    }

    /// New total and the gain that produced it
    pub fn on_score_change(&mut self, mut f: impl FnMut(u64, f64) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::ScoreChanged { score, delta, .. } = e {
                f(*score, *delta);
            }
        });
    }

    /// Streak and multiplier after a kill or a break
    pub fn on_combo_change(&mut self, mut f: impl FnMut(u32, f64) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::ComboChanged { streak, multiplier } = e {
                f(*streak, *multiplier);
            }
        });
    }

    /// Length of the streak that just ended
    pub fn on_combo_broken(&mut self, mut f: impl FnMut(u32) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::ComboBroken { streak } = e {
                f(*streak);
            }
        });
    }

    pub fn on_style_bonus(&mut self, mut f: impl FnMut(StyleKind, f64) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::StyleBonus { kind, points } = e {
                f(*kind, *points);
            }
        });
    }

    /// Previous and new phase ids
    pub fn on_phase_change(&mut self, mut f: impl FnMut(&str, &str) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::PhaseChanged { from, to, .. } = e {
                f(from.as_str(), to.as_str());
            }
        });
    }

    /// Entity id and where it died
    pub fn on_enemy_death(&mut self, mut f: impl FnMut(EntityId, f32, f32) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::EnemyDeath { id, x, y, .. } = e {
                f(*id, *x, *y);
            }
        });
    }

    pub fn on_shield_owner_change(
        &mut self,
        mut f: impl FnMut(Option<ShieldOwner>, Option<ShieldOwner>) + 'static,
    ) {
        self.on_any(move |e| {
            if let GameEvent::ShieldOwnerChanged { from, to } = e {
                f(*from, *to);
            }
        });
    }

    pub fn on_effect_combo_activated(&mut self, mut f: impl FnMut(&str) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::EffectComboActivated { rule } = e {
                f(rule.as_str());
            }
        });
    }

    pub fn on_effect_combo_deactivated(&mut self, mut f: impl FnMut(&str) + 'static) {
        self.on_any(move |e| {
            if let GameEvent::EffectComboDeactivated { rule } = e {
                f(rule.as_str());
            }
        });
    }

    /// Deliver a frame's events to every handler, in order
    pub fn dispatch(&mut self, events: &[GameEvent]) {
        if events.is_empty() {
            return;
        }
        for event in events {
            for handler in self.handlers.iter_mut() {
                handler(event);
            }
        }
    }
}
