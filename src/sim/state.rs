//! Game state and query surface
//!
//! Everything a run needs lives in `GameState`. Mission tracking is injected
//! through the `P` parameter so several isolated runs can share a process.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::arbiter::{Grant, OwnerChange, ShieldArbiter, ShieldOwner};
use super::effects::{ActiveEffectSet, EffectKind, EffectResolver};
use super::entity::EntityKind;
use super::events::{EventHandlers, GameEvent};
use super::heightened::HeightenedMode;
use super::missions::{MissionBoard, ProgressTracker};
use super::player::Player;
use super::scaling::{DifficultyState, PhaseState};
use super::scoring::{ComboState, ComboTracker, ScoreKeeper, ScoreMultipliers, ScoreSource};
use super::snapshot::{EntityView, PlayerView, RenderSnapshot};
use super::spawner::{SpawnCategory, Spawner};
use super::style::StyleTracker;
use super::timer::Scheduler;
use super::world::World;
use crate::consts::DOUBLE_SCORE_MULTIPLIER;
use crate::tuning::{PhaseDef, Tuning};

/// Deferred work on the virtual clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimTask {
    Spawn(SpawnCategory),
    ShieldExpire(ShieldOwner),
    EffectExpire(EffectKind),
    /// Carries the stage generation so stale timers are ignored
    HeightenedStageEnd(u32),
}

/// Complete state of one run (deterministic for a given seed and input stream)
#[derive(Debug)]
pub struct GameState<P: ProgressTracker = MissionBoard> {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub scheduler: Scheduler<SimTask>,
    pub world: World,
    pub player: Player,
    pub phase: PhaseState,
    pub difficulty: DifficultyState,
    pub score: ScoreKeeper,
    pub combo: ComboTracker,
    pub style: StyleTracker,
    pub shield: ShieldArbiter,
    pub effects: ActiveEffectSet,
    pub resolver: EffectResolver,
    pub heightened: HeightenedMode,
    pub spawner: Spawner,
    pub tracker: P,
    pub handlers: EventHandlers,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub game_over: bool,
    /// Phase whose boss has already been spawned
    pub(crate) boss_spawned_for: Option<usize>,
    pub(crate) frame_events: Vec<GameEvent>,
}

impl GameState<MissionBoard> {
    /// New run with built-in tuning and the standard mission board
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let board = MissionBoard::new(&tuning.missions);
        GameState::with_tracker(seed, tuning, board)
    }
}

impl<P: ProgressTracker> GameState<P> {
    /// New run with an explicit progress tracker
    pub fn with_tracker(seed: u64, tuning: Tuning, tracker: P) -> Self {
        let difficulty = DifficultyState::at(&tuning.difficulty, 0.0);
        let mut scheduler = Scheduler::new();
        let mut spawner = Spawner::new();
        spawner.arm(
            &tuning.spawn_intervals,
            difficulty.spawn_rate_multiplier,
            &mut scheduler,
            SimTask::Spawn,
        );

        log::info!("New run (seed {})", seed);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            scheduler,
            world: World::new(),
            player: Player::default(),
            phase: PhaseState::default(),
            difficulty,
            score: ScoreKeeper::new(),
            combo: ComboTracker::new(tuning.combo.clone()),
            style: StyleTracker::new(&tuning.style),
            shield: ShieldArbiter::new(),
            effects: ActiveEffectSet::new(),
            resolver: EffectResolver::from_defs(&tuning.synergies),
            heightened: HeightenedMode::new(tuning.heightened.clone()),
            spawner,
            tracker,
            handlers: EventHandlers::new(),
            time_ticks: 0,
            game_over: false,
            boss_spawned_for: None,
            frame_events: Vec::new(),
            tuning,
        }
    }

    /// Seconds of simulated time
    pub fn elapsed(&self) -> f32 {
        self.scheduler.now()
    }

    pub fn score(&self) -> u64 {
        self.score.score()
    }

    pub fn combo(&self) -> ComboState {
        self.combo.state()
    }

    pub fn current_phase(&self) -> Option<&PhaseDef> {
        self.tuning.phases.get(self.phase.current_phase)
    }

    pub fn phase_id(&self) -> &str {
        self.current_phase().map(|p| p.id.as_str()).unwrap_or("")
    }

    /// Any elite hostile alive
    pub fn elite_active(&self) -> bool {
        self.world
            .iter(EntityKind::Hostile)
            .any(|e| e.hostile().is_some_and(|h| h.is_elite))
    }

    /// A phase boss alive
    pub fn boss_active(&self) -> bool {
        self.world
            .iter(EntityKind::Hostile)
            .any(|e| e.hostile().is_some_and(|h| h.is_boss))
    }

    pub fn shield_owner(&self) -> Option<ShieldOwner> {
        self.shield.owner()
    }

    pub fn heightened_stage(&self) -> Option<usize> {
        self.heightened.stage()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Events produced by the most recent tick
    pub fn frame_events(&self) -> &[GameEvent] {
        &self.frame_events
    }

    pub fn handlers_mut(&mut self) -> &mut EventHandlers {
        &mut self.handlers
    }

    pub fn tracker(&self) -> &P {
        &self.tracker
    }

    /// Multipliers applied to the next score gain
    pub fn score_multipliers(&self) -> ScoreMultipliers {
        let double = if self.effects.contains(EffectKind::DoubleScore) {
            DOUBLE_SCORE_MULTIPLIER
        } else {
            1.0
        };
        ScoreMultipliers {
            heightened: self.heightened.multiplier(),
            external: double * self.resolver.score_multiplier(),
            combo: self.combo.multiplier(),
        }
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.frame_events.push(event);
    }

    /// Award points through the multiplier chain and report the change
    pub(crate) fn award(&mut self, base: f64, source: ScoreSource, critical: bool) {
        let mults = self.score_multipliers();
        if let Some(delta) = self.score.add_score(base, source, &mults, critical) {
            let score = self.score.score();
            self.emit(GameEvent::ScoreChanged { score, delta, source });
        }
    }

    /// Ask for the shield. Only a change of hands is reported.
    pub(crate) fn request_shield(&mut self, owner: ShieldOwner, duration: f32) -> Grant {
        let before = self.shield.owner();
        let grant = self
            .shield
            .request(owner, duration, &mut self.scheduler, SimTask::ShieldExpire(owner));
        match grant {
            Grant::Acquired => {
                log::debug!("Shield acquired by {:?} for {:.1}s", owner, duration);
                self.emit(GameEvent::ShieldOwnerChanged {
                    from: before,
                    to: Some(owner),
                });
            }
            Grant::Renewed => log::debug!("Shield renewed by {:?} for {:.1}s", owner, duration),
            Grant::Rejected => {
                log::debug!("Shield request from {:?} rejected, held by {:?}", owner, before)
            }
        }
        grant
    }

    pub(crate) fn report_shield_change(&mut self, change: Option<OwnerChange<ShieldOwner>>) {
        if let Some(change) = change {
            log::debug!("Shield released by {:?}", change.from);
            self.emit(GameEvent::ShieldOwnerChanged {
                from: change.from,
                to: change.to,
            });
        }
    }

    /// Capture the current frame for a renderer
    pub fn snapshot(&self) -> RenderSnapshot {
        let entities = EntityKind::ALL
            .iter()
            .flat_map(|kind| self.world.iter(*kind))
            .map(EntityView::from)
            .collect();
        RenderSnapshot {
            time: self.elapsed(),
            score: self.score(),
            combo: self.combo(),
            phase: self.phase_id().to_string(),
            shield_owner: self.shield_owner(),
            heightened_stage: self.heightened_stage(),
            heightened_meter: self.heightened.meter_fraction(),
            effects: self.effects.kinds().collect(),
            synergies: self.resolver.active_ids().into_iter().map(String::from).collect(),
            elite_active: self.elite_active(),
            boss_active: self.boss_active(),
            game_over: self.game_over,
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
                radius: self.player.radius,
                hp: self.player.hp,
                protected: self.player.is_protected(self.shield.is_active(), false),
            },
            entities,
        }
    }
}
