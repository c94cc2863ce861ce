//! Fever Dash headless runner
//!
//! Drives a seeded session on the fixed timestep with the autopilot at the
//! controls and logs what happens. Useful for balance passes and for checking
//! that a tuning file loads.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use clap::Parser;
    use serde_json::json;

    use fever_dash::Tuning;
    use fever_dash::consts::SIM_DT;
    use fever_dash::sim::{GameState, TickInput, tick};

    #[derive(Parser, Debug)]
    #[command(author, version, about)]
    struct Cli {
        /// Run seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Simulated seconds before stopping
        #[arg(long, default_value_t = 120.0)]
        seconds: f32,
        /// JSON tuning file; falls back to built-in balance
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Print the effective tuning as JSON and exit
        #[arg(long)]
        dump_tuning: bool,
        /// Print the final frame snapshot as JSON
        #[arg(long)]
        snapshot: bool,
        /// Keep the player invincible
        #[arg(long)]
        god_mode: bool,
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::parse();

        let tuning = match &cli.tuning {
            Some(path) => Tuning::load_or_default(path),
            None => Tuning::default(),
        };
        if cli.dump_tuning {
            println!("{}", tuning.to_json_pretty()?);
            return Ok(());
        }

        let seed = cli.seed.unwrap_or_else(rand::random);
        let mut state = GameState::with_tuning(seed, tuning);

        let kills = Rc::new(RefCell::new(0u32));
        let best_combo = Rc::new(RefCell::new(0u32));
        {
            let handlers = state.handlers_mut();
            let k = kills.clone();
            handlers.on_enemy_death(move |_, _, _| *k.borrow_mut() += 1);
            let b = best_combo.clone();
            handlers.on_combo_change(move |streak, _| {
                let mut best = b.borrow_mut();
                *best = (*best).max(streak);
            });
            handlers.on_phase_change(|from, to| log::info!("Phase change: {} -> {}", from, to));
            handlers
                .on_shield_owner_change(|from, to| log::debug!("Shield: {:?} -> {:?}", from, to));
            handlers.on_effect_combo_activated(|rule| log::info!("Synergy on: {}", rule));
            handlers.on_effect_combo_deactivated(|rule| log::info!("Synergy off: {}", rule));
        }

        let input = TickInput {
            autopilot: true,
            invincible_override: cli.god_mode,
            ..Default::default()
        };
        let max_ticks = (cli.seconds.max(0.0) / SIM_DT).ceil() as u64;
        while state.time_ticks < max_ticks && !state.is_game_over() {
            tick(&mut state, &input, SIM_DT);
        }

        let summary = json!({
            "seed": seed,
            "seconds": state.elapsed(),
            "score": state.score(),
            "phase": state.phase_id(),
            "kills": *kills.borrow(),
            "best_combo": *best_combo.borrow(),
            "game_over": state.is_game_over(),
            "missions_completed": state.tracker().completed_count(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);

        if cli.snapshot {
            println!("{}", state.snapshot().to_json()?);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Fever Dash (headless) starting...");
    if let Err(err) = native::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is embedded as a library on the web; nothing to run here
}
