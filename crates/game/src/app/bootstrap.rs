use engine::{InputAction, InputSnapshot, LoopConfig, ScriptedInput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::casting::{rng_seed_from_env, CastingSession, ConfigError, GameTuning};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: CastingSession,
    pub(crate) input: ScriptedInput,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Chronocast Startup ===");

    let tuning = GameTuning::load_from_env()?;
    let seed = rng_seed_from_env().unwrap_or_else(rand::random::<u64>);
    info!(seed, "rng_seeded");
    let session = CastingSession::new(tuning, ChaCha8Rng::seed_from_u64(seed));

    Ok(AppWiring {
        config: LoopConfig::default(),
        session,
        input: build_demo_script(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Short scripted run so the headless binary walks the whole lifecycle and
/// exits: walk, slow time, jump, start a cast (freezing the world), answer
/// a couple of symbols, abort, then let the dilation run out. The symbol
/// answers are guesses (the sequence is random), so the log shows slot
/// feedback either way.
fn build_demo_script() -> ScriptedInput {
    let mut script = ScriptedInput::default();
    script.push_idle_ticks(30);
    for _ in 0..60 {
        script.push(InputSnapshot::empty().with_action_down(InputAction::SymbolRight, true));
    }
    script.push(InputSnapshot::empty().with_action_pressed(InputAction::Dilate));
    for _ in 0..45 {
        script.push(InputSnapshot::empty().with_action_down(InputAction::SymbolRight, true));
    }
    script.push(InputSnapshot::empty().with_action_pressed(InputAction::Jump));
    script.push_idle_ticks(30);
    script.push(InputSnapshot::empty().with_action_pressed(InputAction::CastBolt));
    script.push_idle_ticks(10);
    script.push(InputSnapshot::empty().with_action_pressed(InputAction::SymbolUp));
    script.push_idle_ticks(10);
    script.push(InputSnapshot::empty().with_action_pressed(InputAction::AbortCast));
    script.push_idle_ticks(120);
    script
}
