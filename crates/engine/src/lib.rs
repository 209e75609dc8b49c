pub mod app;

pub use app::{
    run_sim, run_sim_with_metrics, AppError, InputAction, InputSnapshot, InputSource, LoopConfig,
    MetricsHandle, ScriptedInput, SimCommand, Simulation, SimulationClock, TickMetricsSnapshot,
    MAX_TIME_SCALE, SLOW_TICK_ENV_VAR,
};
