mod clock;
mod input;
mod loop_runner;
mod metrics;
mod sim;

pub use clock::{SimulationClock, MAX_TIME_SCALE};
pub use input::{InputAction, InputSnapshot, InputSource, ScriptedInput};
pub use loop_runner::{run_sim, run_sim_with_metrics, AppError, LoopConfig, SLOW_TICK_ENV_VAR};
pub use metrics::{MetricsHandle, TickMetricsSnapshot};
pub use sim::{SimCommand, Simulation};
