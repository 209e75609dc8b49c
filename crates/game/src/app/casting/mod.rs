mod challenge;
mod config;
mod cooldown;
mod dilation;
mod dispatcher;
mod pause;
mod pool;
mod sequence;
mod session;
mod types;
mod world;

pub(crate) use config::{rng_seed_from_env, ConfigError, GameTuning};
pub(crate) use session::CastingSession;
