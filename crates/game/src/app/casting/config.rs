use std::env;
use std::fs;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::dilation::DilationTuning;
use super::pool::EnergyTuning;
use super::types::{AbilityDefinition, AbilityKind, ResourceModel};
use super::world::{EffectTuning, PlayerTuning};

pub const TUNING_ENV_VAR: &str = "CHRONOCAST_TUNING";
pub const SEED_ENV_VAR: &str = "CHRONOCAST_SEED";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning json at {json_path}: {source}")]
    Parse {
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid tuning: {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

/// All gameplay tuning in one place. Compiled-in defaults, optionally
/// overridden by a JSON file named by `CHRONOCAST_TUNING`. Every loaded
/// value is validated before the game sees it.
#[derive(Debug, Clone)]
pub struct GameTuning {
    pub abilities: Vec<AbilityDefinition>,
    pub dilation: DilationTuning,
    pub dilation_energy_cost: f32,
    pub energy: EnergyTuning,
    pub player: PlayerTuning,
    pub effects: EffectTuning,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            abilities: vec![
                AbilityDefinition {
                    kind: AbilityKind::Mend,
                    sequence_length: 3,
                    resource: ResourceModel::Charges { max: 3 },
                    challenge_timeout_seconds: 4.0,
                    energy_cost: 20.0,
                },
                AbilityDefinition {
                    kind: AbilityKind::Bolt,
                    sequence_length: 2,
                    resource: ResourceModel::Cooldown { seconds: 2.5 },
                    challenge_timeout_seconds: 3.0,
                    energy_cost: 10.0,
                },
                AbilityDefinition {
                    kind: AbilityKind::Shockwave,
                    sequence_length: 4,
                    resource: ResourceModel::Cooldown { seconds: 8.0 },
                    challenge_timeout_seconds: 5.0,
                    energy_cost: 30.0,
                },
                AbilityDefinition {
                    kind: AbilityKind::Phase,
                    sequence_length: 5,
                    resource: ResourceModel::Charges { max: 2 },
                    challenge_timeout_seconds: 6.0,
                    energy_cost: 25.0,
                },
            ],
            dilation: DilationTuning::default(),
            dilation_energy_cost: 35.0,
            energy: EnergyTuning::default(),
            player: PlayerTuning::default(),
            effects: EffectTuning::default(),
        }
    }
}

impl GameTuning {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        match env::var(TUNING_ENV_VAR) {
            Ok(path) => {
                let tuning = Self::load_from_path(&path)?;
                info!(path = %path, "tuning_loaded");
                Ok(tuning)
            }
            Err(_) => {
                let tuning = Self::default();
                tuning.validate()?;
                Ok(tuning)
            }
        }
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let file: TuningFile =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                let json_path = error.path().to_string();
                let json_path = if json_path.is_empty() || json_path == "." {
                    "<root>".to_string()
                } else {
                    json_path
                };
                ConfigError::Parse {
                    json_path,
                    source: error.into_inner(),
                }
            })?;

        let mut tuning = Self::default();
        tuning.apply(&file);
        tuning.validate()?;
        Ok(tuning)
    }

    fn apply(&mut self, file: &TuningFile) {
        self.apply_ability(AbilityKind::Mend, &file.abilities.mend);
        self.apply_ability(AbilityKind::Bolt, &file.abilities.bolt);
        self.apply_ability(AbilityKind::Shockwave, &file.abilities.shockwave);
        self.apply_ability(AbilityKind::Phase, &file.abilities.phase);

        let dilation = &file.dilation;
        if let Some(base_scale) = dilation.base_scale {
            self.dilation.base_scale = base_scale;
        }
        if let Some(duration_seconds) = dilation.duration_seconds {
            self.dilation.duration_seconds = duration_seconds;
        }
        if let Some(cooldown_seconds) = dilation.cooldown_seconds {
            self.dilation.cooldown_seconds = cooldown_seconds;
        }
        if let Some(recovery_fraction) = dilation.recovery_fraction {
            self.dilation.recovery_fraction = recovery_fraction;
        }
        if let Some(energy_cost) = dilation.energy_cost {
            self.dilation_energy_cost = energy_cost;
        }

        if let Some(max_energy) = file.energy.max_energy {
            self.energy.max_energy = max_energy;
        }
        if let Some(regen_per_second) = file.energy.regen_per_second {
            self.energy.regen_per_second = regen_per_second;
        }

        let player = &file.player;
        if let Some(move_speed) = player.move_speed {
            self.player.move_speed = move_speed;
        }
        if let Some(jump_speed) = player.jump_speed {
            self.player.jump_speed = jump_speed;
        }
        if let Some(gravity) = player.gravity {
            self.player.gravity = gravity;
        }
        if let Some(max_health) = player.max_health {
            self.player.max_health = max_health;
        }
        if let Some(phase_speed_multiplier) = player.phase_speed_multiplier {
            self.player.phase_speed_multiplier = phase_speed_multiplier;
        }

        let effects = &file.effects;
        if let Some(heal_amount) = effects.heal_amount {
            self.effects.heal_amount = heal_amount;
        }
        if let Some(bolt_speed) = effects.bolt_speed {
            self.effects.bolt_speed = bolt_speed;
        }
        if let Some(bolt_lifetime_seconds) = effects.bolt_lifetime_seconds {
            self.effects.bolt_lifetime_seconds = bolt_lifetime_seconds;
        }
        if let Some(shockwave_radius) = effects.shockwave_radius {
            self.effects.shockwave_radius = shockwave_radius;
        }
        if let Some(shockwave_strength) = effects.shockwave_strength {
            self.effects.shockwave_strength = shockwave_strength;
        }
        if let Some(phase_duration_seconds) = effects.phase_duration_seconds {
            self.effects.phase_duration_seconds = phase_duration_seconds;
        }
    }

    fn apply_ability(&mut self, kind: AbilityKind, file: &AbilityFile) {
        let Some(definition) = self
            .abilities
            .iter_mut()
            .find(|definition| definition.kind == kind)
        else {
            return;
        };
        if let Some(sequence_length) = file.sequence_length {
            definition.sequence_length = sequence_length;
        }
        if let Some(resource) = file.resource {
            definition.resource = match resource {
                ResourceFile::Cooldown { seconds } => ResourceModel::Cooldown { seconds },
                ResourceFile::Charges { max } => ResourceModel::Charges { max },
            };
        }
        if let Some(challenge_timeout_seconds) = file.challenge_timeout_seconds {
            definition.challenge_timeout_seconds = challenge_timeout_seconds;
        }
        if let Some(energy_cost) = file.energy_cost {
            definition.energy_cost = energy_cost;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for definition in &self.abilities {
            let kind = definition.kind.as_str();
            if definition.sequence_length == 0 {
                return Err(invalid(
                    "abilities.sequence_length",
                    format!("{kind}: must be at least 1"),
                ));
            }
            if !(definition.challenge_timeout_seconds > 0.0) {
                return Err(invalid(
                    "abilities.challenge_timeout_seconds",
                    format!("{kind}: must be positive"),
                ));
            }
            match definition.resource {
                ResourceModel::Cooldown { seconds } if !(seconds > 0.0) => {
                    return Err(invalid(
                        "abilities.resource.seconds",
                        format!("{kind}: cooldown must be positive"),
                    ));
                }
                ResourceModel::Charges { max } if max == 0 => {
                    return Err(invalid(
                        "abilities.resource.max",
                        format!("{kind}: must hold at least one charge"),
                    ));
                }
                _ => {}
            }
            if !(definition.energy_cost >= 0.0) {
                return Err(invalid(
                    "abilities.energy_cost",
                    format!("{kind}: must not be negative"),
                ));
            }
        }

        if !(self.dilation.base_scale > 0.0 && self.dilation.base_scale < 1.0) {
            return Err(invalid(
                "dilation.base_scale",
                "must be strictly between 0 and 1",
            ));
        }
        if !(self.dilation.duration_seconds > 0.0) {
            return Err(invalid("dilation.duration_seconds", "must be positive"));
        }
        if !(self.dilation.cooldown_seconds >= 0.0) {
            return Err(invalid("dilation.cooldown_seconds", "must not be negative"));
        }
        if !(self.dilation.recovery_fraction >= 0.0 && self.dilation.recovery_fraction < 1.0) {
            return Err(invalid("dilation.recovery_fraction", "must be in [0, 1)"));
        }
        if !(self.dilation_energy_cost >= 0.0) {
            return Err(invalid("dilation.energy_cost", "must not be negative"));
        }

        if !(self.energy.max_energy > 0.0) {
            return Err(invalid("energy.max_energy", "must be positive"));
        }
        if !(self.energy.regen_per_second >= 0.0) {
            return Err(invalid("energy.regen_per_second", "must not be negative"));
        }

        if !(self.player.move_speed > 0.0) {
            return Err(invalid("player.move_speed", "must be positive"));
        }
        if !(self.player.jump_speed > 0.0) {
            return Err(invalid("player.jump_speed", "must be positive"));
        }
        if !(self.player.gravity > 0.0) {
            return Err(invalid("player.gravity", "must be positive"));
        }
        if self.player.max_health == 0 {
            return Err(invalid("player.max_health", "must be at least 1"));
        }
        if !(self.player.phase_speed_multiplier >= 1.0) {
            return Err(invalid(
                "player.phase_speed_multiplier",
                "must be at least 1",
            ));
        }

        if !(self.effects.bolt_speed > 0.0) {
            return Err(invalid("effects.bolt_speed", "must be positive"));
        }
        if !(self.effects.bolt_lifetime_seconds > 0.0) {
            return Err(invalid("effects.bolt_lifetime_seconds", "must be positive"));
        }
        if !(self.effects.shockwave_radius > 0.0) {
            return Err(invalid("effects.shockwave_radius", "must be positive"));
        }
        if !(self.effects.shockwave_strength >= 0.0) {
            return Err(invalid(
                "effects.shockwave_strength",
                "must not be negative",
            ));
        }
        if !(self.effects.phase_duration_seconds > 0.0) {
            return Err(invalid(
                "effects.phase_duration_seconds",
                "must be positive",
            ));
        }

        Ok(())
    }
}

pub fn rng_seed_from_env() -> Option<u64> {
    match env::var(SEED_ENV_VAR) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!(raw = %raw, "seed_env_not_a_number");
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TuningFile {
    #[serde(default)]
    abilities: AbilityTableFile,
    #[serde(default)]
    dilation: DilationFile,
    #[serde(default)]
    energy: EnergyFile,
    #[serde(default)]
    player: PlayerFile,
    #[serde(default)]
    effects: EffectsFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AbilityTableFile {
    #[serde(default)]
    mend: AbilityFile,
    #[serde(default)]
    bolt: AbilityFile,
    #[serde(default)]
    shockwave: AbilityFile,
    #[serde(default)]
    phase: AbilityFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AbilityFile {
    sequence_length: Option<usize>,
    resource: Option<ResourceFile>,
    challenge_timeout_seconds: Option<f32>,
    energy_cost: Option<f32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
enum ResourceFile {
    Cooldown { seconds: f32 },
    Charges { max: u32 },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DilationFile {
    base_scale: Option<f32>,
    duration_seconds: Option<f32>,
    cooldown_seconds: Option<f32>,
    recovery_fraction: Option<f32>,
    energy_cost: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnergyFile {
    max_energy: Option<f32>,
    regen_per_second: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerFile {
    move_speed: Option<f32>,
    jump_speed: Option<f32>,
    gravity: Option<f32>,
    max_health: Option<u32>,
    phase_speed_multiplier: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EffectsFile {
    heal_amount: Option<u32>,
    bolt_speed: Option<f32>,
    bolt_lifetime_seconds: Option<f32>,
    shockwave_radius: Option<f32>,
    shockwave_strength: Option<f32>,
    phase_duration_seconds: Option<f32>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_pass_validation() {
        GameTuning::default().validate().expect("defaults valid");
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let tuning = GameTuning::from_json_str(
            r#"{
                "abilities": {
                    "bolt": {
                        "sequence_length": 4,
                        "resource": { "model": "cooldown", "seconds": 1.0 }
                    }
                },
                "dilation": { "base_scale": 0.5 },
                "player": { "move_speed": 7.5 }
            }"#,
        )
        .expect("valid overrides");

        let bolt = tuning
            .abilities
            .iter()
            .find(|definition| definition.kind == AbilityKind::Bolt)
            .expect("bolt defined");
        assert_eq!(bolt.sequence_length, 4);
        assert_eq!(bolt.resource, ResourceModel::Cooldown { seconds: 1.0 });
        assert_eq!(tuning.dilation.base_scale, 0.5);
        assert_eq!(tuning.player.move_speed, 7.5);
        // untouched sections keep their defaults.
        assert_eq!(tuning.energy.max_energy, 100.0);
        let mend = tuning
            .abilities
            .iter()
            .find(|definition| definition.kind == AbilityKind::Mend)
            .expect("mend defined");
        assert_eq!(mend.sequence_length, 3);
    }

    #[test]
    fn malformed_json_reports_the_offending_path() {
        let error = GameTuning::from_json_str(
            r#"{ "abilities": { "bolt": { "sequence_length": "two" } } }"#,
        )
        .expect_err("type mismatch must fail");
        match error {
            ConfigError::Parse { json_path, .. } => {
                assert!(
                    json_path.contains("abilities.bolt.sequence_length"),
                    "unexpected path: {json_path}"
                );
            }
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = GameTuning::from_json_str(r#"{ "abilitees": {} }"#)
            .expect_err("typo must fail");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_sequence_length_is_rejected() {
        let error = GameTuning::from_json_str(
            r#"{ "abilities": { "mend": { "sequence_length": 0 } } }"#,
        )
        .expect_err("zero-length sequence must fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "abilities.sequence_length",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_base_scale_is_rejected() {
        for raw in [
            r#"{ "dilation": { "base_scale": 0.0 } }"#,
            r#"{ "dilation": { "base_scale": 1.5 } }"#,
        ] {
            let error = GameTuning::from_json_str(raw).expect_err("bad base scale");
            assert!(matches!(
                error,
                ConfigError::Invalid {
                    field: "dilation.base_scale",
                    ..
                }
            ));
        }
    }

    #[test]
    fn non_positive_timeout_is_rejected() {
        let error = GameTuning::from_json_str(
            r#"{ "abilities": { "phase": { "challenge_timeout_seconds": 0.0 } } }"#,
        )
        .expect_err("zero timeout must fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "abilities.challenge_timeout_seconds",
                ..
            }
        ));
    }

    #[test]
    fn load_from_path_round_trips_a_real_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "energy": {{ "max_energy": 150.0 }} }}"#).expect("write");
        let path = file.path().to_string_lossy().to_string();

        let tuning = GameTuning::load_from_path(&path).expect("load");
        assert_eq!(tuning.energy.max_energy, 150.0);
    }

    #[test]
    fn load_from_missing_path_reports_read_error() {
        let error = GameTuning::load_from_path("definitely/not/here.json")
            .expect_err("missing file must fail");
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
