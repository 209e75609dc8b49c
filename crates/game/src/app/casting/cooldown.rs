use std::collections::HashMap;

use tracing::debug;

use super::types::{AbilityDefinition, AbilityKind, RejectReason, ResourceModel};

#[derive(Debug, Clone, Copy)]
enum ResourceState {
    Cooldown {
        remaining_seconds: f32,
        duration_seconds: f32,
    },
    Charges {
        remaining: u32,
        max: u32,
    },
}

/// Per-ability cooldown/charge bookkeeping. Cooldown timers tick down on the
/// scaled clock (they freeze while the world is paused); charges are not
/// time-based at all.
#[derive(Debug, Default)]
pub struct CooldownLedger {
    states: HashMap<AbilityKind, ResourceState>,
}

impl CooldownLedger {
    pub fn from_definitions<'a>(
        definitions: impl IntoIterator<Item = &'a AbilityDefinition>,
    ) -> Self {
        let mut ledger = Self::default();
        for definition in definitions {
            ledger.register(definition);
        }
        ledger
    }

    pub fn register(&mut self, definition: &AbilityDefinition) {
        let state = match definition.resource {
            ResourceModel::Cooldown { seconds } => ResourceState::Cooldown {
                remaining_seconds: 0.0,
                duration_seconds: seconds,
            },
            ResourceModel::Charges { max } => ResourceState::Charges {
                remaining: max,
                max,
            },
        };
        self.states.insert(definition.kind, state);
    }

    /// Consumes the resource if it is ready. Cooldown timers restart at the
    /// full duration; charges decrement by one, clamped at zero.
    pub fn try_consume(&mut self, kind: AbilityKind) -> Result<(), RejectReason> {
        let Some(state) = self.states.get_mut(&kind) else {
            debug!(kind = kind.as_str(), "ability_not_registered");
            return Ok(());
        };
        match state {
            ResourceState::Cooldown {
                remaining_seconds,
                duration_seconds,
            } => {
                if *remaining_seconds > 0.0 {
                    return Err(RejectReason::OnCooldown);
                }
                *remaining_seconds = *duration_seconds;
                Ok(())
            }
            ResourceState::Charges { remaining, .. } => {
                if *remaining == 0 {
                    return Err(RejectReason::NoCharges);
                }
                *remaining = remaining.saturating_sub(1);
                Ok(())
            }
        }
    }

    pub fn tick(&mut self, scaled_delta_seconds: f32) {
        for state in self.states.values_mut() {
            if let ResourceState::Cooldown {
                remaining_seconds, ..
            } = state
            {
                *remaining_seconds = (*remaining_seconds - scaled_delta_seconds).max(0.0);
            }
        }
    }

    /// Readiness in [0,1]; 1.0 means ready. Charges are binary; a partial
    /// charge has no meaning.
    pub fn progress(&self, kind: AbilityKind) -> f32 {
        match self.states.get(&kind) {
            None => 1.0,
            Some(ResourceState::Cooldown {
                remaining_seconds,
                duration_seconds,
            }) => {
                if *remaining_seconds <= 0.0 || *duration_seconds <= 0.0 {
                    1.0
                } else {
                    (1.0 - remaining_seconds / duration_seconds).clamp(0.0, 1.0)
                }
            }
            Some(ResourceState::Charges { remaining, .. }) => {
                if *remaining > 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    #[cfg(test)]
    pub fn is_ready(&self, kind: AbilityKind) -> bool {
        self.progress(kind) >= 1.0
    }

    #[cfg(test)]
    pub fn charges_remaining(&self, kind: AbilityKind) -> Option<u32> {
        match self.states.get(&kind) {
            Some(ResourceState::Charges { remaining, .. }) => Some(*remaining),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn cooldown_remaining(&self, kind: AbilityKind) -> Option<f32> {
        match self.states.get(&kind) {
            Some(ResourceState::Cooldown {
                remaining_seconds, ..
            }) => Some(*remaining_seconds),
            _ => None,
        }
    }
}
