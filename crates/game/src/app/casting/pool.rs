use std::collections::HashMap;

use super::types::{AbilityDefinition, AbilityKind, ResourceGate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyTuning {
    pub max_energy: f32,
    pub regen_per_second: f32,
}

impl Default for EnergyTuning {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            regen_per_second: 8.0,
        }
    }
}

/// The concrete external resource gate: a shared energy pool with per-kind
/// costs. Regenerates on the scaled clock, so it is inert while the world is
/// paused. Exhaustion vetoes activation; it never panics and never goes
/// negative.
#[derive(Debug)]
pub struct EnergyPool {
    current: f32,
    max: f32,
    regen_per_second: f32,
    costs: HashMap<AbilityKind, f32>,
    dilation_cost: f32,
}

impl EnergyPool {
    pub fn new(
        tuning: EnergyTuning,
        definitions: &[AbilityDefinition],
        dilation_cost: f32,
    ) -> Self {
        let costs = definitions
            .iter()
            .map(|definition| (definition.kind, definition.energy_cost))
            .collect();
        Self {
            current: tuning.max_energy,
            max: tuning.max_energy,
            regen_per_second: tuning.regen_per_second,
            costs,
            dilation_cost,
        }
    }

    pub fn tick(&mut self, scaled_delta_seconds: f32) {
        self.current = (self.current + self.regen_per_second * scaled_delta_seconds).min(self.max);
    }

    pub fn can_afford_dilation(&self) -> bool {
        self.current >= self.dilation_cost
    }

    pub fn spend_dilation(&mut self) {
        self.current = (self.current - self.dilation_cost).max(0.0);
    }

    fn cost_of(&self, kind: AbilityKind) -> f32 {
        self.costs.get(&kind).copied().unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn current(&self) -> f32 {
        self.current
    }
}

impl ResourceGate for EnergyPool {
    fn can_afford(&self, kind: AbilityKind) -> bool {
        self.current >= self.cost_of(kind)
    }

    fn spend(&mut self, kind: AbilityKind) {
        self.current = (self.current - self.cost_of(kind)).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::casting::types::ResourceModel;

    fn definitions() -> Vec<AbilityDefinition> {
        vec![AbilityDefinition {
            kind: AbilityKind::Bolt,
            sequence_length: 2,
            resource: ResourceModel::Cooldown { seconds: 2.5 },
            challenge_timeout_seconds: 3.0,
            energy_cost: 40.0,
        }]
    }

    fn pool() -> EnergyPool {
        EnergyPool::new(
            EnergyTuning {
                max_energy: 100.0,
                regen_per_second: 10.0,
            },
            &definitions(),
            35.0,
        )
    }

    #[test]
    fn spend_reduces_energy_and_exhaustion_vetoes() {
        let mut pool = pool();
        assert!(pool.can_afford(AbilityKind::Bolt));
        pool.spend(AbilityKind::Bolt);
        pool.spend(AbilityKind::Bolt);
        assert_eq!(pool.current(), 20.0);
        assert!(!pool.can_afford(AbilityKind::Bolt));
    }

    #[test]
    fn energy_never_goes_negative() {
        let mut pool = pool();
        for _ in 0..10 {
            pool.spend(AbilityKind::Bolt);
        }
        assert_eq!(pool.current(), 0.0);
    }

    #[test]
    fn regen_follows_the_scaled_clock_and_caps_at_max() {
        let mut pool = pool();
        pool.spend(AbilityKind::Bolt);
        pool.tick(2.0);
        assert_eq!(pool.current(), 80.0);
        pool.tick(1000.0);
        assert_eq!(pool.current(), 100.0);
        // paused world: scaled delta zero, no regen.
        pool.spend(AbilityKind::Bolt);
        pool.tick(0.0);
        assert_eq!(pool.current(), 60.0);
    }

    #[test]
    fn unknown_kind_costs_nothing() {
        let mut pool = pool();
        assert!(pool.can_afford(AbilityKind::Mend));
        pool.spend(AbilityKind::Mend);
        assert_eq!(pool.current(), 100.0);
    }

    #[test]
    fn dilation_has_its_own_cost() {
        let mut pool = pool();
        assert!(pool.can_afford_dilation());
        pool.spend_dilation();
        pool.spend_dilation();
        assert_eq!(pool.current(), 30.0);
        assert!(!pool.can_afford_dilation());
    }
}
