use tracing::debug;

use super::types::{AbilityKind, EffectCommand, EffectExecutor};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTuning {
    pub move_speed: f32,
    pub jump_speed: f32,
    pub gravity: f32,
    pub max_health: u32,
    pub phase_speed_multiplier: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            jump_speed: 9.0,
            gravity: 20.0,
            max_health: 100,
            phase_speed_multiplier: 1.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectTuning {
    pub heal_amount: u32,
    pub bolt_speed: f32,
    pub bolt_lifetime_seconds: f32,
    pub shockwave_radius: f32,
    pub shockwave_strength: f32,
    pub phase_duration_seconds: f32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            heal_amount: 25,
            bolt_speed: 14.0,
            bolt_lifetime_seconds: 1.5,
            shockwave_radius: 3.0,
            shockwave_strength: 8.0,
            phase_duration_seconds: 4.0,
        }
    }
}

/// Default effect executor: maps a successful cast onto a world command
/// using the tuned magnitudes.
#[derive(Debug, Clone, Copy)]
pub struct TunedEffects {
    tuning: EffectTuning,
}

impl TunedEffects {
    pub fn new(tuning: EffectTuning) -> Self {
        Self { tuning }
    }
}

impl EffectExecutor for TunedEffects {
    fn execute(&mut self, kind: AbilityKind) -> Option<EffectCommand> {
        Some(match kind {
            AbilityKind::Mend => EffectCommand::Heal {
                amount: self.tuning.heal_amount,
            },
            AbilityKind::Bolt => EffectCommand::SpawnProjectile {
                speed: self.tuning.bolt_speed,
                lifetime_seconds: self.tuning.bolt_lifetime_seconds,
            },
            AbilityKind::Shockwave => EffectCommand::Knockback {
                radius: self.tuning.shockwave_radius,
                strength: self.tuning.shockwave_strength,
            },
            AbilityKind::Phase => EffectCommand::PhaseMode {
                duration_seconds: self.tuning.phase_duration_seconds,
            },
        })
    }
}

/// The three compensation factors for one tick, sampled once by the session
/// and applied per domain: raw for scale-invariant motion, the damped curves
/// for walking and jumping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensationSet {
    pub raw: f32,
    pub movement: f32,
    pub jump: f32,
}

impl CompensationSet {
    pub const NEUTRAL: CompensationSet = CompensationSet {
        raw: 1.0,
        movement: 1.0,
        jump: 1.0,
    };
}

#[derive(Debug)]
pub struct Avatar {
    pub position: Vec2,
    vertical_velocity: f32,
    grounded: bool,
    facing: f32,
    health: u32,
    max_health: u32,
    move_speed: f32,
    jump_speed: f32,
    gravity: f32,
    phase_speed_multiplier: f32,
    phase_remaining_seconds: f32,
}

impl Avatar {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Self {
            position: Vec2::default(),
            vertical_velocity: 0.0,
            grounded: true,
            facing: 1.0,
            health: tuning.max_health,
            max_health: tuning.max_health,
            move_speed: tuning.move_speed,
            jump_speed: tuning.jump_speed,
            gravity: tuning.gravity,
            phase_speed_multiplier: tuning.phase_speed_multiplier,
            phase_remaining_seconds: 0.0,
        }
    }

    /// Movement on the scaled clock. Walking takes the damped movement
    /// curve; the jump impulse takes the jump curve (gravity is already
    /// slowed by the global scale, so the impulse only gets a small
    /// correction). The phase timer burns at the real-time-equivalent rate,
    /// like every scale-invariant countdown.
    pub fn tick(
        &mut self,
        scaled_delta_seconds: f32,
        move_axis: f32,
        jump_pressed: bool,
        compensation: CompensationSet,
    ) {
        if scaled_delta_seconds <= 0.0 {
            return;
        }

        if move_axis != 0.0 {
            self.facing = move_axis.signum();
        }
        let speed = if self.phase_remaining_seconds > 0.0 {
            self.move_speed * self.phase_speed_multiplier
        } else {
            self.move_speed
        };
        self.position.x += move_axis * speed * compensation.movement * scaled_delta_seconds;

        if jump_pressed && self.grounded {
            self.vertical_velocity = self.jump_speed * compensation.jump;
            self.grounded = false;
        }
        if !self.grounded {
            self.vertical_velocity -= self.gravity * scaled_delta_seconds;
            self.position.y += self.vertical_velocity * scaled_delta_seconds;
            if self.position.y <= 0.0 {
                self.position.y = 0.0;
                self.vertical_velocity = 0.0;
                self.grounded = true;
            }
        }

        if self.phase_remaining_seconds > 0.0 {
            self.phase_remaining_seconds =
                (self.phase_remaining_seconds - scaled_delta_seconds * compensation.raw).max(0.0);
        }
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = (self.health.saturating_add(amount)).min(self.max_health);
    }

    pub fn enter_phase_mode(&mut self, duration_seconds: f32) {
        self.phase_remaining_seconds = duration_seconds;
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    #[cfg(test)]
    pub fn health(&self) -> u32 {
        self.health
    }

    #[cfg(test)]
    pub fn is_phasing(&self) -> bool {
        self.phase_remaining_seconds > 0.0
    }

    #[cfg(test)]
    pub fn grounded(&self) -> bool {
        self.grounded
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    velocity: Vec2,
    remaining_lifetime_seconds: f32,
}

impl Projectile {
    pub fn new(position: Vec2, velocity: Vec2, lifetime_seconds: f32) -> Self {
        Self {
            position,
            velocity,
            remaining_lifetime_seconds: lifetime_seconds,
        }
    }

    /// Flight and lifetime are scale-invariant: both advance at
    /// `scaled_delta * raw`, which equals the wall delta while dilation is
    /// active, so flight distance per real second never changes.
    pub fn tick(&mut self, scaled_delta_seconds: f32, raw_compensation: f32) -> bool {
        let dt = scaled_delta_seconds * raw_compensation;
        self.position.x += self.velocity.x * dt;
        self.position.y += self.velocity.y * dt;
        self.remaining_lifetime_seconds -= dt;
        self.remaining_lifetime_seconds > 0.0
    }
}

const DUMMY_VELOCITY_DAMPING_PER_SECOND: f32 = 4.0;

/// Inert knockback target. Moves on the plain scaled clock: dummies are
/// world objects and are supposed to crawl in slow motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingDummy {
    pub position: Vec2,
    velocity: Vec2,
}

impl TrainingDummy {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::default(),
        }
    }

    pub fn tick(&mut self, scaled_delta_seconds: f32) {
        self.position.x += self.velocity.x * scaled_delta_seconds;
        self.position.y += self.velocity.y * scaled_delta_seconds;
        let damping = (1.0 - DUMMY_VELOCITY_DAMPING_PER_SECOND * scaled_delta_seconds).max(0.0);
        self.velocity.x *= damping;
        self.velocity.y *= damping;
    }
}

#[derive(Debug)]
pub struct WorldState {
    pub avatar: Avatar,
    projectiles: Vec<Projectile>,
    dummies: Vec<TrainingDummy>,
}

impl WorldState {
    pub fn new(player: &PlayerTuning) -> Self {
        Self {
            avatar: Avatar::new(player),
            projectiles: Vec::new(),
            dummies: Vec::new(),
        }
    }

    pub fn spawn_dummy(&mut self, position: Vec2) {
        self.dummies.push(TrainingDummy::new(position));
    }

    pub fn apply_effect(&mut self, command: EffectCommand) {
        match command {
            EffectCommand::Heal { amount } => self.avatar.heal(amount),
            EffectCommand::SpawnProjectile {
                speed,
                lifetime_seconds,
            } => {
                let velocity = Vec2 {
                    x: self.avatar.facing() * speed,
                    y: 0.0,
                };
                self.projectiles.push(Projectile::new(
                    self.avatar.position,
                    velocity,
                    lifetime_seconds,
                ));
            }
            EffectCommand::Knockback { radius, strength } => {
                self.apply_knockback(radius, strength)
            }
            EffectCommand::PhaseMode { duration_seconds } => {
                self.avatar.enter_phase_mode(duration_seconds)
            }
        }
    }

    fn apply_knockback(&mut self, radius: f32, strength: f32) {
        let origin = self.avatar.position;
        let radius_sq = radius * radius;
        let mut hit = 0usize;
        for dummy in &mut self.dummies {
            let dx = dummy.position.x - origin.x;
            let dy = dummy.position.y - origin.y;
            let distance_sq = dx * dx + dy * dy;
            if distance_sq > radius_sq {
                continue;
            }
            let distance = distance_sq.sqrt();
            let (nx, ny) = if distance > f32::EPSILON {
                (dx / distance, dy / distance)
            } else {
                (self.avatar.facing(), 0.0)
            };
            dummy.velocity.x += nx * strength;
            dummy.velocity.y += ny * strength;
            hit += 1;
        }
        debug!(hit, radius, strength, "knockback_applied");
    }

    pub fn tick(
        &mut self,
        scaled_delta_seconds: f32,
        move_axis: f32,
        jump_pressed: bool,
        compensation: CompensationSet,
    ) {
        self.avatar
            .tick(scaled_delta_seconds, move_axis, jump_pressed, compensation);
        self.projectiles
            .retain_mut(|projectile| projectile.tick(scaled_delta_seconds, compensation.raw));
        for dummy in &mut self.dummies {
            dummy.tick(scaled_delta_seconds);
        }
    }

    #[cfg(test)]
    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    #[cfg(test)]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    #[cfg(test)]
    pub fn dummies(&self) -> &[TrainingDummy] {
        &self.dummies
    }
}
