use tracing::debug;

use super::types::{
    AbilityKind, ChallengeFailReason, ChallengeOutcome, ChallengeStatus, DirectionSymbol,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotResolution {
    pub index: usize,
    pub correct: bool,
}

/// What one wall-clock tick of a pending challenge produced. The dispatcher
/// turns this into collaborator events; the challenge itself stays bus-free.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChallengeStep {
    pub slot: Option<SlotResolution>,
    pub outcome: Option<ChallengeOutcome>,
}

/// One active casting attempt.
///
/// The timeout counts down on the wall clock, never the scaled clock: the
/// world is paused for the whole lifetime of the challenge, so scaled time
/// would never advance. Terminal states are reached in `tick` and reported
/// exactly once through the returned step.
#[derive(Debug, Clone)]
pub struct CastChallenge {
    kind: AbilityKind,
    required: Vec<DirectionSymbol>,
    progress_index: usize,
    remaining_timeout_seconds: f32,
    status: ChallengeStatus,
}

impl CastChallenge {
    pub fn new(kind: AbilityKind, required: Vec<DirectionSymbol>, timeout_seconds: f32) -> Self {
        Self {
            kind,
            required,
            progress_index: 0,
            remaining_timeout_seconds: timeout_seconds,
            status: ChallengeStatus::Pending,
        }
    }

    pub fn kind(&self) -> AbilityKind {
        self.kind
    }

    pub fn required(&self) -> &[DirectionSymbol] {
        &self.required
    }

    pub fn progress_index(&self) -> usize {
        self.progress_index
    }

    pub fn remaining_timeout_seconds(&self) -> f32 {
        self.remaining_timeout_seconds
    }

    #[cfg(test)]
    pub fn status(&self) -> ChallengeStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChallengeStatus::Pending
    }

    /// Advances the challenge by one wall-clock tick.
    ///
    /// Check order: cancel, then timeout, then symbol input. `symbols` holds
    /// the edge-triggered symbol presses of this tick; more than one distinct
    /// symbol in the same tick is discarded as noise so an accidental
    /// multi-key press is never resolved arbitrarily. A single wrong symbol
    /// fails the challenge immediately.
    pub fn tick(
        &mut self,
        wall_delta_seconds: f32,
        symbols: &[DirectionSymbol],
        abort_pressed: bool,
    ) -> ChallengeStep {
        if !self.is_pending() {
            return ChallengeStep::default();
        }

        if abort_pressed {
            self.status = ChallengeStatus::Cancelled;
            return ChallengeStep {
                slot: None,
                outcome: Some(ChallengeOutcome::Cancelled),
            };
        }

        self.remaining_timeout_seconds -= wall_delta_seconds;
        if self.remaining_timeout_seconds <= 0.0 {
            self.remaining_timeout_seconds = 0.0;
            self.status = ChallengeStatus::Failed(ChallengeFailReason::Timeout);
            return ChallengeStep {
                slot: None,
                outcome: Some(ChallengeOutcome::Failed(ChallengeFailReason::Timeout)),
            };
        }

        if symbols.len() > 1 {
            debug!(
                kind = self.kind.as_str(),
                symbol_count = symbols.len(),
                "simultaneous_symbols_discarded"
            );
            return ChallengeStep::default();
        }
        let Some(&symbol) = symbols.first() else {
            return ChallengeStep::default();
        };

        let index = self.progress_index;
        if self.required[index] == symbol {
            self.progress_index += 1;
            let outcome = if self.progress_index == self.required.len() {
                self.status = ChallengeStatus::Succeeded;
                Some(ChallengeOutcome::Succeeded)
            } else {
                None
            };
            ChallengeStep {
                slot: Some(SlotResolution {
                    index,
                    correct: true,
                }),
                outcome,
            }
        } else {
            self.status = ChallengeStatus::Failed(ChallengeFailReason::WrongInput);
            ChallengeStep {
                slot: Some(SlotResolution {
                    index,
                    correct: false,
                }),
                outcome: Some(ChallengeOutcome::Failed(ChallengeFailReason::WrongInput)),
            }
        }
    }
}
