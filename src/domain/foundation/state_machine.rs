//! State machine trait for phase enums.
//!
//! Provides a consistent interface for validating transitions between the
//! lifecycle phases of a long-running process (e.g. a harvest lineage).

use super::ValidationError;

/// Trait for phase enums that represent state machines.
///
/// Implementors define valid transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for HarvestPhase {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (Fetching, Converting) |
///             (Converting, Advancing) |
///             // ... etc
///         )
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Fetching => vec![Converting, Advancing, RollingBack, Done],
///             // ... etc
///         }
///     }
/// }
///
/// let next = current.transition_to(HarvestPhase::Converting)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Lamp {
        Off,
        Warming,
        On,
        Burnt,
    }

    impl StateMachine for Lamp {
        fn can_transition_to(&self, target: &Self) -> bool {
            use Lamp::*;
            matches!(
                (self, target),
                (Off, Warming) | (Warming, On) | (Warming, Burnt) | (On, Off) | (On, Burnt)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Lamp::*;
            match self {
                Off => vec![Warming],
                Warming => vec![On, Burnt],
                On => vec![Off, Burnt],
                Burnt => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(Lamp::Off.transition_to(Lamp::Warming), Ok(Lamp::Warming));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        let result = Lamp::Off.transition_to(Lamp::On);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Off"));
    }

    #[test]
    fn is_terminal_only_for_states_without_exits() {
        assert!(Lamp::Burnt.is_terminal());
        assert!(!Lamp::Off.is_terminal());
        assert!(!Lamp::On.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for lamp in [Lamp::Off, Lamp::Warming, Lamp::On, Lamp::Burnt] {
            for target in lamp.valid_transitions() {
                assert!(
                    lamp.can_transition_to(&target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    lamp,
                    target
                );
            }
        }
    }
}
