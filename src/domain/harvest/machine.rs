//! Harvest lineage state machine.
//!
//! A lineage starts at `Fetching(seed)` and ends at `Done`. Each step pairs
//! the new state with at most one effect for the caller to perform, and the
//! caller reports the effect's outcome back as the next event.

use chrono::{DateTime, Utc};

use super::{HarvestError, HarvestPolicy};
use crate::domain::cycle::{ForecastOffset, Identity};
use crate::domain::foundation::StateMachine;

/// Coarse phase of a harvest lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarvestPhase {
    Fetching,
    Converting,
    Advancing,
    RollingBack,
    Done,
}

impl StateMachine for HarvestPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use HarvestPhase::*;
        matches!(
            (self, target),
            (Fetching, Converting)
                | (Fetching, Advancing)
                | (Fetching, RollingBack)
                | (Fetching, Done)
                | (Converting, Advancing)
                | (Converting, RollingBack)
                | (Converting, Done)
                | (Advancing, Fetching)
                | (RollingBack, Fetching)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use HarvestPhase::*;
        match self {
            Fetching => vec![Converting, Advancing, RollingBack, Done],
            Converting => vec![Advancing, RollingBack, Done],
            Advancing => vec![Fetching],
            RollingBack => vec![Fetching],
            Done => vec![],
        }
    }
}

/// Full state of a lineage, including the identity being worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    /// About to fetch (or skip, if cached) this identity.
    Fetching(Identity),
    /// Raw payload stored; waiting for conversion.
    Converting(Identity),
    /// Moving to the next forecast step of the same cycle.
    Advancing(Identity),
    /// Restarting at offset zero of the previous cycle.
    RollingBack(Identity),
    Done,
}

impl HarvestState {
    pub fn phase(&self) -> HarvestPhase {
        match self {
            HarvestState::Fetching(_) => HarvestPhase::Fetching,
            HarvestState::Converting(_) => HarvestPhase::Converting,
            HarvestState::Advancing(_) => HarvestPhase::Advancing,
            HarvestState::RollingBack(_) => HarvestPhase::RollingBack,
            HarvestState::Done => HarvestPhase::Done,
        }
    }

    /// Identity the state refers to, absent once the lineage is done.
    pub fn identity(&self) -> Option<Identity> {
        match self {
            HarvestState::Fetching(id)
            | HarvestState::Converting(id)
            | HarvestState::Advancing(id)
            | HarvestState::RollingBack(id) => Some(*id),
            HarvestState::Done => None,
        }
    }
}

/// Outcome reported back to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarvestEvent {
    /// A converted artifact already exists; the fetch was skipped.
    AlreadyCached,
    /// The remote answered 200 and the raw payload is stored.
    Fetched,
    /// Non-200 status, network error, or the raw payload could not be stored.
    FetchFailed,
    Converted,
    ConversionFailed,
    /// The caller is ready to continue after an advance or rollback.
    Resumed,
}

/// Work the caller must perform before reporting the next event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestEffect {
    Fetch(Identity),
    Convert(Identity),
    Resume,
}

/// Result of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: HarvestState,
    /// `None` only when `state` is `Done`.
    pub effect: Option<HarvestEffect>,
}

/// Where the decide-next rule sends the lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTarget {
    Advance(Identity),
    RollBack(Identity),
    Done,
}

/// Seeds a lineage at `seed`.
pub fn start(seed: Identity) -> Step {
    Step {
        state: HarvestState::Fetching(seed),
        effect: Some(HarvestEffect::Fetch(seed)),
    }
}

/// Decide-next rule for the identity just attempted.
///
/// The history bound is checked first, so a lineage never touches a cycle
/// whose predecessor is older than `policy.max_history`. A failure or an
/// offset above `policy.max_forecast_hours` falls back to offset zero of the
/// previous cycle; otherwise the walk advances one forecast step.
pub fn next_target(
    current: Identity,
    success: bool,
    policy: &HarvestPolicy,
    now: DateTime<Utc>,
) -> NextTarget {
    let Some(previous) = current.cycle().previous() else {
        return NextTarget::Done;
    };
    if now - *previous.as_datetime() > policy.max_history {
        return NextTarget::Done;
    }

    let roll_back = NextTarget::RollBack(Identity::new(previous, ForecastOffset::ZERO));
    if !success || current.offset().hours() > policy.max_forecast_hours {
        return roll_back;
    }

    match current.offset().next_step() {
        Some(offset) => NextTarget::Advance(Identity::new(current.cycle(), offset)),
        None => roll_back,
    }
}

/// Applies `event` to `state`.
///
/// Returns `UnexpectedEvent` when the event makes no sense in the current
/// phase, e.g. `Converted` while still fetching.
pub fn transition(
    state: &HarvestState,
    event: HarvestEvent,
    policy: &HarvestPolicy,
    now: DateTime<Utc>,
) -> Result<Step, HarvestError> {
    let unexpected = || HarvestError::UnexpectedEvent {
        phase: state.phase(),
        event,
    };

    let step = match (*state, event) {
        (HarvestState::Fetching(id), HarvestEvent::AlreadyCached) => {
            decide(next_target(id, true, policy, now))
        }
        (HarvestState::Fetching(id), HarvestEvent::Fetched) => Step {
            state: HarvestState::Converting(id),
            effect: Some(HarvestEffect::Convert(id)),
        },
        (HarvestState::Fetching(id), HarvestEvent::FetchFailed) => {
            decide(next_target(id, false, policy, now))
        }
        (HarvestState::Converting(id), HarvestEvent::Converted) => {
            decide(next_target(id, true, policy, now))
        }
        (HarvestState::Converting(id), HarvestEvent::ConversionFailed) => {
            decide(next_target(id, false, policy, now))
        }
        (HarvestState::Advancing(id), HarvestEvent::Resumed)
        | (HarvestState::RollingBack(id), HarvestEvent::Resumed) => Step {
            state: HarvestState::Fetching(id),
            effect: Some(HarvestEffect::Fetch(id)),
        },
        _ => return Err(unexpected()),
    };

    state.phase().transition_to(step.state.phase())?;
    Ok(step)
}

fn decide(target: NextTarget) -> Step {
    match target {
        NextTarget::Advance(id) => Step {
            state: HarvestState::Advancing(id),
            effect: Some(HarvestEffect::Resume),
        },
        NextTarget::RollBack(id) => Step {
            state: HarvestState::RollingBack(id),
            effect: Some(HarvestEffect::Resume),
        },
        NextTarget::Done => Step {
            state: HarvestState::Done,
            effect: None,
        },
    }
}
