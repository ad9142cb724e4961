//! Bounded linear probe over cycles around a target time.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::RetrievalError;
use crate::domain::cycle::{
    is_beyond_limit, nearest_candidate, round_to_cycle, truncate_to_hour, Cycle, ForecastOffset,
    Identity, Rounding, FORECAST_STEP_HOURS, MAX_FORECAST_OFFSET_HOURS,
};
use crate::domain::foundation::ValidationError;

/// Which way the candidate cycle moves after a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// Step to older cycles (the usual case).
    #[default]
    Backward,
    /// Step to newer cycles.
    Forward,
}

impl SearchDirection {
    fn step(&self, cycle: Cycle) -> Option<Cycle> {
        match self {
            SearchDirection::Backward => cycle.previous(),
            SearchDirection::Forward => cycle.next(),
        }
    }
}

impl FromStr for SearchDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backward" | "backwards" => Ok(SearchDirection::Backward),
            "forward" | "forwards" => Ok(SearchDirection::Forward),
            other => Err(ValidationError::invalid_format(
                "direction",
                format!("expected 'backward' or 'forward', got '{}'", other),
            )),
        }
    }
}

/// The sequence of identities a nearest-match lookup probes, in order.
///
/// Yields one identity per candidate cycle whose floored offset to the
/// target is non-negative. Stops once the offset magnitude exceeds the
/// limit or the candidate drifts beyond the future limit. The limit is
/// capped at `MAX_FORECAST_OFFSET_HOURS`, so a plan never outlives the
/// offsets an identity can carry.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    target_hour: DateTime<Utc>,
    limit_hours: u32,
    direction: SearchDirection,
    now: DateTime<Utc>,
    candidate: Cycle,
    finished: bool,
}

impl SearchPlan {
    /// Starts a plan at the cycle containing `target`.
    ///
    /// Fails with `FutureBeyondLimit` when even the first candidate is too far ahead of `now`.
    pub fn new(
        target: DateTime<Utc>,
        limit_hours: u32,
        direction: SearchDirection,
        now: DateTime<Utc>,
    ) -> Result<Self, RetrievalError> {
        let limit_hours = limit_hours.min(MAX_FORECAST_OFFSET_HOURS);
        let candidate = nearest_candidate(target, limit_hours, now)?;
        Ok(Self {
            target_hour: truncate_to_hour(target),
            limit_hours,
            direction,
            now,
            candidate,
            finished: false,
        })
    }

    pub fn limit_hours(&self) -> u32 {
        self.limit_hours
    }
}

impl Iterator for SearchPlan {
    type Item = Identity;

    fn next(&mut self) -> Option<Identity> {
        while !self.finished {
            let candidate = self.candidate;
            if is_beyond_limit(candidate, self.limit_hours, self.now) {
                self.finished = true;
                break;
            }

            let offset = candidate.hours_until(self.target_hour);
            if offset.abs() > i64::from(self.limit_hours) {
                self.finished = true;
                break;
            }

            match self.direction.step(candidate) {
                Some(next) => self.candidate = next,
                None => self.finished = true,
            }

            let rounded = round_to_cycle(offset, FORECAST_STEP_HOURS, Rounding::Floor);
            if rounded < 0 {
                continue;
            }
            let offset = u32::try_from(rounded)
                .ok()
                .and_then(|hours| ForecastOffset::new(hours).ok());
            if let Some(offset) = offset {
                return Some(Identity::new(candidate, offset));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn probes(plan: SearchPlan) -> Vec<String> {
        plan.map(|id| id.to_string()).collect()
    }

    #[test]
    fn backward_plan_walks_older_cycles_with_growing_offsets() {
        let now = utc(2024, 3, 2, 0, 0);
        let plan = SearchPlan::new(utc(2024, 3, 1, 5, 0), 18, SearchDirection::Backward, now).unwrap();

        assert_eq!(
            probes(plan),
            vec![
                "2024-03-01T00.f003",
                "2024-02-29T18.f009",
                "2024-02-29T12.f015",
            ]
        );
    }

    #[test]
    fn backward_plan_includes_offset_equal_to_limit() {
        let now = utc(2024, 3, 2, 0, 0);
        let plan = SearchPlan::new(utc(2024, 3, 1, 6, 0), 18, SearchDirection::Backward, now).unwrap();

        assert_eq!(
            probes(plan),
            vec![
                "2024-03-01T06.f000",
                "2024-03-01T00.f006",
                "2024-02-29T18.f012",
                "2024-02-29T12.f018",
            ]
        );
    }

    #[test]
    fn minutes_are_ignored_when_computing_offset() {
        let now = utc(2024, 3, 2, 0, 0);
        let mut plan = SearchPlan::new(utc(2024, 3, 1, 8, 59), 18, SearchDirection::Backward, now).unwrap();
        assert_eq!(plan.next().unwrap().to_string(), "2024-03-01T06.f000");
    }

    #[test]
    fn forward_plan_skips_negative_offsets_and_terminates() {
        let now = utc(2024, 3, 5, 0, 0);
        let plan = SearchPlan::new(utc(2024, 3, 1, 5, 0), 18, SearchDirection::Forward, now).unwrap();

        assert_eq!(probes(plan), vec!["2024-03-01T00.f003"]);
    }

    #[test]
    fn plan_stops_when_candidate_passes_future_limit() {
        let now = utc(2024, 3, 1, 0, 0);
        let plan = SearchPlan::new(utc(2024, 3, 1, 12, 0), 12, SearchDirection::Forward, now).unwrap();

        assert_eq!(probes(plan), vec!["2024-03-01T12.f000"]);
    }

    #[test]
    fn plan_creation_fails_for_far_future_target() {
        let now = utc(2024, 3, 1, 0, 0);
        let result = SearchPlan::new(utc(2024, 3, 3, 0, 0), 18, SearchDirection::Backward, now);
        assert!(matches!(result, Err(RetrievalError::FutureBeyondLimit { .. })));
    }

    #[test]
    fn zero_limit_probes_only_exact_cycle() {
        let now = utc(2024, 3, 2, 0, 0);
        let plan = SearchPlan::new(utc(2024, 3, 1, 6, 0), 0, SearchDirection::Backward, now).unwrap();
        assert_eq!(probes(plan), vec!["2024-03-01T06.f000"]);

        let plan = SearchPlan::new(utc(2024, 3, 1, 7, 0), 0, SearchDirection::Backward, now).unwrap();
        assert!(probes(plan).is_empty());
    }

    #[test]
    fn oversized_limit_is_capped_at_largest_offset() {
        let now = utc(2024, 3, 2, 0, 0);
        let plan =
            SearchPlan::new(utc(2024, 3, 1, 5, 0), u32::MAX, SearchDirection::Backward, now).unwrap();
        assert_eq!(plan.limit_hours(), MAX_FORECAST_OFFSET_HOURS);

        let ids: Vec<Identity> = plan.collect();
        assert_eq!(ids.len(), 166);
        assert_eq!(ids.last().unwrap().offset().hours(), 993);
    }

    #[test]
    fn oversized_forward_limit_terminates() {
        let now = utc(2024, 3, 5, 0, 0);
        let plan =
            SearchPlan::new(utc(2024, 3, 1, 5, 0), u32::MAX, SearchDirection::Forward, now).unwrap();

        assert_eq!(probes(plan), vec!["2024-03-01T00.f003"]);
    }

    #[test]
    fn plan_ends_at_start_of_calendar() {
        let target = DateTime::<Utc>::MIN_UTC + chrono::Duration::hours(7);
        let plan = SearchPlan::new(target, 18, SearchDirection::Backward, target).unwrap();

        assert_eq!(plan.count(), 2);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("Forward".parse::<SearchDirection>().unwrap(), SearchDirection::Forward);
        assert_eq!("backward".parse::<SearchDirection>().unwrap(), SearchDirection::Backward);
        assert!("sideways".parse::<SearchDirection>().is_err());
        assert_eq!(SearchDirection::default(), SearchDirection::Backward);
    }
}
