//! Fixed-window evaluation shared by in-process backends.
//!
//! The Redis backend mirrors this exact sequence in its server-side script;
//! keep the two in sync when changing the rollover or rejection rules.

use crate::config::RateLimitPolicy;

use super::{CounterState, Decision};

/// Result of evaluating one call against a key's counter state.
pub(crate) struct WindowEval {
    /// State to persist, with a TTL of twice the window. `None` means the
    /// call was rejected and nothing is written.
    pub state: Option<CounterState>,
    pub decision: Decision,
}

/// Run the read-window/maybe-reset/compare/increment sequence.
///
/// The caller must make the read of `existing` and the write of the returned
/// state atomic per key; this function is only the arithmetic.
pub(crate) fn evaluate(
    existing: Option<CounterState>,
    policy: &RateLimitPolicy,
    now: i64,
) -> WindowEval {
    // Absent state is a fresh window starting now with no hits recorded.
    let state = existing.unwrap_or(CounterState {
        window_start: now,
        hit_count: 0,
    });

    // Lazy rollover: a window only resets on the first call after it has
    // fully elapsed. If the clock regressed (now < window_start) this check
    // never fires and the existing window stays in force.
    let state = if state.window_start + policy.window() < now {
        CounterState {
            window_start: now,
            hit_count: 0,
        }
    } else {
        state
    };

    let reset_at = state.window_start + policy.window();

    if state.hit_count >= policy.max_hits {
        // Rejected: no write, remaining clamped at zero.
        let remaining = policy.max_hits.saturating_sub(state.hit_count);
        return WindowEval {
            state: None,
            decision: Decision::new(policy.max_hits, remaining, reset_at, true),
        };
    }

    let next = CounterState {
        window_start: state.window_start,
        hit_count: state.hit_count + 1,
    };
    let remaining = policy.max_hits - next.hit_count;

    WindowEval {
        state: Some(next),
        decision: Decision::new(policy.max_hits, remaining, reset_at, false),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn policy(window_secs: u64, max_hits: u32) -> RateLimitPolicy {
        RateLimitPolicy::new(Duration::from_secs(window_secs), max_hits)
    }

    #[test]
    fn test_cold_start_admits_and_counts_one() {
        let p = policy(60, 3);
        let eval = evaluate(None, &p, 100);

        assert!(!eval.decision.limited);
        assert_eq!(eval.decision.limit, 3);
        assert_eq!(eval.decision.remaining, 2);
        assert_eq!(eval.decision.reset_at.timestamp(), 160);
        assert_eq!(
            eval.state,
            Some(CounterState {
                window_start: 100,
                hit_count: 1
            })
        );
    }

    #[test]
    fn test_quota_boundary_is_exact() {
        let p = policy(60, 3);
        let mut state = None;

        // Exactly max_hits calls admitted.
        for expected_remaining in [2u32, 1, 0] {
            let eval = evaluate(state, &p, 100);
            assert!(!eval.decision.limited);
            assert_eq!(eval.decision.remaining, expected_remaining);
            state = eval.state;
        }

        // The (max_hits + 1)-th call is the first rejection, and it does not
        // increment the counter.
        let eval = evaluate(state, &p, 100);
        assert!(eval.decision.limited);
        assert_eq!(eval.decision.remaining, 0);
        assert!(eval.state.is_none());
    }

    #[test]
    fn test_rejection_does_not_advance_state() {
        let p = policy(60, 1);
        let admitted = evaluate(None, &p, 100);
        let state = admitted.state;

        let first_reject = evaluate(state, &p, 110);
        let second_reject = evaluate(state, &p, 120);

        assert!(first_reject.decision.limited);
        assert!(second_reject.decision.limited);
        assert_eq!(first_reject.decision.remaining, 0);
        assert_eq!(second_reject.decision.remaining, 0);
        // Both report the original window's end.
        assert_eq!(first_reject.decision.reset_at.timestamp(), 160);
        assert_eq!(second_reject.decision.reset_at.timestamp(), 160);
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let p = policy(60, 2);
        let state = Some(CounterState {
            window_start: 100,
            hit_count: 2,
        });

        // At 160 the window [100, 160) has not yet fully elapsed.
        let eval = evaluate(state, &p, 160);
        assert!(eval.decision.limited);

        // At 161 it has: fresh window, fresh count.
        let eval = evaluate(state, &p, 161);
        assert!(!eval.decision.limited);
        assert_eq!(eval.decision.remaining, 1);
        assert_eq!(
            eval.state,
            Some(CounterState {
                window_start: 161,
                hit_count: 1
            })
        );
    }

    #[test]
    fn test_zero_quota_rejects_first_call() {
        let p = policy(60, 0);
        let eval = evaluate(None, &p, 100);

        assert!(eval.decision.limited);
        assert_eq!(eval.decision.remaining, 0);
        assert!(eval.state.is_none());
    }

    #[test]
    fn test_clock_regression_keeps_window_in_force() {
        let p = policy(60, 2);
        let state = Some(CounterState {
            window_start: 1_000,
            hit_count: 2,
        });

        // The host clock jumped backwards; the rollover check never fires.
        let eval = evaluate(state, &p, 900);
        assert!(eval.decision.limited);
        assert_eq!(eval.decision.reset_at.timestamp(), 1_060);
    }

    #[test]
    fn test_remaining_decreases_by_one_per_admission() {
        let p = policy(60, 5);
        let mut state = None;
        let mut last_remaining = p.max_hits;

        for _ in 0..5 {
            let eval = evaluate(state, &p, 100);
            assert!(!eval.decision.limited);
            assert_eq!(eval.decision.remaining, last_remaining - 1);
            last_remaining = eval.decision.remaining;
            state = eval.state;
        }
        assert_eq!(last_remaining, 0);
    }

    #[test]
    fn test_concrete_scenario_sixty_second_window() {
        // W = 60s, Q = 3, single key, t measured from 0.
        let p = policy(60, 3);
        let mut state = None;

        // Calls 1-3 at t=0.
        for expected_remaining in [2u32, 1, 0] {
            let eval = evaluate(state, &p, 0);
            assert!(!eval.decision.limited);
            assert_eq!(eval.decision.remaining, expected_remaining);
            assert_eq!(eval.decision.reset_at.timestamp(), 60);
            state = eval.state;
        }

        // Call 4 at t=10: rejected, reset still at the original window's end.
        let eval = evaluate(state, &p, 10);
        assert!(eval.decision.limited);
        assert_eq!(eval.decision.remaining, 0);
        assert_eq!(eval.decision.reset_at.timestamp(), 60);

        // Call 5 at t=61: new window.
        let eval = evaluate(state, &p, 61);
        assert!(!eval.decision.limited);
        assert_eq!(eval.decision.remaining, 2);
        assert_eq!(eval.decision.reset_at.timestamp(), 121);
    }
}
