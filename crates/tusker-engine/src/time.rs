//! Time management: convert clock parameters into a single search budget.
//!
//! The driver treats the budget as soft at 1x and hard at 2x (§ termination
//! rules in the search module), so this layer only has to produce one number.

use std::time::Duration;

use tusker_core::Color;

/// Milliseconds reserved for protocol overhead per move.
const MOVE_OVERHEAD_MS: u64 = 10;

/// Default number of moves the remaining time is spread over.
const DEFAULT_MOVES_TO_GO: u32 = 30;

/// Compute the time budget for one move from the remaining clock.
///
/// The remaining time is spread over `moves_to_go` moves (default 30) and
/// three quarters of the increment is added, clamped so the budget never
/// exceeds the usable remaining time.
pub fn budget_from_clock(
    remaining: Duration,
    increment: Duration,
    moves_to_go: Option<u32>,
) -> Duration {
    let remaining_ms = remaining.as_millis() as u64;
    if remaining_ms <= MOVE_OVERHEAD_MS {
        return Duration::from_millis(1);
    }
    let usable = remaining_ms - MOVE_OVERHEAD_MS;
    let mtg = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1) as u64;

    let base = usable / mtg;
    let bonus = increment.as_millis() as u64 * 3 / 4;
    Duration::from_millis((base + bonus).clamp(1, usable))
}

/// Derive the budget for a `go` command, if any.
///
/// Priority: `infinite` wins, then `movetime`, then the side-to-move's clock.
/// With none of these (bare `go`, `go depth n`) there is no budget.
#[allow(clippy::too_many_arguments)]
pub fn budget_from_go(
    wtime: Option<Duration>,
    btime: Option<Duration>,
    winc: Option<Duration>,
    binc: Option<Duration>,
    movestogo: Option<u32>,
    movetime: Option<Duration>,
    infinite: bool,
    side: Color,
) -> Option<Duration> {
    if infinite {
        return None;
    }
    if let Some(movetime) = movetime {
        return Some(movetime);
    }

    let (remaining, increment) = match side {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };
    remaining.map(|rem| budget_from_clock(rem, increment.unwrap_or(Duration::ZERO), movestogo))
}

#[cfg(test)]
mod tests {
    use super::{budget_from_clock, budget_from_go};
    use std::time::Duration;
    use tusker_core::Color;

    #[test]
    fn five_minutes_no_increment() {
        let budget = budget_from_clock(Duration::from_secs(300), Duration::ZERO, None);
        // (300000 - 10) / 30 ~ 9999ms
        assert!(budget.as_millis() > 8_000, "budget={budget:?}");
        assert!(budget.as_millis() < 12_000, "budget={budget:?}");
    }

    #[test]
    fn increment_adds_three_quarters() {
        let with_inc =
            budget_from_clock(Duration::from_secs(300), Duration::from_secs(2), None);
        let without = budget_from_clock(Duration::from_secs(300), Duration::ZERO, None);
        assert_eq!(
            with_inc.as_millis() - without.as_millis(),
            1_500,
            "2s increment contributes 1.5s"
        );
    }

    #[test]
    fn movestogo_divides_remaining() {
        let budget = budget_from_clock(Duration::from_secs(60), Duration::ZERO, Some(10));
        assert!(budget.as_millis() > 5_000, "budget={budget:?}");
        assert!(budget.as_millis() < 7_000, "budget={budget:?}");
    }

    #[test]
    fn nearly_flagged_clock_gets_minimum() {
        let budget = budget_from_clock(Duration::from_millis(5), Duration::ZERO, None);
        assert_eq!(budget, Duration::from_millis(1));
        let zero = budget_from_clock(Duration::ZERO, Duration::ZERO, None);
        assert_eq!(zero, Duration::from_millis(1));
    }

    #[test]
    fn budget_never_exceeds_usable_time() {
        // Huge increment against a nearly empty clock.
        let budget =
            budget_from_clock(Duration::from_millis(100), Duration::from_secs(60), None);
        assert!(budget.as_millis() <= 90);
    }

    #[test]
    fn go_infinite_has_no_budget() {
        let budget = budget_from_go(
            Some(Duration::from_secs(300)),
            None,
            None,
            None,
            None,
            None,
            true,
            Color::White,
        );
        assert!(budget.is_none());
    }

    #[test]
    fn go_movetime_is_exact() {
        let budget = budget_from_go(
            None,
            None,
            None,
            None,
            None,
            Some(Duration::from_millis(750)),
            false,
            Color::White,
        );
        assert_eq!(budget, Some(Duration::from_millis(750)));
    }

    #[test]
    fn go_uses_side_to_move_clock() {
        let budget = budget_from_go(
            Some(Duration::from_secs(600)),
            Some(Duration::from_secs(10)),
            None,
            None,
            None,
            None,
            false,
            Color::Black,
        );
        // Black's 10 seconds, not White's 10 minutes.
        assert!(budget.unwrap().as_millis() < 1_000);
    }

    #[test]
    fn bare_go_has_no_budget() {
        let budget =
            budget_from_go(None, None, None, None, None, None, false, Color::White);
        assert!(budget.is_none());
    }
}
