//! Search limits and time allocation.

use std::time::Duration;

use aspira_core::Color;

/// Reserved on every move for protocol and scheduling latency.
pub const MOVE_OVERHEAD: Duration = Duration::from_millis(10);

/// Moves assumed left in the game when the GUI does not say.
const DEFAULT_MOVES_TO_GO: u32 = 20;

/// What the caller allows a single search to spend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movetime: Option<Duration>,
    pub movestogo: Option<u32>,
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

impl SearchLimits {
    /// Limits from millisecond clocks; a zero means "not given".
    pub fn new(
        wtime_ms: u64,
        btime_ms: u64,
        winc_ms: u64,
        binc_ms: u64,
        movetime_ms: u64,
        depth: u8,
        nodes: u64,
    ) -> Self {
        let ms = |v: u64| (v > 0).then(|| Duration::from_millis(v));
        Self {
            wtime: ms(wtime_ms),
            btime: ms(btime_ms),
            winc: ms(winc_ms),
            binc: ms(binc_ms),
            movetime: ms(movetime_ms),
            movestogo: None,
            depth: (depth > 0).then_some(depth),
            nodes: (nodes > 0).then_some(nodes),
            infinite: false,
        }
    }

    pub fn fixed_depth(depth: u8) -> Self {
        Self { depth: Some(depth), ..Self::default() }
    }

    pub fn fixed_nodes(nodes: u64) -> Self {
        Self { nodes: Some(nodes), ..Self::default() }
    }

    pub fn fixed_time(movetime: Duration) -> Self {
        Self { movetime: Some(movetime), ..Self::default() }
    }

    /// Soft and hard time limits for `side`, or `None` when the clock is not a factor.
    ///
    /// Priority order:
    /// 1. `infinite` -> no limits
    /// 2. `movetime` -> the whole budget, less overhead, for both limits
    /// 3. the side's clock -> `remaining / movestogo + increment / 2`, 90% of it as the
    ///    soft limit, at most three times it as the hard limit, never more than
    ///    three quarters of what is left
    pub fn allocate(&self, side: Color) -> (Option<Duration>, Option<Duration>) {
        if self.infinite {
            return (None, None);
        }

        if let Some(movetime) = self.movetime {
            let budget = movetime.saturating_sub(MOVE_OVERHEAD).max(Duration::from_millis(1));
            return (Some(budget), Some(budget));
        }

        let (remaining, increment) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        let Some(remaining) = remaining else {
            return (None, None);
        };
        let (soft, hard) = compute_limits(remaining, increment.unwrap_or(Duration::ZERO), self.movestogo);
        (Some(soft), Some(hard))
    }
}

/// Soft and hard limits from a clock reading.
pub fn compute_limits(remaining: Duration, increment: Duration, moves_to_go: Option<u32>) -> (Duration, Duration) {
    let one_ms = Duration::from_millis(1);
    let usable = remaining.saturating_sub(MOVE_OVERHEAD);
    if usable <= one_ms {
        return (one_ms, one_ms);
    }

    let mtg = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).clamp(1, 50);
    let target = usable / mtg + increment / 2;
    let ceiling = usable * 3 / 4;

    let hard = (target * 3).min(ceiling).max(one_ms);
    let soft = (target * 9 / 10).min(hard).max(one_ms);
    (soft, hard)
}
