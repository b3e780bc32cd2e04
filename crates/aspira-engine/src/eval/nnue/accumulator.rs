//! Hidden-layer sums for one perspective.

use aspira_core::{Color, PieceKind, Position};

use super::features::feature_index;
use super::network::{MAX_HIDDEN, Network};

/// First-layer pre-activations. Only the first `net.hidden()` lanes are live.
#[derive(Clone)]
#[repr(C, align(64))]
pub(crate) struct Accumulator {
    pub(crate) vals: [i32; MAX_HIDDEN],
}

impl Accumulator {
    /// Full recompute from the bias plus every piece on the board.
    pub(crate) fn refresh(pos: &Position, perspective: Color, net: &Network) -> Accumulator {
        let hidden = net.hidden();
        let mut acc = Accumulator { vals: [0; MAX_HIDDEN] };
        for (lane, &bias) in acc.vals[..hidden].iter_mut().zip(net.feature_bias()) {
            *lane = i32::from(bias);
        }
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for sq in pos.colored(color, kind) {
                    acc.add(net.feature_weights(feature_index(perspective, color, kind, sq)));
                }
            }
        }
        acc
    }

    #[inline]
    fn add(&mut self, weights: &[i16]) {
        for (lane, &w) in self.vals.iter_mut().zip(weights) {
            *lane += i32::from(w);
        }
    }
}
