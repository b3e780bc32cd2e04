//! Perft: exhaustive legal-move tree counts for move generator verification.

use crate::chess_move::Move;
use crate::movegen::legal_moves;
use crate::position::Position;

/// Leaf count of the legal move tree `depth` plies deep. Depth 1 is bulk-counted.
pub fn perft(pos: &mut Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for &mv in &moves {
        let undo = pos.make_move(mv);
        nodes += perft(pos, depth - 1);
        pos.undo_move(undo);
    }
    nodes
}

/// Per-root-move counts, sorted by UCI text.
pub fn divide(pos: &mut Position, depth: usize) -> Vec<(Move, u64)> {
    let moves = legal_moves(pos);
    let mut results: Vec<(Move, u64)> = moves
        .iter()
        .map(|&mv| {
            let undo = pos.make_move(mv);
            let count = perft(pos, depth.saturating_sub(1));
            pos.undo_move(undo);
            (mv, count)
        })
        .collect();
    results.sort_by_key(|(mv, _)| mv.to_uci());
    results
}
