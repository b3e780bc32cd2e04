//! Compile-time leaper tables and the square-pair ray tables used by pin detection.

use crate::bitboard::Bitboard;

const KNIGHT_DELTAS: [(i8, i8); 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];

const KING_DELTAS: [(i8, i8); 8] =
    [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];

/// `(file, rank)` deltas of a pawn capture, White first.
const PAWN_DELTAS: [[(i8, i8); 2]; 2] = [[(-1, 1), (1, 1)], [(-1, -1), (1, -1)]];

const fn on_board(file: i8, rank: i8) -> bool {
    file >= 0 && file < 8 && rank >= 0 && rank < 8
}

const fn bit(file: i8, rank: i8) -> u64 {
    1u64 << (rank as u32 * 8 + file as u32)
}

const fn leaper_table(deltas: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let file = (sq % 8) as i8;
        let rank = (sq / 8) as i8;
        let mut bits = 0u64;
        let mut i = 0;
        while i < deltas.len() {
            let (f, r) = (file + deltas[i].0, rank + deltas[i].1);
            if on_board(f, r) {
                bits |= bit(f, r);
            }
            i += 1;
        }
        table[sq] = Bitboard::new(bits);
        sq += 1;
    }
    table
}

/// Unit step from `a` toward `b`, or `None` when they share no line.
const fn direction(a: usize, b: usize) -> Option<(i8, i8)> {
    let df = (b % 8) as i8 - (a % 8) as i8;
    let dr = (b / 8) as i8 - (a / 8) as i8;
    if a == b || !(df == 0 || dr == 0 || df == dr || df == -dr) {
        return None;
    }
    Some((df.signum(), dr.signum()))
}

/// Ray table for every aligned pair. With `full_line` the ray covers the whole line
/// edge to edge, endpoints included; otherwise only the squares strictly between.
const fn pair_table(full_line: bool) -> [[Bitboard; 64]; 64] {
    let mut table = [[Bitboard::EMPTY; 64]; 64];
    let mut a = 0;
    while a < 64 {
        let mut b = 0;
        while b < 64 {
            if let Some((df, dr)) = direction(a, b) {
                let (fa, ra) = ((a % 8) as i8, (a / 8) as i8);
                let (fb, rb) = ((b % 8) as i8, (b / 8) as i8);
                let mut bits = 0u64;
                if full_line {
                    let (mut f, mut r) = (fa, ra);
                    while on_board(f - df, r - dr) {
                        f -= df;
                        r -= dr;
                    }
                    while on_board(f, r) {
                        bits |= bit(f, r);
                        f += df;
                        r += dr;
                    }
                } else {
                    let (mut f, mut r) = (fa + df, ra + dr);
                    while f != fb || r != rb {
                        bits |= bit(f, r);
                        f += df;
                        r += dr;
                    }
                }
                table[a][b] = Bitboard::new(bits);
            }
            b += 1;
        }
        a += 1;
    }
    table
}

pub(crate) static KNIGHT_ATTACKS: [Bitboard; 64] = leaper_table(&KNIGHT_DELTAS);
pub(crate) static KING_ATTACKS: [Bitboard; 64] = leaper_table(&KING_DELTAS);
pub(crate) static PAWN_ATTACKS: [[Bitboard; 64]; 2] =
    [leaper_table(&PAWN_DELTAS[0]), leaper_table(&PAWN_DELTAS[1])];
pub(crate) static BETWEEN: [[Bitboard; 64]; 64] = pair_table(false);
pub(crate) static LINE: [[Bitboard; 64]; 64] = pair_table(true);
