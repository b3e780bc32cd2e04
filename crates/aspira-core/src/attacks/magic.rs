//! Magic bitboards for sliders. Magic multipliers are searched once at first use with
//! a fixed-seed generator, so every run builds identical tables.

use std::sync::OnceLock;

use crate::bitboard::Bitboard;

const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Debug, Clone, Copy, Default)]
struct MagicEntry {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl MagicEntry {
    #[inline(always)]
    fn index(&self, occupied: u64) -> usize {
        self.offset + ((occupied & self.mask).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

struct SliderTable {
    entries: [MagicEntry; 64],
    attacks: Vec<Bitboard>,
}

/// Walk each ray from `sq` until it leaves the board or hits an occupied square
/// (the blocker itself is attacked).
fn slide(sq: usize, occupied: u64, dirs: &[(i8, i8); 4]) -> u64 {
    let mut attacks = 0u64;
    for &(df, dr) in dirs {
        let (mut f, mut r) = ((sq % 8) as i8 + df, (sq / 8) as i8 + dr);
        while (0..8).contains(&f) && (0..8).contains(&r) {
            let bit = 1u64 << (r * 8 + f);
            attacks |= bit;
            if occupied & bit != 0 {
                break;
            }
            f += df;
            r += dr;
        }
    }
    attacks
}

pub(crate) fn rook_attacks_slow(sq: usize, occupied: u64) -> u64 {
    slide(sq, occupied, &ROOK_DIRS)
}

pub(crate) fn bishop_attacks_slow(sq: usize, occupied: u64) -> u64 {
    slide(sq, occupied, &BISHOP_DIRS)
}

/// Squares whose occupancy can change the attack set: the empty-board rays minus
/// the edge squares each ray ends on.
fn relevant_mask(sq: usize, dirs: &[(i8, i8); 4]) -> u64 {
    let rank_edges = (Bitboard::RANK_1 | Bitboard::RANK_8).bits() & !(0xFFu64 << (sq / 8 * 8));
    let file_edges = (Bitboard::FILE_A | Bitboard::FILE_H).bits() & !(Bitboard::FILE_A.bits() << (sq % 8));
    slide(sq, 0, dirs) & !(rank_edges | file_edges)
}

/// Xorshift64* generator.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Few set bits make good magic candidates.
    fn sparse(&mut self) -> u64 {
        self.next() & self.next() & self.next()
    }
}

fn build(dirs: &[(i8, i8); 4], seed: u64) -> SliderTable {
    let mut rng = Rng(seed);
    let mut entries = [MagicEntry::default(); 64];
    let mut attacks = Vec::new();

    let mut occupancies = Vec::with_capacity(4096);
    let mut reference = Vec::with_capacity(4096);
    let mut used = vec![0u32; 4096];
    let mut attempt = 0u32;

    for (sq, entry) in entries.iter_mut().enumerate() {
        let mask = relevant_mask(sq, dirs);
        let bits = mask.count_ones();
        let size = 1usize << bits;

        occupancies.clear();
        reference.clear();
        let mut subset = 0u64;
        loop {
            occupancies.push(subset);
            reference.push(slide(sq, subset, dirs));
            subset = subset.wrapping_sub(mask) & mask;
            if subset == 0 {
                break;
            }
        }

        let base = attacks.len();
        attacks.resize(base + size, Bitboard::EMPTY);
        let shift = 64 - bits;

        // `used[i] == attempt` marks slot i as written during the current candidate.
        'search: loop {
            let magic = rng.sparse();
            if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
                continue;
            }
            attempt += 1;
            for (&occ, &att) in occupancies.iter().zip(&reference) {
                let idx = (occ.wrapping_mul(magic) >> shift) as usize;
                if used[idx] != attempt {
                    used[idx] = attempt;
                    attacks[base + idx] = Bitboard::new(att);
                } else if attacks[base + idx].bits() != att {
                    continue 'search;
                }
            }
            *entry = MagicEntry { mask, magic, shift, offset: base };
            break;
        }
    }

    tracing::trace!(dirs = ?dirs[0], slots = attacks.len(), "magic table built");
    SliderTable { entries, attacks }
}

static ROOK: OnceLock<SliderTable> = OnceLock::new();
static BISHOP: OnceLock<SliderTable> = OnceLock::new();

#[inline]
pub(crate) fn rook_lookup(sq: usize, occupied: Bitboard) -> Bitboard {
    let table = ROOK.get_or_init(|| build(&ROOK_DIRS, 0x0A5F_1A2B_3C4D_5E6F));
    table.attacks[table.entries[sq].index(occupied.bits())]
}

#[inline]
pub(crate) fn bishop_lookup(sq: usize, occupied: Bitboard) -> Bitboard {
    let table = BISHOP.get_or_init(|| build(&BISHOP_DIRS, 0x1F2E_3D4C_5B6A_7988));
    table.attacks[table.entries[sq].index(occupied.bits())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevant_mask_sizes() {
        assert_eq!(relevant_mask(0, &ROOK_DIRS).count_ones(), 12);
        assert_eq!(relevant_mask(27, &ROOK_DIRS).count_ones(), 10);
        assert_eq!(relevant_mask(0, &BISHOP_DIRS).count_ones(), 6);
        assert_eq!(relevant_mask(27, &BISHOP_DIRS).count_ones(), 9);
    }

    #[test]
    fn table_sizes_match_masks() {
        let _ = rook_lookup(0, Bitboard::EMPTY);
        let _ = bishop_lookup(0, Bitboard::EMPTY);
        let rook_slots: usize = (0..64).map(|sq| 1usize << relevant_mask(sq, &ROOK_DIRS).count_ones()).sum();
        let bishop_slots: usize =
            (0..64).map(|sq| 1usize << relevant_mask(sq, &BISHOP_DIRS).count_ones()).sum();
        assert_eq!(ROOK.get().map(|t| t.attacks.len()), Some(rook_slots));
        assert_eq!(BISHOP.get().map(|t| t.attacks.len()), Some(bishop_slots));
        assert_eq!(rook_slots, 102_400);
        assert_eq!(bishop_slots, 5_248);
    }
}
