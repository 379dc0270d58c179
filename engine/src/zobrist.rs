//! Zobrist hashing.
//!
//! Every square/piece combination, castling right, en-passant file and the
//! side to move gets an independent pseudo-random 64-bit key; a position's
//! hash is the XOR of the keys for everything that's "on" in it. XOR makes
//! toggling a piece on or off its own inverse, which is what gives Zobrist
//! hashing its incremental-update property.
//!
//! The key tables below are generated at compile time by a splitmix64
//! stream seeded with a fixed constant, the same trick `lookups.rs` and
//! `constants.rs` use for their attack tables: no external RNG crate, no
//! codegen step, and the numbers are reproducible across builds.

use chess::board::Board;
use chess::movegen::castling::CastleType;
use chess::piece::{Color, Piece, PieceType};
use chess::square::Square;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub struct ZHash(pub u64);

impl ZHash {
    pub const NULL: ZHash = ZHash(0);

    /// Compute the hash for a board from scratch.
    ///
    /// `Board::play_move` already rebuilds the whole board on every move
    /// (copy-make, not make/unmake), so recomputing the hash in full here
    /// keeps `Position` consistent with that style rather than threading
    /// incremental XOR updates through every move type.
    pub fn compute(board: &Board) -> ZHash {
        let mut hash = 0u64;

        for (idx, piece) in board.piece_list.iter().enumerate() {
            if let Some(piece) = piece {
                hash ^= piece_key(Square::from(idx), *piece);
            }
        }

        for ctype in CastleType::ALL {
            if board.castling_rights.is_available(ctype) {
                hash ^= castling_key(ctype);
            }
        }

        if let Some(ep_sq) = board.en_passant {
            hash ^= ep_key(ep_sq);
        }

        if board.current.is_black() {
            hash ^= SIDE_KEY;
        }

        ZHash(hash)
    }
}

fn piece_key(sq: Square, piece: Piece) -> u64 {
    PIECE_KEYS[piece.color() as usize][piece.piece_type() as usize][sq as usize]
}

fn castling_key(ctype: CastleType) -> u64 {
    CASTLING_KEYS[ctype as usize]
}

fn ep_key(sq: Square) -> u64 {
    EP_KEYS[sq.file()]
}

////////////////////////////////////////////////////////////////////////////
//
// Key tables
//
////////////////////////////////////////////////////////////////////////////

/// A splitmix64 step: cheap, decent statistical quality, and usable in a
/// const fn (no floating point, no external entropy source).
const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^= z >> 31;
    (state, z)
}

const SEED: u64 = 0x5A17_B0A7_D0CE_5EED;

const fn gen_piece_keys() -> [[[u64; 64]; PieceType::COUNT]; Color::COUNT] {
    let mut keys = [[[0u64; 64]; PieceType::COUNT]; Color::COUNT];
    let mut state = SEED;
    let mut color = 0;

    while color < Color::COUNT {
        let mut ptype = 0;

        while ptype < PieceType::COUNT {
            let mut sq = 0;

            while sq < 64 {
                let (next_state, value) = splitmix64(state);
                state = next_state;
                keys[color][ptype][sq] = value;
                sq += 1;
            }

            ptype += 1;
        }

        color += 1;
    }

    keys
}

const fn gen_keys<const N: usize>(seed: u64) -> [u64; N] {
    let mut keys = [0u64; N];
    let mut state = seed;
    let mut i = 0;

    while i < N {
        let (next_state, value) = splitmix64(state);
        state = next_state;
        keys[i] = value;
        i += 1;
    }

    keys
}

const PIECE_KEYS: [[[u64; 64]; PieceType::COUNT]; Color::COUNT] = gen_piece_keys();
const CASTLING_KEYS: [u64; 4] = gen_keys(SEED ^ 0x1111_1111_1111_1111);
const EP_KEYS: [u64; 8] = gen_keys(SEED ^ 0x2222_2222_2222_2222);
const SIDE_KEY: u64 = gen_keys::<1>(SEED ^ 0x3333_3333_3333_3333)[0];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn hash_is_deterministic_for_same_position() {
        let board = Board::default();
        let a = ZHash::compute(&board);
        let b = ZHash::compute(&board);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_changes_with_side_to_move() {
        let white: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let black: Board = "4k3/8/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        assert_ne!(ZHash::compute(&white), ZHash::compute(&black));
    }

    #[test]
    fn hash_changes_when_a_piece_moves() {
        let board = Board::default();
        let mv = board.find_move(chess::movegen::moves::BareMove::from_str("e2e4").unwrap()).unwrap();
        let after = board.play_move(mv);

        assert_ne!(ZHash::compute(&board), ZHash::compute(&after));
    }

    #[test]
    fn distinct_squares_get_distinct_keys() {
        assert_ne!(
            piece_key(Square::A1, Piece::WP),
            piece_key(Square::A2, Piece::WP)
        );
    }
}
