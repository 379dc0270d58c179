use crate::bitboard::Bitboard;

pub const LIGHT_SQUARES: Bitboard = Bitboard(6172840429334713770);
pub const DARK_SQUARES: Bitboard = Bitboard(12273903644374837845);

/// Bitboard masks for each of the 8 files (columns), indexed a..h.
pub const FILES: [Bitboard; 8] = gen_files();

/// Bitboard masks for each of the 8 ranks (rows), indexed 1..8.
pub const RANKS: [Bitboard; 8] = gen_ranks();

const fn gen_files() -> [Bitboard; 8] {
    let mut files = [Bitboard(0); 8];
    let mut file = 0;

    while file < 8 {
        let mut bb: u64 = 0;
        let mut rank = 0;

        while rank < 8 {
            bb |= 1 << (file + 8 * rank);
            rank += 1;
        }

        files[file] = Bitboard(bb);
        file += 1;
    }

    files
}

const fn gen_ranks() -> [Bitboard; 8] {
    let mut ranks = [Bitboard(0); 8];
    let mut rank = 0;

    while rank < 8 {
        ranks[rank] = Bitboard(0xFFu64 << (8 * rank));
        rank += 1;
    }

    ranks
}
