//! Static evaluation.
//!
//! The search kernel only needs a single entry point, [`evaluate`], that
//! scores a position from the perspective of the side to move. This is
//! deliberately a plain material-plus-piece-square-table evaluation with no
//! tapering, passed pawns, king safety or mobility terms: the search kernel
//! treats it as a pluggable collaborator and doesn't care how good it is,
//! only that it's fast, symmetric, and bounded well inside
//! [`crate::score::SCORE_MATE_BOUND`].

use crate::position::Position;
use crate::score::Score;
use chess::piece::{Color, Piece, PieceType};
use chess::square::Square;

const PIECE_VALUES: [Score; PieceType::COUNT] = [100, 320, 330, 500, 900, 0];

#[rustfmt::skip]
const PAWN_PSQT: [Score; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10,-20,-20, 10, 10,  5,
     5, -5,-10,  0,  0,-10, -5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5,  5, 10, 25, 25, 10,  5,  5,
    10, 10, 20, 30, 30, 20, 10, 10,
    50, 50, 50, 50, 50, 50, 50, 50,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PSQT: [Score; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PSQT: [Score; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PSQT: [Score; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     5, 10, 10, 10, 10, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PSQT: [Score; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -10,  5,  5,  5,  5,  5,  0,-10,
      0,  0,  5,  5,  5,  5,  0, -5,
     -5,  0,  5,  5,  5,  5,  0, -5,
    -10,  0,  5,  5,  5,  5,  0,-10,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_PSQT: [Score; 64] = [
     20, 30, 10,  0,  0, 10, 30, 20,
     20, 20,  0,  0,  0,  0, 20, 20,
    -10,-20,-20,-20,-20,-20,-20,-10,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
];

const PSQT: [[Score; 64]; PieceType::COUNT] = [
    PAWN_PSQT,
    KNIGHT_PSQT,
    BISHOP_PSQT,
    ROOK_PSQT,
    QUEEN_PSQT,
    KING_PSQT,
];

fn material(piece: Piece) -> Score {
    PIECE_VALUES[piece.piece_type()]
}

/// The tables are stored from White's perspective; Black's pieces read the
/// vertically-mirrored square.
fn psqt(piece: Piece, sq: Square) -> Score {
    let sq = if piece.color().is_white() { sq } else { sq.flip() };
    PSQT[piece.piece_type()][sq]
}

/// Score a position from the perspective of the side to move, as negamax
/// requires: symmetric under `evaluate(pos) == -evaluate(mirrored pos)`.
pub fn evaluate(pos: &Position) -> Score {
    let board = &pos.board;
    let mut score = 0;

    for (idx, piece) in board.piece_list.iter().enumerate() {
        let Some(piece) = piece else { continue };
        let sq = Square::from(idx);
        let term = material(*piece) + psqt(*piece, sq);

        score += if piece.color() == Color::White { term } else { -term };
    }

    if pos.side_to_move().is_white() {
        score
    } else {
        -score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::board::Board;

    #[test]
    fn starting_position_is_balanced() {
        let pos = Position::new(Board::default());
        assert_eq!(evaluate(&pos), 0);
    }

    #[test]
    fn being_up_material_is_favorable() {
        let board: Board = "4k3/8/8/8/8/8/8/RN2K3 w - - 0 1".parse().unwrap();
        let pos = Position::new(board);
        assert!(evaluate(&pos) > 0);
    }

    #[test]
    fn evaluation_is_symmetric_under_color_flip() {
        let white: Board = "4k3/8/8/8/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        let black: Board = "4k3/8/8/4p3/8/8/8/4K3 b - - 0 1".parse().unwrap();

        let white_pos = Position::new(white);
        let black_pos = Position::new(black);

        assert_eq!(evaluate(&white_pos), evaluate(&black_pos));
    }
}
