//! `Position` wraps a [`Board`] with the extra state the search kernel
//! needs but the board representation itself doesn't track: an incremental
//! Zobrist hash and the history of hashes seen so far in the game, used for
//! repetition detection.

use crate::zobrist::ZHash;
use chess::board::Board;
use chess::movegen::moves::Move;
use chess::piece::Color;

#[derive(Debug, Clone)]
pub struct Position {
    pub board: Board,
    pub hash: ZHash,
    history: Vec<ZHash>,
}

impl Position {
    pub fn new(board: Board) -> Self {
        let hash = ZHash::compute(&board);

        Self {
            board,
            hash,
            history: vec![hash],
        }
    }

    /// Play a move and return the resulting position. The receiver is left
    /// untouched: every node owns its own copy, so there is no explicit
    /// "unmake" step, only letting the copy go out of scope.
    pub fn play_move(&self, mv: Move) -> Self {
        let board = self.board.play_move(mv);
        let hash = ZHash::compute(&board);
        let mut history = self.history.clone();
        history.push(hash);

        Self {
            board,
            hash,
            history,
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.board.current
    }

    pub fn in_check(&self) -> bool {
        self.board.in_check()
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.board.half_moves >= 100
    }

    pub fn is_material_draw(&self) -> bool {
        self.board.insufficient_material()
    }

    /// A position is an (in-search) repetition draw if the same hash was
    /// already reached earlier in this line, within the span of moves that
    /// haven't been made irreversible by a pawn move or a capture (the
    /// half-move clock window). A single earlier occurrence is enough: a
    /// two-fold repetition inside the search tree is treated the same as a
    /// three-fold one on the board, so the engine won't walk into a draw it
    /// could have avoided just because the arbiter hasn't called it yet.
    pub fn is_repetition_draw(&self) -> bool {
        let irreversible_window = self.board.half_moves as usize;
        let len = self.history.len();

        if len <= 1 {
            return false;
        }

        let start = len.saturating_sub(irreversible_window + 1);

        self.history[start..len - 1]
            .iter()
            .any(|&h| h == self.hash)
    }

    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_draw() || self.is_material_draw() || self.is_repetition_draw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::movegen::moves::BareMove;
    use std::str::FromStr;

    #[test]
    fn hash_is_preserved_across_a_search_style_round_trip() {
        let pos = Position::new(Board::default());
        let before = pos.hash;

        let mv = pos.board.find_move(BareMove::from_str("e2e4").unwrap()).unwrap();
        let child = pos.play_move(mv);
        assert_ne!(child.hash, before);

        // The parent is untouched: replaying from `pos` still starts from
        // the original hash.
        assert_eq!(pos.hash, before);
    }

    #[test]
    fn repeating_a_position_twice_is_detected() {
        let mut pos = Position::new(Board::default());
        let moves = ["g1f3", "g8f6", "f3g1", "f6g8"];

        for mv in moves {
            let mv = pos.board.find_move(BareMove::from_str(mv).unwrap()).unwrap();
            pos = pos.play_move(mv);
        }

        assert!(pos.is_repetition_draw());
    }

    #[test]
    fn fresh_position_is_not_a_draw() {
        let pos = Position::new(Board::default());
        assert!(!pos.is_draw());
    }
}
