//! Lazily-sorted move ordering.
//!
//! Move generation always happens eagerly (the underlying board always
//! returns a full `Vec<Move>`), but *sorting* doesn't: `next()` only
//! selects the single best remaining move from whichever stage is active,
//! using a partial selection sort, instead of sorting the whole list up
//! front. Most of the value of good move ordering comes from the first
//! few moves, so a full sort is often wasted work, especially when a
//! cutoff ends the loop early.

use crate::history::History;
use crate::position::Position;
use chess::movegen::moves::Move;
use chess::piece::{Color, PieceType};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Stage {
    TTMove,
    GenerateRest,
    Tacticals,
    Quiets,
    Done,
}

/// Which move set a picker should walk: every legal move, or only the
/// tactical subset (quiescence search).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PickerMode {
    Main,
    Quiescence,
}

pub struct MovePicker {
    stage: Stage,
    mode: PickerMode,
    in_check: bool,
    tt_move: Option<Move>,
    tacticals: Vec<(Move, i32)>,
    quiets: Vec<(Move, i32)>,
    tactical_index: usize,
    quiet_index: usize,
}

/// Piece values used purely for MVV-LVA ordering; unrelated to
/// [`crate::evaluate`]'s positional evaluation scale.
fn piece_value(ptype: PieceType) -> i32 {
    match ptype {
        PieceType::Pawn => 100,
        PieceType::Knight => 300,
        PieceType::Bishop => 300,
        PieceType::Rook => 500,
        PieceType::Queen => 900,
        PieceType::King => 0,
    }
}

impl MovePicker {
    pub fn new(position: &Position, tt_move: Option<Move>, mode: PickerMode) -> Self {
        let in_check = position.in_check();

        // A TT move from a shallower or colliding entry might not be legal
        // here; only trust it after checking it against the actual legal
        // move list. In quiescence, not in check, the move set is
        // non-quiet only, so a quiet TT hint must be rejected too.
        let tt_move = tt_move.filter(|mv| position.board.legal_moves::<true>().contains(mv));
        let tt_move = tt_move.filter(|mv| {
            mode == PickerMode::Main || in_check || mv.is_capture() || mv.is_promotion()
        });

        MovePicker {
            stage: Stage::TTMove,
            mode,
            in_check,
            tt_move,
            tacticals: Vec::new(),
            quiets: Vec::new(),
            tactical_index: 0,
            quiet_index: 0,
        }
    }

    fn generate(&mut self, position: &Position) {
        let moves = if self.mode == PickerMode::Main || self.in_check {
            position.board.legal_moves::<true>()
        } else {
            position.board.legal_moves::<false>()
        };

        for mv in moves {
            if Some(mv) == self.tt_move {
                continue;
            }

            if mv.is_capture() || mv.is_promotion() {
                let victim_value = position
                    .board
                    .get_at(mv.tgt())
                    .map(|p| piece_value(p.piece_type()))
                    .unwrap_or(0);

                let attacker_value = position
                    .board
                    .get_at(mv.src())
                    .map(|p| piece_value(p.piece_type()))
                    .unwrap_or(0);

                // MVV-LVA: sort by victim value first, breaking ties by
                // preferring the cheapest attacker.
                let score = 32 * victim_value - attacker_value;
                self.tacticals.push((mv, score));
            } else {
                self.quiets.push((mv, 0));
            }
        }
    }

    fn score_quiets(&mut self, side: Color, history: &History, ply: usize) {
        let killers = history.killers(ply);

        for (mv, score) in self.quiets.iter_mut() {
            *score = history.score(side, *mv) + 1000 * killers.bonus(*mv);
        }
    }

    /// Select the best-scoring move starting from `from` in `moves` and
    /// swap it to the front of the unsearched range.
    fn partial_sort(moves: &mut [(Move, i32)], from: usize) -> Option<Move> {
        if from >= moves.len() {
            return None;
        }

        let mut best = from;

        for i in (from + 1)..moves.len() {
            if moves[i].1 > moves[best].1 {
                best = i;
            }
        }

        moves.swap(from, best);
        Some(moves[from].0)
    }

    /// Return the next move to try, scoring quiets against `side`'s history
    /// and killer tables at `ply`.
    pub fn next(&mut self, position: &Position, side: Color, history: &History, ply: usize) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TTMove => {
                    self.stage = Stage::GenerateRest;

                    if let Some(mv) = self.tt_move {
                        return Some(mv);
                    }
                }

                Stage::GenerateRest => {
                    self.generate(position);
                    self.score_quiets(side, history, ply);
                    self.stage = Stage::Tacticals;
                }

                Stage::Tacticals => {
                    match Self::partial_sort(&mut self.tacticals, self.tactical_index) {
                        Some(mv) => {
                            self.tactical_index += 1;
                            return Some(mv);
                        }
                        None => {
                            self.stage = if self.mode == PickerMode::Quiescence && !self.in_check {
                                Stage::Done
                            } else {
                                Stage::Quiets
                            };
                        }
                    }
                }

                Stage::Quiets => {
                    match Self::partial_sort(&mut self.quiets, self.quiet_index) {
                        Some(mv) => {
                            self.quiet_index += 1;
                            return Some(mv);
                        }
                        None => self.stage = Stage::Done,
                    }
                }

                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::board::Board;

    fn drain(mut picker: MovePicker, pos: &Position, history: &History) -> Vec<Move> {
        let mut out = Vec::new();
        while let Some(mv) = picker.next(pos, pos.side_to_move(), history, 0) {
            out.push(mv);
        }
        out
    }

    #[test]
    fn yields_every_legal_move_exactly_once_in_main_mode() {
        let pos = Position::new(Board::default());
        let history = History::new();
        let picker = MovePicker::new(&pos, None, PickerMode::Main);

        let mut got = drain(picker, &pos, &history);
        got.sort();

        let mut expected = pos.board.legal_moves::<true>();
        expected.sort();

        assert_eq!(got, expected);
    }

    #[test]
    fn tt_move_comes_first() {
        let pos = Position::new(Board::default());
        let history = History::new();
        let legal = pos.board.legal_moves::<true>();
        let tt_move = legal[3];

        let mut picker = MovePicker::new(&pos, Some(tt_move), PickerMode::Main);
        let first = picker.next(&pos, pos.side_to_move(), &history, 0);

        assert_eq!(first, Some(tt_move));
    }

    #[test]
    fn quiescence_mode_restricts_to_tacticals_when_not_in_check() {
        let board: Board = "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        let pos = Position::new(board);
        let history = History::new();
        let picker = MovePicker::new(&pos, None, PickerMode::Quiescence);

        let got = drain(picker, &pos, &history);
        assert!(got.iter().all(|mv| mv.is_capture() || mv.is_promotion()));
        assert!(!got.is_empty());
    }
}
