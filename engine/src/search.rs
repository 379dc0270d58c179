//! The search kernel: alpha-beta negamax with a principal-variation search
//! scheme, a quiescence extension at the search horizon, and an iterative
//! deepening driver on top.
//!
//! Nothing in this module talks to a thread, a clock outside its own
//! `Instant`, or the outside world directly — [`crate::engine`] owns the
//! worker thread and the event sink; this module just runs one search to
//! completion (or abort) and hands back reports as it finishes each depth.

use crate::history::History;
use crate::move_picker::{MovePicker, PickerMode};
use crate::position::Position;
use crate::pv::PVTable;
use crate::score::{
    Bound, NodeType, Score, MAX_PLY, SCORE_DRAW, SCORE_INFINITE, SCORE_MATE, SCORE_NONE,
};
use crate::transpositions::TTable;
use chess::movegen::moves::Move;
use chess::piece::Color;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

////////////////////////////////////////////////////////////////////////////
//
// Search limits
//
////////////////////////////////////////////////////////////////////////////

/// External constraints on a single search. Every field is optional/zero by
/// default, so `SearchLimits::default()` means "search forever until told
/// to stop".
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    /// Remaining clock time per side, in milliseconds.
    pub time_left: [u64; Color::COUNT],

    /// Per-move increment per side, in milliseconds.
    pub increment: [u64; Color::COUNT],

    /// Moves left until the next time control, if the clock uses one.
    pub moves_to_go: Option<u32>,

    pub max_depth: Option<usize>,
    pub max_nodes: Option<u64>,

    /// Restrict the root move loop to this list, if set (`go searchmoves`).
    pub search_moves: Option<Vec<Move>>,

    /// No time budget at all: only `max_depth`/`max_nodes`/an explicit
    /// `stop()` end the search.
    pub infinite: bool,
}

impl SearchLimits {
    /// `initAllocatedTime`: split the remaining clock budget assuming
    /// `movesToGo` moves left, or 40 if the time control doesn't specify.
    fn allocated_time(&self, side: Color) -> Duration {
        if self.infinite {
            return Duration::from_secs(u64::MAX / 2000);
        }

        let time_left = self.time_left[side as usize];
        let increment = self.increment[side as usize];

        if time_left == 0 && increment == 0 {
            return Duration::from_secs(u64::MAX / 2000);
        }

        let moves = self.moves_to_go.filter(|&n| n > 0).unwrap_or(40) as u64;
        let millis = time_left / moves + increment;

        Duration::from_millis(millis)
    }
}

////////////////////////////////////////////////////////////////////////////
//
// Search reports
//
////////////////////////////////////////////////////////////////////////////

/// A snapshot of search progress, emitted once per completed depth (and
/// once more, finalized, when the search ends).
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub depth: usize,
    pub seldepth: usize,
    pub nodes: u64,
    pub duration: Duration,
    pub score: Score,
    pub pv: Vec<Move>,
    pub hashfull: u32,
}

////////////////////////////////////////////////////////////////////////////
//
// Search data
//
////////////////////////////////////////////////////////////////////////////

/// All the mutable state belonging to a single search invocation: the
/// position being searched, the tables it reads and writes, and the
/// bookkeeping needed to know when to stop.
pub struct SearchData<'a> {
    position: Position,
    limits: SearchLimits,
    tt: &'a mut TTable,
    history: History,
    nodes: u64,
    seldepth: usize,
    start: Instant,
    allocated: Duration,
    aborted: Arc<AtomicBool>,
}

impl<'a> SearchData<'a> {
    pub fn new(position: Position, limits: SearchLimits, tt: &'a mut TTable, aborted: Arc<AtomicBool>) -> Self {
        let side = position.side_to_move();
        let allocated = limits.allocated_time(side);

        Self {
            position,
            limits,
            tt,
            history: History::new(),
            nodes: 0,
            seldepth: 0,
            start: Instant::now(),
            allocated,
            aborted,
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// `shouldStop`: has the search run out of its time, node, or external
    /// stop budget?
    fn should_stop(&self) -> bool {
        if self.aborted.load(Ordering::Relaxed) {
            return true;
        }

        if let Some(max_nodes) = self.limits.max_nodes {
            if self.nodes >= max_nodes {
                return true;
            }
        }

        if !self.limits.infinite && self.start.elapsed() >= self.allocated {
            return true;
        }

        false
    }

    /// Run iterative deepening until a stopping condition is hit, calling
    /// `on_progress` once per depth that completed without being aborted.
    /// Depth 1 is always reported in full, even if the clock expired
    /// partway through it, so the engine always has *some* move to play.
    pub fn run(&mut self, mut on_progress: impl FnMut(&SearchReport)) -> SearchReport {
        let max_depth = self.limits.max_depth.unwrap_or(MAX_PLY).min(MAX_PLY);
        let mut report = SearchReport::default();
        let mut pv = PVTable::new();
        let mut depth = 1;

        while depth <= max_depth {
            pv.clear();
            self.seldepth = depth;

            let score = self.pv_search(0, depth as i32, -SCORE_INFINITE, SCORE_INFINITE, &mut pv, NodeType::Root);

            if self.should_stop() && depth > 1 {
                break;
            }

            report = SearchReport {
                depth,
                seldepth: self.seldepth,
                nodes: self.nodes,
                duration: self.start.elapsed(),
                score,
                pv: pv.moves().to_vec(),
                hashfull: (1000.0 * self.tt.occupancy()) as u32,
            };

            on_progress(&report);

            if self.should_stop() {
                break;
            }

            depth += 1;
        }

        report
    }

    ////////////////////////////////////////////////////////////////////////
    //
    // pvSearch
    //
    ////////////////////////////////////////////////////////////////////////

    fn pv_search(
        &mut self,
        ply: usize,
        depth: i32,
        mut alpha: Score,
        beta: Score,
        pv: &mut PVTable,
        node_type: NodeType,
    ) -> Score {
        if depth <= 0 {
            return self.q_search(ply, alpha, beta, pv);
        }

        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        pv.clear();

        if !node_type.is_root() {
            if self.should_stop() {
                // Sentinel equal to `best_score`'s initial value in the
                // caller's move loop, so it can never look like an
                // improvement and get adopted as the real result of an
                // aborted subtree.
                return -SCORE_INFINITE;
            }

            if self.position.is_draw() {
                return SCORE_DRAW;
            }
        }

        if ply >= MAX_PLY {
            return crate::evaluate::evaluate(&self.position);
        }

        let hash = self.position.hash;
        let tt_entry = self.tt.probe(hash);

        if !node_type.is_pv() {
            if let Some(entry) = tt_entry {
                if let Some(score) = entry.try_score(depth as usize, alpha, beta, ply) {
                    return score;
                }
            }
        }

        let tt_move = tt_entry.and_then(|e| e.best_move());
        let alpha_orig = alpha;

        let mut picker = MovePicker::new(&self.position, tt_move, PickerMode::Main);
        let side = self.position.side_to_move();

        let mut nb_moves = 0;
        let mut best_score = -SCORE_INFINITE;
        let mut best_move = None;
        let mut quiets_tried: Vec<Move> = Vec::new();
        let mut child_pv = PVTable::new();

        while let Some(mv) = picker.next(&self.position, side, &self.history, ply) {
            if node_type.is_root() {
                if let Some(search_moves) = &self.limits.search_moves {
                    if !search_moves.contains(&mv) {
                        continue;
                    }
                }
            }

            nb_moves += 1;
            let is_quiet = !mv.is_capture() && !mv.is_promotion();

            let parent = std::mem::replace(&mut self.position, self.position.play_move(mv));
            child_pv.clear();

            let score = if nb_moves == 1 {
                -self.pv_search(ply + 1, depth - 1, -beta, -alpha, &mut child_pv, NodeType::Pv)
            } else {
                let scout = -self.pv_search(ply + 1, depth - 1, -alpha - 1, -alpha, &mut child_pv, NodeType::NonPv);

                if scout > alpha && scout < beta && node_type.is_pv() {
                    child_pv.clear();
                    -self.pv_search(ply + 1, depth - 1, -beta, -alpha, &mut child_pv, NodeType::Pv)
                } else {
                    scout
                }
            };

            self.position = parent;

            // A child that hit the abort/time/node limit returns
            // `-SCORE_INFINITE` from its own perspective, which negates to
            // `+SCORE_INFINITE` here — large enough to look like the best
            // move found so far. Bail out before that can be adopted: an
            // aborted subtree's score must never reach `best_move`/the PV.
            //
            // Root is the one exception: it always finishes its first move,
            // abort or not, so that depth 1 is guaranteed to leave a legal
            // move to play even if `stop()` landed before the root's own
            // search could make any other progress.
            let must_finish_this_move = node_type.is_root() && nb_moves == 1;
            if self.should_stop() && !must_finish_this_move {
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);

                if score > alpha {
                    alpha = score;
                    pv.add_to_front(mv, &child_pv);

                    if score >= beta {
                        if is_quiet {
                            self.history.record_cutoff(side, ply, mv, &quiets_tried, depth as usize);
                        }
                        break;
                    }
                }
            }

            if is_quiet {
                quiets_tried.push(mv);
            }
        }

        if nb_moves == 0 {
            return if self.position.in_check() {
                -SCORE_MATE + ply as Score
            } else {
                SCORE_DRAW
            };
        }

        if !self.should_stop() {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if !node_type.is_pv() || best_score <= alpha_orig {
                Bound::Upper
            } else {
                Bound::Exact
            };

            self.tt.insert(crate::transpositions::TTEntry::new(
                hash,
                best_move.unwrap_or(Move::NULL),
                best_score,
                SCORE_NONE,
                depth as usize,
                bound,
                ply,
                self.tt.age(),
            ));
        }

        best_score
    }

    ////////////////////////////////////////////////////////////////////////
    //
    // qSearch
    //
    ////////////////////////////////////////////////////////////////////////

    fn q_search(&mut self, ply: usize, mut alpha: Score, beta: Score, pv: &mut PVTable) -> Score {
        pv.clear();
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        if self.should_stop() {
            // Always below any real qsearch best_score (standing pat or
            // the mate-distance default), so it's never adopted by a
            // caller's `score > best_score` check.
            return -SCORE_INFINITE;
        }

        let alpha_orig = alpha;
        let mut best_score = -SCORE_MATE + ply as Score;

        if self.position.is_draw() {
            return SCORE_DRAW;
        }

        if ply >= MAX_PLY {
            return crate::evaluate::evaluate(&self.position);
        }

        let in_check = self.position.in_check();
        let mut static_eval = SCORE_NONE;

        if !in_check {
            let eval = crate::evaluate::evaluate(&self.position);
            static_eval = eval;
            best_score = eval;

            if eval >= beta {
                return eval;
            }

            if eval > alpha {
                alpha = eval;
            }
        }

        let hash = self.position.hash;
        let tt_move = self.tt.probe(hash).and_then(|e| e.best_move());

        let mut picker = MovePicker::new(&self.position, tt_move, PickerMode::Quiescence);
        let side = self.position.side_to_move();
        let mut child_pv = PVTable::new();

        while let Some(mv) = picker.next(&self.position, side, &self.history, ply) {
            let parent = std::mem::replace(&mut self.position, self.position.play_move(mv));
            child_pv.clear();

            let score = -self.q_search(ply + 1, -beta, -alpha, &mut child_pv);

            self.position = parent;

            // Same reasoning as `pv_search`'s move loop: a child that hit
            // the abort/limit check returns `-SCORE_INFINITE`, which
            // negates into a bogus `+SCORE_INFINITE` here. qsearch has no
            // root node to special-case, so the check is unconditional.
            if self.should_stop() {
                break;
            }

            if score > best_score {
                best_score = score;

                if score > alpha {
                    alpha = score;
                    pv.add_to_front(mv, &child_pv);

                    if score >= beta {
                        break;
                    }
                }
            }
        }

        if !self.should_stop() {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if best_score <= alpha_orig {
                Bound::Upper
            } else {
                Bound::Exact
            };

            self.tt.insert(crate::transpositions::TTEntry::new(
                hash,
                Move::NULL,
                best_score,
                static_eval,
                if in_check { 1 } else { 0 },
                bound,
                ply,
                self.tt.age(),
            ));
        }

        best_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::board::Board;

    fn search(fen: &str, max_depth: usize) -> (SearchReport, Arc<AtomicBool>) {
        let board: Board = fen.parse().unwrap();
        let position = Position::new(board);
        let limits = SearchLimits {
            max_depth: Some(max_depth),
            ..Default::default()
        };
        let aborted = Arc::new(AtomicBool::new(false));
        let mut tt = TTable::with_capacity(1);
        let mut data = SearchData::new(position, limits, &mut tt, aborted.clone());

        let report = data.run(|_| {});
        (report, aborted)
    }

    #[test]
    fn finds_mate_in_one() {
        let (report, _) = search("4k3/8/8/8/8/8/4Q3/4K3 w - - 0 1", 2);
        assert_eq!(report.score, SCORE_MATE - 1);
        assert!(!report.pv.is_empty());
        assert!(report.depth >= 2);
    }

    #[test]
    fn recognizes_stalemate() {
        let (report, _) = search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 2);
        assert_eq!(report.score, SCORE_DRAW);
        assert!(report.pv.is_empty());
    }

    #[test]
    fn recognizes_being_mated() {
        let (report, _) = search("R6k/6pp/8/8/8/8/8/6K1 b - - 0 1", 1);
        assert_eq!(report.score, -SCORE_MATE);
    }

    #[test]
    fn respects_an_external_stop_request() {
        let board: Board = Board::default();
        let position = Position::new(board);
        let limits = SearchLimits {
            max_depth: Some(64),
            infinite: true,
            ..Default::default()
        };
        let aborted = Arc::new(AtomicBool::new(false));
        let mut tt = TTable::with_capacity(1);
        let mut data = SearchData::new(position, limits, &mut tt, aborted.clone());

        aborted.store(true, Ordering::Relaxed);
        let report = data.run(|_| {});

        // Depth 1 always completes even when aborted before it starts, so
        // there's always a move to play.
        assert!(report.depth >= 1);
    }

    #[test]
    fn node_limit_bounds_search() {
        let board: Board = Board::default();
        let position = Position::new(board);
        let limits = SearchLimits {
            max_depth: Some(64),
            max_nodes: Some(1000),
            ..Default::default()
        };
        let aborted = Arc::new(AtomicBool::new(false));
        let mut tt = TTable::with_capacity(1);
        let mut data = SearchData::new(position, limits, &mut tt, aborted);

        let report = data.run(|_| {});
        assert!(report.nodes <= 2000);
        assert!(report.depth >= 1);
    }
}
