use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::ChessError;
use crate::evaluation::{Evaluation, Score};
use crate::move_generator::{generate, legal_moves, GenType};
use crate::move_ordering::{score_move, HistoryTable, KillerTable, MAX_PLY};
use crate::movelist::MoveList;
use crate::position::Position;
use crate::r#move::Move;
use crate::rules::is_insufficient_material;
use crate::transposition_table::{SearchInfo, TranspositionTable, DEFAULT_TABLE_SIZE};

pub const MAX_DEPTH: u8 = 64;
pub const MATE_SCORE: Score = 100_000;
/// Scores at least this far from zero announce a forced mate
pub const MATE_THRESHOLD: Score = MATE_SCORE - MAX_PLY as Score;
const INFINITY: Score = MATE_SCORE + 1;

/// Bounds on a single search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: u8,
    pub max_time: Option<Duration>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            max_depth: MAX_DEPTH,
            max_time: None,
        }
    }
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        let mut limits = Self::default();
        limits.set_depth(depth);
        limits
    }

    pub fn time(millis: u64) -> Self {
        let mut limits = Self::default();
        limits.set_time(Some(Duration::from_millis(millis)));
        limits
    }

    pub fn set_depth(&mut self, depth: u8) -> &mut Self {
        self.max_depth = depth.clamp(1, MAX_DEPTH);
        self
    }

    pub fn set_time(&mut self, value: Option<Duration>) -> &mut Self {
        self.max_time = value;
        self
    }

    /// Budgets a fiftieth of the remaining clock plus half the increment
    pub fn set_time_from_clock(&mut self, clock: Duration, increment: Option<Duration>) -> &mut Self {
        self.max_time = Some(Self::get_movetime(clock, increment));
        self
    }

    fn get_movetime(clock: Duration, increment: Option<Duration>) -> Duration {
        let mut movetime = clock / 50;
        if let Some(inc) = increment {
            movetime += inc / 2;
        }
        movetime.min(clock)
    }
}

/// Outcome of a search. `best_move` is `None` when the root has no legal
/// move or when the search was cancelled before any move was scored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: Score,
    pub depth: u8,
    pub nodes: u64,
    pub principal_variation: Vec<Move>,
    pub time: Duration,
}

impl SearchResult {
    /// Moves until mate, negative when the side to move is getting mated
    pub fn mate_in(&self) -> Option<i32> {
        if self.score >= MATE_THRESHOLD {
            Some((MATE_SCORE - self.score + 1) / 2)
        } else if self.score <= -MATE_THRESHOLD {
            Some(-(MATE_SCORE + self.score) / 2)
        } else {
            None
        }
    }
}

impl Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let millis = self.time.as_millis().max(1);
        write!(
            f,
            "depth {} time {} nodes {} nps {} ",
            self.depth,
            self.time.as_millis(),
            self.nodes,
            (self.nodes as u128 * 1000) / millis
        )?;
        match self.mate_in() {
            Some(moves) => write!(f, "score mate {}", moves)?,
            None => write!(f, "score cp {}", self.score)?,
        }
        if !self.principal_variation.is_empty() {
            write!(f, " pv")?;
            for mv in &self.principal_variation {
                write!(f, " {}", mv)?;
            }
        }
        Ok(())
    }
}

/// Anything able to pick a move for a position.
/// `cancel` is polled during the search; once it returns true the search
/// unwinds and reports what it has.
pub trait SearchBackend {
    fn search(
        &mut self,
        position: &mut Position,
        limits: &SearchLimits,
        cancel: Option<&dyn Fn() -> bool>,
    ) -> Result<SearchResult, ChessError>;

    /// Forgets everything learned from previous searches
    fn new_game(&mut self) {}
}

/// Iterative-deepening negamax with quiescence, transposition table,
/// killer moves and history heuristic
pub struct Engine {
    transposition_table: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Engine {
        Self::with_table_size(DEFAULT_TABLE_SIZE)
    }

    pub fn with_table_size(entries: usize) -> Engine {
        Engine {
            transposition_table: TranspositionTable::new(entries),
            killers: KillerTable::default(),
            history: HistoryTable::default(),
        }
    }

    pub fn probe_table(&self, position: &Position) -> SearchInfo {
        self.transposition_table.get(position.hash())
    }
}

impl SearchBackend for Engine {
    fn search(
        &mut self,
        position: &mut Position,
        limits: &SearchLimits,
        cancel: Option<&dyn Fn() -> bool>,
    ) -> Result<SearchResult, ChessError> {
        let mut context = SearchContext {
            start: Instant::now(),
            max_time: limits.max_time,
            cancel,
            nodes: 0,
            aborted: false,
            transposition_table: &mut self.transposition_table,
            killers: &mut self.killers,
            history: &mut self.history,
        };

        if context.should_stop() {
            debug!("search cancelled before it started");
            return Ok(SearchResult::default());
        }
        context.killers.clear();
        context.history.clear();

        let root_moves = legal_moves(position)?;
        if root_moves.is_empty() {
            let score = if position.is_in_check(position.side_to_move())? {
                -MATE_SCORE
            } else {
                Evaluation::DRAW_SCORE
            };
            return Ok(SearchResult {
                score,
                time: context.start.elapsed(),
                ..Default::default()
            });
        }

        let mut result = SearchResult::default();
        for depth in 1..=limits.max_depth.clamp(1, MAX_DEPTH) {
            let (score, best_move) = context.search_root(position, &root_moves, depth, result.best_move)?;

            if context.aborted {
                // nothing completed yet, a partially searched first iteration beats no move
                if result.best_move.is_none() && best_move.is_some() {
                    result.best_move = best_move;
                    result.score = score;
                }
                debug!(depth, nodes = context.nodes, "search stopped mid-iteration");
                break;
            }

            result.best_move = best_move;
            result.score = score;
            result.depth = depth;
            result.principal_variation.clear();
            collect_pv(
                context.transposition_table,
                position,
                &mut result.principal_variation,
                depth as usize,
            )?;
            debug!(
                depth,
                score,
                nodes = context.nodes,
                best_move = %best_move.map_or_else(|| "none".to_string(), |m| m.to_string()),
                elapsed_ms = context.start.elapsed().as_millis() as u64,
                "iteration complete"
            );

            if score.abs() >= MATE_THRESHOLD {
                break;
            }
        }

        result.nodes = context.nodes;
        result.time = context.start.elapsed();
        info!(
            depth = result.depth,
            score = result.score,
            nodes = result.nodes,
            best_move = %result.best_move.map_or_else(|| "none".to_string(), |m| m.to_string()),
            elapsed_ms = result.time.as_millis() as u64,
            "search finished"
        );
        Ok(result)
    }

    fn new_game(&mut self) {
        self.transposition_table.clear();
        self.killers.clear();
        self.history.clear();
    }
}

/// Per-search state, borrowed from the engine for the duration of one call
struct SearchContext<'a> {
    start: Instant,
    max_time: Option<Duration>,
    cancel: Option<&'a dyn Fn() -> bool>,
    nodes: u64,
    aborted: bool,
    transposition_table: &'a mut TranspositionTable,
    killers: &'a mut KillerTable,
    history: &'a mut HistoryTable,
}

impl<'a> SearchContext<'a> {
    fn should_stop(&mut self) -> bool {
        if !self.aborted {
            let cancelled = self.cancel.map_or(false, |cancel| cancel());
            let timed_out = self
                .max_time
                .map_or(false, |max_time| self.start.elapsed() >= max_time);
            self.aborted = cancelled || timed_out;
        }
        self.aborted
    }

    /// Searches every root move with a full window, the previous best move first
    fn search_root(
        &mut self,
        position: &mut Position,
        root_moves: &MoveList,
        depth: u8,
        pv_move: Option<Move>,
    ) -> Result<(Score, Option<Move>), ChessError> {
        self.nodes += 1;
        let mut alpha = -INFINITY;
        let mut best_move = None;

        let killers = self.killers.get(0);
        let history = &*self.history;
        let ordered = root_moves.best_first_iter(|m| score_move(position, *m, pv_move, killers, history));
        for mv in ordered {
            let score = {
                let mut child = position.play(mv)?;
                -self.negamax(&mut child, depth - 1, 1, -INFINITY, -alpha)?
            };
            if self.aborted {
                break;
            }
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
            }
        }

        if let (false, Some(mv)) = (self.aborted, best_move) {
            self.transposition_table.set(
                position.hash(),
                SearchInfo::Exact {
                    position_hash: position.hash(),
                    best_move: mv,
                    depth_searched: depth,
                    score: score_to_table(alpha, 0),
                },
            );
        }
        Ok((alpha, best_move))
    }

    fn negamax(
        &mut self,
        position: &mut Position,
        depth: u8,
        ply: usize,
        mut alpha: Score,
        beta: Score,
    ) -> Result<Score, ChessError> {
        if self.should_stop() {
            return Ok(alpha);
        }
        if depth == 0 || ply >= MAX_PLY - 1 {
            return self.quiescence(position, ply, alpha, beta);
        }
        self.nodes += 1;
        if position.halfmove_clock() >= 100 || is_insufficient_material(position) {
            return Ok(Evaluation::DRAW_SCORE);
        }

        let hash = position.hash();
        let entry = self.transposition_table.get(hash);
        if let Some(score) = entry
            .score()
            .map(|s| entry.with_score(score_from_table(s, ply)))
            .and_then(|e| e.cutoff_score(depth, alpha, beta))
        {
            return Ok(score);
        }

        let moves = legal_moves(position)?;
        if moves.is_empty() {
            return Ok(if position.is_in_check(position.side_to_move())? {
                -MATE_SCORE + ply as Score
            } else {
                Evaluation::DRAW_SCORE
            });
        }

        let side = position.side_to_move();
        let original_alpha = alpha;
        let tt_move = entry.hash_move();
        let killers = self.killers.get(ply);
        let history = &*self.history;
        let ordered = moves.best_first_iter(|m| score_move(position, *m, tt_move, killers, history));

        let mut best_score = -INFINITY;
        let mut best_move = None;
        for mv in ordered {
            let quiet = !position.is_noisy(mv);
            let score = {
                let mut child = position.play(mv)?;
                -self.negamax(&mut child, depth - 1, ply + 1, -beta, -alpha)?
            };
            if self.aborted {
                return Ok(if best_move.is_some() { best_score } else { alpha });
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if quiet {
                    self.killers.store(ply, mv);
                    self.history.record(side, mv, depth);
                }
                break;
            }
        }

        let stored_score = score_to_table(best_score, ply);
        let info = match best_move {
            Some(mv) if best_score >= beta => SearchInfo::Cutoff {
                position_hash: hash,
                refutation_move: mv,
                depth_searched: depth,
                lower_bound: stored_score,
            },
            Some(mv) if best_score > original_alpha => SearchInfo::Exact {
                position_hash: hash,
                best_move: mv,
                depth_searched: depth,
                score: stored_score,
            },
            _ => SearchInfo::All {
                position_hash: hash,
                best_move,
                depth_searched: depth,
                upper_bound: stored_score,
            },
        };
        self.transposition_table.set(hash, info);

        Ok(best_score)
    }

    /// Resolves captures and promotions until the position is quiet.
    /// In check every legal reply is searched instead.
    fn quiescence(&mut self, position: &mut Position, ply: usize, mut alpha: Score, beta: Score) -> Result<Score, ChessError> {
        if self.should_stop() {
            return Ok(alpha);
        }
        self.nodes += 1;
        if position.halfmove_clock() >= 100 || is_insufficient_material(position) {
            return Ok(Evaluation::DRAW_SCORE);
        }
        if ply >= MAX_PLY - 1 {
            return Ok(Evaluation::evaluate(position));
        }

        let in_check = position.is_in_check(position.side_to_move())?;
        let moves = if in_check {
            let moves = legal_moves(position)?;
            if moves.is_empty() {
                return Ok(-MATE_SCORE + ply as Score);
            }
            moves
        } else {
            let stand_pat = Evaluation::evaluate(position);
            if stand_pat >= beta {
                return Ok(stand_pat);
            }
            alpha = alpha.max(stand_pat);
            generate(position, GenType::Noisy)?
        };

        let history = &*self.history;
        let ordered = moves.best_first_iter(|m| score_move(position, *m, None, [None; 2], history));
        for mv in ordered {
            let score = {
                let mut child = position.play(mv)?;
                -self.quiescence(&mut child, ply + 1, -beta, -alpha)?
            };
            if self.aborted {
                return Ok(alpha);
            }
            if score >= beta {
                return Ok(score);
            }
            alpha = alpha.max(score);
        }

        Ok(alpha)
    }
}

/// Mate scores are stored relative to the node so they stay valid when the
/// same position shows up at another ply
fn score_to_table(score: Score, ply: usize) -> Score {
    if score >= MATE_THRESHOLD {
        score + ply as Score
    } else if score <= -MATE_THRESHOLD {
        score - ply as Score
    } else {
        score
    }
}

fn score_from_table(score: Score, ply: usize) -> Score {
    if score >= MATE_THRESHOLD {
        score - ply as Score
    } else if score <= -MATE_THRESHOLD {
        score + ply as Score
    } else {
        score
    }
}

/// Follows table moves from `position`, keeping only legal ones
fn collect_pv(
    table: &TranspositionTable,
    position: &mut Position,
    pv: &mut Vec<Move>,
    max_length: usize,
) -> Result<(), ChessError> {
    if pv.len() >= max_length {
        return Ok(());
    }
    let mv = match table.get(position.hash()).hash_move() {
        Some(mv) => mv,
        None => return Ok(()),
    };
    if !legal_moves(position)?.contains(&mv) {
        return Ok(());
    }
    pv.push(mv);
    let mut child = position.play(mv)?;
    collect_pv(table, &mut child, pv, max_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::is_checkmate;
    use std::cell::Cell;

    fn engine() -> Engine {
        Engine::with_table_size(1 << 16)
    }

    #[test]
    fn finds_a_legal_move_from_the_start() {
        let mut position = Position::initial();
        let result = engine().search(&mut position, &SearchLimits::depth(3), None).unwrap();
        let best = result.best_move.unwrap();
        assert!(legal_moves(&mut position).unwrap().contains(&best));
        assert_eq!(result.depth, 3);
        assert!(result.nodes > 0);
        assert!(result.score.abs() < 100);
        assert_eq!(result.principal_variation.first(), Some(&best));
    }

    #[test]
    fn finds_mate_in_one() {
        // Ra8 mates
        let mut position = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let result = engine().search(&mut position, &SearchLimits::depth(4), None).unwrap();
        let best = result.best_move.unwrap();
        assert_eq!(best.to_string(), "a1a8");
        assert!(result.score >= MATE_THRESHOLD);
        assert_eq!(result.mate_in(), Some(1));
        assert!(result.to_string().contains("score mate 1"));

        let mut child = position.play(best).unwrap();
        assert!(is_checkmate(&mut child).unwrap());
    }

    #[test]
    fn wins_hanging_material() {
        // the black queen on d5 is en prise to the e4 pawn
        let mut position = Position::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let result = engine().search(&mut position, &SearchLimits::depth(2), None).unwrap();
        assert_eq!(result.best_move.map(|m| m.to_string()), Some("e4d5".to_string()));
        assert!(result.score > 0);
    }

    #[test]
    fn search_leaves_the_position_untouched() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let before = position.copy();
        let fen = position.to_fen();
        let mut engine = engine();
        engine.search(&mut position, &SearchLimits::depth(3), None).unwrap();
        assert_eq!(position.to_fen(), fen);
        assert_eq!(position.hash(), before.hash());
        assert_eq!(position.history_len(), before.history_len());

        // cancelled halfway through, still untouched
        let calls = Cell::new(0);
        let cancel: &dyn Fn() -> bool = &|| {
            calls.set(calls.get() + 1);
            calls.get() > 500
        };
        engine.search(&mut position, &SearchLimits::depth(6), Some(cancel)).unwrap();
        assert_eq!(position.to_fen(), fen);
        assert_eq!(position.hash(), before.hash());
    }

    #[test]
    fn cancelled_before_starting() {
        let mut position = Position::initial();
        let cancel: &dyn Fn() -> bool = &|| true;
        let result = engine()
            .search(&mut position, &SearchLimits::depth(5), Some(cancel))
            .unwrap();
        assert_eq!(result.best_move, None);
        assert_eq!(result.depth, 0);
        assert_eq!(result.nodes, 0);
        assert_eq!(position.to_fen(), Position::initial().to_fen());
    }

    #[test]
    fn no_move_at_the_root() {
        // fool's mate, white is checkmated
        let mut mated = Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        let result = engine().search(&mut mated, &SearchLimits::depth(3), None).unwrap();
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, -MATE_SCORE);

        let mut stalemate = Position::from_fen("k7/P7/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
        let result = engine().search(&mut stalemate, &SearchLimits::depth(3), None).unwrap();
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn clock_and_material_draws_inside_the_tree() {
        // one more quiet move and the fifty-move rule applies at every child
        let mut fifty = Position::from_fen("7k/8/8/8/8/8/8/KQ6 w - - 99 80").unwrap();
        let result = engine().search(&mut fifty, &SearchLimits::depth(3), None).unwrap();
        assert_eq!(result.score, 0);
        assert!(result.best_move.is_some());

        let mut fresh_clock = Position::from_fen("7k/8/8/8/8/8/8/KQ6 w - - 0 80").unwrap();
        let result = engine().search(&mut fresh_clock, &SearchLimits::depth(3), None).unwrap();
        assert!(result.score > 500);

        let mut lone_knight = Position::from_fen("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1").unwrap();
        let result = engine().search(&mut lone_knight, &SearchLimits::depth(3), None).unwrap();
        assert_eq!(result.score, 0);
        assert!(result.best_move.is_some());
    }

    fn quiescence_score(position: &mut Position, ply: usize) -> Score {
        let mut table = TranspositionTable::new(1024);
        let mut killers = KillerTable::default();
        let mut history = HistoryTable::default();
        let mut context = SearchContext {
            start: Instant::now(),
            max_time: None,
            cancel: None,
            nodes: 0,
            aborted: false,
            transposition_table: &mut table,
            killers: &mut killers,
            history: &mut history,
        };
        context.quiescence(position, ply, -INFINITY, INFINITY).unwrap()
    }

    #[test]
    fn quiescence_searches_quiet_evasions_in_check() {
        // the rook checks along the back rank, Kg7 is the only way out
        let mut position = Position::from_fen("R6k/7p/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert!(generate(&mut position, GenType::Noisy).unwrap().is_empty());
        assert_eq!(legal_moves(&mut position).unwrap().len(), 1);

        let score = quiescence_score(&mut position, 0);
        assert!(score > -MATE_THRESHOLD);
        assert!(score < 0);
        assert_eq!(position.to_fen(), "R6k/7p/8/8/8/8/8/6K1 b - - 0 1");

        // same check with g7 covered is mate, scored by distance
        let mut mated = Position::from_fen("R6k/6pp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert_eq!(quiescence_score(&mut mated, 3), -MATE_SCORE + 3);
    }

    #[test]
    fn mate_scores_move_with_the_ply() {
        // mate five plies from the root, found at a node three plies deep
        let found = MATE_SCORE - 5;
        let stored = score_to_table(found, 3);
        assert_eq!(stored, MATE_SCORE - 2);

        let mut table = TranspositionTable::new(64);
        table.set(
            42,
            SearchInfo::Exact {
                position_hash: 42,
                best_move: Move::new_normal(0, 8),
                depth_searched: 4,
                score: stored,
            },
        );
        let probed = table.get(42).score().unwrap();
        // the same position reached seven plies deep is still two plies from mate
        assert_eq!(score_from_table(probed, 7), MATE_SCORE - 9);
        assert_eq!(score_from_table(score_to_table(-found, 3), 7), -(MATE_SCORE - 9));

        assert_eq!(score_to_table(250, 3), 250);
        assert_eq!(score_from_table(-250, 7), -250);
    }

    #[test]
    fn respects_the_time_limit() {
        let mut position = Position::initial();
        let start = Instant::now();
        let result = engine().search(&mut position, &SearchLimits::time(100), None).unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(result.best_move.is_some());
    }

    #[test]
    fn repeated_searches_reuse_the_position() {
        let mut position = Position::initial();
        let mut engine = engine();
        let first = engine.search(&mut position, &SearchLimits::depth(3), None).unwrap();
        position.make_move(first.best_move.unwrap()).unwrap();
        let reply = engine.search(&mut position, &SearchLimits::depth(3), None).unwrap();
        assert!(legal_moves(&mut position).unwrap().contains(&reply.best_move.unwrap()));
        assert!(matches!(engine.probe_table(&position), SearchInfo::Exact { .. }));

        engine.new_game();
        assert_eq!(engine.probe_table(&position), SearchInfo::None);
    }

    #[test]
    fn limits() {
        assert_eq!(SearchLimits::depth(0).max_depth, 1);
        assert_eq!(SearchLimits::depth(200).max_depth, MAX_DEPTH);
        assert_eq!(SearchLimits::time(250).max_time, Some(Duration::from_millis(250)));

        let mut limits = SearchLimits::default();
        limits.set_time_from_clock(Duration::from_secs(100), Some(Duration::from_secs(2)));
        assert_eq!(limits.max_time, Some(Duration::from_secs(3)));
        limits.set_depth(5).set_time(None);
        assert_eq!(limits, SearchLimits::depth(5));
    }
}
