use crate::evaluation::{Evaluation, Score};
use crate::piece::{Color, PieceType};
use crate::position::Position;
use crate::r#move::Move;

/// Deepest ply the search tables are sized for
pub const MAX_PLY: usize = 128;

const TT_MOVE_SCORE: Score = 1_000_000;
const PROMOTION_SCORE: Score = 900_000;
const CAPTURE_SCORE: Score = 800_000;
const KILLER_SCORES: [Score; 2] = [700_000, 690_000];
const CASTLE_BONUS: Score = 50;
// History counters are halved once one of them goes past this,
// keeping quiet moves below killers
const HISTORY_CAP: Score = 100_000;

/// Two quiet moves per ply that recently caused a beta cutoff
pub struct KillerTable([[Option<Move>; 2]; MAX_PLY]);

impl Default for KillerTable {
    fn default() -> Self {
        KillerTable([[None; 2]; MAX_PLY])
    }
}

impl KillerTable {
    pub fn get(&self, ply: usize) -> [Option<Move>; 2] {
        self.0.get(ply).copied().unwrap_or([None; 2])
    }

    /// The newest killer goes first, pushing the older one out of the second slot
    pub fn store(&mut self, ply: usize, mv: Move) {
        if let Some(killers) = self.0.get_mut(ply) {
            if killers[0] != Some(mv) {
                killers[1] = killers[0];
                killers[0] = Some(mv);
            }
        }
    }

    pub fn clear(&mut self) {
        self.0 = [[None; 2]; MAX_PLY];
    }
}

/// Depth-weighted cutoff counters per (color, origin, target)
pub struct HistoryTable(Box<[[[Score; 64]; 64]; 2]>);

impl Default for HistoryTable {
    fn default() -> Self {
        HistoryTable(Box::new([[[0; 64]; 64]; 2]))
    }
}

impl HistoryTable {
    pub fn get(&self, color: Color, mv: Move) -> Score {
        self.0[color as usize][mv.origin()][mv.target()]
    }

    pub fn record(&mut self, color: Color, mv: Move, depth: u8) {
        let entry = &mut self.0[color as usize][mv.origin()][mv.target()];
        *entry += (depth as Score) * (depth as Score);
        if *entry > HISTORY_CAP {
            self.age();
        }
    }

    fn age(&mut self) {
        self.0
            .iter_mut()
            .flatten()
            .flatten()
            .for_each(|counter| *counter /= 2);
    }

    pub fn clear(&mut self) {
        self.0.iter_mut().flatten().for_each(|row| *row = [0; 64]);
    }
}

/// Ordering score of `mv`, higher is searched first:
/// table move, promotions by piece value, captures by MVV-LVA, killers,
/// then quiet moves by history, castling bonus and positional delta.
pub fn score_move(
    position: &Position,
    mv: Move,
    tt_move: Option<Move>,
    killers: [Option<Move>; 2],
    history: &HistoryTable,
) -> Score {
    if tt_move == Some(mv) {
        return TT_MOVE_SCORE;
    }
    if let Some(promote_to) = mv.promotion() {
        return PROMOTION_SCORE + promote_to.value();
    }
    if position.is_capture(mv) {
        let board = position.board();
        let victim = board
            .get(mv.target())
            .map_or(PieceType::Pawn, |p| p.piece_type);
        let attacker = board
            .get(mv.origin())
            .map_or(PieceType::Pawn, |p| p.piece_type);
        return CAPTURE_SCORE + 10 * victim.value() - attacker.value();
    }
    if let Some(i) = killers.iter().position(|k| *k == Some(mv)) {
        return KILLER_SCORES[i];
    }

    let castle_bonus = if mv.is_castle() { CASTLE_BONUS } else { 0 };
    history.get(position.side_to_move(), mv)
        + castle_bonus
        + Evaluation::positional_delta(position, mv)
}
