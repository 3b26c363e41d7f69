use crate::castling::CastlingRights;
use crate::piece::Piece;
use crate::r#move::Move;
use crate::square::Square;

/// State that a move destroys and that unmaking it must restore.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UndoRecord {
    pub move_played: Move,
    pub captured_piece: Option<Piece>,
    pub ep_target: Option<Square>,
    pub castling_rights: CastlingRights,
    pub halfmove_clock: u32,
}
