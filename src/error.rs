use crate::piece::Color;
use crate::square::Square;
use thiserror::Error;

/// Contract violations raised by the core.
///
/// None of these are expected in ordinary play: they mean a malformed
/// position or a move that never came out of the generator reached a
/// layer that trusts its input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("no piece on origin square {square}")]
    EmptyOrigin { square: Square },
    #[error("expected exactly one {color} king, found {count}")]
    MissingKing { color: Color, count: u32 },
    #[error("cannot unmake a move, history is empty")]
    EmptyHistory,
    #[error("move {0} is not the last move played")]
    UnmakeMismatch(String),
    #[error("square {square} cannot be an en passant target here")]
    InvalidEnPassant { square: Square },
    #[error("invalid FEN: {0}")]
    Fen(#[from] FenError),
    #[error("malformed move `{0}`")]
    MalformedMove(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 fields, got {0}")]
    FieldCount(usize),
    #[error("bad piece placement `{0}`")]
    PiecePlacement(String),
    #[error("bad side to move `{0}`")]
    SideToMove(String),
    #[error("bad castling rights `{0}`")]
    Castling(String),
    #[error("bad en passant square `{0}`")]
    EnPassant(String),
    #[error("bad move clock `{0}`")]
    Clock(String),
}
