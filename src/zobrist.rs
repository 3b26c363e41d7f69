use crate::castling::CastlingRights;
use crate::piece::{Color, Piece};
use crate::square::Square;

// Keys are initialized at compile time for reproducibility and
// to avoid init functions
include!(concat!(env!("OUT_DIR"), "/zobrist_keys.rs"));

pub type Hash = u64;

/// Key layout: 768 piece-square keys (color, piece type, square), the
/// side to move key, one key per castling rights mask, one key per
/// en passant square.
pub struct ZobristHasher;

impl ZobristHasher {
    pub const BLACK_TO_MOVE_INDEX: usize = 768;
    pub const CASTLING_OFFSET: usize = 769;
    pub const EP_TARGET_OFFSET: usize = 785;

    #[inline]
    pub fn piece_square(piece: Piece, sq: Square) -> Hash {
        Self::ZOBRIST_KEYS[(piece.color as usize) * 384 + (piece.piece_type as usize) * 64 + sq]
    }

    #[inline]
    pub fn side_to_move() -> Hash {
        Self::ZOBRIST_KEYS[Self::BLACK_TO_MOVE_INDEX]
    }

    #[inline]
    pub fn castling_rights(rights: CastlingRights) -> Hash {
        Self::ZOBRIST_KEYS[Self::CASTLING_OFFSET + rights.index()]
    }

    #[inline]
    pub fn en_passant(ep_target: Option<Square>) -> Hash {
        match ep_target {
            Some(sq) => Self::ZOBRIST_KEYS[Self::EP_TARGET_OFFSET + sq],
            None => 0,
        }
    }

    /// Hash of a whole state, from scratch.
    /// The side key is only present when Black is to move.
    pub fn full_hash(
        pieces: impl Iterator<Item = (Square, Piece)>,
        side_to_move: Color,
        castling_rights: CastlingRights,
        ep_target: Option<Square>,
    ) -> Hash {
        let mut hash = pieces.fold(0, |acc, (sq, p)| acc ^ Self::piece_square(p, sq));
        if side_to_move == Color::Black {
            hash ^= Self::side_to_move();
        }
        hash ^ Self::castling_rights(castling_rights) ^ Self::en_passant(ep_target)
    }
}
