use crate::bitboard::Bitboard;
use crate::error::ChessError;
use crate::piece::Color::{Black, White};
use crate::piece::PieceType::{Bishop, King, Knight, Pawn, Queen, Rook};
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;
use std::fmt::{Display, Formatter};

// Bitboards are indexed by color and piece_type, with a redundant
// color bitboard at index 6.
const COLOR_INDEX: usize = 6;

/// Piece placement only: 64 optional pieces mirrored by one bitboard per
/// (color, piece type). Both views are kept consistent by `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pieces: [Option<Piece>; 64],
    bitboards: [[Bitboard; 7]; 2],
}

impl Default for Board {
    fn default() -> Self {
        Board {
            pieces: [None; 64],
            bitboards: [[Bitboard::EMPTY; 7]; 2],
        }
    }
}

impl Board {
    /// An empty board
    pub fn new() -> Board {
        Self::default()
    }

    /// The standard starting arrangement
    pub fn initial() -> Board {
        let mut board = Board::new();
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        for (file, piece_type) in back_rank.into_iter().enumerate() {
            board.set(file, Some(Piece::new(White, piece_type)));
            board.set(8 + file, Some(Piece::new(White, Pawn)));
            board.set(48 + file, Some(Piece::new(Black, Pawn)));
            board.set(56 + file, Some(Piece::new(Black, piece_type)));
        }
        board
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.pieces[sq]
    }

    /// Places `piece` on `sq`, replacing whatever stood there.
    /// Returns the replaced piece.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        let previous = self.pieces[sq];
        if let Some(p) = previous {
            self.bitboards[p.color as usize][p.piece_type as usize].unset(sq);
            self.bitboards[p.color as usize][COLOR_INDEX].unset(sq);
        }
        if let Some(p) = piece {
            self.bitboards[p.color as usize][p.piece_type as usize].set(sq);
            self.bitboards[p.color as usize][COLOR_INDEX].set(sq);
        }
        self.pieces[sq] = piece;
        previous
    }

    #[inline]
    pub fn pieces_bitboard(&self, color: Color, piece_type: PieceType) -> Bitboard {
        self.bitboards[color as usize][piece_type as usize]
    }

    #[inline]
    pub fn color_bitboard(&self, color: Color) -> Bitboard {
        self.bitboards[color as usize][COLOR_INDEX]
    }

    #[inline]
    pub fn occupancy(&self) -> Bitboard {
        self.bitboards[0][COLOR_INDEX] | self.bitboards[1][COLOR_INDEX]
    }

    pub fn pieces(&self, color: Color, piece_type: PieceType) -> Vec<Square> {
        self.pieces_bitboard(color, piece_type).collect()
    }

    pub fn all_pieces(&self, color: Color) -> Vec<Square> {
        self.color_bitboard(color).collect()
    }

    /// Fails unless `color` has exactly one king on the board
    pub fn king_square(&self, color: Color) -> Result<Square, ChessError> {
        let kings = self.pieces_bitboard(color, King);
        match (kings.pop_count(), kings.ls1b()) {
            (1, Some(sq)) => Ok(sq),
            (count, _) => Err(ChessError::MissingKing { color, count }),
        }
    }

    fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.pieces_bitboard(color, Bishop) | self.pieces_bitboard(color, Queen)
    }
    fn cardinal_sliders(&self, color: Color) -> Bitboard {
        self.pieces_bitboard(color, Rook) | self.pieces_bitboard(color, Queen)
    }

    /// Whether any piece of color `by` attacks `sq`.
    /// Sliding attacks stop at the first occupied square of each ray.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        // A pawn of `by` attacks `sq` iff a pawn of the other color on `sq` would attack it
        if !(Bitboard::pawn_attacks(sq, by.opposite()) & self.pieces_bitboard(by, Pawn)).is_empty() {
            return true;
        }
        if !(Bitboard::KNIGHT_ATTACKS[sq] & self.pieces_bitboard(by, Knight)).is_empty() {
            return true;
        }
        if !(Bitboard::KING_ATTACKS[sq] & self.pieces_bitboard(by, King)).is_empty() {
            return true;
        }
        let occupancy = self.occupancy();
        !(Bitboard::bishop_attacks(sq, occupancy) & self.diagonal_sliders(by)).is_empty()
            || !(Bitboard::rook_attacks(sq, occupancy) & self.cardinal_sliders(by)).is_empty()
    }

    /// Non-king material of `color`, in centipawns
    pub fn material(&self, color: Color) -> i32 {
        PieceType::ALL
            .iter()
            .map(|&pt| pt.value() * self.pieces_bitboard(color, pt).pop_count() as i32)
            .sum()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                match self.pieces[rank * 8 + file] {
                    Some(p) => write!(f, "{} ", p)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}
