use crate::board::Board;
use crate::piece::PieceType::{Bishop, King, Knight, Pawn, Queen, Rook};
use crate::piece::{Color, Piece, PieceType};
use crate::position::Position;
use crate::r#move::Move;
use crate::square::Square;

pub type Score = i32;

// Piece-square tables, laid out from White's point of view with a8 first,
// so a white piece on `sq` reads index `sq ^ 56` and a black one reads `sq`.
#[rustfmt::skip]
const PAWN_TABLE: [Score; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     50,  50,  50,  50,  50,  50,  50,  50,
     10,  10,  20,  30,  30,  20,  10,  10,
      5,   5,  10,  25,  25,  10,   5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      5,  10,  10, -20, -20,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];
#[rustfmt::skip]
const KNIGHT_TABLE: [Score; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];
#[rustfmt::skip]
const BISHOP_TABLE: [Score; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];
#[rustfmt::skip]
const ROOK_TABLE: [Score; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10,  10,  10,  10,  10,   5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      0,   0,   0,   5,   5,   0,   0,   0,
];
#[rustfmt::skip]
const QUEEN_TABLE: [Score; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
      0,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   0, -10,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];
#[rustfmt::skip]
const KING_MIDDLEGAME_TABLE: [Score; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];
#[rustfmt::skip]
const KING_ENDGAME_TABLE: [Score; 64] = [
    -50, -40, -30, -20, -20, -30, -40, -50,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -50, -30, -30, -30, -30, -30, -30, -50,
];

/// Static evaluation: material plus piece-square bonuses
pub struct Evaluation;

impl Evaluation {
    pub const DRAW_SCORE: Score = 0;

    /// Score of the position from the side to move's point of view
    pub fn evaluate(position: &Position) -> Score {
        let score = Self::evaluate_for_white(position.board());
        match position.side_to_move() {
            Color::White => score,
            Color::Black => -score,
        }
    }

    /// Score of the board from White's point of view
    pub fn evaluate_for_white(board: &Board) -> Score {
        let endgame = Self::is_endgame(board);
        let mut scores = [0; 2];
        for color in Color::ALL {
            for piece_type in PieceType::ALL {
                let piece = Piece::new(color, piece_type);
                for sq in board.pieces_bitboard(color, piece_type) {
                    scores[color as usize] +=
                        piece_type.value() + Self::piece_square_value(piece, sq, endgame);
                }
            }
        }
        scores[Color::White as usize] - scores[Color::Black as usize]
    }

    pub fn piece_square_value(piece: Piece, sq: Square, endgame: bool) -> Score {
        let index = match piece.color {
            Color::White => sq ^ 56,
            Color::Black => sq,
        };
        let table = match piece.piece_type {
            Pawn => &PAWN_TABLE,
            Knight => &KNIGHT_TABLE,
            Bishop => &BISHOP_TABLE,
            Rook => &ROOK_TABLE,
            Queen => &QUEEN_TABLE,
            King if endgame => &KING_ENDGAME_TABLE,
            King => &KING_MIDDLEGAME_TABLE,
        };
        table[index]
    }

    /// Neither side has a queen, or every side with a queen has at most
    /// one minor piece besides it
    pub fn is_endgame(board: &Board) -> bool {
        Color::ALL.iter().all(|&color| {
            let queens = board.pieces_bitboard(color, Queen).pop_count();
            let rooks = board.pieces_bitboard(color, Rook).pop_count();
            let minors = board.pieces_bitboard(color, Knight).pop_count()
                + board.pieces_bitboard(color, Bishop).pop_count();
            queens == 0 || (queens == 1 && rooks == 0 && minors <= 1)
        })
    }

    /// Change in piece-square bonus for the moving piece, used to break ties
    /// between quiet moves
    pub fn positional_delta(position: &Position, mv: Move) -> Score {
        let board = position.board();
        let moving = match board.get(mv.origin()) {
            Some(p) => p,
            None => return 0,
        };
        let endgame = Self::is_endgame(board);
        let landed = match mv.promotion() {
            Some(promote_to) => Piece::new(moving.color, promote_to),
            None => moving,
        };
        Self::piece_square_value(landed, mv.target(), endgame)
            - Self::piece_square_value(moving, mv.origin(), endgame)
    }
}
