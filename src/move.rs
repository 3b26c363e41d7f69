use crate::piece::{Color, PieceType};
use crate::square::{self, square_representation, Square};
use std::fmt::{Display, Formatter};

/// Moves are stored as a 2bytes word, with the following alignment:
/// - 6*2 bits for origin and destination square
/// - 4 bits used for the move flag
///
/// Captures are not flagged, whether a move captures depends on the position
/// it is played in.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move(u16);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveFlag {
    Normal,
    DoublePawn,
    EnPassant,
    CastleKingside,
    CastleQueenside,
    Promotion(PieceType),
}

const NORMAL: u16 = 0b0000;
const DOUBLE_PAWN: u16 = 0b0001;
const CASTLE_KINGSIDE: u16 = 0b0010;
const CASTLE_QUEENSIDE: u16 = 0b0011;
const EN_PASSANT: u16 = 0b0101;
const PROMOTION: u16 = 0b1000;

impl Move {
    fn new(origin: Square, target: Square, flags: u16) -> Move {
        Move(((origin as u16) << 10) | ((target as u16) << 4) | flags)
    }
    pub fn new_normal(origin: Square, target: Square) -> Move {
        Self::new(origin, target, NORMAL)
    }
    pub fn new_double_pawn(origin: Square, target: Square) -> Move {
        Self::new(origin, target, DOUBLE_PAWN)
    }
    pub fn new_en_passant(origin: Square, target: Square) -> Move {
        Self::new(origin, target, EN_PASSANT)
    }
    pub fn new_kingside_castle(color: Color) -> Move {
        match color {
            Color::White => Self::new(4, 6, CASTLE_KINGSIDE),
            Color::Black => Self::new(60, 62, CASTLE_KINGSIDE),
        }
    }
    pub fn new_queenside_castle(color: Color) -> Move {
        match color {
            Color::White => Self::new(4, 2, CASTLE_QUEENSIDE),
            Color::Black => Self::new(60, 58, CASTLE_QUEENSIDE),
        }
    }
    /// Kings and pawns cannot be promoted to, they fall back to a queen.
    pub fn new_promotion(origin: Square, target: Square, promote_to: PieceType) -> Move {
        Self::new(
            origin,
            target,
            PROMOTION
                | match promote_to {
                    PieceType::Knight => 0b00,
                    PieceType::Bishop => 0b01,
                    PieceType::Rook => 0b10,
                    _ => 0b11,
                },
        )
    }
    /// The four promotions of a pawn move, in Queen, Rook, Bishop, Knight order
    pub fn all_promotions(origin: Square, target: Square) -> [Move; 4] {
        PieceType::PROMOTIONS.map(|p| Self::new_promotion(origin, target, p))
    }

    pub fn origin(&self) -> Square {
        (self.0 >> 10) as Square
    }
    pub fn target(&self) -> Square {
        ((self.0 >> 4) & 0b111111) as Square
    }
    pub fn flag(&self) -> MoveFlag {
        match self.0 & 0b1111 {
            DOUBLE_PAWN => MoveFlag::DoublePawn,
            CASTLE_KINGSIDE => MoveFlag::CastleKingside,
            CASTLE_QUEENSIDE => MoveFlag::CastleQueenside,
            EN_PASSANT => MoveFlag::EnPassant,
            0b1000 => MoveFlag::Promotion(PieceType::Knight),
            0b1001 => MoveFlag::Promotion(PieceType::Bishop),
            0b1010 => MoveFlag::Promotion(PieceType::Rook),
            0b1011 => MoveFlag::Promotion(PieceType::Queen),
            _ => MoveFlag::Normal,
        }
    }

    pub fn promotion(&self) -> Option<PieceType> {
        match self.flag() {
            MoveFlag::Promotion(p) => Some(p),
            _ => None,
        }
    }
    pub fn is_castle(&self) -> bool {
        matches!(
            self.flag(),
            MoveFlag::CastleKingside | MoveFlag::CastleQueenside
        )
    }
    pub fn is_en_passant(&self) -> bool {
        self.flag() == MoveFlag::EnPassant
    }

    /// Parses a move formatted in long algebraic notation.
    /// Since no information can be given on flags, it simply returns origin, target and potential
    /// piece type to promote to
    /// ```
    /// use gambit::r#move::Move;
    /// use gambit::piece::PieceType;
    /// assert_eq!(Move::parse("e2e4"), Some((12, 28, None)));
    /// assert_eq!(Move::parse("a7a8q"), Some((48, 56, Some(PieceType::Queen))));
    /// assert_eq!(Move::parse("a7a8k"), None);
    /// assert_eq!(Move::parse("e2"), None);
    /// ```
    pub fn parse(mv: &str) -> Option<(Square, Square, Option<PieceType>)> {
        if !mv.is_ascii() || !(4..=5).contains(&mv.len()) {
            return None;
        }
        let origin = square::parse_square(&mv[0..2])?;
        let target = square::parse_square(&mv[2..4])?;
        let promotion_target = match &mv[4..] {
            "" => None,
            "n" => Some(PieceType::Knight),
            "b" => Some(PieceType::Bishop),
            "r" => Some(PieceType::Rook),
            "q" => Some(PieceType::Queen),
            _ => return None,
        };
        Some((origin, target, promotion_target))
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let o = square_representation(self.origin()).unwrap_or_else(|| String::from("**"));
        let t = square_representation(self.target()).unwrap_or_else(|| String::from("**"));
        match self.promotion() {
            Some(p) => write!(f, "{}{}{}", o, t, p),
            None => write!(f, "{}{}", o, t),
        }
    }
}
