use crate::error::FenError;
use crate::piece::Color;
use crate::square::Square;
use std::fmt::{Display, Formatter};
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: CastlingRights = CastlingRights(0b0001);
    pub const WHITE_QUEENSIDE: CastlingRights = CastlingRights(0b0010);
    pub const BLACK_KINGSIDE: CastlingRights = CastlingRights(0b0100);
    pub const BLACK_QUEENSIDE: CastlingRights = CastlingRights(0b1000);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// The 4-bit mask, in 0..16
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn contains(&self, rights: CastlingRights) -> bool {
        self.0 & rights.0 == rights.0
    }

    pub fn remove(&mut self, rights: CastlingRights) {
        self.0 &= !rights.0
    }

    pub fn kingside(side: Color) -> CastlingRights {
        match side {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    pub fn queenside(side: Color) -> CastlingRights {
        match side {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    pub fn both(side: Color) -> CastlingRights {
        Self::kingside(side) | Self::queenside(side)
    }

    /// Right lost when a piece leaves or lands on `sq`.
    /// Only the standard rook home squares are tracked.
    pub fn lost_by_touching(sq: Square) -> CastlingRights {
        match sq {
            0 => Self::WHITE_QUEENSIDE,
            7 => Self::WHITE_KINGSIDE,
            56 => Self::BLACK_QUEENSIDE,
            63 => Self::BLACK_KINGSIDE,
            _ => Self::NONE,
        }
    }
}

impl BitOr for CastlingRights {
    type Output = CastlingRights;
    fn bitor(self, rhs: Self) -> Self::Output {
        CastlingRights(self.0 | rhs.0)
    }
}
impl BitOrAssign for CastlingRights {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl FromStr for CastlingRights {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Self::NONE);
        }
        let mut res = Self::NONE;
        for c in s.chars() {
            res |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => return Err(FenError::Castling(s.to_string())),
            }
        }
        if s.is_empty() {
            return Err(FenError::Castling(s.to_string()));
        }
        Ok(res)
    }
}

impl Display for CastlingRights {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        write!(
            f,
            "{}{}{}{}",
            if self.contains(Self::WHITE_KINGSIDE) { "K" } else { "" },
            if self.contains(Self::WHITE_QUEENSIDE) { "Q" } else { "" },
            if self.contains(Self::BLACK_KINGSIDE) { "k" } else { "" },
            if self.contains(Self::BLACK_QUEENSIDE) { "q" } else { "" }
        )
    }
}
