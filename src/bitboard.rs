use crate::piece::Color;
use crate::square::Square;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not};

// Build script to calculate lookup tables at compile time
include!(concat!(env!("OUT_DIR"), "/lookup.rs"));

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(pub u64);

impl Bitboard {
    #[inline]
    pub fn from_square(square: Square) -> Bitboard {
        Bitboard(1u64 << square)
    }
    #[inline]
    pub fn from_squares(squares: &[Square]) -> Bitboard {
        let mut bits: u64 = 0;
        for sq in squares {
            bits |= 1u64 << sq
        }
        Bitboard(bits)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    #[inline(always)]
    pub fn is_set(&self, sq: Square) -> bool {
        self.0 & (1 << sq) != 0
    }
    #[inline(always)]
    pub fn set(&mut self, sq: Square) {
        self.0 |= 1 << sq
    }
    #[inline(always)]
    pub fn unset(&mut self, sq: Square) {
        self.0 &= !(1 << sq)
    }

    #[inline(always)]
    pub fn ls1b(&self) -> Option<Square> {
        if self.is_empty() {
            return None;
        }
        Some(self.0.trailing_zeros() as Square)
    }

    #[inline(always)]
    pub fn ms1b(&self) -> Option<Square> {
        if self.is_empty() {
            return None;
        }
        Some(63 - self.0.leading_zeros() as Square)
    }

    #[inline(always)]
    pub fn pop_ls1b(&mut self) -> Option<Square> {
        let ls1b = self.ls1b();
        self.0 &= self.0.wrapping_sub(1);
        ls1b
    }

    #[inline(always)]
    pub fn pop_count(&self) -> u32 {
        self.0.count_ones()
    }

    pub const EMPTY: Bitboard = Bitboard(0);

    // Ray directions, matching the order used by the build script
    pub const CARDINAL_DIRECTIONS: [usize; 4] = [0, 1, 2, 3];
    pub const DIAGONAL_DIRECTIONS: [usize; 4] = [4, 5, 6, 7];

    #[inline]
    pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
        Self::PAWN_ATTACKS[color as usize][sq]
    }

    /// Squares reached by walking one ray from `origin`, the first occupied
    /// square included
    #[inline]
    pub fn ray_attacks(direction: usize, origin: Square, occupancy: Bitboard) -> Bitboard {
        let ray = Self::RAYS[direction][origin];
        let blockers = ray & occupancy;
        let first_blocker = if direction % 2 == 0 {
            blockers.ls1b()
        } else {
            blockers.ms1b()
        };
        match first_blocker {
            Some(blocker) => ray & !Self::RAYS[direction][blocker],
            None => ray,
        }
    }

    #[inline]
    pub fn bishop_attacks(origin: Square, occupancy: Bitboard) -> Bitboard {
        Self::DIAGONAL_DIRECTIONS
            .iter()
            .fold(Self::EMPTY, |acc, &dir| acc | Self::ray_attacks(dir, origin, occupancy))
    }

    #[inline]
    pub fn rook_attacks(origin: Square, occupancy: Bitboard) -> Bitboard {
        Self::CARDINAL_DIRECTIONS
            .iter()
            .fold(Self::EMPTY, |acc, &dir| acc | Self::ray_attacks(dir, origin, occupancy))
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                write!(f, "{}", if self.is_set(rank * 8 + file) { "x " } else { ". " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// A simple Iterator that resets the LS1B each time
impl Iterator for Bitboard {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop_ls1b()
    }
}

/*
BITWISE OPERATIONS IMPLEMENTATIONS
 */
impl BitAnd for Bitboard {
    type Output = Bitboard;
    fn bitand(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 & rhs.0)
    }
}
impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0
    }
}
impl BitOr for Bitboard {
    type Output = Bitboard;
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}
impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}
impl BitXor for Bitboard {
    type Output = Bitboard;
    fn bitxor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 ^ rhs.0)
    }
}
impl Not for Bitboard {
    type Output = Bitboard;
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_and_king_tables() {
        // a1 knight reaches b3 and c2
        assert_eq!(Bitboard::KNIGHT_ATTACKS[0], Bitboard::from_squares(&[17, 10]));
        // h8 king: g8, g7, h7
        assert_eq!(Bitboard::KING_ATTACKS[63], Bitboard::from_squares(&[62, 54, 55]));
        assert_eq!(Bitboard::KNIGHT_ATTACKS[27].pop_count(), 8);
    }

    #[test]
    fn pawn_attack_tables_do_not_wrap() {
        // a2 white pawn only attacks b3, h7 black pawn only attacks g6
        assert_eq!(Bitboard::pawn_attacks(8, Color::White), Bitboard::from_square(17));
        assert_eq!(Bitboard::pawn_attacks(55, Color::Black), Bitboard::from_square(46));
    }

    #[test]
    fn rays_stop_on_first_blocker() {
        // rook on a1, blocker on a4 and d1
        let occupancy = Bitboard::from_squares(&[24, 3]);
        let attacks = Bitboard::rook_attacks(0, occupancy);
        assert_eq!(attacks, Bitboard::from_squares(&[8, 16, 24, 1, 2, 3]));

        // bishop on d4 on an empty board covers 13 squares
        assert_eq!(Bitboard::bishop_attacks(27, Bitboard::EMPTY).pop_count(), 13);
        // blocker on b2 (south-west), c3 is still reached along with b2
        let attacks = Bitboard::bishop_attacks(27, Bitboard::from_square(9));
        assert!(attacks.is_set(9) && attacks.is_set(18) && !attacks.is_set(0));
    }

    #[test]
    fn iteration_yields_squares_in_order() {
        let squares: Vec<Square> = Bitboard::from_squares(&[63, 0, 12]).collect();
        assert_eq!(squares, vec![0, 12, 63]);
    }
}
