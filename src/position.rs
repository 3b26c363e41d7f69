use crate::board::Board;
use crate::castling::CastlingRights;
use crate::error::ChessError;
use crate::history::UndoRecord;
use crate::piece::PieceType::{King, Pawn};
use crate::piece::{Color, Piece};
use crate::r#move::{Move, MoveFlag};
use crate::square::{file_of, rank_of, square_representation, Square};
use crate::zobrist::{Hash, ZobristHasher};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

/// Full game state, mutated in place through make/unmake.
///
/// Every `make_move` pushes an undo record and the resulting hash; the hash
/// stack always holds one more entry than the undo history (the hash the
/// position was constructed with).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    ep_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: Hash,

    history: Vec<UndoRecord>,
    hash_stack: Vec<Hash>,
    occurrences: HashMap<Hash, u32>,
}

impl Position {
    /// Builds a position from its six FEN fields.
    /// Fails if either side does not have exactly one king, or if the en passant
    /// target does not sit behind an enemy pawn that just made a double push.
    pub fn new(
        board: Board,
        side_to_move: Color,
        castling_rights: CastlingRights,
        ep_target: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Result<Position, ChessError> {
        board.king_square(Color::White)?;
        board.king_square(Color::Black)?;
        if let Some(square) = ep_target {
            Self::check_en_passant_target(&board, side_to_move, square)?;
        }
        Ok(Self::from_parts(
            board,
            side_to_move,
            castling_rights,
            ep_target,
            halfmove_clock,
            fullmove_number,
        ))
    }

    /// With White to move the target is on rank 6, the pushed black pawn right
    /// below it and the square it came from empty. Mirrored for Black.
    fn check_en_passant_target(board: &Board, side_to_move: Color, square: Square) -> Result<(), ChessError> {
        let (target_rank, victim, origin) = match side_to_move {
            Color::White => (5, square.wrapping_sub(8), square + 8),
            Color::Black => (2, square + 8, square.wrapping_sub(8)),
        };
        let pushed_pawn = Piece::new(side_to_move.opposite(), Pawn);
        let valid = square < 64
            && rank_of(square) == target_rank
            && board.get(square).is_none()
            && board.get(origin).is_none()
            && board.get(victim) == Some(pushed_pawn);
        if valid {
            Ok(())
        } else {
            Err(ChessError::InvalidEnPassant { square })
        }
    }

    pub fn initial() -> Position {
        Self::from_parts(Board::initial(), Color::White, CastlingRights::ALL, None, 0, 1)
    }

    /// An independent snapshot whose history starts at the current state
    pub fn copy(&self) -> Position {
        Self::from_parts(
            self.board.clone(),
            self.side_to_move,
            self.castling_rights,
            self.ep_target,
            self.halfmove_clock,
            self.fullmove_number,
        )
    }

    fn from_parts(
        board: Board,
        side_to_move: Color,
        castling_rights: CastlingRights,
        ep_target: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Position {
        let mut position = Position {
            board,
            side_to_move,
            castling_rights,
            ep_target,
            halfmove_clock,
            fullmove_number,
            hash: 0,
            history: Vec::with_capacity(128),
            hash_stack: Vec::with_capacity(128),
            occurrences: HashMap::new(),
        };
        position.hash = position.compute_hash();
        position.reset_history();
        position
    }

    fn reset_history(&mut self) {
        self.history.clear();
        self.hash_stack.clear();
        self.occurrences.clear();
        self.hash_stack.push(self.hash);
        self.occurrences.insert(self.hash, 1);
    }

    /*
    MAKE / UNMAKE
     */

    /// Plays `mv`, which is expected to come from the move generator.
    /// Fails without touching the position if the origin square is empty.
    pub fn make_move(&mut self, mv: Move) -> Result<(), ChessError> {
        let origin = mv.origin();
        let target = mv.target();
        let moving = self
            .board
            .get(origin)
            .ok_or(ChessError::EmptyOrigin { square: origin })?;
        let side = moving.color;

        let flag = mv.flag();
        let captured_square = match flag {
            MoveFlag::EnPassant => Self::en_passant_victim(origin, target),
            _ => target,
        };
        let captured_piece = match flag {
            MoveFlag::CastleKingside | MoveFlag::CastleQueenside => None,
            _ => self.board.get(captured_square),
        };

        self.history.push(UndoRecord {
            move_played: mv,
            captured_piece,
            ep_target: self.ep_target,
            castling_rights: self.castling_rights,
            halfmove_clock: self.halfmove_clock,
        });

        self.remove_piece(origin);
        if captured_piece.is_some() {
            self.remove_piece(captured_square);
        }
        let placed = match flag {
            MoveFlag::Promotion(promote_to) => Piece::new(side, promote_to),
            _ => moving,
        };
        self.add_piece(placed, target);

        if let Some((rook_from, rook_to)) = Self::castling_rook_squares(mv) {
            if let Some(rook) = self.remove_piece(rook_from) {
                self.add_piece(rook, rook_to);
            }
        }

        self.set_ep_target(match flag {
            MoveFlag::DoublePawn => Some((origin + target) / 2),
            _ => None,
        });

        let mut rights = self.castling_rights;
        if moving.piece_type == King {
            rights.remove(CastlingRights::both(side));
        }
        rights.remove(CastlingRights::lost_by_touching(origin));
        rights.remove(CastlingRights::lost_by_touching(target));
        self.set_castling_rights(rights);

        if moving.piece_type == Pawn || captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = self.side_to_move.opposite();
        self.hash ^= ZobristHasher::side_to_move();

        self.hash_stack.push(self.hash);
        *self.occurrences.entry(self.hash).or_insert(0) += 1;
        Ok(())
    }

    /// Reverts `mv`, which must be the last move played.
    /// Everything but the piece placement comes back from the undo record.
    pub fn unmake_move(&mut self, mv: Move) -> Result<(), ChessError> {
        let record = *self.history.last().ok_or(ChessError::EmptyHistory)?;
        if record.move_played != mv {
            return Err(ChessError::UnmakeMismatch(mv.to_string()));
        }
        let origin = mv.origin();
        let target = mv.target();
        let placed = self
            .board
            .get(target)
            .ok_or(ChessError::UnmakeMismatch(mv.to_string()))?;
        self.history.pop();

        if let Some(hash) = self.hash_stack.pop() {
            if let Some(count) = self.occurrences.get_mut(&hash) {
                *count -= 1;
                if *count == 0 {
                    self.occurrences.remove(&hash);
                }
            }
        }

        self.side_to_move = self.side_to_move.opposite();
        if self.side_to_move == Color::Black {
            self.fullmove_number -= 1;
        }

        let restored = match mv.flag() {
            MoveFlag::Promotion(_) => Piece::new(placed.color, Pawn),
            _ => placed,
        };
        self.board.set(target, None);
        self.board.set(origin, Some(restored));

        if let Some(captured) = record.captured_piece {
            let captured_square = match mv.flag() {
                MoveFlag::EnPassant => Self::en_passant_victim(origin, target),
                _ => target,
            };
            self.board.set(captured_square, Some(captured));
        }

        if let Some((rook_from, rook_to)) = Self::castling_rook_squares(mv) {
            if let Some(rook) = self.board.set(rook_to, None) {
                self.board.set(rook_from, Some(rook));
            }
        }

        self.castling_rights = record.castling_rights;
        self.ep_target = record.ep_target;
        self.halfmove_clock = record.halfmove_clock;
        if let Some(&hash) = self.hash_stack.last() {
            self.hash = hash;
        }
        Ok(())
    }

    /// Makes `mv` and returns a guard that unmakes it when dropped
    pub fn play(&mut self, mv: Move) -> Result<MoveGuard<'_>, ChessError> {
        self.make_move(mv)?;
        Ok(MoveGuard { position: self, mv })
    }

    /// The pawn taken en passant shares the target's file and the origin's rank
    fn en_passant_victim(origin: Square, target: Square) -> Square {
        rank_of(origin) * 8 + file_of(target)
    }

    fn castling_rook_squares(mv: Move) -> Option<(Square, Square)> {
        let king = mv.origin();
        match mv.flag() {
            MoveFlag::CastleKingside => Some((king + 3, king + 1)),
            MoveFlag::CastleQueenside => Some((king - 4, king - 1)),
            _ => None,
        }
    }

    /*
    HASHED MUTATORS
     */
    fn add_piece(&mut self, piece: Piece, sq: Square) {
        self.board.set(sq, Some(piece));
        self.hash ^= ZobristHasher::piece_square(piece, sq);
    }

    fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let removed = self.board.set(sq, None);
        if let Some(p) = removed {
            self.hash ^= ZobristHasher::piece_square(p, sq);
        }
        removed
    }

    fn set_ep_target(&mut self, ep_target: Option<Square>) {
        if ep_target != self.ep_target {
            self.hash ^= ZobristHasher::en_passant(self.ep_target);
            self.hash ^= ZobristHasher::en_passant(ep_target);
            self.ep_target = ep_target;
        }
    }

    fn set_castling_rights(&mut self, rights: CastlingRights) {
        if rights != self.castling_rights {
            self.hash ^= ZobristHasher::castling_rights(self.castling_rights);
            self.hash ^= ZobristHasher::castling_rights(rights);
            self.castling_rights = rights;
        }
    }

    /*
    QUERIES
     */
    pub fn board(&self) -> &Board {
        &self.board
    }
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }
    pub fn en_passant_target(&self) -> Option<Square> {
        self.ep_target
    }
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }
    pub fn hash(&self) -> Hash {
        self.hash
    }
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|r| r.move_played)
    }
    /// Number of moves played since construction or the last `copy()`
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Recomputes the hash from scratch, never used on the make/unmake path
    pub fn compute_hash(&self) -> Hash {
        ZobristHasher::full_hash(
            self.board
                .occupancy()
                .filter_map(|sq| self.board.get(sq).map(|p| (sq, p))),
            self.side_to_move,
            self.castling_rights,
            self.ep_target,
        )
    }

    /// How many times the current position occurred, this occurrence included
    pub fn repetition_count(&self) -> u32 {
        self.occurrences.get(&self.hash).copied().unwrap_or(0)
    }

    pub fn is_in_check(&self, color: Color) -> Result<bool, ChessError> {
        let king_square = self.board.king_square(color)?;
        Ok(self.board.is_square_attacked(king_square, color.opposite()))
    }

    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        self.board.is_square_attacked(sq, by)
    }

    pub fn is_capture(&self, mv: Move) -> bool {
        match mv.flag() {
            MoveFlag::EnPassant => true,
            MoveFlag::CastleKingside | MoveFlag::CastleQueenside => false,
            _ => self.board.get(mv.target()).is_some(),
        }
    }

    /// Captures, en passant and promotions
    pub fn is_noisy(&self, mv: Move) -> bool {
        mv.promotion().is_some() || self.is_capture(mv)
    }
}

/// Scoped make/unmake: the move is unmade when the guard goes out of scope,
/// whichever way the scope is left.
pub struct MoveGuard<'a> {
    position: &'a mut Position,
    mv: Move,
}

impl<'a> MoveGuard<'a> {
    pub fn played(&self) -> Move {
        self.mv
    }
}

impl<'a> Deref for MoveGuard<'a> {
    type Target = Position;
    fn deref(&self) -> &Self::Target {
        self.position
    }
}

impl<'a> DerefMut for MoveGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.position
    }
}

impl<'a> Drop for MoveGuard<'a> {
    fn drop(&mut self) {
        if let Err(e) = self.position.unmake_move(self.mv) {
            tracing::error!(mv = %self.mv, error = %e, "failed to restore position");
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.board)?;
        writeln!(f, "side to move: {}", self.side_to_move)?;
        writeln!(f, "castling rights: {}", self.castling_rights)?;
        writeln!(
            f,
            "en passant: {}",
            self.ep_target
                .and_then(square_representation)
                .unwrap_or_else(|| String::from("-"))
        )?;
        writeln!(
            f,
            "halfmove clock: {}, fullmove number: {}",
            self.halfmove_clock, self.fullmove_number
        )?;
        writeln!(f, "hash: {:#018x}", self.hash)?;
        write!(f, "fen: {}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceType;
    use crate::square::parse_square;

    fn sq(s: &str) -> Square {
        parse_square(s).unwrap()
    }

    #[test]
    fn double_pushes_set_and_clear_en_passant() {
        let mut position = Position::initial();
        position.make_move(Move::new_double_pawn(sq("e2"), sq("e4"))).unwrap();
        assert_eq!(position.en_passant_target(), Some(sq("e3")));
        assert_eq!(position.side_to_move(), Color::Black);
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.fullmove_number(), 1);

        position.make_move(Move::new_double_pawn(sq("d7"), sq("d5"))).unwrap();
        assert_eq!(position.en_passant_target(), Some(sq("d6")));
        assert_eq!(position.fullmove_number(), 2);
        assert_eq!(position.hash(), position.compute_hash());
        assert_eq!(
            position.to_fen(),
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2"
        );
    }

    #[test]
    fn make_then_unmake_is_identity() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let before = position.clone();
        let moves = [
            Move::new_kingside_castle(Color::White),
            Move::new_normal(sq("e7"), sq("d8")),
            Move::new_normal(sq("f3"), sq("h3")),
            Move::new_normal(sq("a6"), sq("e2")),
        ];
        for mv in moves {
            position.make_move(mv).unwrap();
            assert_eq!(position.hash(), position.compute_hash());
        }
        for mv in moves.iter().rev() {
            position.unmake_move(*mv).unwrap();
        }
        assert_eq!(position, before);
    }

    #[test]
    fn castling_moves_the_rook_and_clears_rights() {
        let mut position =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 3 10").unwrap();
        position.make_move(Move::new_queenside_castle(Color::White)).unwrap();
        assert_eq!(
            position.board().get(sq("d1")),
            Some(Piece::new(Color::White, PieceType::Rook))
        );
        assert_eq!(position.board().get(sq("a1")), None);
        assert_eq!(
            position.castling_rights(),
            CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE
        );
        assert_eq!(position.halfmove_clock(), 4);

        // capturing the h1 rook in place removes white's kingside right, already gone here,
        // and moving the h8 rook removes black's kingside right
        position.make_move(Move::new_normal(sq("h8"), sq("h1"))).unwrap();
        assert_eq!(position.castling_rights(), CastlingRights::BLACK_QUEENSIDE);
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.hash(), position.compute_hash());
    }

    #[test]
    fn en_passant_capture_and_restore() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let mut position = Position::from_fen(fen).unwrap();
        let mv = Move::new_en_passant(sq("e5"), sq("f6"));
        position.make_move(mv).unwrap();
        assert_eq!(position.board().get(sq("f5")), None);
        assert_eq!(position.hash(), position.compute_hash());
        position.unmake_move(mv).unwrap();
        assert_eq!(position.to_fen(), fen);
        assert_eq!(
            position.board().get(sq("f5")),
            Some(Piece::new(Color::Black, PieceType::Pawn))
        );
    }

    #[test]
    fn promotion_unmakes_to_a_pawn() {
        let fen = "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let mut position = Position::from_fen(fen).unwrap();
        let mv = Move::new_promotion(sq("a7"), sq("b8"), PieceType::Knight);
        assert!(position.is_noisy(mv));
        {
            let promoted = position.play(mv).unwrap();
            assert_eq!(
                promoted.board().get(sq("b8")),
                Some(Piece::new(Color::White, PieceType::Knight))
            );
            assert_eq!(promoted.board().material(Color::Black), 0);
        }
        assert_eq!(position.to_fen(), fen);
        assert_eq!(position.history_len(), 0);
    }

    #[test]
    fn contract_violations() {
        let mut position = Position::initial();
        assert_eq!(
            position.make_move(Move::new_normal(sq("e4"), sq("e5"))),
            Err(ChessError::EmptyOrigin { square: sq("e4") })
        );
        assert_eq!(
            position.unmake_move(Move::new_normal(sq("g1"), sq("f3"))),
            Err(ChessError::EmptyHistory)
        );
        position.make_move(Move::new_normal(sq("g1"), sq("f3"))).unwrap();
        assert!(matches!(
            position.unmake_move(Move::new_normal(sq("b1"), sq("c3"))),
            Err(ChessError::UnmakeMismatch(_))
        ));
        assert_eq!(position.last_move(), Some(Move::new_normal(sq("g1"), sq("f3"))));
    }

    #[test]
    fn transpositions_share_a_hash_and_count_repetitions() {
        let mut position = Position::initial();
        let shuffle = [
            Move::new_normal(sq("g1"), sq("f3")),
            Move::new_normal(sq("g8"), sq("f6")),
            Move::new_normal(sq("f3"), sq("g1")),
            Move::new_normal(sq("f6"), sq("g8")),
        ];
        for mv in shuffle {
            position.make_move(mv).unwrap();
        }
        assert_eq!(position.hash(), Position::initial().hash());
        assert_eq!(position.repetition_count(), 2);
        for mv in shuffle {
            position.make_move(mv).unwrap();
        }
        assert_eq!(position.repetition_count(), 3);

        // a copy forgets how it got there
        let snapshot = position.copy();
        assert_eq!(snapshot.repetition_count(), 1);
        assert_eq!(snapshot.hash(), position.hash());
        assert_eq!(snapshot.history_len(), 0);
    }

    #[test]
    fn same_placement_by_different_move_orders() {
        let mut a = Position::initial();
        let mut b = Position::initial();
        for mv in [
            Move::new_normal(sq("g1"), sq("f3")),
            Move::new_normal(sq("b8"), sq("c6")),
            Move::new_normal(sq("b1"), sq("c3")),
        ] {
            a.make_move(mv).unwrap();
        }
        for mv in [
            Move::new_normal(sq("b1"), sq("c3")),
            Move::new_normal(sq("b8"), sq("c6")),
            Move::new_normal(sq("g1"), sq("f3")),
        ] {
            b.make_move(mv).unwrap();
        }
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.to_fen(), b.to_fen());
    }

    #[test]
    fn constructor_rejects_missing_kings() {
        let mut board = Board::initial();
        board.set(60, None);
        assert_eq!(
            Position::new(board, Color::White, CastlingRights::NONE, None, 0, 1),
            Err(ChessError::MissingKing { color: Color::Black, count: 0 })
        );
        assert_eq!(
            Position::new(Board::initial(), Color::White, CastlingRights::ALL, Some(sq("e3")), 0, 1),
            Err(ChessError::InvalidEnPassant { square: sq("e3") })
        );
        let position = Position::new(
            Board::initial(),
            Color::White,
            CastlingRights::ALL,
            None,
            0,
            1,
        )
        .unwrap();
        assert_eq!(position, Position::initial());
    }
}
