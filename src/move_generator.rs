use crate::{
    bitboard::Bitboard,
    castling::CastlingRights,
    error::ChessError,
    movelist::MoveList,
    piece::{Color, Piece, PieceType},
    position::Position,
    r#move::Move,
    square::{rank_of, Square},
};

#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Eq)]
pub enum GenType {
    Legal,
    /// Captures, en passant and promotions
    Noisy,
}

struct MoveGenInfo {
    pub move_list: MoveList,
    pub side: Color,
    pub occupancy: Bitboard,
    pub opponents: Bitboard,
    pub push_targets: Bitboard,
}

/// Generates the legal moves of the given kind for the side to move
pub fn generate(position: &mut Position, gen_type: GenType) -> Result<MoveList, ChessError> {
    let pseudo_legal = match gen_type {
        GenType::Legal => pseudo_legal_moves(position),
        GenType::Noisy => pseudo_legal_noisy_moves(position),
    };
    retain_legal(position, pseudo_legal)
}

/// Every move that does not leave the mover's king in check
pub fn legal_moves(position: &mut Position) -> Result<MoveList, ChessError> {
    generate(position, GenType::Legal)
}

/// Moves that follow piece movement rules, ignoring whether the mover's king
/// is left in check
pub fn pseudo_legal_moves(position: &Position) -> MoveList {
    pseudo_legal(position, !position.board().occupancy())
}

fn pseudo_legal_noisy_moves(position: &Position) -> MoveList {
    pseudo_legal(position, Bitboard::EMPTY)
}

/// Legality via simulation: play each move, keep it if the mover is not in check afterwards
fn retain_legal(position: &mut Position, moves: MoveList) -> Result<MoveList, ChessError> {
    let side = position.side_to_move();
    let mut legal = MoveList::default();
    for mv in moves {
        let after = position.play(mv)?;
        if !after.is_in_check(side)? {
            legal.push(mv);
        }
    }
    Ok(legal)
}

/// Resolves UCI move text to a legal move of the position, `None` if it is not legal
pub fn find_legal_move(position: &mut Position, text: &str) -> Result<Option<Move>, ChessError> {
    let (origin, target, promotion) =
        Move::parse(text).ok_or_else(|| ChessError::MalformedMove(text.to_string()))?;
    Ok(legal_moves(position)?
        .into_iter()
        .find(|m| m.origin() == origin && m.target() == target && m.promotion() == promotion))
}

// Quiet targets are restricted to `push_targets`, captures are always generated
fn pseudo_legal(position: &Position, push_targets: Bitboard) -> MoveList {
    let board = position.board();
    let side = position.side_to_move();
    let mut info = MoveGenInfo {
        move_list: MoveList::default(),
        side,
        occupancy: board.occupancy(),
        opponents: board.color_bitboard(side.opposite()),
        push_targets,
    };

    for origin in board.pieces_bitboard(side, PieceType::Pawn) {
        pawn_moves(position, origin, &mut info);
    }
    for origin in board.pieces_bitboard(side, PieceType::Knight) {
        add_moves(origin, Bitboard::KNIGHT_ATTACKS[origin], &mut info);
    }
    for origin in board.pieces_bitboard(side, PieceType::Bishop) {
        slider_moves(origin, &Bitboard::DIAGONAL_DIRECTIONS, &mut info);
    }
    for origin in board.pieces_bitboard(side, PieceType::Rook) {
        slider_moves(origin, &Bitboard::CARDINAL_DIRECTIONS, &mut info);
    }
    for origin in board.pieces_bitboard(side, PieceType::Queen) {
        slider_moves(origin, &Bitboard::DIAGONAL_DIRECTIONS, &mut info);
        slider_moves(origin, &Bitboard::CARDINAL_DIRECTIONS, &mut info);
    }
    for origin in board.pieces_bitboard(side, PieceType::King) {
        add_moves(origin, Bitboard::KING_ATTACKS[origin], &mut info);
    }
    if !push_targets.is_empty() {
        castling(position, &mut info);
    }

    info.move_list
}

fn add_moves(origin: Square, targets: Bitboard, info: &mut MoveGenInfo) {
    for target in targets & (info.opponents | info.push_targets) {
        info.move_list.push(Move::new_normal(origin, target))
    }
}

// Each ray is walked up to and including its first occupied square,
// which is kept only if it holds an opponent piece
fn slider_moves(origin: Square, directions: &[usize], info: &mut MoveGenInfo) {
    for &direction in directions {
        add_moves(
            origin,
            Bitboard::ray_attacks(direction, origin, info.occupancy),
            info,
        );
    }
}

fn pawn_moves(position: &Position, origin: Square, info: &mut MoveGenInfo) {
    let (forward, home_rank, last_rank): (isize, usize, usize) = match info.side {
        Color::White => (8, 1, 7),
        Color::Black => (-8, 6, 0),
    };
    let single = origin as isize + forward;
    if !(0..64).contains(&single) {
        return;
    }
    let single = single as Square;
    let promotes = rank_of(single) == last_rank;

    if !info.occupancy.is_set(single) {
        if promotes {
            info.move_list.extend(Move::all_promotions(origin, single));
        } else if info.push_targets.is_set(single) {
            info.move_list.push(Move::new_normal(origin, single));
            if rank_of(origin) == home_rank {
                let double = (single as isize + forward) as Square;
                if !info.occupancy.is_set(double) {
                    info.move_list.push(Move::new_double_pawn(origin, double));
                }
            }
        }
    }

    let attacks = Bitboard::pawn_attacks(origin, info.side);
    for target in attacks & info.opponents {
        if promotes {
            info.move_list.extend(Move::all_promotions(origin, target));
        } else {
            info.move_list.push(Move::new_normal(origin, target));
        }
    }
    if let Some(ep_target) = position.en_passant_target() {
        if attacks.is_set(ep_target) {
            info.move_list.push(Move::new_en_passant(origin, ep_target));
        }
    }
}

// Only offered from the standard king square, with the rook still on its corner.
// The landing square is left to the legality check.
fn castling(position: &Position, info: &mut MoveGenInfo) {
    let board = position.board();
    let side = info.side;
    let opponent = side.opposite();
    let rights = position.castling_rights();
    let king_square: Square = match side {
        Color::White => 4,
        Color::Black => 60,
    };
    if board.get(king_square) != Some(Piece::new(side, PieceType::King))
        || board.is_square_attacked(king_square, opponent)
    {
        return;
    }
    let rook = Some(Piece::new(side, PieceType::Rook));
    let occupancy = info.occupancy;
    let empty = |squares: &[Square]| squares.iter().all(|&sq| !occupancy.is_set(sq));

    if rights.contains(CastlingRights::kingside(side))
        && board.get(king_square + 3) == rook
        && empty(&[king_square + 1, king_square + 2])
        && !board.is_square_attacked(king_square + 1, opponent)
    {
        info.move_list.push(Move::new_kingside_castle(side));
    }
    if rights.contains(CastlingRights::queenside(side))
        && board.get(king_square - 4) == rook
        && empty(&[king_square - 1, king_square - 2, king_square - 3])
        && !board.is_square_attacked(king_square - 1, opponent)
    {
        info.move_list.push(Move::new_queenside_castle(side));
    }
}

#[cfg(test)]
mod perft_tests {
    use crate::perft;
    use crate::position::Position;

    // Depths are kept low enough for the whole table to run in a few seconds,
    // the positions are varied enough to cover every kind of move by then
    const TEST_POSITIONS: [(&str, &[u64]); 7] = [
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            &[20, 400, 8902, 197281],
        ),
        (
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            &[48, 2039, 97862],
        ),
        (
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            &[14, 191, 2812, 43238],
        ),
        (
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            &[6, 264, 9467],
        ),
        (
            "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
            &[6, 264, 9467],
        ),
        (
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            &[44, 1486, 62379],
        ),
        (
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            &[46, 2079, 89890],
        ),
    ];

    #[test]
    fn perft_verification() {
        for (fen, results) in TEST_POSITIONS {
            let mut position = Position::from_fen(fen).unwrap();
            for (d, expected) in results.iter().enumerate() {
                assert_eq!(*expected, perft(&mut position, d + 1).unwrap(), "{} at depth {}", fen, d + 1);
            }
            assert_eq!(position.to_fen(), fen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r#move::MoveFlag;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn legal_texts(fen: &str) -> Vec<String> {
        let mut position = Position::from_fen(fen).unwrap();
        let mut moves: Vec<String> = legal_moves(&mut position)
            .unwrap()
            .iter()
            .map(|m| m.to_string())
            .collect();
        moves.sort();
        moves
    }

    #[test]
    fn promotions_fan_out_in_order() {
        let mut position = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let promotions: Vec<String> = legal_moves(&mut position)
            .unwrap()
            .iter()
            .filter(|m| m.promotion().is_some())
            .map(|m| m.to_string())
            .collect();
        assert_eq!(promotions, vec!["b7b8q", "b7b8r", "b7b8b", "b7b8n"]);
    }

    #[test]
    fn en_passant_follows_the_stored_target() {
        let with_target = legal_texts("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        assert!(with_target.contains(&String::from("e5d6")));
        let without_target = legal_texts("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 2");
        assert!(!without_target.contains(&String::from("e5d6")));
    }

    #[test]
    fn en_passant_cannot_expose_the_king() {
        // capturing would clear the fifth rank between the king and the rook
        let moves = legal_texts("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2");
        assert!(!moves.contains(&String::from("b5c6")));
    }

    #[test]
    fn castling_conditions() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let moves = legal_texts(fen);
        assert!(moves.contains(&String::from("e1g1")));
        assert!(moves.contains(&String::from("e1c1")));

        // f1 attacked by the rook on f8: no kingside castle, queenside still fine
        let moves = legal_texts("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1");
        assert!(!moves.contains(&String::from("e1g1")));
        assert!(moves.contains(&String::from("e1c1")));

        // b1 occupied blocks queenside castling even though the king never crosses it
        let moves = legal_texts("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1");
        assert!(!moves.contains(&String::from("e1c1")));

        // in check: no castling at all
        let moves = legal_texts("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1");
        assert!(!moves.iter().any(|m| m == "e1g1" || m == "e1c1"));

        // no right, no castle
        let mut position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1").unwrap();
        assert!(!position.castling_rights().contains(CastlingRights::WHITE_KINGSIDE));
        let moves = legal_moves(&mut position).unwrap();
        assert!(!moves.iter().any(|m| m.flag() == MoveFlag::CastleKingside));
    }

    #[test]
    fn noisy_moves_are_captures_and_promotions() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let noisy = generate(&mut position, GenType::Noisy).unwrap();
        let legal = legal_moves(&mut position).unwrap();
        let expected: Vec<Move> = legal.iter().copied().filter(|m| position.is_noisy(*m)).collect();
        assert_eq!(noisy.len(), expected.len());
        assert!(noisy.iter().all(|m| expected.contains(m)));
        assert_eq!(noisy.len(), 8);
    }

    #[test]
    fn find_legal_move_resolves_text() {
        let mut position = Position::initial();
        let mv = find_legal_move(&mut position, "e2e4").unwrap();
        assert_eq!(mv, Some(Move::new_double_pawn(12, 28)));
        assert_eq!(find_legal_move(&mut position, "e2e5").unwrap(), None);
        assert_eq!(
            find_legal_move(&mut position, "zz"),
            Err(ChessError::MalformedMove(String::from("zz")))
        );
    }

    #[test]
    fn every_legal_move_unmakes_cleanly() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        ] {
            let mut position = Position::from_fen(fen).unwrap();
            let before = position.clone();
            for mv in legal_moves(&mut position).unwrap() {
                position.make_move(mv).unwrap();
                assert_eq!(position.hash(), position.compute_hash(), "after {}", mv);
                position.unmake_move(mv).unwrap();
                assert_eq!(position, before, "after unmaking {}", mv);
                assert_eq!(position.to_fen(), fen);
            }
        }
    }

    #[test]
    fn random_walks_keep_the_incremental_hash_exact() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..20 {
            let mut position = Position::initial();
            let start = position.clone();
            let mut played = Vec::new();
            for _ in 0..80 {
                let moves = legal_moves(&mut position).unwrap();
                if moves.is_empty() {
                    break;
                }
                let mv = moves.get(rng.gen_range(0..moves.len())).copied().unwrap();
                position.make_move(mv).unwrap();
                assert_eq!(position.hash(), position.compute_hash());
                played.push(mv);
            }
            for mv in played.into_iter().rev() {
                position.unmake_move(mv).unwrap();
            }
            assert_eq!(position, start);
        }
    }
}
