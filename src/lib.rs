pub mod bitboard;
pub mod board;
pub mod castling;
pub mod error;
pub mod evaluation;
pub mod fen;
pub mod history;
pub mod r#move;
pub mod move_generator;
pub mod move_ordering;
pub mod movelist;
pub mod piece;
pub mod position;
pub mod rules;
pub mod search;
pub mod square;
pub mod transposition_table;
pub mod uci;
pub mod zobrist;

pub use crate::error::{ChessError, FenError};
pub use crate::move_generator::{generate, legal_moves, GenType};
pub use crate::movelist::MoveList;
pub use crate::piece::{Color, Piece, PieceType};
pub use crate::position::{MoveGuard, Position};
pub use crate::r#move::Move;
pub use crate::search::{Engine, SearchBackend, SearchLimits, SearchResult};
pub use crate::square::Square;

/// Number of leaf nodes of the legal move tree `depth` plies deep
pub fn perft(position: &mut Position, depth: usize) -> Result<u64, ChessError> {
    if depth == 0 {
        return Ok(1);
    }
    let moves = legal_moves(position)?;
    if depth == 1 {
        return Ok(moves.len() as u64);
    }

    let mut nodes = 0;
    for mv in &moves {
        let mut child = position.play(*mv)?;
        nodes += perft(&mut child, depth - 1)?;
    }
    Ok(nodes)
}

/// Perft count below each legal root move
pub fn perft_divide(position: &mut Position, depth: usize) -> Result<Vec<(Move, u64)>, ChessError> {
    let moves = legal_moves(position)?;
    let mut counts = Vec::with_capacity(moves.len());
    for mv in &moves {
        let mut child = position.play(*mv)?;
        counts.push((*mv, perft(&mut child, depth.saturating_sub(1))?));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_adds_up_to_perft() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let divided = perft_divide(&mut position, 2).unwrap();
        assert_eq!(divided.len(), 48);
        assert_eq!(divided.iter().map(|(_, n)| n).sum::<u64>(), 2039);

        let castle = divided
            .iter()
            .find(|(mv, _)| mv.to_string() == "e1g1")
            .unwrap();
        assert!(castle.1 > 0);
        assert_eq!(perft(&mut position, 0).unwrap(), 1);
    }
}
