use crate::error::ChessError;
use crate::move_generator::legal_moves;
use crate::piece::{Color, PieceType};
use crate::position::Position;
use crate::square::is_light_square;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameResult {
    InProgress,
    WhiteWins,
    BlackWins,
    Draw,
}

impl Display for GameResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GameResult::InProgress => "*",
                GameResult::WhiteWins => "1-0",
                GameResult::BlackWins => "0-1",
                GameResult::Draw => "1/2-1/2",
            }
        )
    }
}

fn has_legal_move(position: &mut Position) -> Result<bool, ChessError> {
    Ok(!legal_moves(position)?.is_empty())
}

pub fn is_checkmate(position: &mut Position) -> Result<bool, ChessError> {
    Ok(position.is_in_check(position.side_to_move())? && !has_legal_move(position)?)
}

pub fn is_stalemate(position: &mut Position) -> Result<bool, ChessError> {
    Ok(!position.is_in_check(position.side_to_move())? && !has_legal_move(position)?)
}

/// K vs K, K and a single minor piece vs K, or K+B vs K+B with both bishops
/// on the same square color
pub fn is_insufficient_material(position: &Position) -> bool {
    let board = position.board();
    let count = |color: Color, piece_type: PieceType| board.pieces_bitboard(color, piece_type).pop_count();
    let heavy_or_pawns = Color::ALL.iter().any(|&color| {
        [PieceType::Pawn, PieceType::Rook, PieceType::Queen]
            .iter()
            .any(|&piece_type| count(color, piece_type) != 0)
    });
    if heavy_or_pawns {
        return false;
    }

    let knights = count(Color::White, PieceType::Knight) + count(Color::Black, PieceType::Knight);
    let white_bishops = board.pieces_bitboard(Color::White, PieceType::Bishop);
    let black_bishops = board.pieces_bitboard(Color::Black, PieceType::Bishop);
    match (knights, white_bishops.pop_count(), black_bishops.pop_count()) {
        (0, 0, 0) | (1, 0, 0) | (0, 1, 0) | (0, 0, 1) => true,
        (0, 1, 1) => match (white_bishops.ls1b(), black_bishops.ls1b()) {
            (Some(w), Some(b)) => is_light_square(w) == is_light_square(b),
            _ => false,
        },
        _ => false,
    }
}

pub fn is_fifty_move_rule(position: &Position) -> bool {
    position.halfmove_clock() >= 100
}

pub fn is_seventy_five_move_rule(position: &Position) -> bool {
    position.halfmove_clock() >= 150
}

pub fn is_threefold_repetition(position: &Position) -> bool {
    position.repetition_count() >= 3
}

pub fn is_fivefold_repetition(position: &Position) -> bool {
    position.repetition_count() >= 5
}

/// Draws a player may claim, the game goes on otherwise
pub fn is_claimable_draw(position: &Position) -> bool {
    is_fifty_move_rule(position) || is_threefold_repetition(position)
}

/// Draws that end the game without any claim
pub fn is_automatic_draw(position: &Position) -> bool {
    is_seventy_five_move_rule(position) || is_fivefold_repetition(position)
}

/// Automatic draws come first, then checkmate, stalemate and insufficient material.
/// Claimable draws leave the game in progress.
pub fn game_result(position: &mut Position) -> Result<GameResult, ChessError> {
    if is_automatic_draw(position) {
        return Ok(GameResult::Draw);
    }
    if !has_legal_move(position)? {
        if position.is_in_check(position.side_to_move())? {
            return Ok(match position.side_to_move() {
                Color::White => GameResult::BlackWins,
                Color::Black => GameResult::WhiteWins,
            });
        }
        return Ok(GameResult::Draw);
    }
    if is_insufficient_material(position) {
        return Ok(GameResult::Draw);
    }
    Ok(GameResult::InProgress)
}
