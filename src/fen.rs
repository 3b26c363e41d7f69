use crate::board::Board;
use crate::castling::CastlingRights;
use crate::error::{ChessError, FenError};
use crate::piece::{Color, Piece};
use crate::position::Position;
use crate::square::{parse_square, rank_of, square_representation};
use std::str::FromStr;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// Parses the 6 FEN fields. Fields are separated by any amount of whitespace.
    pub fn from_fen(fen: &str) -> Result<Position, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()).into());
        }

        let board = parse_placement(fields[0])?;
        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            s => return Err(FenError::SideToMove(s.to_string()).into()),
        };
        let castling_rights = fields[2].parse::<CastlingRights>()?;
        let ep_target = match fields[3] {
            "-" => None,
            s => {
                let sq = parse_square(s)
                    .filter(|&sq| s.len() == 2 && matches!(rank_of(sq), 2 | 5))
                    .ok_or_else(|| FenError::EnPassant(s.to_string()))?;
                Some(sq)
            }
        };
        let halfmove_clock = fields[4]
            .parse::<u32>()
            .map_err(|_| FenError::Clock(fields[4].to_string()))?;
        let fullmove_number = fields[5]
            .parse::<u32>()
            .map_err(|_| FenError::Clock(fields[5].to_string()))?;

        Position::new(
            board,
            side_to_move,
            castling_rights,
            ep_target,
            halfmove_clock,
            fullmove_number,
        )
        .map_err(|e| match e {
            ChessError::InvalidEnPassant { .. } => FenError::EnPassant(fields[3].to_string()).into(),
            e => e,
        })
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty_counter = 0;
            for file in 0..8 {
                match self.board().get(rank * 8 + file) {
                    Some(p) => {
                        if empty_counter != 0 {
                            fen.push_str(&empty_counter.to_string());
                            empty_counter = 0;
                        }
                        fen.push_str(&p.to_string());
                    }
                    None => empty_counter += 1,
                }
            }
            if empty_counter != 0 {
                fen.push_str(&empty_counter.to_string());
            }
            if rank != 0 {
                fen.push('/');
            }
        }

        let ep = self
            .en_passant_target()
            .and_then(square_representation)
            .unwrap_or_else(|| String::from("-"));
        format!(
            "{} {} {} {} {} {}",
            fen,
            self.side_to_move(),
            self.castling_rights(),
            ep,
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

/// Rows go from rank 8 down to rank 1, each must describe exactly 8 files
fn parse_placement(placement: &str) -> Result<Board, FenError> {
    let error = || FenError::PiecePlacement(placement.to_string());
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(error());
    }

    let mut board = Board::new();
    for (i, row) in rows.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0;
        for c in row.chars() {
            match c {
                '1'..='8' => file += c as usize - '0' as usize,
                _ => {
                    let piece = Piece::from_char(c).ok_or_else(error)?;
                    if file >= 8 {
                        return Err(error());
                    }
                    board.set(rank * 8 + file, Some(piece));
                    file += 1;
                }
            }
            if file > 8 {
                return Err(error());
            }
        }
        if file != 8 {
            return Err(error());
        }
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_round_trip() {
        let position = Position::from_fen(STARTING_FEN).unwrap();
        assert_eq!(position, Position::initial());
        assert_eq!(position.to_fen(), STARTING_FEN);
    }

    #[test]
    fn round_trips() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w Kq d6 0 2",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ] {
            assert_eq!(fen.parse::<Position>().unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        let cases = [
            ("8/8/8/8/8/8/8/8 w - - 0", FenError::FieldCount(5)),
            (
                "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                FenError::PiecePlacement("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR".into()),
            ),
            (
                "rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                FenError::PiecePlacement("rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR".into()),
            ),
            (
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
                FenError::SideToMove("x".into()),
            ),
            (
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1",
                FenError::Castling("KQxq".into()),
            ),
            (
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
                FenError::EnPassant("e4".into()),
            ),
            // rank 3 target with White to move, nothing was pushed
            ("4k3/8/8/8/8/8/3PN3/4K3 w - e3 0 1", FenError::EnPassant("e3".into())),
            // right rank but no black pawn on d5
            ("4k3/8/8/8/8/8/8/4K3 w - d6 0 1", FenError::EnPassant("d6".into())),
            // the pushed pawn could not have come through an occupied d7
            ("4k3/3p4/8/3pP3/8/8/8/4K3 w - d6 0 2", FenError::EnPassant("d6".into())),
            // a target behind a white pawn only makes sense with Black to move
            ("4k3/8/8/8/4P3/8/8/4K3 w - e3 0 1", FenError::EnPassant("e3".into())),
            (
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - -1 1",
                FenError::Clock("-1".into()),
            ),
        ];
        for (fen, expected) in cases {
            assert_eq!(Position::from_fen(fen), Err(ChessError::Fen(expected)));
        }
        assert!(Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").is_ok());
    }

    #[test]
    fn rejects_positions_without_kings() {
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(ChessError::MissingKing { color: Color::Black, .. })
        ));
    }
}
