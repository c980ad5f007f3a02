//! Outcome classification of a single exported position

use cozy_chess::{Board, Color};

/// Game result implied by a recorded position, from white's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    WhiteWins,
    BlackWins,
    /// Draws, unfinished games and lines that do not parse
    Undecided,
}

impl Outcome {
    /// Bracketed tag appended to an annotated line
    pub fn tag(self) -> &'static str {
        match self {
            Outcome::WhiteWins => "[1.0]",
            Outcome::BlackWins => "[0.0]",
            Outcome::Undecided => "[0.5]",
        }
    }
}

/// Parse a FEN or EPD line into a board.
///
/// EPD records carry no move counters, so `0 1` is supplied for them and
/// any trailing opcodes (`hmvc 0; fmvn 1;`, `bm e4;`) are ignored.
pub fn parse_position(line: &str) -> Option<Board> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }
    let numeric = |field: &str| field.parse::<u32>().is_ok();

    let fen = if fields.len() >= 6 && numeric(fields[4]) && numeric(fields[5]) {
        fields[..6].join(" ")
    } else if fields.len() == 4 || !numeric(fields[4]) {
        format!("{} 0 1", fields[..4].join(" "))
    } else {
        return None;
    };
    Board::from_fen(&fen, false).ok()
}

/// True when the side to move has no legal move while in check
pub fn is_checkmate(board: &Board) -> bool {
    if board.checkers().is_empty() {
        return false;
    }
    let mut has_legal = false;
    board.generate_moves(|moves| {
        if moves.into_iter().next().is_some() {
            has_legal = true;
        }
        has_legal
    });
    !has_legal
}

/// Classify a recorded position.
///
/// Only checkmate is decisive. The side to move is the mated side, so
/// white to move loses and black to move means white delivered mate.
/// Stalemate and other drawn endings stay undecided in this pass.
pub fn classify(line: &str) -> Outcome {
    let Some(board) = parse_position(line) else {
        tracing::warn!(line, "could not parse exported position");
        return Outcome::Undecided;
    };

    if !is_checkmate(&board) {
        return Outcome::Undecided;
    }

    match board.side_to_move() {
        Color::White => Outcome::BlackWins,
        Color::Black => Outcome::WhiteWins,
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod outcome_tests;
