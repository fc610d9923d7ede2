// =============================================================================
// Piece rules and legal move generation
//
// Each piece kind has a pair of predicates, `might_move` (pseudo-legal
// geometry) and `attacks` (squares it threatens), looked up in RULES by kind.
// Both share the base rule that a piece never lands on its own side.
//
// Legality is decided by make/unmake: a pseudo-legal candidate is applied to
// the board, the mover's king is tested for check, and the move is taken back.
//
// Coordinate system: square 0 = a8, square 63 = h1. White pawns advance
// toward lower rank indices.
// =============================================================================

use crate::board::{Board, Square, E1, E8, SQUARE_COUNT};
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType, Promotion};

type Predicate = fn(&Board, Piece, Square, Square) -> bool;

struct Rule {
    might_move: Predicate,
    attacks: Predicate,
}

/// Indexed by `PieceType::index`.
const RULES: [Rule; 6] = [
    Rule {
        might_move: king_geometry,
        attacks: king_geometry,
    },
    Rule {
        might_move: queen_geometry,
        attacks: queen_geometry,
    },
    Rule {
        might_move: rook_geometry,
        attacks: rook_geometry,
    },
    Rule {
        might_move: bishop_geometry,
        attacks: bishop_geometry,
    },
    Rule {
        might_move: knight_geometry,
        attacks: knight_geometry,
    },
    Rule {
        might_move: pawn_moves,
        attacks: pawn_attacks,
    },
];

fn rule(piece: Piece) -> &'static Rule {
    &RULES[piece.piece_type.index()]
}

/// The piece may go from `from` to `to` and `to` is empty or holds an
/// opposing piece.
fn lands_legally(board: &Board, piece: Piece, from: Square, to: Square) -> bool {
    from != to && board.piece_at(to).map_or(true, |p| p.color != piece.color)
}

/// Pseudo-legal move test; ignores the safety of the mover's own king and
/// does not cover castling.
pub fn might_move(board: &Board, from: Square, to: Square) -> bool {
    match board.piece_at(from) {
        Some(piece) => {
            lands_legally(board, piece, from, to) && (rule(piece).might_move)(board, piece, from, to)
        }
        None => false,
    }
}

/// True if the piece on `from` threatens `to`. Same as `might_move` except
/// for pawns, which threaten both forward diagonals whether occupied or not.
pub fn attacks(board: &Board, from: Square, to: Square) -> bool {
    match board.piece_at(from) {
        Some(piece) => {
            lands_legally(board, piece, from, to) && (rule(piece).attacks)(board, piece, from, to)
        }
        None => false,
    }
}

// =============================================================================
// Geometry per kind
// =============================================================================

fn deltas(from: Square, to: Square) -> (i32, i32) {
    (
        Board::rank(to) as i32 - Board::rank(from) as i32,
        Board::file(to) as i32 - Board::file(from) as i32,
    )
}

fn king_geometry(_: &Board, _: Piece, from: Square, to: Square) -> bool {
    let (dr, df) = deltas(from, to);
    dr.abs().max(df.abs()) == 1
}

fn queen_geometry(board: &Board, piece: Piece, from: Square, to: Square) -> bool {
    rook_geometry(board, piece, from, to) || bishop_geometry(board, piece, from, to)
}

fn rook_geometry(board: &Board, _: Piece, from: Square, to: Square) -> bool {
    let (dr, df) = deltas(from, to);
    (dr == 0 || df == 0) && board.is_path_clear(from, to)
}

fn bishop_geometry(board: &Board, _: Piece, from: Square, to: Square) -> bool {
    let (dr, df) = deltas(from, to);
    dr.abs() == df.abs() && board.is_path_clear(from, to)
}

fn knight_geometry(_: &Board, _: Piece, from: Square, to: Square) -> bool {
    let (dr, df) = deltas(from, to);
    matches!((dr.abs(), df.abs()), (1, 2) | (2, 1))
}

/// Rank step of a pawn of `color`.
fn forward(color: Color) -> i32 {
    match color {
        Color::White => -1,
        Color::Black => 1,
    }
}

fn pawn_start_rank(color: Color) -> usize {
    match color {
        Color::White => 6,
        Color::Black => 1,
    }
}

fn promotion_rank(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 7,
    }
}

fn pawn_moves(board: &Board, pawn: Piece, from: Square, to: Square) -> bool {
    let dir = forward(pawn.color);
    let (dr, df) = deltas(from, to);

    if df == 0 {
        if dr == dir {
            return board.piece_at(to).is_none();
        }
        if dr == 2 * dir && Board::rank(from) == pawn_start_rank(pawn.color) {
            let skipped = (from + to) / 2;
            return board.piece_at(skipped).is_none() && board.piece_at(to).is_none();
        }
        return false;
    }

    if df.abs() == 1 && dr == dir {
        return match board.piece_at(to) {
            Some(target) => target.color != pawn.color,
            None => board.status().en_passant == Some(to),
        };
    }
    false
}

fn pawn_attacks(_: &Board, pawn: Piece, from: Square, to: Square) -> bool {
    let (dr, df) = deltas(from, to);
    dr == forward(pawn.color) && df.abs() == 1
}

// =============================================================================
// Castling
// =============================================================================

fn king_home(color: Color) -> Square {
    match color {
        Color::White => E1,
        Color::Black => E8,
    }
}

/// Builds the castling move for a king on its home square heading two files
/// toward either rook, if the right is held and the path is empty and safe.
fn castling_move(board: &Board, king: Piece, from: Square, to: Square) -> Option<Move> {
    let home = king_home(king.color);
    if from != home {
        return None;
    }
    let rights = board.status().castling;

    let (rook_from, rook_to, mut between) = if to == home + 2 && rights.short(king.color) {
        (home + 3, home + 1, home + 1..=home + 2)
    } else if to + 2 == home && rights.long(king.color) {
        (home - 4, home - 1, home - 3..=home - 1)
    } else {
        return None;
    };

    if board.piece_at(rook_from) != Some(Piece::new(PieceType::Rook, king.color)) {
        return None;
    }
    if between.any(|sq| board.piece_at(sq).is_some()) {
        return None;
    }

    // start, transit and destination squares
    let transit = (from + to) / 2;
    let enemy = king.color.opposite();
    if [from, transit, to]
        .iter()
        .any(|&sq| board.is_attacked(sq, enemy))
    {
        return None;
    }

    Some(Move::castling(board, king, from, to, rook_from, rook_to))
}

// =============================================================================
// Legal move generation
// =============================================================================

/// Builds the legal move from `from` to `to`, or `None` if there is none.
///
/// The candidate is applied to `board` and taken back before returning, so
/// the board is observably unchanged afterwards.
pub fn generate_move(board: &mut Board, from: Square, to: Square) -> Option<Move> {
    let piece = board.piece_at(from)?;

    let candidate = if might_move(board, from, to) {
        if piece.piece_type == PieceType::Pawn && Board::rank(to) == promotion_rank(piece.color) {
            Move::promoting(board, piece, from, to)
        } else {
            Move::simple(board, piece, from, to)
        }
    } else if piece.piece_type == PieceType::King {
        castling_move(board, piece, from, to)?
    } else {
        return None;
    };

    candidate.apply_resolved(board);
    let exposed = board.king_in_check(piece.color);
    candidate.undo(board);

    if exposed {
        None
    } else {
        Some(candidate)
    }
}

/// Every legal move for the side to move, in square order.
pub fn legal_moves(board: &mut Board) -> Vec<Move> {
    let mut moves = Vec::new();
    for from in 0..SQUARE_COUNT {
        if !board.is_side_to_move_piece(from) {
            continue;
        }
        for to in 0..SQUARE_COUNT {
            if let Some(mv) = generate_move(board, from, to) {
                moves.push(mv);
            }
        }
    }
    moves
}

/// Counts leaf positions `depth` plies ahead. A promotion counts once per
/// promotion kind.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let promotions = Promotion::ALL.map(Some);
    let mut nodes = 0;
    for mv in legal_moves(board) {
        let choices: &[Option<Promotion>] = if mv.is_promotion() {
            &promotions
        } else {
            &[None]
        };
        for &choice in choices {
            let mut mv = mv.clone();
            mv.resolve(choice);
            mv.apply_resolved(board);
            nodes += if depth == 1 { 1 } else { perft(board, depth - 1) };
            mv.undo(board);
        }
    }
    nodes
}
