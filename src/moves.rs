use serde::Serialize;

use crate::board::{Board, BoardStatus, Square};
use crate::error::GameError;
use crate::piece::{Color, Piece, PieceType, Promotion};

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub enum MoveKind {
    /// Quiet moves, captures and en-passant captures.
    Simple,
    /// King move of two squares; carries the rook's own relocation.
    Castling { rook: Box<Move> },
    /// Pawn reaching the last rank. The kind stays `None` until resolved.
    Promotion { promotion: Option<Promotion> },
}

/// A reversible change to a [`Board`].
///
/// Moves are only built by the generator in [`crate::rules`], from the
/// position they will be applied to. A move remembers the status before and
/// after itself, so `apply` followed by `undo` restores the board exactly.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Move {
    from: Square,
    to: Square,
    piece: Piece,
    capture: Option<Piece>,
    capture_square: Square,
    before: BoardStatus,
    after: BoardStatus,
    kind: MoveKind,
}

impl Move {
    pub(crate) fn simple(board: &Board, piece: Piece, from: Square, to: Square) -> Move {
        let en_passant = piece.piece_type == PieceType::Pawn
            && board.status().en_passant == Some(to)
            && board.piece_at(to).is_none();
        // The pawn taken en passant stands beside the mover, not on the target.
        let capture_square = if en_passant {
            Board::square(Board::rank(from), Board::file(to))
        } else {
            to
        };
        Move::build(board, piece, from, to, capture_square, MoveKind::Simple)
    }

    pub(crate) fn promoting(board: &Board, pawn: Piece, from: Square, to: Square) -> Move {
        Move::build(board, pawn, from, to, to, MoveKind::Promotion { promotion: None })
    }

    pub(crate) fn castling(
        board: &Board,
        king: Piece,
        from: Square,
        to: Square,
        rook_from: Square,
        rook_to: Square,
    ) -> Move {
        let rook = Piece::new(PieceType::Rook, king.color);
        let rook_move = Move::simple(board, rook, rook_from, rook_to);
        Move::build(
            board,
            king,
            from,
            to,
            to,
            MoveKind::Castling {
                rook: Box::new(rook_move),
            },
        )
    }

    fn build(
        board: &Board,
        piece: Piece,
        from: Square,
        to: Square,
        capture_square: Square,
        kind: MoveKind,
    ) -> Move {
        let before = *board.status();
        let capture = board.piece_at(capture_square);
        let after = derive_after(&before, piece, from, to, capture);
        Move {
            from,
            to,
            piece,
            capture,
            capture_square,
            before,
            after,
            kind,
        }
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    /// The moving piece; for a promotion, the original pawn.
    pub fn piece(&self) -> Piece {
        self.piece
    }

    pub fn capture(&self) -> Option<Piece> {
        self.capture
    }

    pub fn before(&self) -> &BoardStatus {
        &self.before
    }

    pub fn after(&self) -> &BoardStatus {
        &self.after
    }

    pub fn kind(&self) -> &MoveKind {
        &self.kind
    }

    pub fn is_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_en_passant(&self) -> bool {
        self.capture_square != self.to
    }

    pub fn is_castling(&self) -> bool {
        matches!(self.kind, MoveKind::Castling { .. })
    }

    pub fn is_promotion(&self) -> bool {
        matches!(self.kind, MoveKind::Promotion { .. })
    }

    /// The chosen promotion kind, `None` for unresolved promotions and
    /// for every other move.
    pub fn promotion(&self) -> Option<Promotion> {
        match self.kind {
            MoveKind::Promotion { promotion } => promotion,
            _ => None,
        }
    }

    /// Sets or resets the promotion kind. Kinds a pawn cannot become
    /// (king, pawn) resolve to a queen. Ignored on non-promotion moves.
    pub fn set_promotion(&mut self, piece_type: Option<PieceType>) {
        self.resolve(piece_type.map(Promotion::or_queen));
    }

    pub(crate) fn resolve(&mut self, choice: Option<Promotion>) {
        if let MoveKind::Promotion { promotion } = &mut self.kind {
            *promotion = choice;
        }
    }

    /// Applies the move to `board`, which must be the position it was
    /// generated from.
    pub fn apply(&self, board: &mut Board) -> Result<(), GameError> {
        let placed = match self.kind {
            MoveKind::Promotion { promotion: None } => {
                return Err(GameError::UnresolvedPromotion {
                    from: self.from,
                    to: self.to,
                })
            }
            MoveKind::Promotion {
                promotion: Some(promotion),
            } => Piece::new(promotion.piece_type(), self.piece.color),
            _ => self.piece,
        };
        self.place(board, placed);
        Ok(())
    }

    /// Applies the move, standing in a queen for an unresolved promotion.
    /// The kind of the promoted piece never changes whose king is attacked,
    /// so this is what the legality probe uses.
    pub(crate) fn apply_resolved(&self, board: &mut Board) {
        let placed = match self.kind {
            MoveKind::Promotion { promotion } => Piece::new(
                promotion.unwrap_or(Promotion::Queen).piece_type(),
                self.piece.color,
            ),
            _ => self.piece,
        };
        self.place(board, placed);
    }

    fn place(&self, board: &mut Board, placed: Piece) {
        // rook first, so the king's status write lands last
        if let MoveKind::Castling { rook } = &self.kind {
            rook.place(board, rook.piece);
        }
        board.set(self.capture_square, None);
        board.set(self.from, None);
        board.set(self.to, Some(placed));
        board.set_status(self.after);
    }

    /// Takes the move back. Exact inverse of `apply`.
    pub fn undo(&self, board: &mut Board) {
        board.set(self.to, None);
        if let Some(captured) = self.capture {
            board.set(self.capture_square, Some(captured));
        }
        board.set(self.from, Some(self.piece));
        board.set_status(self.before);

        if let MoveKind::Castling { rook } = &self.kind {
            rook.undo(board);
        }
    }
}

fn derive_after(
    before: &BoardStatus,
    piece: Piece,
    from: Square,
    to: Square,
    capture: Option<Piece>,
) -> BoardStatus {
    let mut after = *before;
    after.side_to_move = before.side_to_move.opposite();

    match piece.piece_type {
        PieceType::King => after.castling.clear(piece.color),
        PieceType::Rook => after.castling.clear_rook_home(piece.color, from),
        _ => {}
    }
    if let Some(captured) = capture {
        if captured.piece_type == PieceType::Rook {
            after.castling.clear_rook_home(captured.color, to);
        }
    }

    let is_pawn = piece.piece_type == PieceType::Pawn;
    after.en_passant = if is_pawn && Board::rank(from).abs_diff(Board::rank(to)) == 2 {
        Some((from + to) / 2)
    } else {
        None
    };

    after.ply = if is_pawn || capture.is_some() {
        0
    } else {
        before.ply + 1
    };
    if before.side_to_move == Color::Black {
        after.moves += 1;
    }
    after
}
