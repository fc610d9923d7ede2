use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::piece::{Color, Piece, PieceType};
use crate::rules;

/// Square index in `0..64`. Rank 0 is Black's back rank, so `0` is a8 and
/// `63` is h1.
pub type Square = usize;

pub const SIDE: usize = 8;
pub const SQUARE_COUNT: usize = SIDE * SIDE;

pub const A8: Square = 0;
pub const B8: Square = 1;
pub const C8: Square = 2;
pub const D8: Square = 3;
pub const E8: Square = 4;
pub const F8: Square = 5;
pub const G8: Square = 6;
pub const H8: Square = 7;

pub const A1: Square = 56;
pub const B1: Square = 57;
pub const C1: Square = 58;
pub const D1: Square = 59;
pub const E1: Square = 60;
pub const F1: Square = 61;
pub const G1: Square = 62;
pub const H1: Square = 63;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_short: bool,
    pub white_long: bool,
    pub black_short: bool,
    pub black_long: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_short: true,
        white_long: true,
        black_short: true,
        black_long: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_short: false,
        white_long: false,
        black_short: false,
        black_long: false,
    };

    pub fn short(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_short,
            Color::Black => self.black_short,
        }
    }

    pub fn long(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_long,
            Color::Black => self.black_long,
        }
    }

    /// Drops both rights of `color`.
    pub(crate) fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_short = false;
                self.white_long = false;
            }
            Color::Black => {
                self.black_short = false;
                self.black_long = false;
            }
        }
    }

    /// Drops the right tied to a rook of `color` standing on `square`, if
    /// `square` is one of that color's rook home squares.
    pub(crate) fn clear_rook_home(&mut self, color: Color, square: Square) {
        match (color, square) {
            (Color::White, H1) => self.white_short = false,
            (Color::White, A1) => self.white_long = false,
            (Color::Black, H8) => self.black_short = false,
            (Color::Black, A8) => self.black_long = false,
            _ => {}
        }
    }
}

/// Everything about a position that is not piece placement.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct BoardStatus {
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    /// Plies since the last pawn move or capture.
    pub ply: u32,
    /// Full-move number, incremented after Black moves.
    pub moves: u32,
}

impl Default for BoardStatus {
    fn default() -> Self {
        BoardStatus {
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            ply: 0,
            moves: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; SQUARE_COUNT],
    status: BoardStatus,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up custom positions.
    pub fn empty() -> Self {
        Board {
            squares: [None; SQUARE_COUNT],
            status: BoardStatus::default(),
        }
    }

    /// The standard starting position.
    pub fn new() -> Self {
        const BACK_RANK: [PieceType; SIDE] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut board = Board::empty();
        for (file, &pt) in BACK_RANK.iter().enumerate() {
            board.squares[Self::square(0, file)] = Some(Piece::new(pt, Color::Black));
            board.squares[Self::square(1, file)] = Some(Piece::new(PieceType::Pawn, Color::Black));
            board.squares[Self::square(6, file)] = Some(Piece::new(PieceType::Pawn, Color::White));
            board.squares[Self::square(7, file)] = Some(Piece::new(pt, Color::White));
        }
        board.status.castling = CastlingRights::ALL;
        board
    }

    /// Places a piece while building a custom position.
    pub fn put(&mut self, square: Square, piece: Piece) -> Result<(), GameError> {
        let slot = self
            .squares
            .get_mut(square)
            .ok_or(GameError::InvalidSquare(square))?;
        *slot = Some(piece);
        Ok(())
    }

    pub fn set_status(&mut self, status: BoardStatus) {
        self.status = status;
    }

    pub(crate) fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square] = piece;
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square]
    }

    pub fn status(&self) -> &BoardStatus {
        &self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.status.side_to_move
    }

    /// Occupied squares in index order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(square, piece)| piece.map(|p| (square, p)))
    }

    pub fn rank(square: Square) -> usize {
        square / SIDE
    }

    pub fn file(square: Square) -> usize {
        square % SIDE
    }

    pub fn square(rank: usize, file: usize) -> Square {
        rank * SIDE + file
    }

    /// a8 and h1 are light squares.
    pub fn is_light_square(square: Square) -> bool {
        (Self::rank(square) + Self::file(square)) % 2 == 0
    }

    /// True if every square strictly between `from` and `to` is empty.
    /// The two squares must share a rank, file or diagonal.
    pub fn is_path_clear(&self, from: Square, to: Square) -> bool {
        let dr = (Self::rank(to) as i32 - Self::rank(from) as i32).signum();
        let df = (Self::file(to) as i32 - Self::file(from) as i32).signum();
        let step = dr * SIDE as i32 + df;

        let mut current = from as i32 + step;
        while current != to as i32 {
            if self.squares[current as usize].is_some() {
                return false;
            }
            current += step;
        }
        true
    }

    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        self.pieces()
            .any(|(from, piece)| piece.color == by && rules::attacks(self, from, square))
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.piece_type == PieceType::King && p.color == color)
            .map(|(square, _)| square)
    }

    pub fn king_in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(king) => self.is_attacked(king, color.opposite()),
            None => false,
        }
    }

    pub fn is_side_to_move_piece(&self, square: Square) -> bool {
        self.squares[square].is_some_and(|p| p.color == self.status.side_to_move)
    }

    pub fn is_in_starting_position(&self) -> bool {
        *self == Board::new()
    }

    /// Hash of the piece placement, used to count repeated positions.
    ///
    /// Each occupied square contributes a key mixed from a piece salt and a
    /// square salt. This is not collision resistant; an accidental collision
    /// can at worst misreport a repetition.
    pub fn position_hash(&self) -> u64 {
        self.pieces()
            .fold(0, |hash, (square, piece)| hash ^ HASH_KEYS[piece.index()][square])
    }

    /// True if neither side can possibly deliver mate with the material left.
    pub fn has_insufficient_material(&self) -> bool {
        let mut knights = [false; 2];
        // For each side, the color of its single bishop's square, if any.
        let mut bishops: [Option<bool>; 2] = [None; 2];

        for (square, piece) in self.pieces() {
            let side = piece.color.index();
            match piece.piece_type {
                PieceType::King => {}
                PieceType::Knight => {
                    if knights[side] {
                        return false;
                    }
                    knights[side] = true;
                }
                PieceType::Bishop => {
                    if bishops[side].is_some() {
                        return false;
                    }
                    bishops[side] = Some(Self::is_light_square(square));
                }
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
            }
        }

        match (knights, bishops) {
            // King vs King
            ([false, false], [None, None]) => true,
            // King + one minor vs King
            ([true, false], [None, None])
            | ([false, true], [None, None])
            | ([false, false], [Some(_), None])
            | ([false, false], [None, Some(_)]) => true,
            // King + bishop vs King + bishop on the same square color
            ([false, false], [Some(white), Some(black)]) => white == black,
            _ => false,
        }
    }
}

const fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

const HASH_KEYS: [[u64; SQUARE_COUNT]; 12] = {
    let mut keys = [[0u64; SQUARE_COUNT]; 12];
    let mut piece = 0;
    while piece < 12 {
        let piece_salt = splitmix64(piece as u64 + 1);
        let mut square = 0;
        while square < SQUARE_COUNT {
            let square_salt = splitmix64(0x5157_0000 + square as u64);
            keys[piece][square] = splitmix64(piece_salt ^ square_salt);
            square += 1;
        }
        piece += 1;
    }
    keys
};
