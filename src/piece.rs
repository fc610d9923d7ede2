use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::King,
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Pawn,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            PieceType::King => 0,
            PieceType::Queen => 1,
            PieceType::Rook => 2,
            PieceType::Bishop => 3,
            PieceType::Knight => 4,
            PieceType::Pawn => 5,
        }
    }
}

/// A piece is a plain `(kind, color)` value; it carries no position.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
}

impl Piece {
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Piece { piece_type, color }
    }

    /// Dense index in `0..12`, white pieces first.
    pub(crate) fn index(self) -> usize {
        self.color.index() * PieceType::ALL.len() + self.piece_type.index()
    }
}

/// The kinds a pawn may promote to.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    pub const ALL: [Promotion; 4] = [
        Promotion::Queen,
        Promotion::Rook,
        Promotion::Bishop,
        Promotion::Knight,
    ];

    pub fn piece_type(self) -> PieceType {
        match self {
            Promotion::Queen => PieceType::Queen,
            Promotion::Rook => PieceType::Rook,
            Promotion::Bishop => PieceType::Bishop,
            Promotion::Knight => PieceType::Knight,
        }
    }

    /// Maps any piece kind onto a promotion, falling back to a queen for
    /// kinds a pawn cannot become.
    pub fn or_queen(piece_type: PieceType) -> Promotion {
        Promotion::try_from(piece_type).unwrap_or(Promotion::Queen)
    }
}

impl From<Promotion> for PieceType {
    fn from(promotion: Promotion) -> PieceType {
        promotion.piece_type()
    }
}

impl TryFrom<PieceType> for Promotion {
    type Error = PieceType;

    fn try_from(piece_type: PieceType) -> Result<Self, Self::Error> {
        match piece_type {
            PieceType::Queen => Ok(Promotion::Queen),
            PieceType::Rook => Ok(Promotion::Rook),
            PieceType::Bishop => Ok(Promotion::Bishop),
            PieceType::Knight => Ok(Promotion::Knight),
            other => Err(other),
        }
    }
}
