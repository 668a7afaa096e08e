//! Board model: pieces on an 8x8 grid.
//!
//! There are no chess rules here. A press on a piece selects it, a press on
//! another square moves the selected piece there (capturing whatever stood
//! on it), and a second press on the selected square drops the selection.

/// Squares per side.
pub const BOARD_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub side: Side,
    pub kind: Kind,
}

impl Piece {
    pub const fn new(side: Side, kind: Kind) -> Self {
        Self { side, kind }
    }
}

/// A board square. File 0 is the a-file, rank 0 is White's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    /// Returns `None` when either coordinate is off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        ((file as usize) < BOARD_SIZE && (rank as usize) < BOARD_SIZE).then_some(Self { file, rank })
    }

    pub fn is_light(self) -> bool {
        (self.file + self.rank) % 2 == 1
    }
}

/// Result of a press on a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Selected(Square),
    Moved {
        from: Square,
        to: Square,
        captured: Option<Piece>,
    },
    Cleared,
    /// Press on an empty square with nothing selected.
    Unchanged,
}

impl Selection {
    /// Whether the board needs to be uploaded again.
    pub fn changed_board(self) -> bool {
        self != Selection::Unchanged
    }
}

const BACK_RANK: [Kind; BOARD_SIZE] = [
    Kind::Rook,
    Kind::Knight,
    Kind::Bishop,
    Kind::Queen,
    Kind::King,
    Kind::Bishop,
    Kind::Knight,
    Kind::Rook,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    squares: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
    selected: Option<Square>,
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
            selected: None,
        }
    }

    /// The standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            board.squares[0][file] = Some(Piece::new(Side::White, kind));
            board.squares[1][file] = Some(Piece::new(Side::White, Kind::Pawn));
            board.squares[BOARD_SIZE - 2][file] = Some(Piece::new(Side::Black, Kind::Pawn));
            board.squares[BOARD_SIZE - 1][file] = Some(Piece::new(Side::Black, kind));
        }
        board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.rank as usize][square.file as usize]
    }

    pub fn place(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.rank as usize][square.file as usize] = piece;
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Apply a press on `square`.
    pub fn select(&mut self, square: Square) -> Selection {
        match self.selected {
            Some(from) if from == square => {
                self.selected = None;
                Selection::Cleared
            }
            Some(from) => {
                let piece = self.piece_at(from);
                let captured = self.piece_at(square);
                self.place(square, piece);
                self.place(from, None);
                self.selected = None;
                Selection::Moved {
                    from,
                    to: square,
                    captured,
                }
            }
            None if self.piece_at(square).is_some() => {
                self.selected = Some(square);
                Selection::Selected(square)
            }
            None => Selection::Unchanged,
        }
    }

    pub fn piece_count(&self) -> usize {
        self.squares.iter().flatten().filter(|p| p.is_some()).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
