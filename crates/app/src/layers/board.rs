//! The chess board viewport.

use glam::Vec2;
use modeler_platform::{Rect, WindowGeometry};
use modeler_renderer::{BoardLayer, CommandTarget, FrameContext, InputResponse, Layer, LayerInput, RenderResult};
use tracing::debug;

use crate::board::{BOARD_SIZE, Board, Kind, Side, Square};

const BACKGROUND: [f32; 4] = [0.12, 0.12, 0.14, 1.0];
const HIGHLIGHT: [f32; 4] = [0.95, 0.78, 0.25, 1.0];

/// Dark and light square colours.
static SQUARE_COLORS: [[f32; 4]; 2] = [[0.46, 0.59, 0.34, 1.0], [0.93, 0.93, 0.82, 1.0]];

/// Piece colours by side.
static PIECE_COLORS: [[f32; 4]; 2] = [[0.98, 0.97, 0.94, 1.0], [0.10, 0.10, 0.10, 1.0]];

/// Margin between a piece and its square edge, as a fraction of the square, by kind.
static PIECE_INSETS: [f32; 6] = [0.34, 0.26, 0.24, 0.20, 0.14, 0.10];

fn side_index(side: Side) -> usize {
    match side {
        Side::White => 0,
        Side::Black => 1,
    }
}

fn kind_index(kind: Kind) -> usize {
    match kind {
        Kind::Pawn => 0,
        Kind::Knight => 1,
        Kind::Bishop => 2,
        Kind::Rook => 3,
        Kind::Queen => 4,
        Kind::King => 5,
    }
}

/// What one square looks like in the uploaded snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    color: [f32; 4],
    /// Piece colour and inset fraction.
    piece: Option<([f32; 4], f32)>,
    highlighted: bool,
}

const EMPTY_CELL: Cell = Cell {
    color: [0.0; 4],
    piece: None,
    highlighted: false,
};

pub struct ChessBoardLayer {
    board: Board,
    /// Board state as last uploaded; recording reads only this.
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    uploads: u64,
    /// Last pointer position, normalized to the viewport it was delivered against.
    pointer: Option<Vec2>,
}

impl ChessBoardLayer {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            cells: [[EMPTY_CELL; BOARD_SIZE]; BOARD_SIZE],
            uploads: 0,
            pointer: None,
        }
    }

    /// Square area inside `viewport`, centred.
    fn board_rect(viewport: Rect) -> Rect {
        let side = viewport.width.min(viewport.height);
        Rect::new(
            viewport.x + ((viewport.width - side) / 2) as i32,
            viewport.y + ((viewport.height - side) / 2) as i32,
            side,
            side,
        )
    }

    fn square_rect(board: Rect, square: Square) -> Rect {
        let size = board.width / BOARD_SIZE as u32;
        let row = (BOARD_SIZE - 1 - square.rank as usize) as i32;
        Rect::new(
            board.x + square.file as i32 * size as i32,
            board.y + row * size as i32,
            size,
            size,
        )
    }

    /// Square under a pointer position normalized to `viewport`.
    fn square_at(viewport: Rect, normalized: Vec2) -> Option<Square> {
        let board = Self::board_rect(viewport);
        let point = viewport.denormalize(normalized);
        if board.width < BOARD_SIZE as u32 || !board.contains(point) {
            return None;
        }
        let local = board.normalize(point) * BOARD_SIZE as f32;
        let file = (local.x as usize).min(BOARD_SIZE - 1);
        let row = (local.y as usize).min(BOARD_SIZE - 1);
        Square::new(file as u8, (BOARD_SIZE - 1 - row) as u8)
    }
}

impl Layer for ChessBoardLayer {
    fn name(&self) -> &'static str {
        "board"
    }

    fn viewport(&self, geometry: &WindowGeometry) -> Rect {
        geometry.client_rect()
    }

    fn handle_input(&mut self, input: LayerInput, geometry: &WindowGeometry) -> InputResponse {
        match input {
            LayerInput::PointerMove(position) => {
                self.pointer = Some(position);
                InputResponse::Handled
            }
            LayerInput::PointerLeave => {
                self.pointer = None;
                InputResponse::Handled
            }
            LayerInput::ButtonDown => {
                let viewport = self.viewport(geometry);
                let Some(square) = self.pointer.and_then(|p| Self::square_at(viewport, p)) else {
                    return InputResponse::Ignored;
                };
                let selection = self.board.select(square);
                debug!("Board press at {:?}: {:?}", square, selection);
                if selection.changed_board() {
                    InputResponse::RequestBoardUpdate
                } else {
                    InputResponse::Handled
                }
            }
            LayerInput::ButtonUp => InputResponse::Ignored,
        }
    }

    fn record_draw(&mut self, target: &mut dyn CommandTarget, frame: &FrameContext) -> RenderResult<()> {
        let viewport = self.viewport(&frame.geometry);
        target.fill_rect(viewport, BACKGROUND);

        let board = Self::board_rect(viewport);
        let border = (2.0 * frame.geometry.scale).round().max(1.0) as u32;
        for (rank, row) in self.cells.iter().enumerate() {
            for (file, cell) in row.iter().enumerate() {
                let Some(square) = Square::new(file as u8, rank as u8) else {
                    continue;
                };
                let rect = Self::square_rect(board, square);
                if cell.highlighted {
                    target.fill_rect(rect, HIGHLIGHT);
                    target.fill_rect(rect.inset(border), cell.color);
                } else {
                    target.fill_rect(rect, cell.color);
                }
                if let Some((color, inset)) = cell.piece {
                    let margin = (rect.width as f32 * inset).round() as u32;
                    target.fill_rect(rect.inset(margin), color);
                }
            }
        }
        Ok(())
    }
}

impl BoardLayer for ChessBoardLayer {
    fn upload_board_state(&mut self) -> RenderResult<()> {
        let selected = self.board.selected();
        for (rank, row) in self.cells.iter_mut().enumerate() {
            for (file, cell) in row.iter_mut().enumerate() {
                let Some(square) = Square::new(file as u8, rank as u8) else {
                    continue;
                };
                *cell = Cell {
                    color: SQUARE_COLORS[square.is_light() as usize],
                    piece: self.board.piece_at(square).map(|piece| {
                        (
                            PIECE_COLORS[side_index(piece.side)],
                            PIECE_INSETS[kind_index(piece.kind)],
                        )
                    }),
                    highlighted: selected == Some(square),
                };
            }
        }
        self.uploads += 1;
        debug!("Board state uploaded ({} pieces, upload {})", self.board.piece_count(), self.uploads);
        Ok(())
    }
}
