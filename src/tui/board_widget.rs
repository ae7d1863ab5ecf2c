//! Chess board widget for TUI rendering

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Widget},
};
use shakmaty::{Board, Color as PieceColor, File, Piece, Rank, Role, Square};

use crate::tui::theme::{SquareMark, Theme};

/// Squares to highlight on top of the plain board.
#[derive(Debug, Default, Clone)]
pub struct Highlights {
    pub selection: Option<Square>,
    pub targets: Vec<Square>,
    /// Origin and destination squares of previewed engine lines.
    pub previews: Vec<Square>,
    pub last_move: Option<(Square, Square)>,
}

impl Highlights {
    fn mark(&self, square: Square) -> Option<SquareMark> {
        if self.selection == Some(square) {
            Some(SquareMark::Selected)
        } else if self.targets.contains(&square) {
            Some(SquareMark::Target)
        } else if self.previews.contains(&square) {
            Some(SquareMark::Preview)
        } else if matches!(self.last_move, Some((from, to)) if from == square || to == square) {
            Some(SquareMark::LastMove)
        } else {
            None
        }
    }
}

/// Widget that renders a chess board
pub struct BoardWidget<'a> {
    board: &'a Board,
    theme: &'a Theme,
    highlights: &'a Highlights,
    /// Draw rank 1 at the top, for a player on the black side.
    flipped: bool,
}

impl<'a> BoardWidget<'a> {
    pub fn new(board: &'a Board, theme: &'a Theme, highlights: &'a Highlights) -> Self {
        Self {
            board,
            theme,
            highlights,
            flipped: false,
        }
    }

    pub fn flipped(mut self, flipped: bool) -> Self {
        self.flipped = flipped;
        self
    }

    /// Board coordinates (file, rank) shown at display column `col`, row `row`.
    fn coords_at(&self, col: u8, row: u8) -> (u8, u8) {
        if self.flipped {
            (7 - col, row)
        } else {
            (col, 7 - row)
        }
    }
}

pub fn piece_glyph(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (PieceColor::White, Role::King) => '♔',
        (PieceColor::White, Role::Queen) => '♕',
        (PieceColor::White, Role::Rook) => '♖',
        (PieceColor::White, Role::Bishop) => '♗',
        (PieceColor::White, Role::Knight) => '♘',
        (PieceColor::White, Role::Pawn) => '♙',
        (PieceColor::Black, Role::King) => '♚',
        (PieceColor::Black, Role::Queen) => '♛',
        (PieceColor::Black, Role::Rook) => '♜',
        (PieceColor::Black, Role::Bishop) => '♝',
        (PieceColor::Black, Role::Knight) => '♞',
        (PieceColor::Black, Role::Pawn) => '♟',
    }
}

fn put(buf: &mut Buffer, x: u16, y: u16, ch: char, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(ch).set_style(style);
    }
}

impl Widget for BoardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Board")
            .border_style(self.theme.border_style());

        let inner = block.inner(area);
        block.render(area, buf);

        // 1 column of rank labels, 2 rows of file labels
        let available_width = inner.width.saturating_sub(1);
        let available_height = inner.height.saturating_sub(2);
        let square_width = (available_width / 8).clamp(2, 6);
        let square_height = (available_height / 8).clamp(1, 3);
        let right = inner.x + inner.width;
        let bottom = inner.y + inner.height;

        // file labels, top and bottom
        for col in 0u8..8 {
            let (file, _) = self.coords_at(col, 0);
            let x = inner.x + 1 + u16::from(col) * square_width + square_width / 2;
            for y in [inner.y, inner.y + 1 + 8 * square_height] {
                if x < right && y < bottom {
                    put(buf, x, y, (b'a' + file) as char, self.theme.text_style());
                }
            }
        }

        for row in 0u8..8 {
            let y = inner.y + 1 + u16::from(row) * square_height;
            let (_, rank) = self.coords_at(0, row);

            let label_y = y + square_height / 2;
            if label_y < bottom {
                put(buf, inner.x, label_y, (b'1' + rank) as char, self.theme.text_style());
            }

            for col in 0u8..8 {
                let (file, rank) = self.coords_at(col, row);
                let square =
                    Square::from_coords(File::new(u32::from(file)), Rank::new(u32::from(rank)));
                let x = inner.x + 1 + u16::from(col) * square_width;
                if x + square_width > right || y >= bottom {
                    continue;
                }

                let is_light = (file + rank) % 2 == 1;
                let piece = self.board.piece_at(square);
                let style = self.theme.square_style(
                    is_light,
                    piece.map(|p| p.color),
                    self.highlights.mark(square),
                );
                let glyph = piece.map_or(' ', piece_glyph);

                for dy in 0..square_height {
                    for dx in 0..square_width {
                        let (cell_x, cell_y) = (x + dx, y + dy);
                        if cell_x < right && cell_y < bottom {
                            let is_center = dx == square_width / 2 && dy == square_height / 2;
                            put(buf, cell_x, cell_y, if is_center { glyph } else { ' ' }, style);
                        }
                    }
                }
            }
        }
    }
}
