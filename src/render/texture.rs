// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Cell-grid textures drawn by image nodes.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
};

use crate::render::clip;

#[derive(Debug, PartialEq)]
pub(crate) struct Texture {
    cells: Buffer,
}

impl Texture {
    /// A single blank cell, used as a stand-in until real content arrives.
    pub(crate) fn empty(colour: Color) -> Self {
        let mut cells = Buffer::empty(Rect::new(0, 0, 1, 1));
        cells.set_style(cells.area, Style::new().bg(colour));
        Self { cells }
    }

    /// Builds a texture from rows of text, one row per line.
    pub(crate) fn from_lines<S: AsRef<str>>(lines: &[S], colour: Color) -> Self {
        let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        let mut cells = Buffer::with_lines(lines);
        cells.set_style(cells.area, Style::new().fg(colour));
        Self { cells }
    }

    pub(crate) fn width(&self) -> u16 {
        self.cells.area.width
    }

    pub(crate) fn height(&self) -> u16 {
        self.cells.area.height
    }

    /// Copies the texture into `buf` with its top-left corner at (`x`, `y`).
    pub(crate) fn blit(&self, x: i32, y: i32, buf: &mut Buffer) {
        let Some(area) = clip(x, y, self.width(), self.height(), buf.area) else {
            return;
        };

        for row in area.top()..area.bottom() {
            for column in area.left()..area.right() {
                // Inside the clipped area both offsets fit the texture.
                let source = (
                    (i64::from(column) - i64::from(x)) as u16,
                    (i64::from(row) - i64::from(y)) as u16,
                );
                if let (Some(src), Some(dst)) = (self.cells.cell(source), buf.cell_mut((column, row))) {
                    *dst = src.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_texture_is_one_coloured_cell() {
        let texture = Texture::empty(Color::DarkGray);

        assert_eq!((texture.width(), texture.height()), (1, 1));
        assert_eq!(texture.cells.cell((0, 0)).unwrap().bg, Color::DarkGray);
    }

    #[test]
    fn from_lines_takes_widest_row() {
        let texture = Texture::from_lines(&["ab", "abcd", ""], Color::White);

        assert_eq!((texture.width(), texture.height()), (4, 3));
    }

    #[test]
    fn blit_copies_visible_part_only() {
        let texture = Texture::from_lines(&["abc", "def"], Color::White);
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 2));

        texture.blit(-1, 1, &mut buf);

        assert_eq!(buf.cell((0, 1)).unwrap().symbol(), "b");
        assert_eq!(buf.cell((1, 1)).unwrap().symbol(), "c");
        assert_eq!(buf.cell((2, 1)).unwrap().symbol(), " ");
        assert_eq!(buf.cell((0, 0)).unwrap().symbol(), " ");
    }

    #[test]
    fn blit_far_off_surface_draws_nothing() {
        let texture = Texture::from_lines(&["abc"], Color::White);
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 2));

        texture.blit(i32::MAX, 0, &mut buf);
        texture.blit(i32::MIN, i32::MIN, &mut buf);
        texture.blit(0, i32::MAX, &mut buf);

        assert_eq!(buf, Buffer::empty(Rect::new(0, 0, 4, 2)));
    }
}
