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

//! Render lists and the nodes they draw.
//!
//! A [`RenderList`] is an ordered collection of shared [`RenderNode`]s that
//! scripts build up and mutate. The application keeps two of them, the
//! primary list and an overlay, and composites them into a surface (a
//! `ratatui` [`Buffer`]) whenever either one reports a pending change.
//!
//! # Dirty Tracking
//!
//! A list is dirty when nodes were added, removed or cleared since the last
//! render, or when any contained node was mutated. Rendering clears both.

mod texture;

pub(crate) use texture::Texture;

use std::{cell::RefCell, rc::Rc};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Paragraph, Widget},
};

pub(crate) type NodeRef = Rc<RefCell<RenderNode>>;

pub(crate) trait Render {
    fn draw(&self, buf: &mut Buffer);
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Rectangle { width: u16, height: u16 },
    Text { text: String },
    Image { texture: Rc<Texture> },
}

#[derive(Debug)]
pub(crate) struct RenderNode {
    pub(crate) kind: NodeKind,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) foreground: Color,
    pub(crate) background: Option<Color>,
    pub(crate) visible: bool,
    changed: bool,
}

impl RenderNode {
    pub(crate) fn new(kind: NodeKind, x: i32, y: i32, foreground: Color) -> Self {
        Self {
            kind,
            x,
            y,
            foreground,
            background: None,
            visible: true,
            changed: true,
        }
    }

    pub(crate) fn into_ref(self) -> NodeRef {
        Rc::new(RefCell::new(self))
    }

    /// Applies `update` and flags the node as changed.
    pub(crate) fn update(&mut self, update: impl FnOnce(&mut Self)) {
        update(self);
        self.changed = true;
    }

    pub(crate) fn changed(&self) -> bool {
        self.changed
    }

    fn style(&self) -> Style {
        let style = Style::new().fg(self.foreground);
        match self.background {
            Some(background) => style.bg(background),
            None => style,
        }
    }
}

impl Render for RenderNode {
    fn draw(&self, buf: &mut Buffer) {
        if !self.visible {
            return;
        }

        match &self.kind {
            NodeKind::Rectangle { width, height } => {
                if let Some(area) = clip(self.x, self.y, *width, *height, buf.area) {
                    Block::new().style(self.style()).render(area, buf);
                }
            }
            NodeKind::Text { text } => {
                let line = Line::from(text.as_str());
                let width = u16::try_from(line.width()).unwrap_or(u16::MAX);
                if let Some(area) = clip(self.x, self.y, width, 1, buf.area) {
                    let skip = u16::try_from(i64::from(area.x) - i64::from(self.x)).unwrap_or(0);
                    Paragraph::new(line)
                        .style(self.style())
                        .scroll((0, skip))
                        .render(area, buf);
                }
            }
            NodeKind::Image { texture } => texture.blit(self.x, self.y, buf),
        }
    }
}

/// Intersects the rectangle at (`x`, `y`) with `bounds`, allowing the origin
/// to be off the surface.
pub(crate) fn clip(x: i32, y: i32, width: u16, height: u16, bounds: Rect) -> Option<Rect> {
    // Scripts may place nodes anywhere in the i32 range.
    let (x, y) = (i64::from(x), i64::from(y));

    let left = x.max(i64::from(bounds.left()));
    let top = y.max(i64::from(bounds.top()));
    let right = (x + i64::from(width)).min(i64::from(bounds.right()));
    let bottom = (y + i64::from(height)).min(i64::from(bounds.bottom()));

    if left >= right || top >= bottom {
        return None;
    }

    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

#[derive(Debug, Default)]
pub(crate) struct RenderList {
    nodes: Vec<NodeRef>,
    changed: bool,
}

impl RenderList {
    pub(crate) fn add(&mut self, node: NodeRef) {
        self.nodes.push(node);
        self.changed = true;
    }

    /// Removes every occurrence of `node`, returning whether it was present.
    pub(crate) fn remove(&mut self, node: &NodeRef) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| !Rc::ptr_eq(n, node));

        let removed = self.nodes.len() != before;
        self.changed |= removed;
        removed
    }

    pub(crate) fn clear(&mut self) {
        if !self.nodes.is_empty() {
            self.nodes.clear();
            self.changed = true;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Marks the list as needing a redraw without changing its contents.
    pub(crate) fn touch(&mut self) {
        self.changed = true;
    }

    pub(crate) fn should_render(&self) -> bool {
        self.changed || self.nodes.iter().any(|node| node.borrow().changed())
    }

    /// Draws every node in insertion order and clears all pending changes.
    pub(crate) fn render(&mut self, buf: &mut Buffer) {
        for node in &self.nodes {
            let mut node = node.borrow_mut();
            node.draw(buf);
            node.changed = false;
        }

        self.changed = false;
    }
}
