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

//! Display surface and input.
//!
//! The [`Graphics`] trait is the seam between the application and whatever
//! presents frames and produces input. The application only ever clears,
//! draws render lists into [`Graphics::surface`], and presents.
//!
//! [`TerminalGraphics`] is the implementation used by the binary; it presents
//! through `ratatui` and reads input with `crossterm`.

mod input;
mod terminal;

pub(crate) use terminal::TerminalGraphics;

use std::{io, sync::mpsc::Sender};

use ratatui::buffer::Buffer;
use thiserror::Error;

use crate::events::Event;

#[derive(Debug, Error)]
pub(crate) enum GraphicsError {
    #[error("could not initialise display: {0}")]
    Init(#[source] io::Error),

    #[error("could not create window: {0}")]
    Window(#[source] io::Error),

    #[error("display used before initialisation")]
    NotInitialised,

    #[error("could not present frame: {0}")]
    Present(#[source] io::Error),
}

/// Capabilities requested from the backend at initialisation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct GraphicsOptions {
    pub(crate) fullscreen_desktop: bool,
    pub(crate) video: bool,
    pub(crate) timer: bool,
}

impl GraphicsOptions {
    pub(crate) fn with_fullscreen_desktop(mut self) -> Self {
        self.fullscreen_desktop = true;
        self
    }

    pub(crate) fn with_video(mut self) -> Self {
        self.video = true;
        self
    }

    pub(crate) fn with_timer(mut self) -> Self {
        self.timer = true;
        self
    }
}

pub(crate) trait Graphics {
    /// Brings the backend up. Input events are posted to `event_tx` from then
    /// on.
    fn init(&mut self, options: GraphicsOptions, event_tx: Sender<Event>) -> Result<(), GraphicsError>;

    fn create_window(&mut self, title: &str, width: u16, height: u16) -> Result<(), GraphicsError>;

    /// The real drawable size, which may differ from the requested one.
    fn output_size(&mut self) -> (u16, u16);

    /// Resets the surface to the background colour.
    fn clear(&mut self);

    fn surface(&mut self) -> &mut Buffer;

    fn present(&mut self) -> Result<(), GraphicsError>;

    fn set_text_input(&mut self, enable: bool);

    fn set_show_cursor(&mut self, enable: bool);

    fn shutdown(&mut self);
}
