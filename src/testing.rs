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

//! Test doubles shared by the unit tests.

use std::{cell::RefCell, io, rc::Rc, sync::mpsc::Sender};

use ratatui::{buffer::Buffer, layout::Rect};

use crate::{
    app::{Application, PlatformHints},
    config::Settings,
    events::Event,
    graphics::{Graphics, GraphicsError, GraphicsOptions},
};

const DEFAULT_SIZE: (u16, u16) = (40, 10);

/// What a [`RecordingGraphics`] has been asked to do.
#[derive(Debug)]
pub(crate) struct FrameLog {
    pub(crate) clears: usize,
    pub(crate) presents: usize,
    /// The surface as it was at the most recent present.
    pub(crate) presented: Option<Buffer>,
    pub(crate) text_input: bool,
    pub(crate) show_cursor: bool,
    pub(crate) shut_down: bool,
}

impl Default for FrameLog {
    fn default() -> Self {
        Self {
            clears: 0,
            presents: 0,
            presented: None,
            text_input: false,
            show_cursor: true,
            shut_down: false,
        }
    }
}

/// An in-memory display that records every call.
pub(crate) struct RecordingGraphics {
    log: Rc<RefCell<FrameLog>>,
    surface: Buffer,
    requested: Option<(u16, u16)>,
    output_size: Option<(u16, u16)>,
    fail_init: bool,
}

impl RecordingGraphics {
    pub(crate) fn new() -> (Self, Rc<RefCell<FrameLog>>) {
        let log = Rc::new(RefCell::new(FrameLog::default()));
        let graphics = Self {
            log: Rc::clone(&log),
            surface: Buffer::empty(Rect::ZERO),
            requested: None,
            output_size: None,
            fail_init: false,
        };
        (graphics, log)
    }

    /// Reports this size regardless of what the window asked for.
    pub(crate) fn with_output_size(mut self, width: u16, height: u16) -> Self {
        self.output_size = Some((width, height));
        self
    }

    pub(crate) fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

impl Graphics for RecordingGraphics {
    fn init(&mut self, _options: GraphicsOptions, _event_tx: Sender<Event>) -> Result<(), GraphicsError> {
        if self.fail_init {
            return Err(GraphicsError::Init(io::Error::other("no display")));
        }
        Ok(())
    }

    fn create_window(&mut self, _title: &str, width: u16, height: u16) -> Result<(), GraphicsError> {
        self.requested = Some((width, height));
        Ok(())
    }

    fn output_size(&mut self) -> (u16, u16) {
        self.output_size.or(self.requested).unwrap_or(DEFAULT_SIZE)
    }

    fn clear(&mut self) {
        let (width, height) = self.output_size();
        self.surface = Buffer::empty(Rect::new(0, 0, width, height));
        self.log.borrow_mut().clears += 1;
    }

    fn surface(&mut self) -> &mut Buffer {
        &mut self.surface
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        let mut log = self.log.borrow_mut();
        log.presents += 1;
        log.presented = Some(self.surface.clone());
        Ok(())
    }

    fn set_text_input(&mut self, enable: bool) {
        self.log.borrow_mut().text_input = enable;
    }

    fn set_show_cursor(&mut self, enable: bool) {
        self.log.borrow_mut().show_cursor = enable;
    }

    fn shutdown(&mut self) {
        self.log.borrow_mut().shut_down = true;
    }
}

/// An application over a [`RecordingGraphics`] with the `app` handle bound.
///
/// The display is never initialised so no timer runs, tests push every event
/// themselves.
pub(crate) fn test_app() -> (Application, Rc<RefCell<FrameLog>>) {
    let settings = Settings {
        width: DEFAULT_SIZE.0,
        height: DEFAULT_SIZE.1,
        console_address: "127.0.0.1:0".into(),
        ..Settings::default()
    };

    let (graphics, log) = RecordingGraphics::new();
    let app = Application::new(settings, PlatformHints::default(), Box::new(graphics)).unwrap();
    app.refresh_output_size();
    app.bind_scripts().unwrap();

    (app, log)
}
