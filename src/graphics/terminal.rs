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

//! Terminal display backend.
//!
//! Presents frames with `ratatui` over a `crossterm` backend. Fullscreen mode
//! takes over the alternate screen; otherwise an inline viewport of the
//! requested height is used.
//!
//! # Input
//!
//! A dedicated thread blocks on `crossterm` input and posts translated
//! [`Event`]s into the main event queue. Whether key presses also produce
//! text input is shared with that thread through an atomic flag.

use std::{
    io::{self, Stdout},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
    },
    thread,
};

use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    style::Print,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use log::{debug, warn};
use ratatui::{
    Terminal, TerminalOptions, Viewport,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::Style,
};

use crate::{
    events::Event,
    graphics::{Graphics, GraphicsError, GraphicsOptions, input},
    theme::Theme,
};

pub(crate) struct TerminalGraphics {
    theme: Theme,
    options: GraphicsOptions,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    surface: Buffer,
    requested_width: u16,
    text_input: Arc<AtomicBool>,
    show_cursor: bool,
    raw_mode: bool,
    keyboard_enhanced: bool,
}

impl TerminalGraphics {
    pub(crate) fn new(theme: Theme) -> Self {
        Self {
            theme,
            options: GraphicsOptions::default(),
            terminal: None,
            surface: Buffer::empty(Rect::ZERO),
            requested_width: 0,
            text_input: Arc::new(AtomicBool::new(false)),
            show_cursor: false,
            raw_mode: false,
            keyboard_enhanced: false,
        }
    }

    /// Drawable area of the viewport, limited to the requested width.
    fn drawable_area(&mut self) -> Option<Rect> {
        let requested_width = self.requested_width;
        let terminal = self.terminal.as_mut()?;

        if let Err(e) = terminal.autoresize() {
            debug!("Terminal resize check failed: {e}");
        }

        let mut area = terminal.get_frame().area();
        if requested_width > 0 {
            area.width = area.width.min(requested_width);
        }
        Some(area)
    }

    fn spawn_input_thread(&self, event_tx: Sender<Event>) -> io::Result<()> {
        let text_input = Arc::clone(&self.text_input);

        thread::Builder::new().name("input".into()).spawn(move || {
            loop {
                let event = match event::read() {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Failed to read terminal input: {e}");
                        continue;
                    }
                };

                for event in input::translate(event, text_input.load(Ordering::Acquire)) {
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
        })?;

        Ok(())
    }
}

impl Graphics for TerminalGraphics {
    fn init(&mut self, options: GraphicsOptions, event_tx: Sender<Event>) -> Result<(), GraphicsError> {
        self.options = options;

        if options.video {
            enable_raw_mode().map_err(GraphicsError::Init)?;
            self.raw_mode = true;

            let mut stdout = io::stdout();
            execute!(stdout, EnableMouseCapture, EnableBracketedPaste, EnableFocusChange)
                .map_err(GraphicsError::Init)?;

            // Without this a terminal only ever reports key presses.
            if supports_keyboard_enhancement().unwrap_or(false) {
                execute!(
                    stdout,
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
                )
                .map_err(GraphicsError::Init)?;
                self.keyboard_enhanced = true;
            }

            if let Some(hex) = Theme::to_hex(self.theme.background_colour) {
                set_emulator_background(&hex).map_err(GraphicsError::Init)?;
            }
        }

        self.spawn_input_thread(event_tx).map_err(GraphicsError::Init)?;

        debug!(
            "Terminal display initialised (video {}, timer {}, fullscreen {})",
            options.video, options.timer, options.fullscreen_desktop
        );
        Ok(())
    }

    fn create_window(&mut self, title: &str, width: u16, height: u16) -> Result<(), GraphicsError> {
        let mut stdout = io::stdout();
        execute!(stdout, SetTitle(title)).map_err(GraphicsError::Window)?;

        let viewport = if self.options.fullscreen_desktop {
            execute!(stdout, EnterAlternateScreen).map_err(GraphicsError::Window)?;
            Viewport::Fullscreen
        } else {
            Viewport::Inline(height)
        };

        let backend = CrosstermBackend::new(stdout);
        let mut terminal =
            Terminal::with_options(backend, TerminalOptions { viewport }).map_err(GraphicsError::Window)?;
        terminal.hide_cursor().map_err(GraphicsError::Window)?;

        self.terminal = Some(terminal);
        self.requested_width = width;
        self.clear();

        Ok(())
    }

    fn output_size(&mut self) -> (u16, u16) {
        self.drawable_area()
            .map(|area| (area.width, area.height))
            .unwrap_or_default()
    }

    fn clear(&mut self) {
        let (width, height) = self.output_size();
        self.surface = Buffer::empty(Rect::new(0, 0, width, height));
        self.surface
            .set_style(self.surface.area, Style::new().bg(self.theme.background_colour));
    }

    fn surface(&mut self) -> &mut Buffer {
        &mut self.surface
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        let surface = &self.surface;
        let terminal = self.terminal.as_mut().ok_or(GraphicsError::NotInitialised)?;

        terminal
            .draw(|frame| {
                let area = frame.area();
                let buf = frame.buffer_mut();

                for y in 0..surface.area.height.min(area.height) {
                    for x in 0..surface.area.width.min(area.width) {
                        if let (Some(src), Some(dst)) =
                            (surface.cell((x, y)), buf.cell_mut((area.x + x, area.y + y)))
                        {
                            *dst = src.clone();
                        }
                    }
                }
            })
            .map_err(GraphicsError::Present)?;

        // Drawing hides the cursor whenever no position is set.
        if self.show_cursor {
            terminal.show_cursor().map_err(GraphicsError::Present)?;
        }

        Ok(())
    }

    fn set_text_input(&mut self, enable: bool) {
        self.text_input.store(enable, Ordering::Release);
    }

    fn set_show_cursor(&mut self, enable: bool) {
        self.show_cursor = enable;

        if let Some(terminal) = self.terminal.as_mut() {
            let result = if enable {
                terminal.show_cursor()
            } else {
                terminal.hide_cursor()
            };
            if let Err(e) = result {
                warn!("Could not change cursor visibility: {e}");
            }
        }
    }

    /// Restores the terminal to its original state.
    ///
    /// This is best-effort; every step is attempted even when an earlier one
    /// fails. Calling it again does nothing.
    fn shutdown(&mut self) {
        let mut stdout = io::stdout();

        if let Some(mut terminal) = self.terminal.take() {
            if !self.options.fullscreen_desktop {
                // Leave the prompt below the inline viewport.
                terminal.clear().ok();
            }
            terminal.show_cursor().ok();
            if self.options.fullscreen_desktop {
                execute!(stdout, LeaveAlternateScreen).ok();
            }
        }

        if self.keyboard_enhanced {
            execute!(stdout, PopKeyboardEnhancementFlags).ok();
            self.keyboard_enhanced = false;
        }

        if self.raw_mode {
            execute!(stdout, DisableMouseCapture, DisableBracketedPaste, DisableFocusChange).ok();
            disable_raw_mode().ok();
            reset_emulator_background().ok();
            self.raw_mode = false;
        }
    }
}

/// Sets the emulator's own background (OSC 11) so that whatever lies outside
/// the viewport matches the frame.
fn set_emulator_background(hex: &str) -> io::Result<()> {
    execute!(io::stdout(), Print(format!("\x1b]11;{hex}\x07")))
}

/// Restores the user's configured background (OSC 111).
fn reset_emulator_background() -> io::Result<()> {
    execute!(io::stdout(), Print("\x1b]111\x07"))
}
