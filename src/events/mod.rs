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

//! Application event distribution and orchestration.
//!
//! This module defines the central event-handling logic for the application,
//! bridging the gap between raw input (keyboard, pointer, touch), the periodic
//! timer, and the Lua scripts that actually implement the display.
//!
//! # Architecture
//!
//! The system follows a blocking wait-then-drain pattern:
//!
//! 1. **Wait**: Block on the [`EventQueue`] until at least one [`Event`] is
//!    available.
//! 2. **Drain**: Dispatch that event, then keep polling and dispatching
//!    without blocking until the queue is empty. Each dispatch is isolated, a
//!    failing script handler is logged and the next event is delivered.
//! 3. **Render**: After the drain, composite a frame once, and only if one of
//!    the render lists has changed.

mod handlers;
use handlers::*;

use std::sync::mpsc::{self, Receiver, RecvError, Sender};

use log::{error, warn};

use crate::{app::Application, scripts::ScriptError};

/// Device id carried by pointer events that were synthesised from touch
/// input.
pub(crate) const TOUCH_MOUSE_ID: u32 = u32::MAX;

/// Numeric event type codes, as seen by scripts.
///
/// The values match the SDL event type constants so that existing scripts can
/// compare against familiar numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub(crate) enum EventKind {
    Other = 0,
    Quit = 0x100,
    WindowExposed = 0x200,
    KeyDown = 0x300,
    KeyUp = 0x301,
    TextInput = 0x303,
    MouseMotion = 0x400,
    MouseButtonDown = 0x401,
    MouseButtonUp = 0x402,
    MouseWheel = 0x403,
    FingerDown = 0x700,
    FingerUp = 0x701,
    FingerMotion = 0x702,
    Timer = 0x8000,
}

impl EventKind {
    pub(crate) const ALL: [EventKind; 14] = [
        EventKind::Other,
        EventKind::Quit,
        EventKind::WindowExposed,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::TextInput,
        EventKind::MouseMotion,
        EventKind::MouseButtonDown,
        EventKind::MouseButtonUp,
        EventKind::MouseWheel,
        EventKind::FingerDown,
        EventKind::FingerUp,
        EventKind::FingerMotion,
        EventKind::Timer,
    ];

    pub(crate) fn code(self) -> u32 {
        self as u32
    }

    /// The name scripts use to refer to this kind in the `EventType` table.
    pub(crate) fn script_name(self) -> &'static str {
        match self {
            EventKind::Other => "OTHER",
            EventKind::Quit => "QUIT",
            EventKind::WindowExposed => "WINDOWEXPOSED",
            EventKind::KeyDown => "KEYDOWN",
            EventKind::KeyUp => "KEYUP",
            EventKind::TextInput => "TEXTINPUT",
            EventKind::MouseMotion => "MOUSEMOTION",
            EventKind::MouseButtonDown => "MOUSEBUTTONDOWN",
            EventKind::MouseButtonUp => "MOUSEBUTTONUP",
            EventKind::MouseWheel => "MOUSEWHEEL",
            EventKind::FingerDown => "FINGERDOWN",
            EventKind::FingerUp => "FINGERUP",
            EventKind::FingerMotion => "FINGERMOTION",
            EventKind::Timer => "TIMER",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct KeyEvent {
    pub(crate) scancode: i32,
    pub(crate) keysym: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PointerEvent {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) button: u8,
    pub(crate) pressed: bool,
    pub(crate) clicks: u8,
    /// Originating device, [`TOUCH_MOUSE_ID`] for touch emulation.
    pub(crate) which: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WheelEvent {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) which: u32,
}

/// A touch contact, coordinates normalised to `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TouchEvent {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) dx: f32,
    pub(crate) dy: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    Quit,

    TextInput(String),

    KeyDown(KeyEvent),
    KeyUp(KeyEvent),

    MouseButtonDown(PointerEvent),
    MouseButtonUp(PointerEvent),
    MouseMotion(PointerEvent),
    MouseWheel(WheelEvent),

    // The terminal backend has no touch input, other backends (and tests)
    // produce these.
    #[allow(dead_code)]
    FingerDown(TouchEvent),
    #[allow(dead_code)]
    FingerUp(TouchEvent),
    #[allow(dead_code)]
    FingerMotion(TouchEvent),

    Timer,

    WindowExposed,

    Other,
}

impl Event {
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            Event::Quit => EventKind::Quit,
            Event::TextInput(_) => EventKind::TextInput,
            Event::KeyDown(_) => EventKind::KeyDown,
            Event::KeyUp(_) => EventKind::KeyUp,
            Event::MouseButtonDown(_) => EventKind::MouseButtonDown,
            Event::MouseButtonUp(_) => EventKind::MouseButtonUp,
            Event::MouseMotion(_) => EventKind::MouseMotion,
            Event::MouseWheel(_) => EventKind::MouseWheel,
            Event::FingerDown(_) => EventKind::FingerDown,
            Event::FingerUp(_) => EventKind::FingerUp,
            Event::FingerMotion(_) => EventKind::FingerMotion,
            Event::Timer => EventKind::Timer,
            Event::WindowExposed => EventKind::WindowExposed,
            Event::Other => EventKind::Other,
        }
    }
}

/// The single queue every event producer posts into.
///
/// The input thread, the timer and scripts (via `app:quit()`) all hold a
/// [`Sender`] obtained from [`EventQueue::sender`]; only the main loop ever
/// receives.
pub(crate) struct EventQueue {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl EventQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    #[cfg(test)]
    pub(crate) fn push(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Blocks until an event is available.
    pub(crate) fn wait(&self) -> Result<Event, RecvError> {
        self.rx.recv()
    }

    /// Returns the next queued event, if any, without blocking.
    pub(crate) fn poll(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

/// Runs the main application loop.
///
/// This function loops until the application stops running, which only
/// happens when a quit event is dispatched. Setting the running flag is
/// cooperative: the rest of the current drain is still delivered and a frame
/// is still composited before the flag is observed.
///
/// A failure to wait for events is logged and the wait is retried, it never
/// ends the loop.
pub(crate) fn process_events(app: &mut Application) {
    while app.is_running() {
        match app.events.wait() {
            Ok(event) => {
                dispatch_isolated(app, event);

                while let Some(event) = app.events.poll() {
                    dispatch_isolated(app, event);
                }

                app.render();
            }
            Err(e) => warn!("There was a problem waiting for events: {e}"),
        }
    }
}

/// The dispatch boundary: a script failure raised while handling `event` is
/// logged and discarded here.
fn dispatch_isolated(app: &mut Application, event: Event) {
    if let Err(e) = dispatch_event(app, event) {
        error!("{e}");
    }
}

/// Routes a single event to its handler.
///
/// Event kinds without a handler are ignored.
pub(crate) fn dispatch_event(app: &mut Application, event: Event) -> Result<(), ScriptError> {
    let kind = event.kind();

    match event {
        Event::Quit => {
            app.stop();
            Ok(())
        }
        Event::TextInput(text) => handle_text_input(app, &text),
        Event::KeyUp(key) => handle_key_up(app, key),
        Event::KeyDown(key) => handle_key_down(app, key),
        Event::MouseButtonDown(pointer)
        | Event::MouseButtonUp(pointer)
        | Event::MouseMotion(pointer) => handle_mouse(app, kind, pointer),
        Event::MouseWheel(wheel) => handle_mouse_wheel(app, wheel),
        Event::FingerDown(touch) | Event::FingerUp(touch) | Event::FingerMotion(touch) => {
            handle_touch(app, kind, touch)
        }
        Event::Timer => handle_timer(app),
        Event::WindowExposed => {
            handle_window_exposed(app);
            Ok(())
        }
        Event::Other => Ok(()),
    }
}
