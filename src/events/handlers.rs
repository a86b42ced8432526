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

//! Per-kind event handlers.
//!
//! Each handler looks up its script callable by name and invokes it when it
//! exists. A missing callable is never an error.

use log::trace;

use crate::{
    app::Application,
    events::{EventKind, KeyEvent, PointerEvent, TOUCH_MOUSE_ID, TouchEvent, WheelEvent},
    scripts::ScriptError,
};

const TEXT_INPUT_HANDLER: &str = "handleTextInput";
const KEY_UP_HANDLER: &str = "handleKeyUp";
const KEY_DOWN_HANDLER: &str = "handleKeyDown";
const MOUSE_HANDLER: &str = "handleMouse";
const TOUCH_HANDLER: &str = "handleTouch";

pub(super) fn handle_text_input(app: &mut Application, text: &str) -> Result<(), ScriptError> {
    if let Some(text_input) = app.scripts.global_function(TEXT_INPUT_HANDLER)? {
        text_input.call::<()>(text)?;
    }

    Ok(())
}

pub(super) fn handle_key_up(app: &mut Application, key: KeyEvent) -> Result<(), ScriptError> {
    if let Some(key_up) = app.scripts.global_function(KEY_UP_HANDLER)? {
        key_up.call::<()>((key.scancode, key.keysym))?;
    }

    Ok(())
}

pub(super) fn handle_key_down(app: &mut Application, key: KeyEvent) -> Result<(), ScriptError> {
    if let Some(key_down) = app.scripts.global_function(KEY_DOWN_HANDLER)? {
        key_down.call::<()>((key.scancode, key.keysym))?;
    }

    Ok(())
}

pub(super) fn handle_mouse(
    app: &mut Application,
    kind: EventKind,
    pointer: PointerEvent,
) -> Result<(), ScriptError> {
    // Touch is delivered through handleTouch, don't report it twice.
    if pointer.which == TOUCH_MOUSE_ID {
        return Ok(());
    }

    if let Some(mouse) = app.scripts.global_function(MOUSE_HANDLER)? {
        mouse.call::<()>((
            kind.code(),
            pointer.x,
            pointer.y,
            pointer.button,
            u8::from(pointer.pressed),
            pointer.clicks,
            pointer.which,
        ))?;
    }

    Ok(())
}

/// Wheel events go through the same lookup as the other pointer events but
/// their deltas are not handed to the script.
pub(super) fn handle_mouse_wheel(app: &mut Application, wheel: WheelEvent) -> Result<(), ScriptError> {
    if wheel.which == TOUCH_MOUSE_ID {
        return Ok(());
    }

    if app.scripts.global_function(MOUSE_HANDLER)?.is_some() {
        trace!("Mouse wheel ({}, {}) not forwarded", wheel.x, wheel.y);
    }

    Ok(())
}

pub(super) fn handle_touch(
    app: &mut Application,
    kind: EventKind,
    touch: TouchEvent,
) -> Result<(), ScriptError> {
    if let Some(handler) = app.scripts.global_function(TOUCH_HANDLER)? {
        handler.call::<()>((kind.code(), touch.x, touch.y, touch.dx, touch.dy))?;
    }

    Ok(())
}

/// Runs the next task coroutine, then services the network console.
///
/// The console is serviced even when the task fails, the task's error is
/// reported afterwards.
pub(super) fn handle_timer(app: &mut Application) -> Result<(), ScriptError> {
    let resumed = app.scripts.resume();

    app.console.process();

    resumed
}

pub(super) fn handle_window_exposed(app: &mut Application) {
    app.refresh_output_size();
    app.state.render_list.borrow_mut().touch();
    app.state.overlay_render_list.borrow_mut().touch();
}
