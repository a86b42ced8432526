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

//! Terminal input translation.
//!
//! Converts `crossterm` events into application [`Event`]s. Keys are reported
//! with SDL-compatible scancodes and keysyms so scripts written against those
//! numbers keep working.

use crossterm::event::{
    Event as TermEvent, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};

use crate::events::{Event, KeyEvent, PointerEvent, WheelEvent};

/// Device id reported for the terminal's mouse.
const TERMINAL_MOUSE_ID: u32 = 0;

/// Keysym flag for keys without a character, as SDL does.
const SCANCODE_MASK: i32 = 1 << 30;

/// Translates one terminal event.
///
/// A single key press can produce both a key-down and a text-input event,
/// text input is only produced while `text_input` is enabled.
pub(super) fn translate(event: TermEvent, text_input: bool) -> Vec<Event> {
    match event {
        TermEvent::Key(key) => translate_key(key, text_input),
        TermEvent::Mouse(mouse) => vec![translate_mouse(mouse)],
        TermEvent::Paste(text) if text_input => vec![Event::TextInput(text)],
        TermEvent::Resize(_, _) | TermEvent::FocusGained => vec![Event::WindowExposed],
        _ => vec![Event::Other],
    }
}

fn translate_key(key: TermKeyEvent, text_input: bool) -> Vec<Event> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![Event::Quit];
    }

    let translated = KeyEvent {
        scancode: scancode(key.code),
        keysym: keysym(key.code),
    };

    match key.kind {
        KeyEventKind::Release => vec![Event::KeyUp(translated)],
        KeyEventKind::Press | KeyEventKind::Repeat => {
            let mut events = vec![Event::KeyDown(translated)];

            if text_input {
                if let KeyCode::Char(c) = key.code {
                    if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                        events.push(Event::TextInput(c.to_string()));
                    }
                }
            }

            events
        }
    }
}

fn translate_mouse(mouse: MouseEvent) -> Event {
    let pointer = |button: u8, pressed: bool| PointerEvent {
        x: mouse.column as i32,
        y: mouse.row as i32,
        button,
        pressed,
        clicks: 1,
        which: TERMINAL_MOUSE_ID,
    };
    let wheel = |x: i32, y: i32| WheelEvent {
        x,
        y,
        which: TERMINAL_MOUSE_ID,
    };

    match mouse.kind {
        MouseEventKind::Down(button) => Event::MouseButtonDown(pointer(button_id(button), true)),
        MouseEventKind::Up(button) => Event::MouseButtonUp(pointer(button_id(button), false)),
        MouseEventKind::Drag(button) => Event::MouseMotion(pointer(button_id(button), true)),
        MouseEventKind::Moved => Event::MouseMotion(pointer(0, false)),
        MouseEventKind::ScrollUp => Event::MouseWheel(wheel(0, 1)),
        MouseEventKind::ScrollDown => Event::MouseWheel(wheel(0, -1)),
        MouseEventKind::ScrollLeft => Event::MouseWheel(wheel(-1, 0)),
        MouseEventKind::ScrollRight => Event::MouseWheel(wheel(1, 0)),
    }
}

fn button_id(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
    }
}

fn scancode(code: KeyCode) -> i32 {
    match code {
        KeyCode::Char(c) => char_scancode(c),
        KeyCode::Enter => 40,
        KeyCode::Esc => 41,
        KeyCode::Backspace => 42,
        KeyCode::Tab | KeyCode::BackTab => 43,
        KeyCode::F(n @ 1..=12) => 57 + n as i32,
        KeyCode::Insert => 73,
        KeyCode::Home => 74,
        KeyCode::PageUp => 75,
        KeyCode::Delete => 76,
        KeyCode::End => 77,
        KeyCode::PageDown => 78,
        KeyCode::Right => 79,
        KeyCode::Left => 80,
        KeyCode::Down => 81,
        KeyCode::Up => 82,
        _ => 0,
    }
}

fn char_scancode(c: char) -> i32 {
    match c.to_ascii_lowercase() {
        c @ 'a'..='z' => 4 + (c as i32 - 'a' as i32),
        c @ '1'..='9' => 30 + (c as i32 - '1' as i32),
        '0' => 39,
        ' ' => 44,
        '-' => 45,
        '=' => 46,
        '[' => 47,
        ']' => 48,
        '\\' => 49,
        ';' => 51,
        '\'' => 52,
        '`' => 53,
        ',' => 54,
        '.' => 55,
        '/' => 56,
        _ => 0,
    }
}

fn keysym(code: KeyCode) -> i32 {
    match code {
        KeyCode::Char(c) if c.is_ascii_alphabetic() => c.to_ascii_lowercase() as i32,
        KeyCode::Char(c) => c as i32,
        KeyCode::Enter => '\r' as i32,
        KeyCode::Esc => 0x1b,
        KeyCode::Backspace => 0x08,
        KeyCode::Tab | KeyCode::BackTab => '\t' as i32,
        KeyCode::Delete => 0x7f,
        other => match scancode(other) {
            0 => 0,
            scancode => scancode | SCANCODE_MASK,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> TermEvent {
        TermEvent::Key(TermKeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind) -> TermEvent {
        TermEvent::Mouse(MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn letter_press_is_key_down() {
        let events = translate(press(KeyCode::Char('A')), false);

        assert_eq!(events, vec![Event::KeyDown(KeyEvent { scancode: 4, keysym: 97 })]);
    }

    #[test]
    fn text_input_mode_adds_text_event() {
        let events = translate(press(KeyCode::Char('A')), true);

        assert_eq!(
            events,
            vec![
                Event::KeyDown(KeyEvent { scancode: 4, keysym: 97 }),
                Event::TextInput("A".into()),
            ]
        );
    }

    #[test]
    fn release_is_key_up() {
        let release = TermKeyEvent::new_with_kind(KeyCode::Enter, KeyModifiers::NONE, KeyEventKind::Release);

        let events = translate(TermEvent::Key(release), true);

        assert_eq!(events, vec![Event::KeyUp(KeyEvent { scancode: 40, keysym: 13 })]);
    }

    #[test]
    fn arrow_keys_carry_scancode_mask() {
        let events = translate(press(KeyCode::Up), false);

        assert_eq!(
            events,
            vec![Event::KeyDown(KeyEvent { scancode: 82, keysym: 82 | SCANCODE_MASK })]
        );
    }

    #[test]
    fn ctrl_c_quits() {
        let event = TermEvent::Key(TermKeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert_eq!(translate(event, true), vec![Event::Quit]);
    }

    #[test]
    fn paste_is_text_only_in_text_mode() {
        assert_eq!(
            translate(TermEvent::Paste("hello".into()), true),
            vec![Event::TextInput("hello".into())]
        );
        assert_eq!(translate(TermEvent::Paste("hello".into()), false), vec![Event::Other]);
    }

    #[test]
    fn mouse_buttons_map_to_pointer_events() {
        let events = translate(mouse(MouseEventKind::Down(MouseButton::Right)), false);

        assert_eq!(
            events,
            vec![Event::MouseButtonDown(PointerEvent {
                x: 3,
                y: 4,
                button: 3,
                pressed: true,
                clicks: 1,
                which: TERMINAL_MOUSE_ID,
            })]
        );
    }

    #[test]
    fn scrolling_is_a_wheel_event() {
        let events = translate(mouse(MouseEventKind::ScrollDown), false);

        assert_eq!(
            events,
            vec![Event::MouseWheel(WheelEvent { x: 0, y: -1, which: TERMINAL_MOUSE_ID })]
        );
    }

    #[test]
    fn resize_and_focus_expose_the_window() {
        assert_eq!(translate(TermEvent::Resize(80, 24), false), vec![Event::WindowExposed]);
        assert_eq!(translate(TermEvent::FocusGained, false), vec![Event::WindowExposed]);
        assert_eq!(translate(TermEvent::FocusLost, false), vec![Event::Other]);
    }
}
