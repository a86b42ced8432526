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

//! Hardware and deployment hints exposed to scripts.

use std::fs;

use log::debug;

const DEVICE_TREE_MODEL: &str = "/sys/firmware/devicetree/base/model";

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PlatformHints {
    pub(crate) on_raspberry: bool,
    pub(crate) on_mac_mini: bool,
    pub(crate) is_picture_frame: bool,
}

impl PlatformHints {
    pub(crate) fn detect(picture_frame: bool) -> Self {
        let hints = Self {
            on_raspberry: on_raspberry(),
            on_mac_mini: on_mac_mini(),
            is_picture_frame: picture_frame,
        };
        debug!("Platform hints {hints:?}");
        hints
    }
}

fn on_raspberry() -> bool {
    fs::read_to_string(DEVICE_TREE_MODEL)
        .map(|model| is_raspberry_model(&model))
        .unwrap_or(false)
}

#[cfg(target_os = "macos")]
fn on_mac_mini() -> bool {
    std::process::Command::new("sysctl")
        .args(["-n", "hw.model"])
        .output()
        .map(|output| is_mac_mini_model(&String::from_utf8_lossy(&output.stdout)))
        .unwrap_or(false)
}

#[cfg(not(target_os = "macos"))]
fn on_mac_mini() -> bool {
    false
}

fn is_raspberry_model(model: &str) -> bool {
    // The device tree string is NUL terminated.
    model.trim_end_matches('\0').starts_with("Raspberry Pi")
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn is_mac_mini_model(model: &str) -> bool {
    model.trim().starts_with("Macmini")
}
