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

//! Application configuration.
//!
//! There are two layers of configuration:
//!
//! * Host [`Settings`], a small settings file managed with `confy`, covering
//!   what must be known before any script runs (display size, timer interval,
//!   console address).
//! * The Lua configuration script, which sets up the display itself. Its
//!   location is resolved by [`resolve_config_path`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub(crate) const APP_NAME: &str = "disorganiser";

const SETTINGS_NAME: &str = "settings";

const CONFIG_SCRIPT: &str = "config.lua";

/// Bootstrap script, relative to the working directory.
pub(crate) const SYSTEM_INIT_SCRIPT: &str = "scripts/init.lua";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub version: u32,
    pub width: u16,
    pub height: u16,
    pub fullscreen: bool,
    pub picture_frame: bool,
    pub timer_interval_ms: u64,
    pub console_address: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            width: 80,
            height: 25,
            fullscreen: false,
            picture_frame: false,
            timer_interval_ms: 10,
            console_address: "127.0.0.1:8023".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    confy::load(APP_NAME, Some(SETTINGS_NAME)).unwrap_or_default()
}

/// Resolves the Lua configuration script location.
///
/// An explicit path always wins. Otherwise the script is
/// `<home>/.config/disorganiser/config.lua`; `None` is returned when the home
/// directory is unknown.
pub(crate) fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => dirs::home_dir().map(|home| default_config_path(&home)),
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".config").join(APP_NAME).join(CONFIG_SCRIPT)
}
