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

//! # Disorganiser.
//!
//! A scriptable kiosk display for the terminal.
//!
//! The host owns a display, a periodic timer, a Lua scripting engine and a
//! remote debug console. Everything that appears on screen is built by Lua
//! scripts through the `app` handle, using two render lists: a primary list
//! and an overlay that is always drawn on top of it.
//!
//! ## Architecture
//!
//! There is one thread of control. Input and timer ticks are produced on
//! background threads but only ever posted into a channel; the main loop
//! blocks on that channel, dispatches everything that has arrived to the
//! script handlers, then composites at most one frame.
//!
//! The lifecycle follows a strict setup-run-teardown pattern so the terminal
//! is restored even when startup fails part way through.

mod app;
mod config;
mod console;
mod events;
mod graphics;
mod render;
mod scripts;
mod theme;
mod timer;
mod util;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::info;

use crate::{
    app::{Application, PlatformHints},
    graphics::TerminalGraphics,
    scripts::ScriptError,
    theme::Theme,
};

#[derive(Parser, Debug)]
#[command(version, about = "A scriptable kiosk display for the terminal")]
struct Cli {
    /// Configuration script to run instead of the default one.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Take over the whole terminal.
    #[arg(short, long)]
    fullscreen: bool,

    /// Tell scripts they are driving a picture frame.
    #[arg(long)]
    picture_frame: bool,

    /// Where to write the log.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// The entry point of the application.
///
/// Brings every subsystem up in order, runs the event loop for as long as the
/// scripts keep the application running, then tears everything down again.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli.log_file.unwrap_or_else(util::logging::default_log_path);
    util::logging::init_logging(&log_path)?;

    let settings = config::load_settings();
    let fullscreen = cli.fullscreen || settings.fullscreen;
    let hints = PlatformHints::detect(cli.picture_frame || settings.picture_frame);

    info!("Starting {} {}", config::APP_NAME, env!("CARGO_PKG_VERSION"));

    let graphics = TerminalGraphics::new(Theme::default());
    let mut app = Application::new(settings, hints, Box::new(graphics))
        .map_err(|e| script_failure(e, "Failed to initialise scripting"))?;

    if let Err(e) = app.init_graphics(fullscreen) {
        app.shutdown();
        return Err(e).context("Failed to initialise graphics");
    }

    app.init_console();

    if let Err(e) = app.bind_scripts() {
        app.shutdown();
        return Err(script_failure(e, "Failed to bind the application to scripts"));
    }

    app.init_system();
    if app.is_running() {
        app.load_configuration(cli.config.as_deref());
    }

    if !app.is_running() {
        app.shutdown();
        return Err(anyhow!("Startup failed, see {} for details", log_path.display()));
    }

    events::process_events(&mut app);
    app.shutdown();

    Ok(())
}

/// Lua errors are not `Send`, so they reach `anyhow` as text.
fn script_failure(e: ScriptError, context: &'static str) -> anyhow::Error {
    anyhow!("{e}").context(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_failures_keep_their_message() {
        let e = ScriptError::Lua(mlua::Error::runtime("no bindings"));

        let report = format!("{:#}", script_failure(e, "Failed to bind the application to scripts"));

        assert!(report.starts_with("Failed to bind the application to scripts: "), "{report}");
        assert!(report.contains("no bindings"), "{report}");
    }

    #[test]
    fn script_failures_can_leave_main() {
        fn fatal() -> Result<()> {
            Err(script_failure(
                ScriptError::Lua(mlua::Error::runtime("boom")),
                "Failed to initialise scripting",
            ))
        }

        let e = fatal().unwrap_err();
        assert_eq!(e.to_string(), "Failed to initialise scripting");
        assert_eq!(e.root_cause().to_string(), "runtime error: boom");
    }
}
