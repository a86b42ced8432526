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

//! Application state and lifecycle.
//!
//! [`Application`] owns every subsystem and brings them up and down in a
//! fixed order. The parts scripts can reach (display state, graphics, the two
//! render lists) live in [`AppState`], which is shared with the `app` handle
//! published to Lua.
//!
//! # Startup
//!
//! 1. [`Application::init_graphics`]
//! 2. [`Application::init_console`] and [`Application::bind_scripts`]
//! 3. [`Application::init_system`], which runs the bootstrap script
//! 4. [`Application::load_configuration`], which runs the user script
//!
//! A failure in steps 3 or 4 clears the running flag so the main loop is
//! never entered.

mod hints;

pub(crate) use hints::PlatformHints;

use std::{
    cell::{Cell, RefCell},
    path::Path,
    rc::Rc,
    sync::mpsc::Sender,
};

use log::{error, info};

use crate::{
    config::{self, Settings},
    console::TelnetConsole,
    events::{Event, EventQueue},
    graphics::{Graphics, GraphicsError, GraphicsOptions},
    render::{RenderList, Texture},
    scripts::{ScriptError, ScriptManager, bindings},
    theme::Theme,
    timer::Timer,
};

const WINDOW_TITLE: &str = "Disorganiser";

/// State shared between the host and scripts.
pub(crate) struct AppState {
    pub(crate) width: Cell<u16>,
    pub(crate) height: Cell<u16>,
    pub(crate) fullscreen: Cell<bool>,
    pub(crate) hints: PlatformHints,
    pub(crate) theme: Theme,

    pub(crate) graphics: RefCell<Box<dyn Graphics>>,

    pub(crate) render_list: Rc<RefCell<RenderList>>,
    pub(crate) overlay_render_list: Rc<RefCell<RenderList>>,

    empty_texture: RefCell<Option<Rc<Texture>>>,

    pub(crate) event_tx: Sender<Event>,
}

impl AppState {
    /// The placeholder texture, created on first use and shared from then on.
    pub(crate) fn empty_texture(&self) -> Rc<Texture> {
        let mut cached = self.empty_texture.borrow_mut();
        let texture = cached.get_or_insert_with(|| Rc::new(Texture::empty(self.theme.placeholder_colour)));
        Rc::clone(texture)
    }
}

pub(crate) struct Application {
    running: bool,
    graphics_initialised: bool,
    shut_down: bool,

    settings: Settings,

    pub(crate) state: Rc<AppState>,
    pub(crate) events: EventQueue,
    pub(crate) scripts: ScriptManager,
    pub(crate) console: TelnetConsole,

    timer: Timer,
}

impl Application {
    pub(crate) fn new(
        settings: Settings,
        hints: PlatformHints,
        graphics: Box<dyn Graphics>,
    ) -> Result<Self, ScriptError> {
        let events = EventQueue::new();
        let scripts = ScriptManager::new()?;
        let console = TelnetConsole::new(scripts.lua().clone(), settings.console_address.clone());

        let state = AppState {
            width: Cell::new(settings.width),
            height: Cell::new(settings.height),
            fullscreen: Cell::new(false),
            hints,
            theme: Theme::default(),
            graphics: RefCell::new(graphics),
            render_list: Rc::default(),
            overlay_render_list: Rc::default(),
            empty_texture: RefCell::new(None),
            event_tx: events.sender(),
        };

        Ok(Self {
            running: true,
            graphics_initialised: false,
            shut_down: false,
            settings,
            state: Rc::new(state),
            events,
            scripts,
            console,
            timer: Timer::new(),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    #[cfg(test)]
    pub(crate) fn resume_running(&mut self) {
        self.running = true;
    }

    /// Brings up the display and starts the timer.
    ///
    /// The window is created at the configured size, the real drawable size
    /// is read back and a blank frame is presented. Any failure is logged and
    /// returned, the caller must not enter the main loop.
    pub(crate) fn init_graphics(&mut self, fullscreen: bool) -> Result<(), GraphicsError> {
        let mut options = GraphicsOptions::default().with_video().with_timer();
        if fullscreen {
            options = options.with_fullscreen_desktop();
        }

        if let Err(e) = self.start_graphics(options) {
            error!("Failed to initialise graphics: {e}");
            return Err(e);
        }

        self.timer
            .with_interval(self.settings.timer_interval_ms)
            .start(self.events.sender());

        Ok(())
    }

    fn start_graphics(&mut self, options: GraphicsOptions) -> Result<(), GraphicsError> {
        {
            let mut graphics = self.state.graphics.borrow_mut();
            if let Err(e) = graphics.init(options, self.events.sender()) {
                // Undo whatever part of the set up did happen.
                graphics.shutdown();
                return Err(e);
            }
            self.graphics_initialised = true;
            graphics.create_window(WINDOW_TITLE, self.settings.width, self.settings.height)?;
        }

        self.state.fullscreen.set(options.fullscreen_desktop);
        self.refresh_output_size();

        let mut graphics = self.state.graphics.borrow_mut();
        graphics.clear();
        graphics.present()
    }

    pub(crate) fn init_console(&mut self) {
        self.console.listen();
    }

    /// Publishes the `app` handle to scripts.
    pub(crate) fn bind_scripts(&self) -> Result<(), ScriptError> {
        bindings::register(&self.scripts, Rc::clone(&self.state))
    }

    /// Runs the bootstrap script.
    pub(crate) fn init_system(&mut self) {
        self.init_system_from(Path::new(config::SYSTEM_INIT_SCRIPT));
    }

    fn init_system_from(&mut self, path: &Path) {
        if let Err(e) = self.scripts.run_from_file(path) {
            error!("Failed to load system init script: {e}");
            self.stop();
        }
    }

    /// Runs the user configuration script, from `explicit` if given or from
    /// the default location otherwise.
    pub(crate) fn load_configuration(&mut self, explicit: Option<&Path>) {
        let Some(path) = config::resolve_config_path(explicit) else {
            error!("No configuration given and no home directory to find one in");
            self.stop();
            return;
        };

        info!("Loading configuration from {}", path.display());

        if let Err(e) = self.scripts.run_from_file(&path) {
            error!("Failed to load configuration: {e}");
            self.stop();
        }
    }

    /// Reads the real drawable size back from the display.
    pub(crate) fn refresh_output_size(&self) {
        let (width, height) = self.state.graphics.borrow_mut().output_size();
        self.state.width.set(width);
        self.state.height.set(height);
    }

    /// Composites and presents a frame if either render list has changed.
    ///
    /// The primary list is always drawn first so the overlay ends up on top.
    /// Returns whether a frame was produced.
    pub(crate) fn render(&mut self) -> bool {
        let mut primary = self.state.render_list.borrow_mut();
        let mut overlay = self.state.overlay_render_list.borrow_mut();

        if !primary.should_render() && !overlay.should_render() {
            return false;
        }

        let mut graphics = self.state.graphics.borrow_mut();
        graphics.clear();
        primary.render(graphics.surface());
        overlay.render(graphics.surface());

        if let Err(e) = graphics.present() {
            error!("{e}");
        }

        true
    }

    /// Tears everything down: console, scripts, timer, then graphics.
    ///
    /// Only the first call does anything.
    pub(crate) fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.console.shutdown();
        self.scripts.shutdown();
        if self.timer.is_running() {
            self.timer.stop();
        }

        self.state.empty_texture.borrow_mut().take();

        if self.graphics_initialised {
            self.state.graphics.borrow_mut().shutdown();
            self.graphics_initialised = false;
        }

        info!("Shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::testing::{RecordingGraphics, test_app};

    fn script(source: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".lua").tempfile().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    #[test]
    fn configuration_runs_immediately() {
        let (mut app, _) = test_app();
        let config = script("configured = app:width()");

        app.load_configuration(Some(config.path()));

        assert!(app.is_running());
        assert_eq!(app.scripts.lua().globals().get::<u16>("configured").unwrap(), 40);
    }

    #[test]
    fn missing_configuration_stops_startup() {
        let (mut app, _) = test_app();

        app.load_configuration(Some(Path::new("/no/such/config.lua")));

        assert!(!app.is_running());
    }

    #[test]
    fn failing_configuration_stops_startup() {
        let (mut app, _) = test_app();
        let config = script("error('bad config')");

        app.load_configuration(Some(config.path()));

        assert!(!app.is_running());
    }

    fn bootstrap() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(config::SYSTEM_INIT_SCRIPT)
    }

    #[test]
    fn missing_bootstrap_stops_startup() {
        let (mut app, _) = test_app();

        app.init_system_from(Path::new("/no/such/init.lua"));

        assert!(!app.is_running());
    }

    #[test]
    fn failing_bootstrap_stops_startup() {
        let (mut app, _) = test_app();
        let init = script("error('boom')");

        app.init_system_from(init.path());

        assert!(!app.is_running());
    }

    #[test]
    fn bootstrap_tasks_step_on_timer_ticks() {
        let (mut app, _) = test_app();
        app.init_system_from(&bootstrap());
        assert!(app.is_running());

        app.scripts
            .exec("count = 0 every(2, function() count = count + 1 return count < 3 end)")
            .unwrap();
        assert_eq!(app.scripts.pending_tasks(), 1);

        // One call, then two idle ticks per sleep.
        let mut counts = Vec::new();
        for _ in 0..6 {
            crate::events::dispatch_event(&mut app, crate::events::Event::Timer).unwrap();
            counts.push(app.scripts.lua().globals().get::<i64>("count").unwrap());
        }

        assert_eq!(counts, vec![1, 1, 2, 2, 3, 3]);
        assert_eq!(app.scripts.pending_tasks(), 0);
    }

    #[test]
    fn bootstrap_centres_text() {
        let (mut app, _) = test_app();
        app.init_system_from(&bootstrap());

        let (x, y): (i32, i32) = app
            .scripts
            .lua()
            .load("return centredText(3, 'hello'):position()")
            .eval()
            .unwrap();

        assert_eq!((x, y), (17, 3));
    }

    #[test]
    fn init_graphics_reads_back_real_size() {
        let (graphics, log) = RecordingGraphics::new();
        let graphics = graphics.with_output_size(120, 40);
        let mut app = Application::new(Settings::default(), PlatformHints::default(), Box::new(graphics)).unwrap();

        app.init_graphics(true).unwrap();

        assert_eq!((app.state.width.get(), app.state.height.get()), (120, 40));
        assert!(app.state.fullscreen.get());
        assert_eq!(log.borrow().presents, 1);

        app.shutdown();
        assert!(log.borrow().shut_down);
    }

    #[test]
    fn init_graphics_failure_is_reported() {
        let (graphics, log) = RecordingGraphics::new();
        let graphics = graphics.failing_init();
        let mut app = Application::new(Settings::default(), PlatformHints::default(), Box::new(graphics)).unwrap();

        assert!(app.init_graphics(false).is_err());
        assert_eq!(log.borrow().presents, 0);
        assert!(log.borrow().shut_down);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (mut app, _) = test_app();
        app.scripts
            .exec("addTask(function() while true do coroutine.yield() end end)")
            .unwrap();

        app.shutdown();
        app.shutdown();

        assert_eq!(app.scripts.pending_tasks(), 0);
    }

    #[test]
    fn placeholder_is_created_once_and_released_at_shutdown() {
        let (mut app, _) = test_app();

        let first = app.state.empty_texture();
        let second = app.state.empty_texture();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(Rc::strong_count(&first), 3);

        app.shutdown();
        assert_eq!(Rc::strong_count(&first), 2);
    }

    #[test]
    fn render_skips_clean_lists() {
        let (mut app, log) = test_app();

        assert!(!app.render());
        assert_eq!(log.borrow().clears, 0);

        app.state.overlay_render_list.borrow_mut().touch();
        assert!(app.render());
        assert_eq!(log.borrow().clears, 1);
        assert_eq!(log.borrow().presents, 1);
    }
}
