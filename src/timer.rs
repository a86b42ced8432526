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

//! Periodic timer events.
//!
//! The [`Timer`] owns a background thread that posts [`Event::Timer`] into
//! the main event queue at a fixed interval. Each tick advances one script
//! task and services the network console.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, warn};

use crate::events::Event;

const DEFAULT_INTERVAL_MS: u64 = 10;

pub(crate) struct Timer {
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub(crate) fn new() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub(crate) fn with_interval(&mut self, millis: u64) -> &mut Self {
        self.interval = Duration::from_millis(millis.max(1));
        self
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts posting timer events to `event_tx`.
    ///
    /// Starting a timer that is already running does nothing.
    pub(crate) fn start(&mut self, event_tx: Sender<Event>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let interval = self.interval;
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name("timer".into())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    thread::sleep(interval);
                    if !running.load(Ordering::Acquire) || event_tx.send(Event::Timer).is_err() {
                        break;
                    }
                }
            });

        match spawned {
            Ok(handle) => {
                debug!("Timer started with interval {:?}", self.interval);
                self.handle = Some(handle);
            }
            Err(e) => {
                warn!("Could not start timer thread: {e}");
                self.running.store(false, Ordering::Release);
            }
        }
    }

    /// Stops the timer and waits for its thread to finish.
    pub(crate) fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        if let Some(handle) = self.handle.take() {
            join(handle);
        }
    }
}

/// Waits for the timer thread, returns whether it finished cleanly.
fn join(handle: JoinHandle<()>) -> bool {
    let Err(payload) = handle.join() else {
        return true;
    };

    let reason = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    warn!("Timer thread panicked: {reason}");

    false
}
