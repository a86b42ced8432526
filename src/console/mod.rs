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

//! Remote Lua console.
//!
//! A line-oriented debug console reachable with `telnet` or `nc`. Every
//! complete line a client sends is run against the application's Lua state
//! and the results are written back.
//!
//! Nothing here blocks: the console only makes progress when
//! [`TelnetConsole::process`] is called, which the main loop does once per
//! timer tick. Lua is therefore only ever touched from the main thread.

use std::{
    io::{self, ErrorKind, Read, Write},
    net::{Shutdown, SocketAddr, TcpListener, TcpStream},
};

use log::{debug, info, warn};
use mlua::{Function, Lua, MultiValue};

const GREETING: &str = "Disorganiser console, 'quit' to disconnect\r\n";
const PROMPT: &str = "> ";
const FAREWELL: &str = "Bye\r\n";
const LINE_TOO_LONG: &str = "error: line too long\r\n";

const CHUNK_NAME: &str = "=console";

const READ_BUFFER_SIZE: usize = 1024;
const MAX_LINE_LENGTH: usize = 4096;

struct Client {
    stream: TcpStream,
    peer: SocketAddr,
    pending: Vec<u8>,
}

impl Client {
    fn connect(stream: TcpStream, peer: SocketAddr) -> io::Result<Self> {
        stream.set_nonblocking(true)?;

        let mut client = Self {
            stream,
            peer,
            pending: Vec::new(),
        };
        client.send(GREETING)?;
        client.send(PROMPT)?;

        Ok(client)
    }

    fn send(&mut self, text: &str) -> io::Result<()> {
        self.stream.write_all(text.as_bytes())
    }

    /// Reads whatever is available without blocking, stopping early once
    /// more than a line's worth is buffered.
    ///
    /// Returns `false` once the peer has gone away.
    fn receive(&mut self) -> bool {
        let mut buf = [0u8; READ_BUFFER_SIZE];

        while self.pending.len() <= MAX_LINE_LENGTH {
            match self.stream.read(&mut buf) {
                Ok(0) => return false,
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return true,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("Console read from {} failed: {e}", self.peer);
                    return false;
                }
            }
        }

        true
    }

    fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();

        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    /// Services one client, returns whether it should stay connected.
    fn serve(&mut self, lua: &Lua) -> bool {
        if !self.receive() {
            info!("Console client {} disconnected", self.peer);
            return false;
        }

        while let Some(line) = self.next_line() {
            let reply = match line.as_str() {
                "" => String::new(),
                "quit" | "exit" => {
                    self.send(FAREWELL).ok();
                    self.stream.shutdown(Shutdown::Both).ok();
                    info!("Console client {} closed the session", self.peer);
                    return false;
                }
                chunk => evaluate(lua, chunk),
            };

            if let Err(e) = self.send(&reply).and_then(|()| self.send(PROMPT)) {
                debug!("Console write to {} failed: {e}", self.peer);
                return false;
            }
        }

        if self.pending.len() > MAX_LINE_LENGTH {
            self.send(LINE_TOO_LONG).ok();
            self.stream.shutdown(Shutdown::Both).ok();
            warn!("Console client {} sent an overlong line, disconnected", self.peer);
            return false;
        }

        true
    }
}

pub(crate) struct TelnetConsole {
    lua: Lua,
    address: String,
    listener: Option<TcpListener>,
    clients: Vec<Client>,
}

impl TelnetConsole {
    /// Creates a console for `lua`. Nothing is bound until [`listen`] is
    /// called.
    ///
    /// [`listen`]: TelnetConsole::listen
    pub(crate) fn new(lua: Lua, address: impl Into<String>) -> Self {
        Self {
            lua,
            address: address.into(),
            listener: None,
            clients: Vec::new(),
        }
    }

    /// Starts accepting connections.
    ///
    /// The console is optional, if the address cannot be bound a warning is
    /// logged and the console stays disabled.
    pub(crate) fn listen(&mut self) {
        let bound = TcpListener::bind(&self.address).and_then(|listener| {
            listener.set_nonblocking(true)?;
            Ok(listener)
        });

        match bound {
            Ok(listener) => {
                self.listener = Some(listener);
                if let Some(addr) = self.local_addr() {
                    info!("Console listening on {addr}");
                }
            }
            Err(e) => warn!("Console disabled, could not listen on {}: {e}", self.address),
        }
    }

    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|listener| listener.local_addr().ok())
    }

    pub(crate) fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// One non-blocking service step: accept new connections, then read and
    /// run any complete lines from every client.
    pub(crate) fn process(&mut self) {
        self.accept();

        let lua = &self.lua;
        self.clients.retain_mut(|client| client.serve(lua));
    }

    /// Disconnects every client and stops listening.
    pub(crate) fn shutdown(&mut self) {
        if self.client_count() > 0 {
            debug!("Disconnecting {} console clients", self.client_count());
        }
        for client in self.clients.drain(..) {
            client.stream.shutdown(Shutdown::Both).ok();
        }

        if self.listener.take().is_some() {
            debug!("Console stopped");
        }
    }

    fn accept(&mut self) {
        let Some(listener) = &self.listener else {
            return;
        };

        loop {
            match listener.accept() {
                Ok((stream, peer)) => match Client::connect(stream, peer) {
                    Ok(client) => {
                        info!("Console client connected from {peer}");
                        self.clients.push(client);
                    }
                    Err(e) => warn!("Could not set up console client {peer}: {e}"),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("Console accept failed: {e}");
                    break;
                }
            }
        }
    }
}

/// Runs one console line and formats the reply.
///
/// The line is first tried as an expression so that `1 + 2` prints `3`; when
/// that does not compile it is run as a statement.
fn evaluate(lua: &Lua, line: &str) -> String {
    let result = compile(lua, &format!("return {line}"))
        .or_else(|_| compile(lua, line))
        .and_then(|function| function.call::<MultiValue>(()))
        .and_then(|values| format_values(lua, values));

    match result {
        Ok(text) if text.is_empty() => text,
        Ok(text) => format!("{text}\r\n"),
        Err(e) => format!("error: {e}\r\n"),
    }
}

fn compile(lua: &Lua, source: &str) -> mlua::Result<Function> {
    lua.load(source).set_name(CHUNK_NAME).into_function()
}

fn format_values(lua: &Lua, values: MultiValue) -> mlua::Result<String> {
    let tostring: Function = lua.globals().get("tostring")?;

    let texts = values
        .into_iter()
        .map(|value| tostring.call::<String>(value))
        .collect::<mlua::Result<Vec<_>>>()?;

    Ok(texts.join("\t"))
}
