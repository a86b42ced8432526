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

//! Lua scripting host.
//!
//! The [`ScriptManager`] owns the Lua state and a queue of cooperative tasks.
//! A task is a Lua coroutine; each call to [`ScriptManager::resume`] advances
//! the task at the front of the queue to its next yield (or to completion)
//! and moves it to the back if it still has work to do.
//!
//! Script files run as tasks too: their first step runs as soon as they are
//! loaded and anything after a yield is scheduled like any other task.
//! Scripts can start more tasks with the global `addTask(fn)`.
//!
//! # Errors
//!
//! Every failure raised by Lua surfaces as a [`ScriptError`] value. Callers
//! decide whether it is fatal (startup) or logged and discarded (dispatch).

pub(crate) mod bindings;

use std::{
    cell::RefCell,
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use log::debug;
use mlua::{Function, IntoLua, Lua, Thread, ThreadStatus, Value};
use thiserror::Error;

const ADD_TASK: &str = "addTask";

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("could not read script {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

type TaskQueue = Rc<RefCell<VecDeque<Thread>>>;

pub(crate) struct ScriptManager {
    lua: Lua,
    tasks: TaskQueue,
}

impl ScriptManager {
    /// Creates a fresh Lua state with the task scheduler installed.
    pub(crate) fn new() -> Result<Self, ScriptError> {
        let lua = Lua::new();
        let tasks: TaskQueue = Rc::default();

        let queue = Rc::clone(&tasks);
        let add_task = lua.create_function(move |lua, function: Function| {
            let thread = lua.create_thread(function)?;
            queue.borrow_mut().push_back(thread);
            Ok(())
        })?;
        lua.globals().set(ADD_TASK, add_task)?;

        Ok(Self { lua, tasks })
    }

    pub(crate) fn lua(&self) -> &Lua {
        &self.lua
    }

    pub(crate) fn set_global(&self, name: &str, value: impl IntoLua) -> Result<(), ScriptError> {
        self.lua.globals().set(name, value)?;
        Ok(())
    }

    /// Returns the named global when it is a function.
    pub(crate) fn global_function(&self, name: &str) -> Result<Option<Function>, ScriptError> {
        match self.lua.globals().get::<Value>(name)? {
            Value::Function(function) => Ok(Some(function)),
            _ => Ok(None),
        }
    }

    /// Compiles the script at `path` and runs it up to its first yield
    /// straight away, ahead of any queued task.
    ///
    /// If the script yields, the rest of it is queued like any other task.
    pub(crate) fn run_from_file(&mut self, path: &Path) -> Result<(), ScriptError> {
        let task = self.compile_file(path)?;
        self.step(task)
    }

    /// Advances the task at the front of the queue by one step.
    ///
    /// A task that fails is dropped and its error returned. Resuming with no
    /// queued tasks does nothing.
    pub(crate) fn resume(&mut self) -> Result<(), ScriptError> {
        // Released before resuming so that the task can call addTask.
        let next = self.tasks.borrow_mut().pop_front();

        match next {
            Some(task) => self.step(task),
            None => Ok(()),
        }
    }

    pub(crate) fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Drops every task and reclaims script memory.
    pub(crate) fn shutdown(&mut self) {
        debug!("Dropping {} pending script tasks", self.pending_tasks());
        self.tasks.borrow_mut().clear();
        if let Err(e) = self.lua.gc_collect() {
            debug!("Lua garbage collection failed during shutdown: {e}");
        }
    }

    #[cfg(test)]
    pub(crate) fn exec(&self, chunk: &str) -> Result<(), ScriptError> {
        self.lua.load(chunk).exec()?;
        Ok(())
    }

    fn compile_file(&self, path: &Path) -> Result<Thread, ScriptError> {
        let source = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let function = self
            .lua
            .load(source)
            .set_name(format!("@{}", path.display()))
            .into_function()?;

        Ok(self.lua.create_thread(function)?)
    }

    fn step(&mut self, task: Thread) -> Result<(), ScriptError> {
        task.resume::<()>(())?;

        if task.status() == ThreadStatus::Resumable {
            self.tasks.borrow_mut().push_back(task);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn script(source: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".lua").tempfile().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    fn int(scripts: &ScriptManager, name: &str) -> i64 {
        scripts.lua().globals().get(name).unwrap()
    }

    #[test]
    fn run_executes_first_step_immediately() {
        let mut scripts = ScriptManager::new().unwrap();
        let config = script("order = (order or '') .. 'config' coroutine.yield() order = order .. '+rest'");
        scripts
            .exec("addTask(function() order = (order or '') .. 'queued' end)")
            .unwrap();

        scripts.run_from_file(config.path()).unwrap();

        let order: String = scripts.lua().globals().get("order").unwrap();
        assert_eq!(order, "config");
        assert_eq!(scripts.pending_tasks(), 2);

        scripts.resume().unwrap();
        scripts.resume().unwrap();
        let order: String = scripts.lua().globals().get("order").unwrap();
        assert_eq!(order, "configqueued+rest");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let mut scripts = ScriptManager::new().unwrap();

        let result = scripts.run_from_file(Path::new("/definitely/not/here.lua"));

        assert!(matches!(result, Err(ScriptError::Read { .. })));
    }

    #[test]
    fn finished_script_leaves_nothing_queued() {
        let mut scripts = ScriptManager::new().unwrap();
        let file = script("ran = 1");

        scripts.run_from_file(file.path()).unwrap();

        assert_eq!(int(&scripts, "ran"), 1);
        assert_eq!(scripts.pending_tasks(), 0);
    }

    #[test]
    fn syntax_error_fails_to_load() {
        let mut scripts = ScriptManager::new().unwrap();
        let file = script("this is not lua");

        assert!(matches!(scripts.run_from_file(file.path()), Err(ScriptError::Lua(_))));
        assert_eq!(scripts.pending_tasks(), 0);
    }

    #[test]
    fn tasks_round_robin_one_step_per_resume() {
        let mut scripts = ScriptManager::new().unwrap();
        scripts
            .exec(
                "trace = ''
                 addTask(function() trace = trace .. 'a1' coroutine.yield() trace = trace .. 'a2' end)
                 addTask(function() trace = trace .. 'b1' coroutine.yield() trace = trace .. 'b2' end)",
            )
            .unwrap();

        for _ in 0..4 {
            scripts.resume().unwrap();
        }

        let trace: String = scripts.lua().globals().get("trace").unwrap();
        assert_eq!(trace, "a1b1a2b2");
        assert_eq!(scripts.pending_tasks(), 0);
    }

    #[test]
    fn failed_task_is_dropped() {
        let mut scripts = ScriptManager::new().unwrap();
        scripts
            .exec("addTask(function() coroutine.yield() error('late failure') end)")
            .unwrap();

        scripts.resume().unwrap();
        let error = scripts.resume().unwrap_err();

        assert!(error.to_string().contains("late failure"));
        assert_eq!(scripts.pending_tasks(), 0);
    }

    #[test]
    fn task_may_add_tasks_while_running() {
        let mut scripts = ScriptManager::new().unwrap();
        scripts
            .exec("addTask(function() addTask(function() nested = 1 end) end)")
            .unwrap();

        scripts.resume().unwrap();
        scripts.resume().unwrap();

        assert_eq!(int(&scripts, "nested"), 1);
    }

    #[test]
    fn global_function_ignores_other_values() {
        let scripts = ScriptManager::new().unwrap();
        scripts.exec("notFunction = 'x' function isFunction() end").unwrap();

        assert!(scripts.global_function("isFunction").unwrap().is_some());
        assert!(scripts.global_function("notFunction").unwrap().is_none());
        assert!(scripts.global_function("absent").unwrap().is_none());
    }

    #[test]
    fn shutdown_drops_pending_tasks() {
        let mut scripts = ScriptManager::new().unwrap();
        scripts
            .exec("addTask(function() while true do coroutine.yield() end end)")
            .unwrap();
        scripts.resume().unwrap();

        scripts.shutdown();

        assert_eq!(scripts.pending_tasks(), 0);
    }
}
