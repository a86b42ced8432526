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

//! Host objects exposed to Lua.
//!
//! Scripts reach the host only through the `app` global, an [`AppHandle`]
//! wrapping the shared [`AppState`]. Everything else (render lists, nodes,
//! textures) is obtained from it.
//!
//! ```lua
//! local title = app:newText(2, 1, "Hello")
//! title:setColour(250, 189, 47)
//! app:renderList():add(title)
//! ```

use std::{cell::RefCell, rc::Rc};

use mlua::{Lua, MetaMethod, UserData, UserDataMethods, UserDataRef};
use ratatui::style::Color;

use crate::{
    app::AppState,
    events::{Event, EventKind},
    render::{NodeKind, NodeRef, RenderList, RenderNode, Texture},
    scripts::{ScriptError, ScriptManager},
};

const APP_GLOBAL: &str = "app";
const EVENT_TYPE_GLOBAL: &str = "EventType";

/// Publishes the `app` handle and the `EventType` table to scripts.
pub(crate) fn register(scripts: &ScriptManager, state: Rc<AppState>) -> Result<(), ScriptError> {
    scripts.set_global(APP_GLOBAL, AppHandle(state))?;
    scripts.set_global(EVENT_TYPE_GLOBAL, event_types(scripts.lua())?)?;
    Ok(())
}

fn event_types(lua: &Lua) -> mlua::Result<mlua::Table> {
    lua.create_table_from(
        EventKind::ALL
            .iter()
            .map(|kind| (kind.script_name(), kind.code())),
    )
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(r, g, b)
}

pub(crate) struct AppHandle(Rc<AppState>);

impl UserData for AppHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("width", |_, this, ()| Ok(this.0.width.get()));
        methods.add_method("height", |_, this, ()| Ok(this.0.height.get()));
        methods.add_method("isFullscreen", |_, this, ()| Ok(this.0.fullscreen.get()));
        methods.add_method("onRaspberry", |_, this, ()| Ok(this.0.hints.on_raspberry));
        methods.add_method("onMacMini", |_, this, ()| Ok(this.0.hints.on_mac_mini));
        methods.add_method("isPictureFrame", |_, this, ()| Ok(this.0.hints.is_picture_frame));

        methods.add_method("setTextInputMode", |_, this, enable: bool| {
            this.0.graphics.borrow_mut().set_text_input(enable);
            Ok(())
        });
        methods.add_method("setShowCursor", |_, this, enable: bool| {
            this.0.graphics.borrow_mut().set_show_cursor(enable);
            Ok(())
        });

        methods.add_method("renderList", |_, this, ()| {
            Ok(RenderListHandle(Rc::clone(&this.0.render_list)))
        });
        methods.add_method("overlayRenderList", |_, this, ()| {
            Ok(RenderListHandle(Rc::clone(&this.0.overlay_render_list)))
        });

        methods.add_method("emptyTexture", |_, this, ()| Ok(TextureHandle(this.0.empty_texture())));
        methods.add_method("newTexture", |_, this, lines: Vec<String>| {
            let texture = Texture::from_lines(&lines, this.0.theme.foreground_colour);
            Ok(TextureHandle(Rc::new(texture)))
        });

        methods.add_method("newRectangle", |_, this, (x, y, width, height): (i32, i32, u16, u16)| {
            let mut node = RenderNode::new(
                NodeKind::Rectangle { width, height },
                x,
                y,
                this.0.theme.foreground_colour,
            );
            node.background = Some(this.0.theme.foreground_colour);
            Ok(NodeHandle(node.into_ref()))
        });
        methods.add_method("newText", |_, this, (x, y, text): (i32, i32, String)| {
            let node = RenderNode::new(NodeKind::Text { text }, x, y, this.0.theme.foreground_colour);
            Ok(NodeHandle(node.into_ref()))
        });
        methods.add_method(
            "newImage",
            |_, this, (x, y, texture): (i32, i32, Option<UserDataRef<TextureHandle>>)| {
                let texture = match texture {
                    Some(texture) => Rc::clone(&texture.0),
                    None => this.0.empty_texture(),
                };
                let node = RenderNode::new(NodeKind::Image { texture }, x, y, this.0.theme.foreground_colour);
                Ok(NodeHandle(node.into_ref()))
            },
        );

        methods.add_method("quit", |_, this, ()| {
            // Fails only once the main loop is gone, by which point there is
            // nothing left to stop.
            let _ = this.0.event_tx.send(Event::Quit);
            Ok(())
        });
    }
}

pub(crate) struct RenderListHandle(Rc<RefCell<RenderList>>);

impl UserData for RenderListHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("add", |_, this, node: UserDataRef<NodeHandle>| {
            this.0.borrow_mut().add(Rc::clone(&node.0));
            Ok(())
        });
        methods.add_method("remove", |_, this, node: UserDataRef<NodeHandle>| {
            Ok(this.0.borrow_mut().remove(&node.0))
        });
        methods.add_method("clear", |_, this, ()| {
            this.0.borrow_mut().clear();
            Ok(())
        });
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.0.borrow().len()));
    }
}

pub(crate) struct NodeHandle(NodeRef);

impl NodeHandle {
    fn update(&self, update: impl FnOnce(&mut RenderNode)) {
        self.0.borrow_mut().update(update);
    }
}

impl UserData for NodeHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("position", |_, this, ()| {
            let node = this.0.borrow();
            Ok((node.x, node.y))
        });
        methods.add_method("setPosition", |_, this, (x, y): (i32, i32)| {
            this.update(|node| {
                node.x = x;
                node.y = y;
            });
            Ok(())
        });
        methods.add_method("setSize", |_, this, (w, h): (u16, u16)| {
            let mut node = this.0.borrow_mut();
            if !matches!(node.kind, NodeKind::Rectangle { .. }) {
                return Err(mlua::Error::runtime("setSize applies to rectangles only"));
            }
            node.update(|node| node.kind = NodeKind::Rectangle { width: w, height: h });
            Ok(())
        });
        methods.add_method("setText", |_, this, text: String| {
            let mut node = this.0.borrow_mut();
            if !matches!(node.kind, NodeKind::Text { .. }) {
                return Err(mlua::Error::runtime("setText applies to text only"));
            }
            node.update(|node| node.kind = NodeKind::Text { text });
            Ok(())
        });
        methods.add_method("setTexture", |_, this, texture: UserDataRef<TextureHandle>| {
            let mut node = this.0.borrow_mut();
            if !matches!(node.kind, NodeKind::Image { .. }) {
                return Err(mlua::Error::runtime("setTexture applies to images only"));
            }
            let texture = Rc::clone(&texture.0);
            node.update(|node| node.kind = NodeKind::Image { texture });
            Ok(())
        });
        methods.add_method("setColour", |_, this, (r, g, b): (u8, u8, u8)| {
            this.update(|node| node.foreground = rgb(r, g, b));
            Ok(())
        });
        methods.add_method("setBackground", |_, this, (r, g, b): (u8, u8, u8)| {
            this.update(|node| node.background = Some(rgb(r, g, b)));
            Ok(())
        });
        methods.add_method("setVisible", |_, this, visible: bool| {
            this.update(|node| node.visible = visible);
            Ok(())
        });
    }
}

pub(crate) struct TextureHandle(Rc<Texture>);

impl UserData for TextureHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("width", |_, this, ()| Ok(this.0.width()));
        methods.add_method("height", |_, this, ()| Ok(this.0.height()));
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::test_app;

    #[test]
    fn app_reports_display_state() {
        let (app, _) = test_app();

        let (width, height, fullscreen): (u16, u16, bool) = app
            .scripts
            .lua()
            .load("return app:width(), app:height(), app:isFullscreen()")
            .eval()
            .unwrap();

        assert_eq!((width, height, fullscreen), (40, 10, false));
    }

    #[test]
    fn empty_texture_is_shared() {
        let (app, _) = test_app();

        let width: u16 = app
            .scripts
            .lua()
            .load("placeholder = app:newImage(0, 0) return app:emptyTexture():width()")
            .eval()
            .unwrap();

        assert_eq!(width, 1);
        assert!(std::rc::Rc::ptr_eq(&app.state.empty_texture(), &app.state.empty_texture()));
        // Held by the cache, the image node and the test's two handles.
        assert!(std::rc::Rc::strong_count(&app.state.empty_texture()) >= 3);
    }

    #[test]
    fn list_handles_address_the_shared_lists() {
        let (app, _) = test_app();

        app.scripts
            .exec(
                "local node = app:newText(0, 0, 'x')
                 app:renderList():add(node)
                 app:renderList():add(app:newRectangle(0, 0, 1, 1))
                 app:overlayRenderList():add(node)
                 app:renderList():remove(node)",
            )
            .unwrap();

        assert_eq!(app.state.render_list.borrow().len(), 1);
        assert_eq!(app.state.overlay_render_list.borrow().len(), 1);

        let length: usize = app.scripts.lua().load("return #app:overlayRenderList()").eval().unwrap();
        assert_eq!(length, 1);
    }

    #[test]
    fn node_setters_dirty_the_list() {
        let (mut app, _) = test_app();
        app.scripts
            .exec("label = app:newText(0, 0, 'x') app:renderList():add(label)")
            .unwrap();
        app.render();
        assert!(!app.state.render_list.borrow().should_render());

        app.scripts.exec("label:setText('changed')").unwrap();

        assert!(app.state.render_list.borrow().should_render());
    }

    #[test]
    fn setter_for_wrong_node_kind_raises() {
        let (app, _) = test_app();

        let result = app.scripts.exec("app:newText(0, 0, 'x'):setTexture(app:emptyTexture())");

        assert!(result.is_err());
    }

    #[test]
    fn text_input_mode_reaches_graphics() {
        let (app, log) = test_app();

        app.scripts.exec("app:setTextInputMode(true) app:setShowCursor(false)").unwrap();

        assert!(log.borrow().text_input);
        assert!(!log.borrow().show_cursor);
    }
}
