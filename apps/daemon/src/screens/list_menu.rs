//! Generic list menu used for the top-level menu and every submenu.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cyfi_core::{
    handle_menu_select, FrameSink, ItemAction, MenuItem, MenuList, MenuScreen, Mode, Navigator,
    Screen, Transition,
};

/// Rows that fit under the title.
const VISIBLE_ROWS: usize = 4;

pub struct ListMenuScreen {
    mode: Mode,
    display: Arc<dyn FrameSink>,
    navigator: Navigator,
    list: Mutex<MenuList>,
    active: AtomicBool,
}

impl ListMenuScreen {
    pub fn new(
        mode: Mode,
        items: Vec<MenuItem>,
        navigator: Navigator,
        display: Arc<dyn FrameSink>,
    ) -> Self {
        Self {
            mode,
            display,
            navigator,
            list: Mutex::new(MenuList::new(items)),
            active: AtomicBool::new(false),
        }
    }

    fn list(&self) -> MutexGuard<'_, MenuList> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self) {
        let lines = {
            let list = self.list();
            rows(self.mode.title(), list.items(), list.cursor())
        };
        self.display.show_text(&lines);
    }
}

/// Title followed by a window of items around the cursor.
fn rows(title: &str, items: &[MenuItem], cursor: usize) -> Vec<String> {
    let first = cursor.saturating_sub(VISIBLE_ROWS - 1);
    let mut rows = vec![title.to_string()];
    rows.extend(
        items
            .iter()
            .enumerate()
            .skip(first)
            .take(VISIBLE_ROWS)
            .map(|(i, item)| {
                let marker = if i == cursor { ">" } else { " " };
                format!("{} {}", marker, item.title())
            }),
    );
    rows
}

impl Screen for ListMenuScreen {
    fn start_mode(&self) {
        self.list().reset();
        self.active.store(true, Ordering::Release);
        self.render();
    }

    fn stop_mode(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl MenuScreen for ListMenuScreen {
    fn select_item(&self) {
        let (index, items) = {
            let list = self.list();
            (list.cursor(), list.items().to_vec())
        };
        if handle_menu_select(self, &self.navigator, index, &items) {
            return;
        }
        match items.get(index).and_then(MenuItem::action) {
            Some(ItemAction::Open(child)) => {
                self.navigator.trigger(Transition::To(*child));
            }
            Some(ItemAction::Custom(name)) => {
                log::info!("Menu: '{}' selected in {}", name, self.mode);
            }
            Some(ItemAction::Back) | None => {
                log::debug!("Menu: Item {} in {} has no action", index, self.mode);
            }
        }
    }

    fn scroll_selection(&self, delta: i32) {
        let moved = self.list().scroll(delta);
        if moved && self.active.load(Ordering::Acquire) {
            self.render();
        }
    }
}

/// Entries for `mode`: its child menus, or a placeholder for leaf menus
/// whose content comes from the player.
pub fn items_for(mode: Mode) -> Vec<MenuItem> {
    let children = mode.children();
    if !children.is_empty() {
        return children.into_iter().map(MenuItem::open).collect();
    }
    match mode {
        Mode::SystemInfo => vec![MenuItem::label(concat!("cyfid ", env!("CARGO_PKG_VERSION")))],
        _ => vec![MenuItem::label("No items")],
    }
}
