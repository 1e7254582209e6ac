//! Menu items and the Back-sentinel convention.
//!
//! Menu-like screens append a synthetic "Back" entry to their item list.
//! Selecting it stops the screen and hands control to the Mode Manager's
//! `back()`; [`handle_menu_select`] implements that once for every screen.

use crate::manager::Navigator;
use crate::screen::Screen;
use crate::Mode;

pub const BACK_LABEL: &str = "Back";

/// What selecting a structured entry does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAction {
    Back,
    /// Open a child mode
    Open(Mode),
    /// Screen-specific action identified by name
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    /// Plain text entry
    Label(String),
    /// Entry tagged with an action
    Entry {
        title: String,
        action: Option<ItemAction>,
    },
}

impl MenuItem {
    pub fn label(title: &str) -> Self {
        MenuItem::Label(title.to_string())
    }

    pub fn entry(title: &str, action: ItemAction) -> Self {
        MenuItem::Entry {
            title: title.to_string(),
            action: Some(action),
        }
    }

    /// Structured entry opening `mode`, titled after it.
    pub fn open(mode: Mode) -> Self {
        Self::entry(mode.title(), ItemAction::Open(mode))
    }

    pub fn title(&self) -> &str {
        match self {
            MenuItem::Label(title) => title,
            MenuItem::Entry { title, .. } => title,
        }
    }

    pub fn action(&self) -> Option<&ItemAction> {
        match self {
            MenuItem::Label(_) => None,
            MenuItem::Entry { action, .. } => action.as_ref(),
        }
    }

    pub fn is_back(&self) -> bool {
        match self {
            MenuItem::Label(title) => title == BACK_LABEL,
            MenuItem::Entry { action, .. } => action == &Some(ItemAction::Back),
        }
    }
}

/// Append a Back entry unless the list already ends with one.
///
/// Lists ending in a structured entry get a structured Back, lists of labels
/// get a plain label. Idempotent.
pub fn ensure_back_item(items: &mut Vec<MenuItem>) {
    let back = match items.last() {
        Some(last) if last.is_back() => return,
        Some(MenuItem::Entry { .. }) => MenuItem::entry(BACK_LABEL, ItemAction::Back),
        Some(MenuItem::Label(_)) | None => MenuItem::label(BACK_LABEL),
    };
    items.push(back);
}

/// If `items[index]` is the Back entry: stop `screen`, navigate back and
/// return `true`. Otherwise leave everything untouched and return `false`.
pub fn handle_menu_select(
    screen: &dyn Screen,
    navigator: &Navigator,
    index: usize,
    items: &[MenuItem],
) -> bool {
    if !items.get(index).is_some_and(MenuItem::is_back) {
        return false;
    }
    screen.stop_mode();
    navigator.back();
    true
}

/// Item list with a clamped cursor, Back entry included.
#[derive(Debug, Clone)]
pub struct MenuList {
    items: Vec<MenuItem>,
    cursor: usize,
}

impl MenuList {
    pub fn new(mut items: Vec<MenuItem>) -> Self {
        ensure_back_item(&mut items);
        Self { items, cursor: 0 }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&MenuItem> {
        self.items.get(self.cursor)
    }

    /// Move the cursor by `delta`, clamped to the list. Returns `true` if it moved.
    pub fn scroll(&mut self, delta: i32) -> bool {
        let last = self.items.len().saturating_sub(1);
        let target = if delta < 0 {
            self.cursor.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            (self.cursor + delta as usize).min(last)
        };
        let moved = target != self.cursor;
        self.cursor = target;
        moved
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Replace the items, keeping the cursor in range.
    pub fn set_items(&mut self, mut items: Vec<MenuItem>) {
        ensure_back_item(&mut items);
        self.items = items;
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }
}
