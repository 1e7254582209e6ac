//! Screens and player fakes for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cyfi_core::{
    handle_menu_select, ItemAction, MenuItem, MenuList, MenuScreen, Mode, ModeManager, Navigator,
    PlaybackPolicy, PlaybackState, PlayerControl, Screen, ScreenSet, SystemControl, Transition,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start(Mode),
    Stop(Mode),
    Select(Mode, String),
    Scroll(Mode, i32),
    Player(&'static str),
}

#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<Call>>>);

impl Calls {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.0.lock().unwrap().contains(call)
    }

    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

pub struct PlainScreen {
    mode: Mode,
    calls: Calls,
}

impl Screen for PlainScreen {
    fn start_mode(&self) {
        self.calls.push(Call::Start(self.mode));
    }

    fn stop_mode(&self) {
        self.calls.push(Call::Stop(self.mode));
    }
}

/// Menu screen over its children (or a single placeholder entry for leaf
/// menus), opening the selected child through the navigator.
pub struct ListScreen {
    mode: Mode,
    list: Mutex<MenuList>,
    navigator: Navigator,
    calls: Calls,
}

impl ListScreen {
    pub fn new(mode: Mode, navigator: Navigator, calls: Calls) -> Self {
        let mut items: Vec<MenuItem> = mode.children().iter().map(|m| MenuItem::open(*m)).collect();
        if items.is_empty() {
            items.push(MenuItem::label("Empty"));
        }
        Self {
            mode,
            list: Mutex::new(MenuList::new(items)),
            navigator,
            calls,
        }
    }
}

impl Screen for ListScreen {
    fn start_mode(&self) {
        self.list.lock().unwrap().reset();
        self.calls.push(Call::Start(self.mode));
    }

    fn stop_mode(&self) {
        self.calls.push(Call::Stop(self.mode));
    }
}

impl MenuScreen for ListScreen {
    fn select_item(&self) {
        let (index, items) = {
            let list = self.list.lock().unwrap();
            (list.cursor(), list.items().to_vec())
        };
        let Some(item) = items.get(index) else {
            return;
        };
        self.calls.push(Call::Select(self.mode, item.title().to_string()));
        if handle_menu_select(self, &self.navigator, index, &items) {
            return;
        }
        if let Some(ItemAction::Open(child)) = item.action() {
            self.navigator.trigger(Transition::To(*child));
        }
    }

    fn scroll_selection(&self, delta: i32) {
        self.list.lock().unwrap().scroll(delta);
        self.calls.push(Call::Scroll(self.mode, delta));
    }
}

pub fn manager(calls: &Calls) -> Arc<ModeManager> {
    ModeManager::with_screens(PlaybackPolicy::default(), |navigator| {
        ScreenSet::from_factories(
            |mode| {
                Arc::new(PlainScreen {
                    mode,
                    calls: calls.clone(),
                }) as Arc<dyn Screen>
            },
            |mode| Arc::new(ListScreen::new(mode, navigator.clone(), calls.clone())) as Arc<dyn MenuScreen>,
        )
    })
}

pub struct FakePlayer {
    calls: Calls,
}

impl FakePlayer {
    pub fn new(calls: &Calls) -> Arc<Self> {
        Arc::new(Self {
            calls: calls.clone(),
        })
    }
}

impl PlayerControl for FakePlayer {
    fn toggle_play_pause(&self) {
        self.calls.push(Call::Player("toggle"));
    }

    fn toggle_repeat(&self) {
        self.calls.push(Call::Player("repeat"));
    }

    fn volume_up(&self) {
        self.calls.push(Call::Player("volume_up"));
    }

    fn volume_down(&self) {
        self.calls.push(Call::Player("volume_down"));
    }

    fn current_state(&self) -> Option<PlaybackState> {
        None
    }
}

impl SystemControl for FakePlayer {
    fn shutdown(&self) {
        self.calls.push(Call::Player("shutdown"));
    }
}
