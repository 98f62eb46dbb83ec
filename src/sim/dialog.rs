/// Dialog and inventory panel state.
///
/// Pure presentation state: what is open, which page, where the cursor
/// sits. The game mode machine decides when to open and close them; the
/// renderer only reads.

use crate::domain::memory::Memory;

/// Shown when an object has no pages at all.
const EMPTY_PAGE: &str = "...";

#[derive(Clone, Debug, Default)]
pub struct Dialog {
    open: bool,
    title: String,
    pages: Vec<String>,
    page: usize,
}

impl Dialog {
    pub fn show(&mut self, title: &str, pages: &[&str]) {
        self.title = title.to_string();
        self.pages = pages.iter().map(|p| p.to_string()).collect();
        if self.pages.is_empty() {
            self.pages.push(EMPTY_PAGE.to_string());
        }
        self.page = 0;
        self.open = true;
    }

    /// Next page, or close after the last one. Returns true if this call
    /// closed the dialog.
    pub fn advance_or_close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        if self.page + 1 < self.pages.len() {
            self.page += 1;
            false
        } else {
            self.close();
            true
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.pages.clear();
        self.page = 0;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn current_page(&self) -> Option<&str> {
        if !self.open {
            return None;
        }
        self.pages.get(self.page).map(String::as_str)
    }

    /// `(page, count)`, 1-based page.
    pub fn progress(&self) -> (usize, usize) {
        (self.page + 1, self.pages.len())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Inventory {
    open: bool,
    items: Vec<Memory>,
    cursor: usize,
}

impl Inventory {
    pub fn show(&mut self, records: &[Memory]) {
        self.items = records.to_vec();
        self.cursor = 0;
        self.open = true;
    }

    /// Move the cursor by `delta`, clamped to the list.
    pub fn move_cursor(&mut self, delta: i32) {
        if self.items.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.items.len() as i64 - 1;
        self.cursor = (self.cursor as i64 + delta as i64).clamp(0, max) as usize;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn items(&self) -> &[Memory] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Memory> {
        self.items.get(self.cursor)
    }
}
