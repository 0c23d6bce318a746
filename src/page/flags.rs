use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Named on/off state that flag conditions read
///
/// Clones share the same board, so a condition built from one clone sees
/// updates made through another.
#[derive(Debug, Clone, Default)]
pub struct FlagBoard {
    flags: Rc<RefCell<BTreeMap<String, bool>>>,
}

impl FlagBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl Into<String>, value: bool) {
        self.flags.borrow_mut().insert(name.into(), value);
    }

    /// Current value, `None` for a flag the board never heard of
    pub fn get(&self, name: &str) -> Option<bool> {
        self.flags.borrow().get(name).copied()
    }

    /// Snapshot of all flags, sorted by name
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.flags.borrow().clone()
    }

    pub fn raised(&self) -> Vec<String> {
        self.flags
            .borrow()
            .iter()
            .filter(|(_, value)| **value)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for FlagBoard {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let board = Self::new();
        for (name, value) in iter {
            board.set(name, value);
        }
        board
    }
}
