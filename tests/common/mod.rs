#![allow(dead_code)]

use std::cell::Cell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;
use unload_guard::platform::HostBindings;
use unload_guard::platform::memory::{MemoryWindow, ScriptedDialog};
use unload_guard::{Condition, Verdict};

/// Window and dialog doubles wired into host bindings
pub struct TestHost {
    pub window: Rc<MemoryWindow>,
    pub dialog: Rc<ScriptedDialog>,
}

impl TestHost {
    pub fn answering(answer: bool) -> Self {
        Self {
            window: Rc::new(MemoryWindow::new()),
            dialog: Rc::new(ScriptedDialog::always(answer)),
        }
    }

    pub fn legacy(answer: bool) -> Self {
        Self {
            window: Rc::new(MemoryWindow::legacy()),
            dialog: Rc::new(ScriptedDialog::always(answer)),
        }
    }

    pub fn bindings(&self) -> HostBindings {
        HostBindings::new(self.window.clone(), self.dialog.clone())
    }
}

/// Toggle shared between a test and the condition reading it
#[derive(Clone, Default)]
pub struct Switch(Rc<Cell<bool>>);

impl Switch {
    pub fn set(&self, value: bool) {
        self.0.set(value);
    }

    /// Condition blocking with `message` while the switch is on
    pub fn condition(&self, message: Option<&str>) -> Condition {
        let state = Rc::clone(&self.0);
        let message = message.map(str::to_string);
        Condition::new(move || match (state.get(), &message) {
            (false, _) => Verdict::Clear,
            (true, None) => Verdict::Blocked,
            (true, Some(message)) => Verdict::with_message(message.clone()),
        })
    }
}

/// Write a page file into a fresh temp dir
pub fn write_page(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("page.toml");
    let mut file = std::fs::File::create(&path).expect("Failed to create page file");
    file.write_all(content.as_bytes())
        .expect("Failed to write page file");
    (dir, path)
}
