use super::{FlagBoard, PageSpec};
use crate::app::config::GuardSettings;
use crate::guard::{Guard, GuardResult, Verdict};
use crate::platform::memory::{DispatchOutcome, MemoryWindow};
use crate::platform::{ConfirmDialog, HostBindings};
use std::rc::Rc;

/// A page loaded into an in-memory window with its guard attached
pub struct PageSession {
    guard: Guard,
    window: Rc<MemoryWindow>,
    flags: FlagBoard,
}

impl PageSession {
    /// Build the page's guard on a fresh window.
    ///
    /// `overrides` are applied to the page's flags before the guard is built.
    pub fn open(
        page: &PageSpec,
        settings: &GuardSettings,
        overrides: &[(String, bool)],
        dialog: Rc<dyn ConfirmDialog>,
    ) -> GuardResult<Self> {
        let flags = page.flag_board();
        for (name, value) in overrides {
            if flags.get(name).is_none() {
                tracing::warn!("Flag '{}' is not declared by the page", name);
            }
            flags.set(name.clone(), *value);
        }

        tracing::debug!("Page flags: {:?}", flags.snapshot());
        tracing::debug!("Raised flags: {:?}", flags.raised());

        let window = Rc::new(MemoryWindow::new());
        let host = HostBindings::new(window.clone(), dialog);
        let guard = page.build_guard(settings, &flags, host)?;

        tracing::info!(
            "Page session opened: {} condition(s), registered={}",
            guard.condition_count(),
            guard.is_registered()
        );

        Ok(Self {
            guard,
            window,
            flags,
        })
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    pub fn window(&self) -> &MemoryWindow {
        &self.window
    }

    pub fn flags(&self) -> &FlagBoard {
        &self.flags
    }

    pub fn check(&self) -> GuardResult<Verdict> {
        self.guard.check()
    }

    /// Fire the unload notification at the page's window
    pub fn unload(&self) -> GuardResult<DispatchOutcome> {
        self.window.dispatch_unload()
    }

    /// Run `action` through the guard's confirmation gate
    pub fn act<F, R>(&self, action: F, preserve_handlers: bool) -> GuardResult<Option<R>>
    where
        F: FnOnce() -> R,
    {
        self.guard.confirmed_if_necessary(action, preserve_handlers)
    }

    /// Unregister the guard and discard the page
    pub fn close(self) {
        self.guard.unregister();
    }
}
