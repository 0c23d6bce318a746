pub mod app;
pub mod cli;
pub mod guard;
pub mod page;
pub mod platform;
pub mod util;

pub use app::config::Config;
pub use guard::{Condition, Conditions, Guard, GuardBuilder, GuardError, RegisterPolicy, Verdict};
pub use platform::{ConfirmDialog, EventModel, HostBindings, UnloadEvent, UnloadTarget};
