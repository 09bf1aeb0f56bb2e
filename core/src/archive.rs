mod identity;
mod input;
mod output;

pub use self::{identity::*, input::*, output::*};

use strum::Display;

/// Lifecycle of one archive session. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ArchiveState {
  Open,
  Failed,
}
