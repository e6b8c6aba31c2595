#![forbid(unsafe_code)]

pub mod clock;
mod entry;
mod housekeeper;
mod places;
mod scripts;
mod sweeper;

pub use clock::{Clock, ManualClock, SharedClock, TokioClock};
pub use housekeeper::Housekeeper;
pub use places::PlaceRegistry;
pub use scripts::{PendingScriptInfo, PendingScriptQueue, run_expirer};
pub use sweeper::{Sweep, Sweeper};
