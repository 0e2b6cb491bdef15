pub mod event;
pub mod verdict;
pub mod time;
pub mod errors;

pub use event::*;
pub use verdict::*;
pub use time::{parse_timestamp, from_epoch_millis, to_iso_millis, ParsedTimestamp};
pub use errors::*;
