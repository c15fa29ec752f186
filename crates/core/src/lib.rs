// crates/core/src/lib.rs
pub mod calendar;
pub mod error;
pub mod goals;
pub mod merge;
pub mod streak;
pub mod timer;
pub mod types;
pub mod validate;

pub use calendar::*;
pub use error::*;
pub use goals::*;
pub use merge::*;
pub use streak::*;
pub use timer::*;
pub use types::*;
