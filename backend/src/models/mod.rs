//! Domain models shared by the repositories, services and HTTP layer.
//!
//! All entities are read-only views: the engine never writes them back.

pub mod catalog;
pub mod macros;
pub mod term;
pub mod timetable;

pub use catalog::*;
pub use term::*;
pub use timetable::*;
