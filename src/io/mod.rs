//! Configuration shared by the readers.
mod limits;

pub use self::limits::Limits;
