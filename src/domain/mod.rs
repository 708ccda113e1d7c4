//! Domain records and value objects exchanged with the audience backend.

pub mod audience;
pub mod types;
