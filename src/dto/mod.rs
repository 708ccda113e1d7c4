//! Wire-level shapes exchanged with the audience backend.

pub mod api;
