//! Audience data access and list synchronization for the messaging dashboard.

pub mod domain;
pub mod filter;
pub mod forms;
pub mod modal;
pub mod models;
pub mod pagination;
pub mod stats;

#[cfg(feature = "client")]
pub mod dto;
#[cfg(feature = "client")]
pub mod export;
#[cfg(feature = "client")]
pub mod gateway;
#[cfg(feature = "client")]
pub mod sync;
