pub mod cluster;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod helm;
pub mod io;
pub mod ledger;
pub mod orchestrator;
pub mod paths;
pub mod poll;
pub mod progress;
pub mod report;
pub mod status;
pub mod tier;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use context::InstallContext;
pub use error::{Result, TierError};
