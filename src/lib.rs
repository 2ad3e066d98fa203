pub mod config;
pub mod controllers;
pub mod errors;
pub mod forms;
pub mod navigation;
pub mod notice;
pub mod payment;
pub mod store;
pub mod structs;

pub use errors::{ExplorerError, Result};
pub use structs::client::{Client, ClientOptions, StatusQuery};
pub use structs::session::Session;
pub use structs::*;

// Tester
#[cfg(test)]
mod tests;
