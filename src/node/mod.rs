mod config;
mod node;
mod server;
mod service;

pub use config::*;
pub use node::*;
pub(crate) use server::*;
pub(crate) use service::*;

#[cfg(test)]
mod node_test;
