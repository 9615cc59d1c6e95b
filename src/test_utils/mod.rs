//! Shared fixtures for unit tests
mod common;

pub(crate) use common::*;
