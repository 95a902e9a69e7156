//! Test helper modules for mediabox integration tests
//!
//! - TestServer: full router with in-memory SQLite and fake collaborators
//! - fakes: recording Player / Bluetooth / ServiceControl implementations

#![allow(dead_code)]

pub mod fakes;
pub mod test_server;

pub use fakes::{FakeBluetooth, FakePlayer, FakeServices};
pub use test_server::{next_sse_frame, TestServer};
