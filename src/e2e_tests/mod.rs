//! End-to-end tests: the client against a scripted loopback server

pub mod fake_server;

mod scenarios;

pub use fake_server::{FakeServer, ServerScript};
