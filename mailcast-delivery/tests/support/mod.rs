//! Shared test utilities for integration tests

pub mod mock_transport;
