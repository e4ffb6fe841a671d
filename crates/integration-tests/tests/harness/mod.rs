//! Shared test harness

pub mod mock_api;
