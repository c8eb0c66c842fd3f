//! Shared test support for the integration suite.

pub mod mock_service;
