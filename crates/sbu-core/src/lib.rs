pub mod config;
pub mod logging;

// Core modules
pub mod batch;
pub mod clock;
pub mod meta;
pub mod queue;
pub mod quota;
pub mod retry;
pub mod service;
pub mod session;
