pub mod aggregate;
pub mod attribution;
pub mod config;
pub mod errors;
pub mod export;
pub mod invocation;
pub mod loader;
pub mod model;
pub mod service;
pub mod storage;
pub mod utils;
