pub mod api;
pub mod conf;
pub mod core;
pub mod frame;
pub mod service;
pub mod session;
pub mod store;

#[cfg(feature = "testutil")]
pub mod testutil;
