//! Transports carrying JSON-RPC messages to the server

#[cfg(feature = "http")]
pub mod http;
pub mod stdio;
