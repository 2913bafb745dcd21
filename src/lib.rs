/// CoShop Client Library
/// Collaborative shopping: catalog, cart and checkout pricing, and shared
/// rooms with chat over a real-time channel

pub mod api;
pub mod cart;
pub mod catalog;
pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod invite;
pub mod models;
pub mod orders;
pub mod pricing;
pub mod sample;
pub mod session;
pub mod storage;
pub mod websocket;

pub use error::{ClientError, ErrorKind, Result};
