pub mod app;
pub mod ws;

pub use ws::{connect_ws, spawn_server};
