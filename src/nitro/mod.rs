pub mod client;
pub mod connection;
pub mod target;
pub mod types;

pub use client::NitroClient;
pub use connection::NitroConnection;
pub use target::{ClientSettings, DeviceQuirks, DeviceTarget};
