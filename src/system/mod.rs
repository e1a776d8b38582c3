pub mod config;
pub mod events;
pub mod logger;

pub use config::*;
pub use events::*;
pub use logger::*;
