pub mod calc;
pub mod controller;
pub mod error;
pub mod export;
pub mod flow;
pub mod journal;
pub mod system;
pub mod timer;
pub mod types;

pub use controller::*;
pub use error::*;
pub use types::*;
