pub mod guided;
pub mod navigation;
pub mod reducer;
pub mod session;
pub mod state;

pub use guided::*;
pub use navigation::*;
pub use reducer::*;
pub use session::*;
pub use state::*;
