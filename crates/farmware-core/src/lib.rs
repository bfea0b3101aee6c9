pub mod actions;
pub mod config;
pub mod error;
pub mod projection;
pub mod reducer;
pub mod state;
pub mod wire;

pub use actions::*;
pub use config::*;
pub use error::*;
pub use projection::*;
pub use reducer::*;
pub use state::*;
pub use wire::*;
