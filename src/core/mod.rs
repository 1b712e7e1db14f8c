pub mod config;
pub mod config_loader;
pub mod coordinates;
pub mod error;
pub mod state_machine;
pub mod traits;

pub use config::*;
pub use config_loader::*;
pub use coordinates::*;
pub use error::*;
pub use state_machine::*;
pub use traits::*;
