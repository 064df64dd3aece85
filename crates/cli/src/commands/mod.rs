pub mod classify;
pub mod config;
pub mod generate;
pub mod hash;

pub use classify::*;
pub use config::*;
pub use generate::*;
pub use hash::*;
