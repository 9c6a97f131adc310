pub mod activity;
pub mod board;
pub mod catalog;
pub mod config;
pub mod status;
pub mod task;

pub use activity::*;
pub use board::*;
pub use catalog::*;
pub use config::*;
pub use status::*;
pub use task::*;
