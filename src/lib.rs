pub mod config;
pub mod error;
pub mod game;

pub use error::{Error, Result};
pub use game::engine::Engine;
pub use game::input::GameInput;
