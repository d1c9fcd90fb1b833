pub mod chart;
pub mod drums;
pub mod engine;
pub mod events;
pub mod frets;
pub mod input;
pub mod judgment;
pub mod note;
pub mod parameters;
pub mod replay;
pub mod solo;
pub mod star_power;
pub mod state;
pub mod stats;
pub mod timing;
pub mod timing_windows;
