//! Domain types: bars, levels, signals, parameters.

pub mod bar;
pub mod params;
pub mod signal;

pub use bar::{AnnotatedBar, Levels, PriceBar, SignaledBar};
pub use params::{LevelParams, ParamError, ValidationMode};
pub use signal::Signal;
