//! 도메인 추상화.

mod bar_source;

pub use bar_source::*;
