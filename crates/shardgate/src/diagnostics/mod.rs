mod event;
mod sink;

pub use event::*;
pub use sink::*;
