mod executor;
mod throttle;

pub use executor::*;
