mod backend;
mod gated;
mod multi;
#[cfg(test)]
mod tests;

pub use backend::*;
pub use gated::*;
pub use multi::*;
