mod pool;
mod registry;
#[cfg(test)]
mod tests;

pub use pool::*;
pub use registry::*;
