mod admission;
mod permit;

pub use admission::*;
pub use permit::*;
