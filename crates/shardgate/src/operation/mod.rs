mod command;
mod interface;
mod query;
mod reply;

pub use command::*;
pub use interface::*;
pub use query::*;
pub use reply::*;
