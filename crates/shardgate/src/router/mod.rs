mod crc16;
mod slot;

pub use crc16::*;
pub use slot::*;
