#[macro_use]
extern crate bitflags;

pub mod error;
pub mod gb;
pub mod utils;
