//! Validation primitives - transactions and scripts

mod transaction;
mod script;

pub use transaction::*;
pub use script::*;
