pub mod liked;
pub mod store;

pub use liked::*;
pub use store::*;
