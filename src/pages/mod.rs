pub mod error;
pub mod home;
pub mod liked;
pub mod search;
pub mod swipe;

pub use error::{PageError, PageResult};
