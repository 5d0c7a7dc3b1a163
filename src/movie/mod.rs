pub mod normalize;
pub mod types;
pub mod view;

pub use normalize::{normalize_movie, normalize_movies};
pub use types::*;
pub use view::{MovieCardView, PLACEHOLDER_POSTER};
