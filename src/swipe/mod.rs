pub mod cardstack;
pub mod gesture;
pub mod session;

pub use cardstack::{CardFrame, CardStack, Decision};
pub use gesture::{CardStyle, Direction, GestureConfig, GesturePhase, GestureTracker, PointerEvent, Release};
pub use session::{SessionSnapshot, SwipeOutcome, SwipeSession};
