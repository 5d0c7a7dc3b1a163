use serde::{Deserialize, Serialize};

use crate::config::SwipeConfig;
use crate::movie::SwipeAction;

/// Scale applied to a card while it is being dragged.
pub const DRAG_SCALE: f64 = 1.1;
/// Extra distance past the viewport edge a dismissed card travels.
pub const OFFSCREEN_OVERSHOOT: f64 = 200.0;
/// A pause this long (ms) between the last movement and release kills momentum.
const STALE_MOVE_MS: f64 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn action(&self) -> SwipeAction {
        match self {
            Direction::Left => SwipeAction::Skip,
            Direction::Right => SwipeAction::Like,
        }
    }
}

impl From<SwipeAction> for Direction {
    fn from(action: SwipeAction) -> Self {
        match action {
            SwipeAction::Like => Direction::Right,
            SwipeAction::Skip => Direction::Left,
        }
    }
}

/// Pointer input in viewport pixels, timestamps in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    Down { x: f64, t: f64 },
    Move { x: f64, t: f64 },
    Up { x: f64, t: f64 },
}

/// Animation target for a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardStyle {
    pub x: f64,
    pub scale: f64,
    pub visible: bool,
}

impl CardStyle {
    pub const NEUTRAL: CardStyle = CardStyle {
        x: 0.0,
        scale: 1.0,
        visible: true,
    };
}

impl Default for CardStyle {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "direction", rename_all = "lowercase")]
pub enum GesturePhase {
    Idle,
    Dragging,
    Committed(Direction),
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Commit(Direction),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Release speed (px/ms) above which a drag commits.
    pub velocity_threshold: f64,
    pub viewport_width: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.2,
            viewport_width: 1280.0,
        }
    }
}

impl From<&SwipeConfig> for GestureConfig {
    fn from(config: &SwipeConfig) -> Self {
        Self {
            velocity_threshold: config.velocity_threshold,
            viewport_width: config.viewport_width,
        }
    }
}

impl GestureConfig {
    /// Where a card committed in `direction` ends up: past the far edge.
    pub fn offscreen_x(&self, direction: Direction) -> f64 {
        (OFFSCREEN_OVERSHOOT + self.viewport_width) * direction.sign()
    }
}

/// Per-card gesture state machine:
/// `Idle -> Dragging -> { Committed(dir) -> Dismissed | Cancelled -> Idle }`.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: GestureConfig,
    phase: GesturePhase,
    origin_x: f64,
    last_x: f64,
    last_t: f64,
    velocity: f64,
    last_direction: Option<Direction>,
    style: CardStyle,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: GesturePhase::Idle,
            origin_x: 0.0,
            last_x: 0.0,
            last_t: 0.0,
            velocity: 0.0,
            last_direction: None,
            style: CardStyle::NEUTRAL,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn style(&self) -> CardStyle {
        self.style
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.phase, GesturePhase::Idle | GesturePhase::Dragging)
    }

    /// Feeds one pointer event. Returns the release outcome on pointer-up
    /// of an active drag.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Release> {
        match event {
            PointerEvent::Down { x, t } => {
                self.pointer_down(x, t);
                None
            }
            PointerEvent::Move { x, t } => {
                self.pointer_move(x, t);
                None
            }
            PointerEvent::Up { x, t } => self.pointer_up(x, t),
        }
    }

    pub fn pointer_down(&mut self, x: f64, t: f64) {
        if self.phase != GesturePhase::Idle {
            return;
        }
        self.phase = GesturePhase::Dragging;
        self.origin_x = x;
        self.last_x = x;
        self.last_t = t;
        self.velocity = 0.0;
        self.last_direction = None;
        self.style = CardStyle {
            x: 0.0,
            scale: DRAG_SCALE,
            visible: true,
        };
    }

    pub fn pointer_move(&mut self, x: f64, t: f64) {
        if self.phase != GesturePhase::Dragging {
            return;
        }
        self.track(x, t);
        self.style.x = x - self.origin_x;
    }

    pub fn pointer_up(&mut self, x: f64, t: f64) -> Option<Release> {
        if self.phase != GesturePhase::Dragging {
            return None;
        }
        self.track(x, t);

        let release = match self.last_direction {
            Some(direction) if self.velocity > self.config.velocity_threshold => {
                self.commit(direction);
                Release::Commit(direction)
            }
            _ => {
                self.phase = GesturePhase::Idle;
                self.style = CardStyle::NEUTRAL;
                Release::Cancel
            }
        };
        Some(release)
    }

    /// Commits without a drag (like/skip controls). Returns false when the
    /// card already left the interactive states.
    pub fn commit(&mut self, direction: Direction) -> bool {
        if !self.is_interactive() {
            return false;
        }
        self.phase = GesturePhase::Committed(direction);
        self.style = CardStyle {
            x: self.config.offscreen_x(direction),
            scale: 1.0,
            visible: true,
        };
        true
    }

    /// The off-screen animation finished; hide the card for good.
    pub fn finish(&mut self) -> bool {
        if !matches!(self.phase, GesturePhase::Committed(_)) {
            return false;
        }
        self.phase = GesturePhase::Dismissed;
        self.style.visible = false;
        true
    }

    fn track(&mut self, x: f64, t: f64) {
        let dx = x - self.last_x;
        let dt = t - self.last_t;

        if dx != 0.0 {
            self.last_direction = Some(if dx > 0.0 { Direction::Right } else { Direction::Left });
            if dt > 0.0 {
                self.velocity = dx.abs() / dt;
            }
        } else if dt > STALE_MOVE_MS {
            self.velocity = 0.0;
        }

        self.last_x = x;
        if dt > 0.0 {
            self.last_t = t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> GestureTracker {
        GestureTracker::new(GestureConfig {
            velocity_threshold: 0.2,
            viewport_width: 1000.0,
        })
    }

    #[test]
    fn test_drag_tracks_pointer() {
        let mut g = tracker();
        g.pointer_down(100.0, 0.0);
        assert_eq!(g.phase(), GesturePhase::Dragging);
        assert_eq!(g.style().scale, DRAG_SCALE);

        g.pointer_move(160.0, 100.0);
        assert_eq!(g.style().x, 60.0);
        g.pointer_move(70.0, 200.0);
        assert_eq!(g.style().x, -30.0);
    }

    #[test]
    fn test_slow_release_cancels() {
        let mut g = tracker();
        g.pointer_down(0.0, 0.0);
        g.pointer_move(50.0, 500.0);
        g.pointer_move(80.0, 1000.0);

        assert_eq!(g.pointer_up(80.0, 1010.0), Some(Release::Cancel));
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert_eq!(g.style(), CardStyle::NEUTRAL);
    }

    #[test]
    fn test_fast_release_commits_right_offscreen() {
        let mut g = tracker();
        g.pointer_down(0.0, 0.0);
        g.pointer_move(30.0, 20.0);
        g.pointer_move(90.0, 40.0);

        assert_eq!(g.pointer_up(120.0, 50.0), Some(Release::Commit(Direction::Right)));
        assert_eq!(g.phase(), GesturePhase::Committed(Direction::Right));
        assert!(g.style().x > 1000.0);
        assert_eq!(g.style().x, 1200.0);

        assert!(g.finish());
        assert_eq!(g.phase(), GesturePhase::Dismissed);
        assert!(!g.style().visible);
    }

    #[test]
    fn test_last_direction_wins_over_net_displacement() {
        let mut g = tracker();
        g.pointer_down(0.0, 0.0);
        // Long slow drag to the right...
        g.pointer_move(100.0, 1000.0);
        g.pointer_move(200.0, 2000.0);
        // ...then a quick flick back to the left.
        g.pointer_move(170.0, 2010.0);

        assert_eq!(g.pointer_up(170.0, 2015.0), Some(Release::Commit(Direction::Left)));
        assert_eq!(g.style().x, -1200.0);
    }

    #[test]
    fn test_pause_before_release_cancels() {
        let mut g = tracker();
        g.pointer_down(0.0, 0.0);
        g.pointer_move(100.0, 10.0);
        assert_eq!(g.pointer_up(100.0, 500.0), Some(Release::Cancel));
    }

    #[test]
    fn test_events_outside_a_drag_are_ignored() {
        let mut g = tracker();
        assert_eq!(g.handle(PointerEvent::Up { x: 10.0, t: 1.0 }), None);
        g.pointer_move(50.0, 5.0);
        assert_eq!(g.style(), CardStyle::NEUTRAL);

        assert!(g.commit(Direction::Left));
        assert!(!g.commit(Direction::Right));
        g.pointer_down(0.0, 10.0);
        assert_eq!(g.phase(), GesturePhase::Committed(Direction::Left));
    }

    #[test]
    fn test_pointer_event_wire_format() {
        let event: PointerEvent = serde_json::from_str(r#"{"type":"move","x":12.5,"t":40}"#).unwrap();
        assert_eq!(event, PointerEvent::Move { x: 12.5, t: 40.0 });
    }
}
