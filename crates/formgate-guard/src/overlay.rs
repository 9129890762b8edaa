//! Floating timer overlay positioning
//!
//! Purely cosmetic: the overlay keeps an offset clamped inside the viewport,
//! can be dragged, and follows page scrolling with a small nudge that decays
//! once scrolling stops. Nothing here touches the countdown.

use crate::events::Point;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DRAG_BOUNDARY: f64 = 16.0;
pub const DEFAULT_SCROLL_FOLLOW: f64 = 0.3;
pub const DEFAULT_SCROLL_DECAY: f64 = 0.8;
pub const DEFAULT_SCROLL_QUIET_MS: i64 = 150;

/// Nudges below this are dropped.
const NUDGE_EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
	/// Minimum margin kept between the overlay and the viewport edges.
	pub drag_boundary: f64,
	pub scroll_follow_factor: f64,
	pub scroll_decay_factor: f64,
	pub scroll_quiet_ms: i64,
}

impl Default for OverlayConfig {
	fn default() -> Self {
		Self {
			drag_boundary: DEFAULT_DRAG_BOUNDARY,
			scroll_follow_factor: DEFAULT_SCROLL_FOLLOW,
			scroll_decay_factor: DEFAULT_SCROLL_DECAY,
			scroll_quiet_ms: DEFAULT_SCROLL_QUIET_MS,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
	pointer: Point,
	offset: Point,
}

/// Draggable, scroll-following overlay position
///
/// # Examples
///
/// ```
/// use formgate_guard::{FloatingOverlay, OverlayConfig, Point, Size};
///
/// let mut overlay = FloatingOverlay::new(
///     OverlayConfig::default(),
///     Size::new(800.0, 600.0),
///     Size::new(200.0, 80.0),
///     Point::new(100.0, 100.0),
/// );
/// overlay.begin_drag(Point::new(150.0, 120.0));
/// overlay.drag_to(Point::new(2000.0, 120.0));
/// overlay.end_drag();
///
/// assert_eq!(overlay.position(), Point::new(584.0, 100.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingOverlay {
	config: OverlayConfig,
	viewport: Size,
	size: Size,
	offset: Point,
	drag: Option<Drag>,
	nudge: f64,
	last_scroll_y: Option<f64>,
	last_activity: Option<DateTime<Utc>>,
}

impl FloatingOverlay {
	pub fn new(config: OverlayConfig, viewport: Size, size: Size, offset: Point) -> Self {
		let mut overlay = Self {
			config,
			viewport,
			size,
			offset,
			drag: None,
			nudge: 0.0,
			last_scroll_y: None,
			last_activity: None,
		};
		overlay.offset = overlay.clamp(offset);
		overlay
	}

	/// Keep `point` inside the viewport minus the boundary margin.
	pub fn clamp(&self, point: Point) -> Point {
		let margin = self.config.drag_boundary;
		let max_x = (self.viewport.width - self.size.width - margin).max(margin);
		let max_y = (self.viewport.height - self.size.height - margin).max(margin);
		Point::new(point.x.clamp(margin, max_x), point.y.clamp(margin, max_y))
	}

	/// Offset chosen by the user, without the scroll nudge.
	pub fn offset(&self) -> Point {
		self.offset
	}

	/// Where to draw the overlay.
	pub fn position(&self) -> Point {
		self.clamp(Point::new(self.offset.x, self.offset.y + self.nudge))
	}

	/// How long scrolling must pause before the nudge decays a step.
	pub fn quiet_period(&self) -> std::time::Duration {
		let millis = u64::try_from(self.config.scroll_quiet_ms).unwrap_or(0);
		std::time::Duration::from_millis(millis.max(1))
	}

	pub fn nudge(&self) -> f64 {
		self.nudge
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.is_some()
	}

	pub fn set_viewport(&mut self, viewport: Size) {
		self.viewport = viewport;
		self.offset = self.clamp(self.offset);
	}

	pub fn begin_drag(&mut self, pointer: Point) {
		self.drag = Some(Drag {
			pointer,
			offset: self.offset,
		});
	}

	/// Move with the pointer. Ignored unless a drag is in progress.
	pub fn drag_to(&mut self, pointer: Point) {
		let Some(drag) = self.drag else {
			return;
		};
		let moved = Point::new(
			drag.offset.x + pointer.x - drag.pointer.x,
			drag.offset.y + pointer.y - drag.pointer.y,
		);
		self.offset = self.clamp(moved);
	}

	/// Finish dragging and re-clamp.
	pub fn end_drag(&mut self) {
		if self.drag.take().is_some() {
			self.offset = self.clamp(self.offset);
			tracing::debug!(x = self.offset.x, y = self.offset.y, "overlay dropped");
		}
	}

	/// Follow a scroll to `scroll_y` observed at `now`.
	pub fn on_scroll(&mut self, scroll_y: f64, now: DateTime<Utc>) {
		if let Some(last) = self.last_scroll_y {
			self.nudge += self.config.scroll_follow_factor * (scroll_y - last);
		}
		self.last_scroll_y = Some(scroll_y);
		self.last_activity = Some(now);
	}

	/// Decay the nudge once per quiet period. Returns whether it changed.
	pub fn settle(&mut self, now: DateTime<Utc>) -> bool {
		if self.nudge == 0.0 {
			return false;
		}
		let quiet = Duration::milliseconds(self.config.scroll_quiet_ms);
		match self.last_activity {
			Some(last) if now - last < quiet => false,
			_ => {
				self.nudge *= self.config.scroll_decay_factor;
				if self.nudge.abs() < NUDGE_EPSILON {
					self.nudge = 0.0;
				}
				self.last_activity = Some(now);
				true
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn overlay() -> FloatingOverlay {
		FloatingOverlay::new(
			OverlayConfig::default(),
			Size::new(1000.0, 800.0),
			Size::new(200.0, 100.0),
			Point::new(500.0, 300.0),
		)
	}

	fn at(millis: i64) -> DateTime<Utc> {
		DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(millis)
	}

	#[rstest]
	#[case(Point::new(-50.0, -50.0), Point::new(16.0, 16.0))]
	#[case(Point::new(5000.0, 5000.0), Point::new(784.0, 684.0))]
	#[case(Point::new(300.0, 200.0), Point::new(300.0, 200.0))]
	fn test_clamp_keeps_boundary(
		overlay: FloatingOverlay,
		#[case] input: Point,
		#[case] expected: Point,
	) {
		// Act + Assert
		assert_eq!(overlay.clamp(input), expected);
	}

	#[rstest]
	fn test_drag_moves_by_pointer_delta(mut overlay: FloatingOverlay) {
		// Arrange
		overlay.begin_drag(Point::new(10.0, 10.0));

		// Act
		overlay.drag_to(Point::new(60.0, -20.0));

		// Assert
		assert!(overlay.is_dragging());
		assert_eq!(overlay.offset(), Point::new(550.0, 270.0));
		overlay.end_drag();
		assert!(!overlay.is_dragging());
	}

	#[rstest]
	fn test_drag_without_begin_is_ignored(mut overlay: FloatingOverlay) {
		// Act
		overlay.drag_to(Point::new(0.0, 0.0));

		// Assert
		assert_eq!(overlay.offset(), Point::new(500.0, 300.0));
	}

	#[rstest]
	fn test_shrinking_viewport_reclamps(mut overlay: FloatingOverlay) {
		// Act
		overlay.set_viewport(Size::new(400.0, 300.0));

		// Assert
		assert_eq!(overlay.offset(), Point::new(184.0, 184.0));
	}

	#[rstest]
	fn test_scroll_nudges_by_follow_factor(mut overlay: FloatingOverlay) {
		// Arrange
		overlay.on_scroll(0.0, at(0));

		// Act
		overlay.on_scroll(100.0, at(10));

		// Assert
		assert!((overlay.nudge() - 30.0).abs() < 1e-9);
		assert_eq!(overlay.position(), Point::new(500.0, 330.0));
	}

	#[rstest]
	fn test_nudge_decays_only_after_quiet_period(mut overlay: FloatingOverlay) {
		// Arrange
		overlay.on_scroll(0.0, at(0));
		overlay.on_scroll(100.0, at(10));

		// Act + Assert
		assert!(!overlay.settle(at(100)));
		assert!(overlay.settle(at(160)));
		assert!((overlay.nudge() - 24.0).abs() < 1e-9);
		assert!(!overlay.settle(at(200)));
		assert!(overlay.settle(at(310)));
		assert!((overlay.nudge() - 19.2).abs() < 1e-9);
	}

	#[rstest]
	fn test_nudge_eventually_reaches_zero(mut overlay: FloatingOverlay) {
		// Arrange
		overlay.on_scroll(0.0, at(0));
		overlay.on_scroll(10.0, at(0));

		// Act
		let mut now = 0;
		while overlay.nudge() != 0.0 {
			now += 150;
			overlay.settle(at(now));
		}

		// Assert
		assert_eq!(overlay.position(), overlay.offset());
	}
}
