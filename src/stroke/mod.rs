pub mod point;
pub mod tracker;

pub use point::Point2D;
pub use tracker::{Stroke, StrokeTracker, MIN_STROKE_POINTS};
