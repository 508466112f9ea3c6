pub mod geometry;
pub mod landmark;

pub use geometry::{is_finger_extended, is_thumb_extended, planar_distance, FingerState};
pub use landmark::{Landmark, LandmarkIndex, LandmarkSet};
