pub mod classifier;
pub mod debounce;
pub mod recognizer;

pub use classifier::{classify, classify_fingers, GestureLabel, PINCH_DISTANCE};
pub use debounce::{GestureDebouncer, GestureInfo, GestureState, DEFAULT_HOLD_FRAMES};
pub use recognizer::GestureRecognizer;
