pub mod config;
pub mod gesture;
pub mod hand;
pub mod recording;
pub mod session;
pub mod smoothing;
pub mod stroke;
