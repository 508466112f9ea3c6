use crate::config::GestureConfig;
use crate::hand::LandmarkSet;

use super::classifier::{classify, GestureLabel};
use super::debounce::{GestureDebouncer, GestureInfo};

/// フレームごとの判定とデバウンスをまとめたもの
pub struct GestureRecognizer {
    debouncer: GestureDebouncer,
}

impl GestureRecognizer {
    pub fn new(hold_frames: u32) -> Self {
        Self {
            debouncer: GestureDebouncer::new(hold_frames),
        }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(config.hold_frames)
    }

    /// 検出結果を1フレーム分入力し (確定ラベル, 変化したか) を返す
    pub fn update(&mut self, hand: Option<&LandmarkSet>) -> (GestureLabel, bool) {
        let changed = self.debouncer.update(classify(hand));
        (self.debouncer.confirmed(), changed)
    }

    pub fn info(&self) -> GestureInfo {
        self.debouncer.info()
    }

    pub fn is_writing_active(&self) -> bool {
        self.debouncer.is_writing_active()
    }

    pub fn debouncer(&self) -> &GestureDebouncer {
        &self.debouncer
    }

    pub fn set_hold_frames(&mut self, hold_frames: u32) {
        self.debouncer.set_hold_frames(hold_frames);
    }

    pub fn reset(&mut self) {
        self.debouncer.reset();
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::from_config(&GestureConfig::default())
    }
}
