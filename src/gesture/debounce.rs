use serde::Serialize;
use tracing::debug;

use super::classifier::GestureLabel;

pub const DEFAULT_HOLD_FRAMES: u32 = 5;

/// 生ラベルと確定ラベルの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureState {
    pub raw_label: GestureLabel,
    pub raw_hold_count: u32,
    pub confirmed_label: GestureLabel,
    pub previous_confirmed_label: GestureLabel,
}

/// 表示側に渡す確定ジェスチャーのスナップショット
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GestureInfo {
    pub label: GestureLabel,
    pub previous: GestureLabel,
    pub confidence: f32,
}

/// 同じ生ラベルが hold_frames 回連続したときだけ確定ラベルを切り替える
pub struct GestureDebouncer {
    hold_frames: u32,
    state: GestureState,
}

impl GestureDebouncer {
    pub fn new(hold_frames: u32) -> Self {
        Self {
            hold_frames: hold_frames.max(1),
            state: GestureState::default(),
        }
    }

    /// 1フレーム分の生ラベルを入力し、確定ラベルが変化したら true を返す
    pub fn update(&mut self, label: GestureLabel) -> bool {
        let s = &mut self.state;
        if label == s.raw_label {
            s.raw_hold_count = s.raw_hold_count.saturating_add(1);
        } else {
            s.raw_label = label;
            s.raw_hold_count = 1;
        }

        if s.raw_hold_count >= self.hold_frames && s.confirmed_label != s.raw_label {
            s.previous_confirmed_label = s.confirmed_label;
            s.confirmed_label = s.raw_label;
            debug!(
                "gesture confirmed: {} -> {}",
                s.previous_confirmed_label, s.confirmed_label
            );
            return true;
        }
        false
    }

    pub fn confirmed(&self) -> GestureLabel {
        self.state.confirmed_label
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// min(hold_count / hold_frames, 1.0)
    pub fn confidence(&self) -> f32 {
        (self.state.raw_hold_count as f32 / self.hold_frames as f32).min(1.0)
    }

    pub fn info(&self) -> GestureInfo {
        GestureInfo {
            label: self.state.confirmed_label,
            previous: self.state.previous_confirmed_label,
            confidence: self.confidence(),
        }
    }

    pub fn is_writing_active(&self) -> bool {
        self.state.confirmed_label == GestureLabel::Writing
    }

    pub fn hold_frames(&self) -> u32 {
        self.hold_frames
    }

    pub fn set_hold_frames(&mut self, hold_frames: u32) {
        self.hold_frames = hold_frames.max(1);
    }

    /// トラッキング喪失時に呼ぶ。確定ラベルも NONE に戻す
    pub fn reset(&mut self) {
        self.state = GestureState::default();
    }
}

impl Default for GestureDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GestureLabel::*;

    fn feed(d: &mut GestureDebouncer, labels: &[GestureLabel]) -> Vec<bool> {
        labels.iter().map(|&l| d.update(l)).collect()
    }

    #[test]
    fn test_confirms_on_fifth_frame() {
        let mut d = GestureDebouncer::new(5);
        let changed = feed(&mut d, &[Writing; 5]);
        assert_eq!(changed, vec![false, false, false, false, true]);
        assert_eq!(d.confirmed(), Writing);
        assert_eq!(d.state().previous_confirmed_label, None);
    }

    #[test]
    fn test_change_reported_once() {
        let mut d = GestureDebouncer::new(3);
        let changed = feed(&mut d, &[Stop; 6]);
        assert_eq!(changed.iter().filter(|&&c| c).count(), 1);
        assert!(changed[2]);
    }

    #[test]
    fn test_interrupted_run_restarts_count() {
        let mut d = GestureDebouncer::new(5);
        let labels = [
            Writing, Writing, Writing, Writing, Stop, Writing, Writing, Writing, Writing, Writing,
        ];
        let changed = feed(&mut d, &labels);
        let first = changed.iter().position(|&c| c);
        // 連続5回目は index 9
        assert_eq!(first, Some(9));
        assert_eq!(d.confirmed(), Writing);
    }

    #[test]
    fn test_previous_tracks_last_confirmed() {
        let mut d = GestureDebouncer::new(2);
        feed(&mut d, &[Writing, Writing, Stop, Stop]);
        let info = d.info();
        assert_eq!(info.label, Stop);
        assert_eq!(info.previous, Writing);
    }

    #[test]
    fn test_confidence_ramps_and_clamps() {
        let mut d = GestureDebouncer::new(4);
        assert_eq!(d.confidence(), 0.0);
        d.update(Space);
        assert!((d.confidence() - 0.25).abs() < 1e-6);
        feed(&mut d, &[Space; 10]);
        assert_eq!(d.confidence(), 1.0);
    }

    #[test]
    fn test_reset_clears_confirmed() {
        let mut d = GestureDebouncer::new(2);
        feed(&mut d, &[Writing, Writing]);
        assert!(d.is_writing_active());
        d.reset();
        assert_eq!(*d.state(), GestureState::default());
        assert!(!d.is_writing_active());
        // reset 後は再び hold_frames 回必要
        assert!(!d.update(Writing));
        assert!(d.update(Writing));
    }

    #[test]
    fn test_zero_hold_frames_clamped_to_one() {
        let mut d = GestureDebouncer::new(0);
        assert_eq!(d.hold_frames(), 1);
        assert!(d.update(Clear));
    }
}
