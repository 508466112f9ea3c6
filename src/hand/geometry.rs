//! 正規化座標上の距離・指の伸展判定
//!
//! 伸展判定はすべて x/y 平面で行い、z は使わない。

use super::landmark::{Landmark, LandmarkIndex, LandmarkSet};

/// 指先-手首距離が MCP-手首距離のこの倍率を超えたら伸展とみなす
pub const FINGER_EXTENSION_RATIO: f32 = 0.9;
/// 親指先端と人差し指MCPの距離がこれを超えたら親指伸展
pub const THUMB_EXTENSION_DISTANCE: f32 = 0.1;

/// 平面ユークリッド距離（正規化座標）
pub fn planar_distance(a: &Landmark, b: &Landmark) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// 親指以外の指が伸びているか
pub fn is_finger_extended(hand: &LandmarkSet, tip: LandmarkIndex, mcp: LandmarkIndex) -> bool {
    let wrist = hand.get(LandmarkIndex::Wrist);
    let tip_to_wrist = planar_distance(hand.get(tip), wrist);
    let mcp_to_wrist = planar_distance(hand.get(mcp), wrist);
    tip_to_wrist > mcp_to_wrist * FINGER_EXTENSION_RATIO
}

/// 親指が人差し指の付け根から離れているか
pub fn is_thumb_extended(hand: &LandmarkSet) -> bool {
    planar_distance(hand.get(LandmarkIndex::ThumbTip), hand.get(LandmarkIndex::IndexMcp))
        > THUMB_EXTENSION_DISTANCE
}

/// 1フレーム分の指の伸展状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    pub fn from_landmarks(hand: &LandmarkSet) -> Self {
        use LandmarkIndex::*;
        Self {
            thumb: is_thumb_extended(hand),
            index: is_finger_extended(hand, IndexTip, IndexMcp),
            middle: is_finger_extended(hand, MiddleTip, MiddleMcp),
            ring: is_finger_extended(hand, RingTip, RingMcp),
            pinky: is_finger_extended(hand, PinkyTip, PinkyMcp),
        }
    }

    /// 親指を除く伸展本数
    pub fn extended_count(&self) -> usize {
        [self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|&&e| e)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_with(points: &[(LandmarkIndex, f32, f32)]) -> LandmarkSet {
        let mut set = LandmarkSet::default();
        for &(idx, x, y) in points {
            set.landmarks[idx as usize] = Landmark::new(x, y, 0.0);
        }
        set
    }

    #[test]
    fn test_planar_distance_ignores_z() {
        let a = Landmark::new(0.0, 0.0, 5.0);
        let b = Landmark::new(0.3, 0.4, -5.0);
        assert!((planar_distance(&a, &b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_finger_extended_ratio_boundary() {
        use LandmarkIndex::*;
        // MCP-wrist = 0.1 なので閾値は 0.09
        let extended =
            hand_with(&[(Wrist, 0.5, 0.5), (IndexMcp, 0.5, 0.4), (IndexTip, 0.5, 0.409)]);
        assert!(is_finger_extended(&extended, IndexTip, IndexMcp));

        let curled = hand_with(&[(Wrist, 0.5, 0.5), (IndexMcp, 0.5, 0.4), (IndexTip, 0.5, 0.42)]);
        assert!(!is_finger_extended(&curled, IndexTip, IndexMcp));
    }

    #[test]
    fn test_thumb_extended() {
        use LandmarkIndex::*;
        let out = hand_with(&[(IndexMcp, 0.5, 0.5), (ThumbTip, 0.65, 0.5)]);
        assert!(is_thumb_extended(&out));
        let tucked = hand_with(&[(IndexMcp, 0.5, 0.5), (ThumbTip, 0.55, 0.5)]);
        assert!(!is_thumb_extended(&tucked));
    }

    #[test]
    fn test_extended_count_excludes_thumb() {
        let state = FingerState {
            thumb: true,
            index: true,
            middle: true,
            ring: false,
            pinky: false,
        };
        assert_eq!(state.extended_count(), 2);
        assert_eq!(FingerState::default().extended_count(), 0);
    }
}
