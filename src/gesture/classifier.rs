use std::fmt;

use serde::Serialize;

use crate::hand::{planar_distance, FingerState, LandmarkIndex, LandmarkSet};

/// 親指先端と人差し指先端がこの距離未満ならピンチ
pub const PINCH_DISTANCE: f32 = 0.05;

/// 1フレームで判定されるジェスチャー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    #[default]
    None,
    /// 人差し指のみ
    Writing,
    /// 握りこぶし
    Stop,
    /// 人差し指 + 中指
    Space,
    /// 親指と人差し指のピンチ
    Clear,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Writing => "writing",
            Self::Stop => "stop",
            Self::Space => "space",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ランドマークから単一フレームのジェスチャーを判定する。
///
/// 優先順位は CLEAR > SPACE > WRITING > STOP で、最初に一致したものを返す。
/// 判定は正規化座標のみで行うため、フレームの幅・高さは引数に取らない。
/// ピクセル座標が必要なのは指先位置だけで、それは `HandFrame::fingertip` で求める。
pub fn classify(hand: Option<&LandmarkSet>) -> GestureLabel {
    let Some(hand) = hand else {
        return GestureLabel::None;
    };
    classify_fingers(hand, &FingerState::from_landmarks(hand))
}

/// 事前に計算した指の状態を使って判定する
pub fn classify_fingers(hand: &LandmarkSet, fingers: &FingerState) -> GestureLabel {
    let pinch = planar_distance(
        hand.get(LandmarkIndex::ThumbTip),
        hand.get(LandmarkIndex::IndexTip),
    );

    if pinch < PINCH_DISTANCE && !fingers.ring && !fingers.pinky {
        return GestureLabel::Clear;
    }
    if fingers.index && fingers.middle && !fingers.ring && !fingers.pinky {
        return GestureLabel::Space;
    }
    if fingers.index && !fingers.middle && !fingers.ring && !fingers.pinky {
        return GestureLabel::Writing;
    }
    if fingers.extended_count() == 0 && !fingers.thumb {
        return GestureLabel::Stop;
    }
    GestureLabel::None
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::hand::{Landmark, LandmarkIndex, LandmarkSet};

    /// 手首 (0.5, 0.8) を基準に、指ごとに伸ばす/曲げるを指定して手を組み立てる
    pub fn hand(
        thumb_out: bool,
        index: bool,
        middle: bool,
        ring: bool,
        pinky: bool,
    ) -> LandmarkSet {
        use LandmarkIndex::*;
        let mut set = LandmarkSet::default();
        let mut put = |idx: LandmarkIndex, x: f32, y: f32| {
            set.landmarks[idx as usize] = Landmark::new(x, y, 0.0);
        };
        put(Wrist, 0.5, 0.8);

        // MCP は手首から 0.2 上、伸展時の先端は 0.4 上、屈曲時は手首寄り
        let fingers = [
            (IndexMcp, IndexTip, 0.42, index),
            (MiddleMcp, MiddleTip, 0.48, middle),
            (RingMcp, RingTip, 0.54, ring),
            (PinkyMcp, PinkyTip, 0.60, pinky),
        ];
        for (mcp, tip, x, extended) in fingers {
            put(mcp, x, 0.6);
            put(tip, x, if extended { 0.4 } else { 0.7 });
        }

        // 親指: 伸展なら人差し指MCPから 0.2、畳めば 0.07（どちらもピンチにはならない）
        if thumb_out {
            put(ThumbTip, 0.22, 0.6);
        } else {
            put(ThumbTip, 0.42, 0.53);
        }
        set
    }

    /// 親指先端を人差し指先端に重ねたピンチ
    pub fn pinch() -> LandmarkSet {
        let mut set = hand(false, true, false, false, false);
        let tip = *set.get(LandmarkIndex::IndexTip);
        set.landmarks[LandmarkIndex::ThumbTip as usize] = Landmark::new(tip.x + 0.01, tip.y, 0.0);
        set
    }
}
