//! フレームループ側の制御
//!
//! 1フレームごとに ジェスチャー判定 → デバウンス → ストローク更新 を行う。
//! 確定ジェスチャーが変化したフレームでのみ開始/終了/スペース/クリアを実行する。

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::gesture::{GestureInfo, GestureLabel, GestureRecognizer};
use crate::hand::{LandmarkIndex, LandmarkSet};
use crate::stroke::{Point2D, StrokeTracker};

/// 検出器から渡される1フレーム分の手
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HandFrame {
    pub width: u32,
    pub height: u32,
    pub landmarks: LandmarkSet,
}

impl HandFrame {
    /// 人差し指先端のピクセル座標
    pub fn fingertip(&self) -> Point2D {
        self.landmarks
            .get(LandmarkIndex::IndexTip)
            .to_pixel(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    GestureChanged { from: GestureLabel, to: GestureLabel },
    StrokeStarted(Point2D),
    StrokeCompleted { points: usize },
    StrokeDiscarded,
    SpaceAdded { total: u32 },
    CanvasCleared,
    HandLost,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GestureChanged { from, to } => write!(f, "gesture {} -> {}", from, to),
            Self::StrokeStarted(p) => write!(f, "stroke started at ({:.1}, {:.1})", p.x, p.y),
            Self::StrokeCompleted { points } => write!(f, "stroke completed: {} points", points),
            Self::StrokeDiscarded => f.write_str("stroke discarded (too short)"),
            Self::SpaceAdded { total } => write!(f, "space added (total: {})", total),
            Self::CanvasCleared => f.write_str("canvas cleared"),
            Self::HandLost => f.write_str("hand lost"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub strokes: usize,
    pub spaces: u32,
    pub raw_points: usize,
    pub smoothed_points: usize,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames:          {}", self.frames)?;
        writeln!(f, "Strokes Drawn:   {}", self.strokes)?;
        writeln!(f, "Spaces Added:    {}", self.spaces)?;
        writeln!(f, "Raw Points:      {}", self.raw_points)?;
        write!(f, "Smoothed Points: {}", self.smoothed_points)
    }
}

pub struct AirWritingSession {
    recognizer: GestureRecognizer,
    tracker: StrokeTracker,
    is_writing: bool,
    space_count: u32,
    hand_present: bool,
    frames: u64,
}

impl AirWritingSession {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GestureRecognizer::from_config(&config.gesture),
            StrokeTracker::from_config(&config.stroke, &config.smoothing),
        )
    }

    pub fn new(recognizer: GestureRecognizer, tracker: StrokeTracker) -> Self {
        Self {
            recognizer,
            tracker,
            is_writing: false,
            space_count: 0,
            hand_present: false,
            frames: 0,
        }
    }

    /// 1フレーム分を処理し、発生したイベントを返す。None は手が検出されなかったフレーム
    pub fn process_frame(&mut self, frame: Option<&HandFrame>) -> Vec<SessionEvent> {
        self.frames += 1;
        let mut events = Vec::new();

        let Some(frame) = frame else {
            // 手を見失ったら描画を打ち切り、確定ジェスチャーも捨てる
            if self.is_writing {
                self.is_writing = false;
                events.push(self.finish_stroke());
            }
            if self.hand_present {
                debug!("hand lost at frame {}", self.frames);
                events.push(SessionEvent::HandLost);
            }
            self.hand_present = false;
            self.recognizer.reset();
            return events;
        };
        self.hand_present = true;

        let tip = frame.fingertip();
        let (gesture, changed) = self.recognizer.update(Some(&frame.landmarks));
        if changed {
            events.push(SessionEvent::GestureChanged {
                from: self.recognizer.info().previous,
                to: gesture,
            });
            self.handle_gesture(gesture, tip, &mut events);
        }

        if self.is_writing {
            self.tracker.add_point(tip);
        }
        events
    }

    fn handle_gesture(
        &mut self,
        gesture: GestureLabel,
        tip: Point2D,
        events: &mut Vec<SessionEvent>,
    ) {
        match gesture {
            GestureLabel::Writing => {
                if !self.is_writing {
                    self.is_writing = true;
                    self.tracker.start(tip);
                    info!("writing started");
                    events.push(SessionEvent::StrokeStarted(tip));
                }
            }
            GestureLabel::Stop => {
                if self.is_writing {
                    self.is_writing = false;
                    events.push(self.finish_stroke());
                    info!("writing stopped");
                }
            }
            GestureLabel::Space => {
                self.space_count += 1;
                info!("space added (total: {})", self.space_count);
                events.push(SessionEvent::SpaceAdded {
                    total: self.space_count,
                });
            }
            GestureLabel::Clear => {
                self.tracker.clear_all();
                self.is_writing = false;
                self.space_count = 0;
                info!("canvas cleared");
                events.push(SessionEvent::CanvasCleared);
            }
            GestureLabel::None => {}
        }
    }

    fn finish_stroke(&mut self) -> SessionEvent {
        match self.tracker.end() {
            Some(points) => SessionEvent::StrokeCompleted {
                points: points.len(),
            },
            None => SessionEvent::StrokeDiscarded,
        }
    }

    /// 入力の終わり。描画中のストロークがあれば閉じる
    pub fn finish(&mut self) -> Vec<SessionEvent> {
        if !self.is_writing {
            return Vec::new();
        }
        self.is_writing = false;
        vec![self.finish_stroke()]
    }

    /// キーボード操作相当のクリア。描画中フラグとジェスチャー状態は変えない
    pub fn clear_canvas(&mut self) {
        self.tracker.clear_all();
        self.space_count = 0;
        info!("canvas cleared (manual)");
    }

    pub fn summary(&self) -> SessionSummary {
        let strokes = self.tracker.strokes();
        SessionSummary {
            frames: self.frames,
            strokes: strokes.len(),
            spaces: self.space_count,
            raw_points: strokes.iter().map(|s| s.raw_count()).sum(),
            smoothed_points: strokes.iter().map(|s| s.smoothed_count()).sum(),
        }
    }

    pub fn gesture_info(&self) -> GestureInfo {
        self.recognizer.info()
    }

    pub fn is_writing(&self) -> bool {
        self.is_writing
    }

    pub fn space_count(&self) -> u32 {
        self.space_count
    }

    pub fn tracker(&self) -> &StrokeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut StrokeTracker {
        &mut self.tracker
    }

    pub fn recognizer_mut(&mut self) -> &mut GestureRecognizer {
        &mut self.recognizer
    }
}

impl Default for AirWritingSession {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
