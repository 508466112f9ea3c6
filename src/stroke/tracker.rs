use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::Point2D;
use crate::config::{SmoothingConfig, StrokeConfig};
use crate::smoothing::{multi_pass, smooth_stroke, SmoothingKind};

/// 点数がこれ未満のストロークは確定時に捨てる
pub const MIN_STROKE_POINTS: usize = 3;

/// リアルタイム平滑化を始める生点数（これを超えたら）
const REALTIME_SMOOTHING_MIN_POINTS: usize = 3;

/// 確定済みストローク
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub raw_points: Vec<Point2D>,
    pub smoothed_points: Vec<Point2D>,
    pub started_at: Instant,
    pub duration: Duration,
}

impl Stroke {
    pub fn raw_count(&self) -> usize {
        self.raw_points.len()
    }

    pub fn smoothed_count(&self) -> usize {
        self.smoothed_points.len()
    }
}

/// 描画中ストロークの状態
struct ActiveStroke {
    raw: Vec<Point2D>,
    smoothed: Vec<Point2D>,
    /// start 直後の1点目は距離判定なしで受け付ける
    awaiting_first: bool,
    started_at: Instant,
}

pub struct StrokeTracker {
    min_distance_threshold: f32,
    smoothing: SmoothingConfig,
    active: Option<ActiveStroke>,
    strokes: Vec<Stroke>,
}

impl StrokeTracker {
    pub fn from_config(stroke: &StrokeConfig, smoothing: &SmoothingConfig) -> Self {
        Self::new(stroke.min_distance_threshold, smoothing.clone())
    }

    pub fn new(min_distance_threshold: f32, smoothing: SmoothingConfig) -> Self {
        Self {
            min_distance_threshold,
            smoothing,
            active: None,
            strokes: Vec::new(),
        }
    }

    /// 新しいストロークを開始する。描画中のストロークは破棄される
    pub fn start(&mut self, point: Point2D) {
        if self.active.is_some() {
            debug!("stroke restarted before end; dropping in-progress points");
        }
        self.active = Some(ActiveStroke {
            raw: vec![point],
            smoothed: vec![point],
            awaiting_first: true,
            started_at: Instant::now(),
        });
        debug!("stroke started at ({:.1}, {:.1})", point.x, point.y);
    }

    /// 点を追加する。直前の生点から閾値未満しか動いていなければ捨てる
    pub fn add_point(&mut self, point: Point2D) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        if !active.awaiting_first {
            let Some(last) = active.raw.last() else {
                return false;
            };
            if point.distance(last) < self.min_distance_threshold {
                return false;
            }
        }
        active.awaiting_first = false;
        active.raw.push(point);

        let n = active.raw.len();
        active.smoothed = if self.smoothing.enabled && n > REALTIME_SMOOTHING_MIN_POINTS {
            smooth_stroke(
                &active.raw,
                self.smoothing.realtime_method(n),
                self.smoothing.dedup_min_distance,
            )
        } else {
            active.raw.clone()
        };
        true
    }

    /// ストロークを終了する。
    ///
    /// 生点が `MIN_STROKE_POINTS` 未満なら何も保存せず None。
    /// それ以外は生点列に多段平滑化をかけて保存し、平滑化後の点列を返す。
    pub fn end(&mut self) -> Option<Vec<Point2D>> {
        let active = self.active.take()?;
        if active.raw.len() < MIN_STROKE_POINTS {
            debug!("stroke discarded: {} raw points", active.raw.len());
            return None;
        }

        let smoothed = if self.smoothing.enabled {
            multi_pass(
                &active.raw,
                &self.smoothing.final_passes,
                self.smoothing.dedup_min_distance,
            )
        } else {
            active.raw.clone()
        };

        info!(
            "stroke #{} committed: {} raw -> {} smoothed points",
            self.strokes.len() + 1,
            active.raw.len(),
            smoothed.len()
        );
        self.strokes.push(Stroke {
            raw_points: active.raw,
            smoothed_points: smoothed.clone(),
            started_at: active.started_at,
            duration: active.started_at.elapsed(),
        });
        Some(smoothed)
    }

    /// 確定済みストロークと描画中の状態をすべて消す
    pub fn clear_all(&mut self) {
        self.strokes.clear();
        self.active = None;
    }

    pub fn remove_last(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }

    /// 平滑化の有効/無効を切り替え、切り替え後の状態を返す
    pub fn toggle_smoothing(&mut self) -> bool {
        self.smoothing.enabled = !self.smoothing.enabled;
        info!("smoothing {}", if self.smoothing.enabled { "enabled" } else { "disabled" });
        self.smoothing.enabled
    }

    /// リアルタイム平滑化のメソッドを名前で切り替える。未知の名前なら false で何もしない
    pub fn set_method(&mut self, name: &str) -> bool {
        match name.parse::<SmoothingKind>() {
            Ok(kind) => {
                self.smoothing.method = kind;
                info!("smoothing method set to {}", kind);
                true
            }
            Err(e) => {
                warn!("{}; keeping {}", e, self.smoothing.method);
                false
            }
        }
    }

    pub fn set_min_distance_threshold(&mut self, threshold: f32) {
        self.min_distance_threshold = threshold;
    }

    pub fn min_distance_threshold(&self) -> f32 {
        self.min_distance_threshold
    }

    pub fn smoothing(&self) -> &SmoothingConfig {
        &self.smoothing
    }

    pub fn smoothing_mut(&mut self) -> &mut SmoothingConfig {
        &mut self.smoothing
    }

    /// 描画中ストロークのリアルタイム平滑化済み点列
    pub fn current_stroke(&self) -> &[Point2D] {
        self.active.as_ref().map_or(&[], |a| a.smoothed.as_slice())
    }

    pub fn raw_stroke(&self) -> &[Point2D] {
        self.active.as_ref().map_or(&[], |a| a.raw.as_slice())
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke(&self, index: usize) -> Option<&Stroke> {
        self.strokes.get(index)
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }
}

impl Default for StrokeTracker {
    fn default() -> Self {
        Self::from_config(&StrokeConfig::default(), &SmoothingConfig::default())
    }
}
