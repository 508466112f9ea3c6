use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::gesture::DEFAULT_HOLD_FRAMES;
use crate::smoothing::{
    default_final_passes, SmoothingKind, SmoothingMethod, DEFAULT_DEDUP_MIN_DISTANCE,
    DEFAULT_GAUSSIAN_SIGMA, DEFAULT_KALMAN_MEASUREMENT_VARIANCE, DEFAULT_KALMAN_PROCESS_VARIANCE,
    DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_SAVGOL_POLYORDER, DEFAULT_SAVGOL_WINDOW,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stroke: StrokeConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrokeConfig {
    /// 直前の点からこの距離（px）未満の点は追加しない
    #[serde(default = "default_min_distance_threshold")]
    pub min_distance_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GestureConfig {
    /// ジェスチャー確定に必要な連続フレーム数
    #[serde(default = "default_hold_frames")]
    pub hold_frames: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SmoothingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// リアルタイム平滑化に使うメソッド
    #[serde(default = "default_method")]
    pub method: SmoothingKind,
    #[serde(default = "default_moving_average_window")]
    pub moving_average_window: usize,
    #[serde(default = "default_gaussian_sigma")]
    pub gaussian_sigma: f32,
    #[serde(default = "default_savgol_window")]
    pub savgol_window: usize,
    #[serde(default = "default_savgol_polyorder")]
    pub savgol_polyorder: usize,
    #[serde(default)]
    pub spline_smoothing: f32,
    #[serde(default = "default_kalman_process_variance")]
    pub kalman_process_variance: f32,
    #[serde(default = "default_kalman_measurement_variance")]
    pub kalman_measurement_variance: f32,
    /// 平滑化前の近接点除去の最小距離（px）
    #[serde(default = "default_dedup_min_distance")]
    pub dedup_min_distance: f32,
    /// ストローク確定時の多段平滑化
    #[serde(default = "default_final_passes")]
    pub final_passes: Vec<SmoothingMethod>,
}

fn default_min_distance_threshold() -> f32 { 5.0 }
fn default_hold_frames() -> u32 { DEFAULT_HOLD_FRAMES }
fn default_enabled() -> bool { true }
fn default_method() -> SmoothingKind { SmoothingKind::SavitzkyGolay }
fn default_moving_average_window() -> usize { DEFAULT_MOVING_AVERAGE_WINDOW }
fn default_gaussian_sigma() -> f32 { DEFAULT_GAUSSIAN_SIGMA }
fn default_savgol_window() -> usize { DEFAULT_SAVGOL_WINDOW }
fn default_savgol_polyorder() -> usize { DEFAULT_SAVGOL_POLYORDER }
fn default_kalman_process_variance() -> f32 { DEFAULT_KALMAN_PROCESS_VARIANCE }
fn default_kalman_measurement_variance() -> f32 { DEFAULT_KALMAN_MEASUREMENT_VARIANCE }
fn default_dedup_min_distance() -> f32 { DEFAULT_DEDUP_MIN_DISTANCE }

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            min_distance_threshold: default_min_distance_threshold(),
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            hold_frames: default_hold_frames(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            method: default_method(),
            moving_average_window: default_moving_average_window(),
            gaussian_sigma: default_gaussian_sigma(),
            savgol_window: default_savgol_window(),
            savgol_polyorder: default_savgol_polyorder(),
            spline_smoothing: 0.0,
            kalman_process_variance: default_kalman_process_variance(),
            kalman_measurement_variance: default_kalman_measurement_variance(),
            dedup_min_distance: default_dedup_min_distance(),
            final_passes: default_final_passes(),
        }
    }
}

impl SmoothingConfig {
    /// 設定値から kind のパラメータ付きメソッドを組み立てる
    pub fn method_for(&self, kind: SmoothingKind) -> SmoothingMethod {
        match kind {
            SmoothingKind::MovingAverage => SmoothingMethod::MovingAverage {
                window: self.moving_average_window,
            },
            SmoothingKind::Gaussian => SmoothingMethod::Gaussian {
                sigma: self.gaussian_sigma,
            },
            SmoothingKind::SavitzkyGolay => SmoothingMethod::SavitzkyGolay {
                window: self.savgol_window,
                polyorder: self.savgol_polyorder,
            },
            SmoothingKind::Spline => SmoothingMethod::Spline {
                smoothing: self.spline_smoothing,
                num_points: None,
            },
            SmoothingKind::Kalman => SmoothingMethod::Kalman {
                process_variance: self.kalman_process_variance,
                measurement_variance: self.kalman_measurement_variance,
            },
        }
    }

    /// リアルタイム用のメソッド。窓幅・次数は現在の点数で頭打ちにする
    pub fn realtime_method(&self, point_count: usize) -> SmoothingMethod {
        match self.method_for(self.method) {
            SmoothingMethod::MovingAverage { window } => SmoothingMethod::MovingAverage {
                window: window.min(point_count),
            },
            SmoothingMethod::SavitzkyGolay { window, polyorder } => {
                SmoothingMethod::SavitzkyGolay {
                    window: window.min(point_count),
                    polyorder: polyorder.min(point_count.saturating_sub(1)),
                }
            }
            other => other,
        }
    }

    /// 扱えないパラメータを警告付きで既定値に戻す
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        for kind in SmoothingKind::ALL {
            if !self.method_for(kind).is_valid() {
                warn!("invalid {} parameters in config; using defaults", kind);
                self.reset_params(kind, &defaults);
            }
        }
        for pass in &mut self.final_passes {
            if !pass.is_valid() {
                warn!("invalid final pass {:?}; using {} defaults", pass, pass.kind());
                *pass = defaults.method_for(pass.kind());
            }
        }
    }

    fn reset_params(&mut self, kind: SmoothingKind, defaults: &Self) {
        match kind {
            SmoothingKind::MovingAverage => {
                self.moving_average_window = defaults.moving_average_window;
            }
            SmoothingKind::Gaussian => self.gaussian_sigma = defaults.gaussian_sigma,
            SmoothingKind::SavitzkyGolay => {
                self.savgol_window = defaults.savgol_window;
                self.savgol_polyorder = defaults.savgol_polyorder;
            }
            SmoothingKind::Spline => self.spline_smoothing = defaults.spline_smoothing,
            SmoothingKind::Kalman => {
                self.kalman_process_variance = defaults.kalman_process_variance;
                self.kalman_measurement_variance = defaults.kalman_measurement_variance;
            }
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.smoothing.sanitize();
        Ok(config)
    }

    /// 読み込みに失敗したら警告を出して既定値を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; using default config", e);
                Self::default()
            }
        }
    }
}
