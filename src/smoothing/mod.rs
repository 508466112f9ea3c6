//! ストローク点列の平滑化
//!
//! 各メソッドは入力を変更しない純関数。数値的に処理できない場合は
//! `Fallback` を返し、呼び出し側が次に試すメソッドを選ぶ。

pub mod gaussian;
pub mod kalman;
pub mod moving_average;
pub mod pipeline;
pub mod savitzky_golay;
pub mod simplify;
pub mod spline;

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::stroke::Point2D;

pub use gaussian::gaussian;
pub use kalman::{kalman, KalmanFilter};
pub use moving_average::moving_average;
pub use pipeline::{apply_with_fallback, default_final_passes, multi_pass, smooth_stroke};
pub use savitzky_golay::savitzky_golay;
pub use simplify::{douglas_peucker, remove_duplicates};
pub use spline::spline;

pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;
pub const DEFAULT_GAUSSIAN_SIGMA: f32 = 2.0;
pub const DEFAULT_SAVGOL_WINDOW: usize = 7;
pub const DEFAULT_SAVGOL_POLYORDER: usize = 3;
pub const DEFAULT_KALMAN_PROCESS_VARIANCE: f32 = 1e-5;
pub const DEFAULT_KALMAN_MEASUREMENT_VARIANCE: f32 = 1e-1;
pub const DEFAULT_DEDUP_MIN_DISTANCE: f32 = 2.0;
/// カーネル長は 6σ なので、これを超える σ は受け付けない
pub const MAX_GAUSSIAN_SIGMA: f32 = 100.0;
pub const MAX_SPLINE_POINTS: usize = 10_000;

/// 平滑化メソッドの種類（設定・表示用の名前）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingKind {
    MovingAverage,
    Gaussian,
    SavitzkyGolay,
    Spline,
    Kalman,
}

impl SmoothingKind {
    pub const ALL: [SmoothingKind; 5] = [
        Self::MovingAverage,
        Self::Gaussian,
        Self::SavitzkyGolay,
        Self::Spline,
        Self::Kalman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MovingAverage => "moving_average",
            Self::Gaussian => "gaussian",
            Self::SavitzkyGolay => "savitzky_golay",
            Self::Spline => "spline",
            Self::Kalman => "kalman",
        }
    }
}

impl fmt::Display for SmoothingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow!("unknown smoothing method: {s}"))
    }
}

/// パラメータ付きの平滑化メソッド
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SmoothingMethod {
    MovingAverage {
        #[serde(default = "default_moving_average_window")]
        window: usize,
    },
    Gaussian {
        #[serde(default = "default_gaussian_sigma")]
        sigma: f32,
    },
    SavitzkyGolay {
        #[serde(default = "default_savgol_window")]
        window: usize,
        #[serde(default = "default_savgol_polyorder")]
        polyorder: usize,
    },
    Spline {
        /// 0 なら補間、正なら2階差分ペナルティの重み
        #[serde(default)]
        smoothing: f32,
        /// 出力点数。None なら入力と同数
        #[serde(default)]
        num_points: Option<usize>,
    },
    Kalman {
        #[serde(default = "default_kalman_process_variance")]
        process_variance: f32,
        #[serde(default = "default_kalman_measurement_variance")]
        measurement_variance: f32,
    },
}

fn default_moving_average_window() -> usize { DEFAULT_MOVING_AVERAGE_WINDOW }
fn default_gaussian_sigma() -> f32 { DEFAULT_GAUSSIAN_SIGMA }
fn default_savgol_window() -> usize { DEFAULT_SAVGOL_WINDOW }
fn default_savgol_polyorder() -> usize { DEFAULT_SAVGOL_POLYORDER }
fn default_kalman_process_variance() -> f32 { DEFAULT_KALMAN_PROCESS_VARIANCE }
fn default_kalman_measurement_variance() -> f32 { DEFAULT_KALMAN_MEASUREMENT_VARIANCE }

impl SmoothingMethod {
    pub fn kind(&self) -> SmoothingKind {
        match self {
            Self::MovingAverage { .. } => SmoothingKind::MovingAverage,
            Self::Gaussian { .. } => SmoothingKind::Gaussian,
            Self::SavitzkyGolay { .. } => SmoothingKind::SavitzkyGolay,
            Self::Spline { .. } => SmoothingKind::Spline,
            Self::Kalman { .. } => SmoothingKind::Kalman,
        }
    }

    /// パラメータが有限かつ扱える範囲にあるか。窓幅は点数で頭打ちになるので見ない
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::MovingAverage { .. } | Self::SavitzkyGolay { .. } => true,
            Self::Gaussian { sigma } => {
                sigma.is_finite() && sigma > 0.0 && sigma <= MAX_GAUSSIAN_SIGMA
            }
            Self::Spline { smoothing, num_points } => {
                smoothing.is_finite()
                    && smoothing >= 0.0
                    && num_points.map_or(true, |count| count <= MAX_SPLINE_POINTS)
            }
            Self::Kalman {
                process_variance,
                measurement_variance,
            } => {
                process_variance.is_finite()
                    && process_variance >= 0.0
                    && measurement_variance.is_finite()
                    && measurement_variance >= 0.0
            }
        }
    }

    /// メソッドを1回適用する。フォールバックはしない
    pub fn apply(&self, points: &[Point2D]) -> SmoothResult {
        match *self {
            Self::MovingAverage { window } => Ok(moving_average(points, window)),
            Self::Gaussian { sigma } => Ok(gaussian(points, sigma)),
            Self::SavitzkyGolay { window, polyorder } => savitzky_golay(points, window, polyorder),
            Self::Spline { smoothing, num_points } => spline(points, smoothing, num_points),
            Self::Kalman {
                process_variance,
                measurement_variance,
            } => kalman(points, process_variance, measurement_variance),
        }
    }
}

/// フォールバック理由
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    /// 窓幅に対して点数が足りない
    InsufficientPoints { window: usize, len: usize },
    /// 数値的なフィットに失敗
    FitFailed {
        method: SmoothingKind,
        reason: &'static str,
    },
}

impl Fallback {
    /// 次に試すメソッド。移動平均とガウシアンは失敗しないので連鎖は必ず止まる
    pub fn next_method(&self, len: usize) -> SmoothingMethod {
        match self {
            Self::InsufficientPoints { .. } => SmoothingMethod::MovingAverage { window: len / 2 },
            Self::FitFailed {
                method: SmoothingKind::Spline,
                ..
            } => SmoothingMethod::Gaussian {
                sigma: DEFAULT_GAUSSIAN_SIGMA,
            },
            Self::FitFailed { .. } => SmoothingMethod::MovingAverage {
                window: DEFAULT_MOVING_AVERAGE_WINDOW,
            },
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientPoints { window, len } => {
                write!(f, "{len} points is fewer than window {window}")
            }
            Self::FitFailed { method, reason } => write!(f, "{method} fit failed: {reason}"),
        }
    }
}

pub type SmoothResult = Result<Vec<Point2D>, Fallback>;

#[cfg(test)]
pub(crate) fn approx_eq_point(a: &Point2D, b: &Point2D, eps: f32) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_methods() -> Vec<SmoothingMethod> {
        vec![
            SmoothingMethod::MovingAverage { window: 5 },
            SmoothingMethod::Gaussian { sigma: 2.0 },
            SmoothingMethod::SavitzkyGolay { window: 7, polyorder: 3 },
            SmoothingMethod::Spline { smoothing: 0.0, num_points: None },
            SmoothingMethod::Kalman {
                process_variance: 1e-5,
                measurement_variance: 1e-1,
            },
        ]
    }

    #[test]
    fn test_short_inputs_unchanged_for_every_method() {
        let one = vec![Point2D::new(3.0, 4.0)];
        for method in all_methods() {
            assert_eq!(method.apply(&[]), Ok(vec![]), "{:?}", method);
            assert_eq!(method.apply(&one), Ok(one.clone()), "{:?}", method);
        }
        assert!(remove_duplicates(&[], 2.0).is_empty());
        assert_eq!(remove_duplicates(&one, 2.0), one);
        assert!(douglas_peucker(&[], 2.0).is_empty());
        assert_eq!(douglas_peucker(&one, 2.0), one);
    }

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in SmoothingKind::ALL {
            assert_eq!(kind.as_str().parse::<SmoothingKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!("bezier".parse::<SmoothingKind>().is_err());
        assert!("Gaussian".parse::<SmoothingKind>().is_err());
    }

    #[test]
    fn test_method_kind() {
        for (method, kind) in all_methods().iter().zip(SmoothingKind::ALL) {
            assert_eq!(method.kind(), kind);
        }
    }

    #[test]
    fn test_fallback_next_method() {
        let short = Fallback::InsufficientPoints { window: 7, len: 5 };
        assert_eq!(short.next_method(5), SmoothingMethod::MovingAverage { window: 2 });

        let spline_failed = Fallback::FitFailed {
            method: SmoothingKind::Spline,
            reason: "singular",
        };
        assert_eq!(
            spline_failed.next_method(10),
            SmoothingMethod::Gaussian { sigma: DEFAULT_GAUSSIAN_SIGMA }
        );

        let kalman_failed = Fallback::FitFailed {
            method: SmoothingKind::Kalman,
            reason: "singular",
        };
        assert_eq!(
            kalman_failed.next_method(10),
            SmoothingMethod::MovingAverage { window: DEFAULT_MOVING_AVERAGE_WINDOW }
        );
    }

    #[test]
    fn test_is_valid_bounds() {
        for method in all_methods() {
            assert!(method.is_valid(), "{:?}", method);
        }
        assert!(SmoothingMethod::Gaussian { sigma: MAX_GAUSSIAN_SIGMA }.is_valid());
        assert!(!SmoothingMethod::Gaussian { sigma: 1e12 }.is_valid());
        assert!(!SmoothingMethod::Gaussian { sigma: f32::NAN }.is_valid());
        let huge = SmoothingMethod::Spline {
            smoothing: 0.0,
            num_points: Some(usize::MAX),
        };
        assert!(!huge.is_valid());
        assert!(!SmoothingMethod::Spline { smoothing: -1.0, num_points: None }.is_valid());
        assert!(!SmoothingMethod::Kalman {
            process_variance: f32::INFINITY,
            measurement_variance: 0.1,
        }
        .is_valid());
    }

    #[test]
    fn test_method_deserialize_with_defaults() {
        #[derive(Deserialize)]
        struct Passes {
            passes: Vec<SmoothingMethod>,
        }
        let text = r#"
            [[passes]]
            method = "kalman"
            measurement_variance = 0.5

            [[passes]]
            method = "savitzky_golay"
            window = 9

            [[passes]]
            method = "spline"
        "#;
        let parsed: Passes = toml::from_str(text).unwrap();
        assert_eq!(
            parsed.passes,
            vec![
                SmoothingMethod::Kalman {
                    process_variance: DEFAULT_KALMAN_PROCESS_VARIANCE,
                    measurement_variance: 0.5,
                },
                SmoothingMethod::SavitzkyGolay {
                    window: 9,
                    polyorder: DEFAULT_SAVGOL_POLYORDER,
                },
                SmoothingMethod::Spline {
                    smoothing: 0.0,
                    num_points: None,
                },
            ]
        );
    }
}
