//! 等速度モデルのカルマンフィルタ
//!
//! 状態ベクトル: [x, y, vx, vy]ᵀ、1サンプル = 1ステップ (dt = 1)

use nalgebra::{SMatrix, SVector};

use super::{Fallback, SmoothResult, SmoothingKind};
use crate::stroke::Point2D;

type State = SVector<f32, 4>;
type Matrix4 = SMatrix<f32, 4, 4>;
type Matrix2x4 = SMatrix<f32, 2, 4>;
type Matrix4x2 = SMatrix<f32, 4, 2>;
type Matrix2 = SMatrix<f32, 2, 2>;
type Vector2 = SVector<f32, 2>;

/// 初期共分散（初期速度は未知なので大きくとる）
const INITIAL_COVARIANCE: f32 = 1000.0;

pub struct KalmanFilter {
    state: State,
    covariance: Matrix4,
    process_noise: Matrix4,
    measurement_noise: Matrix2,
    last_correction: f32,
    last_gain: f32,
}

impl KalmanFilter {
    /// 最初の観測点で初期化する。速度は 0
    pub fn new(initial: Point2D, process_variance: f32, measurement_variance: f32) -> Self {
        Self {
            state: State::new(initial.x, initial.y, 0.0, 0.0),
            covariance: Matrix4::identity() * INITIAL_COVARIANCE,
            process_noise: Matrix4::identity() * process_variance,
            measurement_noise: Matrix2::identity() * measurement_variance,
            last_correction: 0.0,
            last_gain: 0.0,
        }
    }

    /// ```text
    /// | 1 0 1 0 |
    /// | 0 1 0 1 |
    /// | 0 0 1 0 |
    /// | 0 0 0 1 |
    /// ```
    #[rustfmt::skip]
    fn transition_matrix() -> Matrix4 {
        Matrix4::new(
            1.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    #[rustfmt::skip]
    fn observation_matrix() -> Matrix2x4 {
        Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        )
    }

    pub fn predict(&mut self) {
        let f = Self::transition_matrix();
        self.state = f * self.state;
        self.covariance = f * self.covariance * f.transpose() + self.process_noise;
    }

    /// 観測で補正する。イノベーション共分散が特異なら None
    pub fn update(&mut self, measured: Point2D) -> Option<Point2D> {
        let h = Self::observation_matrix();
        let z = Vector2::new(measured.x, measured.y);

        let innovation = z - h * self.state;
        let s = h * self.covariance * h.transpose() + self.measurement_noise;
        let s_inv = s.try_inverse()?;
        let k: Matrix4x2 = self.covariance * h.transpose() * s_inv;

        let correction = k * innovation;
        self.state += correction;
        self.covariance = (Matrix4::identity() - k * h) * self.covariance;

        self.last_correction = correction.fixed_rows::<2>(0).norm();
        self.last_gain = k[(0, 0)];
        Some(self.position())
    }

    /// predict → update の1ステップ
    pub fn step(&mut self, measured: Point2D) -> Option<Point2D> {
        self.predict();
        self.update(measured)
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.state[0], self.state[1])
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.state[2], self.state[3])
    }

    /// 直前の update で位置に加えた補正量
    pub fn last_correction(&self) -> f32 {
        self.last_correction
    }

    /// 直前の update の x 位置ゲイン
    pub fn last_gain(&self) -> f32 {
        self.last_gain
    }
}

/// 因果的なカルマン平滑化。先読みはしない
pub fn kalman(
    points: &[Point2D],
    process_variance: f32,
    measurement_variance: f32,
) -> SmoothResult {
    if points.len() < 2 {
        return Ok(points.to_vec());
    }

    let mut filter = KalmanFilter::new(points[0], process_variance, measurement_variance);
    let mut smoothed = Vec::with_capacity(points.len());
    for &p in points {
        let estimate = filter.step(p).ok_or(Fallback::FitFailed {
            method: SmoothingKind::Kalman,
            reason: "singular innovation covariance",
        })?;
        if !estimate.x.is_finite() || !estimate.y.is_finite() {
            return Err(Fallback::FitFailed {
                method: SmoothingKind::Kalman,
                reason: "non-finite state",
            });
        }
        smoothed.push(estimate);
    }
    Ok(smoothed)
}
