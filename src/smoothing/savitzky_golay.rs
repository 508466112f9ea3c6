//! Savitzky-Golay フィルタ
//!
//! 窓内の多項式最小二乗フィットで各点を置き換える。両端は最初/最後の窓で
//! フィットした多項式をそのまま評価する（interp モード）。

use nalgebra::DMatrix;

use super::{Fallback, SmoothResult, SmoothingKind};
use crate::stroke::Point2D;

/// 窓幅を奇数かつ polyorder + 2 以上に揃える
pub fn normalized_window(window: usize, polyorder: usize) -> usize {
    let mut window = window.max(polyorder + 2);
    if window % 2 == 0 {
        window += 1;
    }
    window
}

pub fn savitzky_golay(points: &[Point2D], window: usize, polyorder: usize) -> SmoothResult {
    let n = points.len();
    if n < 2 {
        return Ok(points.to_vec());
    }

    let window = normalized_window(window, polyorder);
    if n < window {
        return Err(Fallback::InsufficientPoints { window, len: n });
    }

    let projection = projection_matrix(window, polyorder)?;
    let xs: Vec<f64> = points.iter().map(|p| p.x as f64).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y as f64).collect();
    let xs = filter_axis(&xs, &projection);
    let ys = filter_axis(&ys, &projection);

    let smoothed: Vec<Point2D> = xs
        .into_iter()
        .zip(ys)
        .map(|(x, y)| Point2D::new(x as f32, y as f32))
        .collect();

    if smoothed.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(fit_failed("non-finite output"));
    }
    Ok(smoothed)
}

fn fit_failed(reason: &'static str) -> Fallback {
    Fallback::FitFailed {
        method: SmoothingKind::SavitzkyGolay,
        reason,
    }
}

/// S = A * pinv(A)。A は窓内オフセット t のヴァンデルモンド行列。
/// 行 r は窓内 r 番目の位置での平滑値を与える係数。
fn projection_matrix(window: usize, polyorder: usize) -> Result<DMatrix<f64>, Fallback> {
    let half = (window / 2) as f64;
    let vandermonde =
        DMatrix::from_fn(window, polyorder + 1, |i, j| (i as f64 - half).powi(j as i32));
    let pinv = vandermonde
        .clone()
        .pseudo_inverse(1e-12)
        .map_err(fit_failed)?;
    Ok(vandermonde * pinv)
}

fn filter_axis(values: &[f64], projection: &DMatrix<f64>) -> Vec<f64> {
    let n = values.len();
    let window = projection.nrows();
    let half = window / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half).min(n - window);
            let row = i - start;
            (0..window)
                .map(|k| projection[(row, k)] * values[start + k])
                .sum::<f64>()
        })
        .collect()
}
