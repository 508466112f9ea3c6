//! パラメトリック B スプライン
//!
//! 弦長パラメータ u ∈ [0, 1] に対して x(u), y(u) を同じ B スプラインで表す。
//! 両端はクランプ（端点を通る）、内部ノットはパラメータの平均で置く。

use nalgebra::DMatrix;

use super::{Fallback, SmoothResult, SmoothingKind};
use crate::stroke::Point2D;

const MAX_DEGREE: usize = 3;

/// smoothing == 0 で補間スプライン、正なら制御点の2階差分にペナルティをかける。
/// num_points を省略すると入力と同じ点数で再サンプリングする。
pub fn spline(points: &[Point2D], smoothing: f32, num_points: Option<usize>) -> SmoothResult {
    let n = points.len();
    if n < 4 {
        return Ok(points.to_vec());
    }
    let degree = MAX_DEGREE.min(n - 1);

    let params = chord_length_params(points)?;
    let knots = averaged_knots(&params, degree);

    let mut collocation = DMatrix::<f64>::zeros(n, n);
    for (row, &u) in params.iter().enumerate() {
        let span = find_span(&knots, n, degree, u);
        for (offset, value) in basis_functions(&knots, span, degree, u).into_iter().enumerate() {
            collocation[(row, span - degree + offset)] = value;
        }
    }
    let targets = DMatrix::from_fn(n, 2, |i, j| {
        if j == 0 {
            points[i].x as f64
        } else {
            points[i].y as f64
        }
    });

    let solved = if smoothing > 0.0 {
        let penalty = second_difference(n);
        let lhs = collocation.transpose() * &collocation
            + penalty.transpose() * &penalty * smoothing as f64;
        let rhs = collocation.transpose() * &targets;
        lhs.lu().solve(&rhs)
    } else {
        collocation.lu().solve(&targets)
    };
    let control = solved.ok_or_else(|| fit_failed("singular collocation system"))?;

    let count = match num_points {
        Some(count) if count > 0 => count,
        _ => n,
    };
    let resampled: Vec<Point2D> = (0..count)
        .map(|i| {
            let u = if count == 1 {
                0.0
            } else {
                i as f64 / (count - 1) as f64
            };
            let span = find_span(&knots, n, degree, u);
            let basis = basis_functions(&knots, span, degree, u);
            let (x, y) = basis.iter().enumerate().fold((0.0, 0.0), |(x, y), (offset, b)| {
                let c = span - degree + offset;
                (x + b * control[(c, 0)], y + b * control[(c, 1)])
            });
            Point2D::new(x as f32, y as f32)
        })
        .collect();

    if resampled.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(fit_failed("non-finite output"));
    }
    Ok(resampled)
}

fn fit_failed(reason: &'static str) -> Fallback {
    Fallback::FitFailed {
        method: SmoothingKind::Spline,
        reason,
    }
}

/// 累積弦長を全長で正規化したパラメータ。同じ点が続くと u が重複するので失敗扱い
fn chord_length_params(points: &[Point2D]) -> Result<Vec<f64>, Fallback> {
    let mut params = Vec::with_capacity(points.len());
    let mut acc = 0.0f64;
    params.push(0.0);
    for pair in points.windows(2) {
        let d = pair[0].distance(&pair[1]) as f64;
        if d <= f64::EPSILON {
            return Err(fit_failed("repeated points"));
        }
        acc += d;
        params.push(acc);
    }
    if !acc.is_finite() {
        return Err(fit_failed("non-finite arc length"));
    }
    for u in &mut params {
        *u /= acc;
    }
    Ok(params)
}

/// クランプノット列（長さ n + degree + 1）
fn averaged_knots(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len();
    let mut knots = vec![0.0; degree + 1];
    for j in 1..n - degree {
        let avg = params[j..j + degree].iter().sum::<f64>() / degree as f64;
        knots.push(avg);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    knots
}

fn find_span(knots: &[f64], n_ctrl: usize, degree: usize, u: f64) -> usize {
    if u >= knots[n_ctrl] {
        return n_ctrl - 1;
    }
    let mut span = degree;
    while span < n_ctrl - 1 && u >= knots[span + 1] {
        span += 1;
    }
    span
}

/// span 上で非ゼロの degree + 1 個の基底関数値（Cox-de Boor）
fn basis_functions(knots: &[f64], span: usize, degree: usize, u: f64) -> Vec<f64> {
    let mut values = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    values[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom.abs() > f64::EPSILON { values[r] / denom } else { 0.0 };
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }
    values
}

/// (n - 2) x n の2階差分行列
fn second_difference(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n - 2, n, |i, j| match j.wrapping_sub(i) {
        0 | 2 => 1.0,
        1 => -2.0,
        _ => 0.0,
    })
}
