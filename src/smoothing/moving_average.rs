use crate::stroke::Point2D;

/// 中心移動平均。端では窓が切り詰められる（非対称）。
///
/// 点数が窓幅より少ない場合は入力をそのまま返す。
pub fn moving_average(points: &[Point2D], window: usize) -> Vec<Point2D> {
    let n = points.len();
    if n < 2 || n < window {
        return points.to_vec();
    }

    let half = window / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            mean(&points[start..end])
        })
        .collect()
}

fn mean(points: &[Point2D]) -> Point2D {
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let len = points.len() as f32;
    Point2D::new(sx / len, sy / len)
}
