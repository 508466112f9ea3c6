use crate::stroke::Point2D;

/// 正規化ガウシアンカーネル。幅は floor(6σ) を奇数に切り上げたもの
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let mut size = (6.0 * sigma) as usize;
    if size % 2 == 0 {
        size += 1;
    }
    let half = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = (i as f32 - half) / sigma;
            (-0.5 * x * x).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// 軸ごとのガウシアン畳み込み（出力長は入力と同じ）。
///
/// 範囲外はゼロ埋めなので両端が原点側に引っ張られる。
pub fn gaussian(points: &[Point2D], sigma: f32) -> Vec<Point2D> {
    if points.len() < 3 || sigma <= 0.0 || !sigma.is_finite() {
        return points.to_vec();
    }

    let kernel = gaussian_kernel(sigma);
    let xs: Vec<f32> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f32> = points.iter().map(|p| p.y).collect();
    let xs = convolve_same(&xs, &kernel);
    let ys = convolve_same(&ys, &kernel);

    xs.into_iter()
        .zip(ys)
        .map(|(x, y)| Point2D::new(x, y))
        .collect()
}

/// 対称カーネルでの same モード畳み込み
fn convolve_same(values: &[f32], kernel: &[f32]) -> Vec<f32> {
    let n = values.len() as isize;
    let half = (kernel.len() / 2) as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(k, w)| {
                    let j = i + k as isize - half;
                    (0..n).contains(&j).then(|| w * values[j as usize])
                })
                .sum::<f32>()
        })
        .collect()
}
