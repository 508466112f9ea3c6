use tracing::debug;

use super::{
    remove_duplicates, SmoothingMethod, DEFAULT_KALMAN_MEASUREMENT_VARIANCE,
    DEFAULT_KALMAN_PROCESS_VARIANCE,
};
use crate::stroke::Point2D;

/// フォールバック連鎖の上限。移動平均/ガウシアンに落ちれば必ず止まる
const MAX_FALLBACKS: usize = 3;

/// 確定時の多段平滑化の既定チェーン: Kalman → Savitzky-Golay → Gaussian
pub fn default_final_passes() -> Vec<SmoothingMethod> {
    vec![
        SmoothingMethod::Kalman {
            process_variance: DEFAULT_KALMAN_PROCESS_VARIANCE,
            measurement_variance: DEFAULT_KALMAN_MEASUREMENT_VARIANCE,
        },
        SmoothingMethod::SavitzkyGolay {
            window: 7,
            polyorder: 3,
        },
        SmoothingMethod::Gaussian { sigma: 1.5 },
    ]
}

/// メソッドを適用し、失敗したら理由が示すメソッドへ順に切り替える
pub fn apply_with_fallback(method: SmoothingMethod, points: &[Point2D]) -> Vec<Point2D> {
    let mut method = method;
    for _ in 0..=MAX_FALLBACKS {
        match method.apply(points) {
            Ok(smoothed) => return smoothed,
            Err(reason) => {
                let next = reason.next_method(points.len());
                debug!(
                    "smoothing fallback: {} -> {} ({})",
                    method.kind(),
                    next.kind(),
                    reason
                );
                method = next;
            }
        }
    }
    points.to_vec()
}

/// 近接点を除去してから1つのメソッドで平滑化する
pub fn smooth_stroke(
    points: &[Point2D],
    method: SmoothingMethod,
    min_distance: f32,
) -> Vec<Point2D> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let deduped = remove_duplicates(points, min_distance);
    if deduped.len() < 2 {
        return deduped;
    }
    apply_with_fallback(method, &deduped)
}

/// passes を順に適用する。途中で2点未満になったら以降はスキップ
pub fn multi_pass(
    points: &[Point2D],
    passes: &[SmoothingMethod],
    min_distance: f32,
) -> Vec<Point2D> {
    passes.iter().fold(points.to_vec(), |result, &method| {
        if result.len() >= 2 {
            smooth_stroke(&result, method, min_distance)
        } else {
            result
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoothing::{moving_average, SmoothingKind};

    fn ramp(n: usize, step: f32) -> Vec<Point2D> {
        (0..n).map(|i| Point2D::new(i as f32 * step, 0.0)).collect()
    }

    #[test]
    fn test_savgol_short_input_falls_back_to_moving_average() {
        let pts = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(5.0, 3.0),
            Point2D::new(12.0, -1.0),
            Point2D::new(20.0, 4.0),
        ];
        let method = SmoothingMethod::SavitzkyGolay { window: 7, polyorder: 3 };
        let out = apply_with_fallback(method, &pts);
        assert_eq!(out, moving_average(&pts, 2));
    }

    #[test]
    fn test_spline_failure_falls_back_to_gaussian() {
        let pts = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(20.0, 0.0),
            Point2D::new(30.0, 0.0),
        ];
        let method = SmoothingMethod::Spline { smoothing: 0.0, num_points: None };
        assert!(method.apply(&pts).is_err());
        let out = apply_with_fallback(method, &pts);
        assert_eq!(out, crate::smoothing::gaussian(&pts, crate::smoothing::DEFAULT_GAUSSIAN_SIGMA));
    }

    #[test]
    fn test_smooth_stroke_removes_duplicates_first() {
        let pts = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.5, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.5, 0.0),
            Point2D::new(20.0, 0.0),
        ];
        let out = smooth_stroke(&pts, SmoothingMethod::MovingAverage { window: 1 }, 2.0);
        assert_eq!(out, vec![pts[0], pts[2], pts[4]]);
    }

    #[test]
    fn test_smooth_stroke_short_input_unchanged() {
        let one = vec![Point2D::new(4.0, 4.0)];
        let method = SmoothingMethod::Gaussian { sigma: 1.0 };
        assert_eq!(smooth_stroke(&one, method, 2.0), one);
        assert!(smooth_stroke(&[], method, 2.0).is_empty());
    }

    #[test]
    fn test_multi_pass_applies_in_order() {
        let pts = ramp(12, 10.0);
        let passes = [
            SmoothingMethod::MovingAverage { window: 3 },
            SmoothingMethod::Gaussian { sigma: 1.0 },
        ];
        let expected = smooth_stroke(&smooth_stroke(&pts, passes[0], 2.0), passes[1], 2.0);
        assert_eq!(multi_pass(&pts, &passes, 2.0), expected);
    }

    #[test]
    fn test_default_chain_keeps_point_count_on_clean_stroke() {
        let pts = ramp(4, 7.0);
        let out = multi_pass(&pts, &default_final_passes(), 2.0);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_default_chain_order() {
        let kinds: Vec<SmoothingKind> = default_final_passes().iter().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            vec![SmoothingKind::Kalman, SmoothingKind::SavitzkyGolay, SmoothingKind::Gaussian]
        );
    }
}
