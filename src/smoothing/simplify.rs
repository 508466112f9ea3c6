use crate::stroke::Point2D;

/// 直前に残した点から min_distance 未満の点を捨てる（冪等）
pub fn remove_duplicates(points: &[Point2D], min_distance: f32) -> Vec<Point2D> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut kept = vec![first];
    let mut last = first;
    for &p in rest {
        if p.distance(&last) >= min_distance {
            kept.push(p);
            last = p;
        }
    }
    kept
}

/// Douglas-Peucker による折れ線の単純化。
///
/// 再帰ではなく区間のスタックで処理する。出力は入力の部分列で、
/// 先頭と末尾の点は必ず残る。負の epsilon は 0 として扱い、NaN なら両端だけ残す。
pub fn douglas_peucker(points: &[Point2D], epsilon: f32) -> Vec<Point2D> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    if epsilon.is_nan() {
        return vec![points[0], points[n - 1]];
    }
    let epsilon = epsilon.max(0.0);

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (index, max_distance) = (start + 1..end)
            .map(|i| (i, segment_distance(&points[i], &points[start], &points[end])))
            .fold((start, 0.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });

        // 線分上にない点が1つもなければ index == start のまま
        if index > start && max_distance > epsilon {
            keep[index] = true;
            stack.push((start, index));
            stack.push((index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// 点から線分 [a, b] までの距離
pub fn segment_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point2D::new(a.x + t * dx, a.y + t * dy))
}
