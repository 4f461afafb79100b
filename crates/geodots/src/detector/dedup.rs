use super::Dot;

/// Drop detections within `radius` of an earlier detection.
///
/// Discovery order decides which one survives, so the output stays a
/// deterministic subsequence of the input.
pub fn dedup_by_proximity(dots: Vec<Dot>, radius: f64) -> Vec<Dot> {
    let mut keep = vec![true; dots.len()];
    let r2 = radius * radius;

    for i in 0..dots.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..dots.len() {
            if !keep[j] {
                continue;
            }
            let dx = dots[i].centroid[0] - dots[j].centroid[0];
            let dy = dots[i].centroid[1] - dots[j].centroid[1];
            if dx * dx + dy * dy < r2 {
                keep[j] = false;
            }
        }
    }

    dots.into_iter()
        .enumerate()
        .filter_map(|(index, dot)| keep[index].then_some(dot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(x: f64, y: f64) -> Dot {
        Dot::from_centroid([x, y], 30.0)
    }

    #[test]
    fn close_pairs_keep_first_in_order() {
        let dots = vec![dot(10.0, 10.0), dot(40.0, 40.0), dot(11.5, 10.5), dot(80.0, 5.0)];
        let kept = dedup_by_proximity(dots, 3.0);
        let centers: Vec<[f64; 2]> = kept.iter().map(|d| d.centroid).collect();
        assert_eq!(centers, vec![[10.0, 10.0], [40.0, 40.0], [80.0, 5.0]]);
    }

    #[test]
    fn distant_dots_are_untouched() {
        let dots = vec![dot(0.0, 0.0), dot(10.0, 0.0), dot(20.0, 0.0)];
        assert_eq!(dedup_by_proximity(dots, 5.0).len(), 3);
    }
}
