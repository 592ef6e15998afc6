use crate::model::PositionedFragment;

/// Default y-tolerance (in PDF units) for grouping fragments into a row.
pub const DEFAULT_Y_TOLERANCE: f32 = 2.0;

/// An ordered set of fragments sharing a y-coordinate within tolerance.
/// Transient, rebuilt per page.
#[derive(Debug, Clone)]
pub struct RowCluster {
    /// Representative y of the cluster (y of the fragment that opened it).
    pub y: f32,
    pub fragments: Vec<PositionedFragment>,
}

/// Group fragments into rows by y-coordinate.
///
/// Greedy single pass: each fragment joins the first existing cluster whose
/// representative y is within tolerance, otherwise it opens a new cluster.
/// Fragments inside a cluster end up sorted left-to-right; clusters are
/// returned top-to-bottom (descending y, PDF y-up).
pub fn cluster_rows(fragments: &[PositionedFragment], y_tolerance: f32) -> Vec<RowCluster> {
    let mut clusters: Vec<RowCluster> = Vec::new();

    for fragment in fragments {
        if fragment.text.trim().is_empty() {
            continue;
        }
        match clusters
            .iter_mut()
            .find(|c| (c.y - fragment.y).abs() <= y_tolerance)
        {
            Some(cluster) => cluster.fragments.push(fragment.clone()),
            None => clusters.push(RowCluster {
                y: fragment.y,
                fragments: vec![fragment.clone()],
            }),
        }
    }

    for cluster in &mut clusters {
        cluster
            .fragments
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }
    clusters.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal));

    clusters
}

/// Threshold above which a horizontal gap splits a row into independent
/// segments: wide enough to ignore word spacing, narrow enough to separate
/// unrelated columns that landed in one y-cluster.
pub fn gap_threshold(page_width: f32) -> f32 {
    (page_width * 0.18).clamp(110.0, 220.0)
}

/// Split one row into independent fragment runs wherever the gap between
/// consecutive fragments exceeds the adaptive threshold.
pub fn split_row_by_gaps(row: &RowCluster, page_width: f32) -> Vec<Vec<PositionedFragment>> {
    let threshold = gap_threshold(page_width);
    let mut groups: Vec<Vec<PositionedFragment>> = Vec::new();
    let mut current: Vec<PositionedFragment> = Vec::new();

    for fragment in &row.fragments {
        if let Some(last) = current.last() {
            if fragment.x - last.x > threshold {
                groups.push(std::mem::take(&mut current));
            }
        }
        current.push(fragment.clone());
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Join a fragment run into one line of text, left to right.
pub fn join_fragments(fragments: &[PositionedFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f32, y: f32) -> PositionedFragment {
        PositionedFragment {
            text: text.into(),
            x,
            y,
            page: 0,
        }
    }

    #[test]
    fn clusters_by_y_within_tolerance() {
        let fragments = vec![
            frag("b", 100.0, 700.2),
            frag("a", 10.0, 700.0),
            frag("c", 10.0, 650.0),
        ];
        let rows = cluster_rows(&fragments, DEFAULT_Y_TOLERANCE);
        assert_eq!(rows.len(), 2);
        // Top row first, fragments left-to-right.
        assert_eq!(rows[0].fragments[0].text, "a");
        assert_eq!(rows[0].fragments[1].text, "b");
        assert_eq!(rows[1].fragments[0].text, "c");
    }

    #[test]
    fn rows_ordered_top_to_bottom() {
        let fragments = vec![frag("low", 0.0, 100.0), frag("high", 0.0, 600.0)];
        let rows = cluster_rows(&fragments, DEFAULT_Y_TOLERANCE);
        assert_eq!(rows[0].fragments[0].text, "high");
        assert_eq!(rows[1].fragments[0].text, "low");
    }

    #[test]
    fn blank_fragments_ignored() {
        let fragments = vec![frag("  ", 0.0, 100.0), frag("x", 5.0, 100.0)];
        let rows = cluster_rows(&fragments, DEFAULT_Y_TOLERANCE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fragments.len(), 1);
    }

    #[test]
    fn gap_threshold_clamped() {
        assert_eq!(gap_threshold(100.0), 110.0);
        assert_eq!(gap_threshold(612.0), 612.0 * 0.18);
        assert_eq!(gap_threshold(5000.0), 220.0);
    }

    #[test]
    fn splits_row_on_large_gap() {
        let row = RowCluster {
            y: 700.0,
            fragments: vec![
                frag("left", 10.0, 700.0),
                frag("phrase", 60.0, 700.0),
                frag("right", 450.0, 700.0),
            ],
        };
        let groups = split_row_by_gaps(&row, 612.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(join_fragments(&groups[0]), "left phrase");
        assert_eq!(join_fragments(&groups[1]), "right");
    }

    #[test]
    fn keeps_row_whole_without_large_gap() {
        let row = RowCluster {
            y: 700.0,
            fragments: vec![frag("4", 10.0, 700.0), frag("mile tempo", 40.0, 700.0)],
        };
        let groups = split_row_by_gaps(&row, 612.0);
        assert_eq!(groups.len(), 1);
    }
}
