//! Line reconstruction from positioned text fragments
//!
//! Text layers hand back fragments in drawing order with bottom-left origin
//! coordinates. Fragments are grouped into lines by Y proximity, ordered left
//! to right within a line, and lines are emitted top to bottom.

use crate::models::{PositionedTextFragment, TextLine, TextPage};

/// Default Y tolerance (in text-layer units) for joining a line
pub const DEFAULT_LINE_TOLERANCE: f64 = 5.0;

struct LineCluster<'a> {
    reference_y: f64,
    fragments: Vec<&'a PositionedTextFragment>,
}

/// Group fragments into logical lines
///
/// Each fragment joins the first cluster (in creation order) whose reference
/// Y, the Y of the fragment that opened it, lies within `tolerance`.
/// Overlapping columns or multi-line cells merge incorrectly; there is no
/// correction pass.
pub fn reconstruct_lines(fragments: &[PositionedTextFragment], tolerance: f64) -> Vec<TextLine> {
    let mut clusters: Vec<LineCluster<'_>> = Vec::new();

    for fragment in fragments {
        if fragment.text.trim().is_empty() {
            continue;
        }

        match clusters
            .iter_mut()
            .find(|c| (c.reference_y - fragment.y).abs() <= tolerance)
        {
            Some(cluster) => cluster.fragments.push(fragment),
            None => clusters.push(LineCluster {
                reference_y: fragment.y,
                fragments: vec![fragment],
            }),
        }
    }

    let mut lines: Vec<TextLine> = clusters
        .into_iter()
        .map(|mut cluster| {
            cluster
                .fragments
                .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
            let text = cluster
                .fragments
                .iter()
                .map(|f| f.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            TextLine {
                y: cluster.reference_y,
                text,
            }
        })
        .collect();

    lines.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal));
    lines
}

/// Reconstruct every page in order, returning line text only
pub fn reconstruct_pages(pages: &[TextPage], tolerance: f64) -> Vec<String> {
    pages
        .iter()
        .flat_map(|page| reconstruct_lines(&page.fragments, tolerance))
        .map(|line| line.text)
        .collect()
}

/// Fragment texts in source order, space separated
pub fn flatten_page(page: &TextPage) -> String {
    page.fragments
        .iter()
        .map(|f| f.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
