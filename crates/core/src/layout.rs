#![forbid(unsafe_code)]

use crate::graph::FrameNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignMode {
    Left,
    Right,
    Top,
    Bottom,
    CenterH,
    CenterV,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Moves every selected node's edge to the selection extreme (min for
/// left/top, max of `pos + size` for right/bottom), or its center to the
/// mean center. Pure geometry: history snapshots are the caller's concern.
pub fn align(nodes: &mut [FrameNode], mode: AlignMode) {
    if nodes.is_empty() {
        return;
    }

    match mode {
        AlignMode::Left => {
            let min = fold_min(nodes.iter().map(|n| n.position.x));
            for node in nodes {
                node.position.x = min;
            }
        }
        AlignMode::Top => {
            let min = fold_min(nodes.iter().map(|n| n.position.y));
            for node in nodes {
                node.position.y = min;
            }
        }
        AlignMode::Right => {
            let max = fold_max(
                nodes
                    .iter()
                    .map(|n| n.position.x + n.effective_size().width),
            );
            for node in nodes {
                node.position.x = max - node.effective_size().width;
            }
        }
        AlignMode::Bottom => {
            let max = fold_max(
                nodes
                    .iter()
                    .map(|n| n.position.y + n.effective_size().height),
            );
            for node in nodes {
                node.position.y = max - node.effective_size().height;
            }
        }
        AlignMode::CenterH => {
            let mean = mean(
                nodes
                    .iter()
                    .map(|n| n.position.x + n.effective_size().width / 2.0),
            );
            for node in nodes {
                node.position.x = mean - node.effective_size().width / 2.0;
            }
        }
        AlignMode::CenterV => {
            let mean = mean(
                nodes
                    .iter()
                    .map(|n| n.position.y + n.effective_size().height / 2.0),
            );
            for node in nodes {
                node.position.y = mean - node.effective_size().height / 2.0;
            }
        }
    }
}

/// Sorts the selection along `axis`, fixes the two extreme nodes, and
/// spaces interior nodes at equal intervals between them. No-op under
/// three nodes.
pub fn distribute(nodes: &mut [FrameNode], axis: Axis) {
    if nodes.len() < 3 {
        return;
    }

    let coordinate = |node: &FrameNode| match axis {
        Axis::Horizontal => node.position.x,
        Axis::Vertical => node.position.y,
    };

    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| coordinate(&nodes[a]).total_cmp(&coordinate(&nodes[b])));

    let first = coordinate(&nodes[order[0]]);
    let last = coordinate(&nodes[order[order.len() - 1]]);
    let interval = (last - first) / (order.len() - 1) as f64;

    for (slot, &index) in order.iter().enumerate() {
        let value = first + interval * slot as f64;
        match axis {
            Axis::Horizontal => nodes[index].position.x = value,
            Axis::Vertical => nodes[index].position.y = value,
        }
    }
}

fn fold_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}

fn fold_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    sum / count as f64
}
