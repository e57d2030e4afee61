//! Layout shared by the interactive and raster renderers

use std::f64::consts::{FRAC_PI_2, TAU};

/// Inner radius of a doughnut relative to its outer radius
pub const DOUGHNUT_INNER_RATIO: f64 = 0.5;

/// Fraction of a category slot covered by its bar group
const BAR_GROUP_WIDTH: f64 = 0.8;

/// Segments used for a full circle when outlining slices
const CIRCLE_SEGMENTS: usize = 96;

/// Horizontal placement of one series' bar within a category slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSlot {
    /// Offset of the bar center from the category position
    pub offset: f64,
    pub width: f64,
}

/// Bars of `series_count` series sit side by side inside each category slot
pub fn bar_slot(series_index: usize, series_count: usize) -> BarSlot {
    let count = series_count.max(1) as f64;
    let width = BAR_GROUP_WIDTH / count;
    BarSlot {
        offset: -BAR_GROUP_WIDTH / 2.0 + width * (series_index as f64 + 0.5),
        width,
    }
}

/// One wedge of a pie, in turns clockwise from twelve o'clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub index: usize,
    pub fraction: f64,
    pub start: f64,
    pub end: f64,
}

/// Wedges for `values`. Negative and non-finite values count as zero; an
/// all-zero input has no wedges.
pub fn share_slices(values: &[f64]) -> Vec<Slice> {
    let clamped: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() && *v > 0.0 { *v } else { 0.0 })
        .collect();
    let total: f64 = clamped.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut start = 0.0;
    clamped
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0.0)
        .map(|(index, v)| {
            let fraction = v / total;
            let slice = Slice {
                index,
                fraction,
                start,
                end: start + fraction,
            };
            start += fraction;
            slice
        })
        .collect()
}

fn point_at(turn: f64, radius: f64) -> [f64; 2] {
    let angle = FRAC_PI_2 - turn * TAU;
    [radius * angle.cos(), radius * angle.sin()]
}

/// Closed outline of a wedge of the unit circle. With a non-zero
/// `inner_ratio` the wedge becomes a ring segment.
pub fn slice_outline(slice: &Slice, inner_ratio: f64) -> Vec<[f64; 2]> {
    let steps = ((slice.end - slice.start) * CIRCLE_SEGMENTS as f64).ceil().max(2.0) as usize;
    let turn = |i: usize| slice.start + (slice.end - slice.start) * i as f64 / steps as f64;

    let mut outline: Vec<[f64; 2]> = (0..=steps).map(|i| point_at(turn(i), 1.0)).collect();
    if inner_ratio > 0.0 {
        outline.extend((0..=steps).rev().map(|i| point_at(turn(i), inner_ratio)));
    } else {
        outline.push([0.0, 0.0]);
    }
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_slots_cover_group() {
        let first = bar_slot(0, 2);
        let second = bar_slot(1, 2);
        assert!((first.width - 0.4).abs() < 1e-12);
        assert!((first.offset + 0.2).abs() < 1e-12);
        assert!((second.offset - 0.2).abs() < 1e-12);

        let single = bar_slot(0, 1);
        assert!(single.offset.abs() < 1e-12);
    }

    #[test]
    fn test_slices_sum_to_one_turn() {
        let slices = share_slices(&[1.0, 3.0, -2.0, 4.0]);
        assert_eq!(slices.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert!((slices.last().unwrap().end - 1.0).abs() < 1e-12);
        assert!((slices[1].fraction - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_has_no_slices() {
        assert!(share_slices(&[0.0, -1.0, f64::NAN]).is_empty());
    }

    #[test]
    fn test_outline_starts_at_top() {
        let slices = share_slices(&[1.0, 1.0]);
        let pie = slice_outline(&slices[0], 0.0);
        assert!((pie[0][0]).abs() < 1e-12);
        assert!((pie[0][1] - 1.0).abs() < 1e-12);
        assert_eq!(*pie.last().unwrap(), [0.0, 0.0]);

        let ring = slice_outline(&slices[0], DOUGHNUT_INNER_RATIO);
        let last = ring.last().unwrap();
        assert!((last[1] - DOUGHNUT_INNER_RATIO).abs() < 1e-12);
    }
}
