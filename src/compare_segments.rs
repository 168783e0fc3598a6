// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Vertical order of the active segments in the scan line.

use super::sweep_event::*;
use iron_shapes::edge::{Edge, Side};
use iron_shapes::CoordinateType;
use std::cmp::Ordering;
use std::rc::Rc;

use std::fmt::Debug;

/// Order `probe` against `base`, where `base` starts further left and
/// both edges run left to right. `probe` lies above `base` iff its start
/// is on the left side of the line through `base`; a start on the line
/// itself defers to the end point.
fn order_against_later_edge<T: CoordinateType>(base: &Edge<T>, probe: &Edge<T>) -> Ordering {
    debug_assert!(base.start != probe.start);
    debug_assert!(base.start.x <= base.end.x);
    debug_assert!(probe.start.x <= probe.end.x);

    match base.side_of(probe.start) {
        Side::Left => Ordering::Less,
        Side::Right => Ordering::Greater,
        Side::Center => match base.side_of(probe.end) {
            Side::Left => Ordering::Less,
            Side::Right => Ordering::Greater,
            Side::Center => Ordering::Equal,
        },
    }
}

/// Order two active segments, given by their left events, by the
/// y-coordinate at which they cross the scan line.
///
/// Both events MUST be left events of segments that share some abscissa
/// (otherwise they could not be active at the same time, and the result
/// is meaningless). Since active segments never cross in their
/// interiors, the result is stable for the whole time both are active.
///
/// Collinear segments meet the scan line in the same point; they are
/// ordered by operand (`Subject` below `Clipping`) and then by edge id,
/// which keeps coinciding fragments apart without affecting geometry.
pub fn compare_events_by_segments<T>(le1: &Rc<SweepEvent<T>>, le2: &Rc<SweepEvent<T>>) -> Ordering
where
    T: CoordinateType + Debug,
{
    debug_assert!(le1.is_left_event());
    debug_assert!(le2.is_left_event());

    // The scan line may probe an event against itself.
    if Rc::ptr_eq(le1, le2) {
        return Ordering::Equal;
    }

    let first = le1.get_edge().unwrap();
    let second = le2.get_edge().unwrap();

    debug_assert!(first.start.x <= first.end.x);
    debug_assert!(second.start.x <= second.end.x);

    debug_assert!(!first.is_degenerate());
    debug_assert!(!second.is_degenerate());

    debug_assert!(
        !(first.start.x > second.end.x || second.start.x > first.end.x),
        "Segments without a common abscissa are never active together."
    );

    if first.is_collinear(&second) {
        if le1.operand != le2.operand {
            if le1.operand == Operand::Subject {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        } else {
            le1.get_edge_id().cmp(&le2.get_edge_id())
        }
    } else if first.start == second.start {
        // Same left endpoint: the right endpoints decide.
        match first.side_of(second.end) {
            Side::Left => Ordering::Less,
            Side::Right => Ordering::Greater,
            Side::Center => {
                unreachable!("collinear edges must be handled before")
            }
        }
    } else if first.start.x == second.start.x {
        // Both segments begin on the same vertical; their start points
        // differ, so the y-coordinates decide.
        debug_assert!(first.start.y != second.start.y);

        if first.start.y < second.start.y {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    } else {
        // The segment starting further left serves as the base line.
        let ordering = if first.start.x < second.start.x {
            order_against_later_edge(&first, &second)
        } else {
            order_against_later_edge(&second, &first).reverse()
        };
        debug_assert!(ordering != Ordering::Equal);
        ordering
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::rc::Weak;

    /// Both events of a segment; the left one is returned first.
    fn segment_events(
        edge_id: usize,
        from: (f64, f64),
        to: (f64, f64),
        operand: Operand,
    ) -> (Rc<SweepEvent<f64>>, Rc<SweepEvent<f64>>) {
        let right = SweepEvent::new_rc(edge_id, to.into(), false, Weak::new(), operand, true);
        let left = SweepEvent::new_rc(
            edge_id,
            from.into(),
            true,
            Rc::downgrade(&right),
            operand,
            true,
        );
        right.set_other_event(&left);

        (left, right)
    }

    #[test]
    fn test_order_by_vertical_position() {
        // A horizontal base line and two segments starting later: one
        // below it, one above it.
        let (base, _k0) = segment_events(0, (0.0, 1.0), (4.0, 1.0), Operand::Subject);
        let (below, _k1) = segment_events(1, (1.0, 0.0), (2.0, 3.0), Operand::Clipping);
        let (above, _k2) = segment_events(2, (1.0, 2.0), (3.0, 4.0), Operand::Clipping);

        assert_eq!(compare_events_by_segments(&base, &below), Ordering::Greater);
        assert_eq!(compare_events_by_segments(&below, &base), Ordering::Less);
        assert_eq!(compare_events_by_segments(&base, &above), Ordering::Less);
        assert_eq!(compare_events_by_segments(&above, &base), Ordering::Greater);

        // Segments starting on the same vertical are ordered by the
        // start y-coordinate.
        let (low_start, _k3) = segment_events(3, (1.0, 0.5), (4.0, 0.5), Operand::Subject);
        assert_eq!(
            compare_events_by_segments(&low_start, &above),
            Ordering::Less
        );
        assert_eq!(
            compare_events_by_segments(&above, &low_start),
            Ordering::Greater
        );
    }

    #[test]
    fn test_shared_start_sorted_by_slope_vertical_last() {
        // Segments fanning out of one point sort by slope, with the
        // upward vertical on top.
        let (flat, _k0) = segment_events(0, (0.0, 0.0), (3.0, 0.0), Operand::Subject);
        let (steep, _k1) = segment_events(1, (0.0, 0.0), (2.0, 2.0), Operand::Clipping);
        let (vertical, _k2) = segment_events(2, (0.0, 0.0), (0.0, 2.0), Operand::Subject);

        assert_eq!(compare_events_by_segments(&flat, &steep), Ordering::Less);
        assert_eq!(compare_events_by_segments(&steep, &vertical), Ordering::Less);
        assert_eq!(compare_events_by_segments(&flat, &vertical), Ordering::Less);

        assert_eq!(compare_events_by_segments(&steep, &flat), Ordering::Greater);
        assert_eq!(
            compare_events_by_segments(&vertical, &steep),
            Ordering::Greater
        );
        assert_eq!(
            compare_events_by_segments(&vertical, &flat),
            Ordering::Greater
        );
    }

    #[test]
    fn test_collinear_ordered_by_operand_then_edge_id() {
        // Coinciding and collinear fragments must be kept apart in the
        // scan line although they meet it in the same point.
        let (clipping_late, _k0) = segment_events(7, (0.0, 0.0), (1.0, 1.0), Operand::Clipping);
        let (subject, _k1) = segment_events(3, (0.0, 0.0), (2.0, 2.0), Operand::Subject);

        // Subject sorts below clipping, regardless of the edge ids.
        assert_eq!(
            compare_events_by_segments(&clipping_late, &subject),
            Ordering::Greater
        );
        assert_eq!(
            compare_events_by_segments(&subject, &clipping_late),
            Ordering::Less
        );

        // Same operand: the edge id decides. This also covers collinear
        // verticals, which share their whole abscissa.
        let (subject_early, _k2) = segment_events(1, (0.0, 0.0), (1.0, 1.0), Operand::Subject);
        assert_eq!(
            compare_events_by_segments(&subject_early, &subject),
            Ordering::Less
        );
        assert_eq!(
            compare_events_by_segments(&subject, &subject_early),
            Ordering::Greater
        );

        let (vertical_a, _k3) = segment_events(4, (0.0, 0.0), (0.0, 1.0), Operand::Subject);
        let (vertical_b, _k4) = segment_events(5, (0.0, 0.0), (0.0, 2.0), Operand::Subject);
        assert_eq!(
            compare_events_by_segments(&vertical_a, &vertical_b),
            Ordering::Less
        );
        assert_eq!(
            compare_events_by_segments(&vertical_b, &vertical_a),
            Ordering::Greater
        );
    }
}
