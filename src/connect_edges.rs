// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Reconstruction of the output polygons from the selected sweep edges.
//!
//! Events at the same point are neighbours in the sorted event list and
//! appear in angular order there, so contours can be followed without
//! geometric searches: start at some left event, go to its paired right
//! event and continue with the next unused event at that point.
//! Hole/shell classification uses the `below_in_result` links recorded
//! during the sweep: a contour whose closest contributing edge below was
//! traversed left to right lies inside that edge's contour.

use super::sweep_event::SweepEvent;
use iron_shapes::edge::{Edge, Side};
use iron_shapes::point::Point;
use iron_shapes::polygon::{Polygon, SimplePolygon};
use iron_shapes::CoordinateType;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct GraphEvent<T: CoordinateType> {
    /// Where the paired event sits in the same list.
    other_index: usize,
    /// Index of the closest contributing edge below, if any.
    below_index: Option<usize>,
    /// The endpoint this event stands for.
    p: Point<T>,
    /// Whether `p` is the lexicographically smaller endpoint.
    is_left_event: bool,
    /// Was the edge traversed from right to left when its contour was
    /// assembled? Only meaningful on left events.
    result_in_out: bool,
    /// Id of the contour the edge was assigned to. Only meaningful on
    /// left events.
    contour_id: Option<usize>,
}

/// For each event compute the index of the next event to follow when
/// walking a contour through the event's point: within a cluster of
/// events sharing a point, right events chain upwards, left events chain
/// downwards, and the two chains are connected into one cycle.
fn events_to_connectivity<T: CoordinateType>(events: &[GraphEvent<T>]) -> Vec<usize> {
    let n = events.len();
    let mut result = vec![0; n];
    let mut index = 0;
    while index < n {
        let current = events[index].p;
        let right_start = index;
        while index < n && events[index].p == current && !events[index].is_left_event {
            index += 1;
        }
        let left_start = index;
        while index < n && events[index].p == current {
            index += 1;
        }
        let left_stop = index;

        let has_right = left_start > right_start;
        let has_left = left_stop > left_start;

        if has_right {
            let right_stop = left_start - 1;
            for i in right_start..right_stop {
                result[i] = i + 1;
            }
            result[right_stop] = if has_left { left_stop - 1 } else { right_start };
        }
        if has_left {
            result[left_start] = if has_right { right_start } else { left_stop - 1 };
            for i in left_start + 1..left_stop {
                result[i] = i - 1;
            }
        }
    }
    result
}

/// Next unused event in the connectivity cycle through `position`, if any.
fn to_next_position(position: usize, processed: &[bool], connectivity: &[usize]) -> Option<usize> {
    let mut candidate = position;
    loop {
        candidate = connectivity[candidate];
        if !processed[candidate] {
            return Some(candidate);
        }
        if candidate == position {
            return None;
        }
    }
}

/// Walk one closed contour starting at `start_index`, marking the
/// traversed events and recording traversal direction and contour id on
/// their left events.
fn events_to_contour<T: CoordinateType>(
    events: &mut [GraphEvent<T>],
    start_index: usize,
    contour_id: usize,
    connectivity: &[usize],
    processed: &mut [bool],
) -> Vec<Point<T>> {
    debug_assert!(events[start_index].is_left_event);

    let contour_start = events[start_index].p;
    let mut contour = vec![contour_start];
    let mut contour_event_indices = vec![start_index];
    let mut cursor = start_index;
    let mut complement_position = events[start_index].other_index;

    loop {
        let vertex = events[events[cursor].other_index].p;
        if vertex == contour_start {
            break;
        }

        // A revisited vertex closes a degenerate loop; drop it.
        if let Some(previous_position) = contour.iter().position(|v| *v == vertex) {
            contour.truncate(previous_position);
            contour_event_indices.truncate(previous_position);
        }
        contour.push(vertex);

        match to_next_position(complement_position, processed, connectivity) {
            Some(position) => {
                cursor = position;
                contour_event_indices.push(position);
                complement_position = events[position].other_index;
            }
            None => break,
        }
    }

    for &index in &contour_event_indices {
        let other_index = events[index].other_index;
        processed[index] = true;
        processed[other_index] = true;
        if events[index].is_left_event {
            // Edge traversed from left to right.
            events[index].result_in_out = false;
            events[index].contour_id = Some(contour_id);
        } else {
            events[other_index].result_in_out = true;
            events[other_index].contour_id = Some(contour_id);
        }
    }

    contour
}

/// Classify a freshly discovered contour relative to the already known
/// ones: push its depth, parent and hole attribution.
fn compute_relations<T: CoordinateType>(
    events: &[GraphEvent<T>],
    below_index: Option<usize>,
    contour_id: usize,
    are_internal: &mut Vec<bool>,
    depths: &mut Vec<usize>,
    holes: &mut Vec<Vec<usize>>,
    parents: &mut Vec<Option<usize>>,
) {
    let mut depth = 0;
    let mut parent = None;
    let mut is_internal = false;

    if let Some(below_index) = below_index {
        let below_event = &events[below_index];
        if let Some(below_contour_id) = below_event.contour_id {
            if !below_event.result_in_out {
                // The edge below bounds its contour from below: the new
                // contour lies inside it.
                holes[below_contour_id].push(contour_id);
                parent = Some(below_contour_id);
                depth = depths[below_contour_id] + 1;
                is_internal = true;
            } else if are_internal[below_contour_id] {
                // Next to a nested contour: same nesting level, same parent.
                let below_parent_id = parents[below_contour_id].unwrap();
                holes[below_parent_id].push(contour_id);
                parent = Some(below_parent_id);
                depth = depths[below_contour_id];
                is_internal = true;
            }
        }
    }

    holes.push(Vec::new());
    parents.push(parent);
    depths.push(depth);
    are_internal.push(is_internal);
}

/// Remove vertices whose adjacent edges are collinear. Subdivision points
/// of the sweep are not corners of the output geometry.
fn shrink_collinear_vertices<T: CoordinateType>(contour: &mut Vec<Point<T>>) {
    loop {
        let mut removed_any = false;
        let mut index = 0;
        while contour.len() > 2 && index < contour.len() {
            let len = contour.len();
            let prev = contour[(index + len - 1) % len];
            let next = contour[(index + 1) % len];
            if Edge::new(prev, contour[index]).side_of(next) == Side::Center {
                contour.remove(index);
                removed_any = true;
            } else {
                index += 1;
            }
        }
        if !removed_any {
            break;
        }
    }
}

/// Rotate the contour such that it starts at its lexicographically
/// smallest vertex.
fn rotate_to_smallest_vertex<T: CoordinateType>(contour: &mut Vec<Point<T>>) {
    let min_index = contour
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(index, _)| index);
    if let Some(min_index) = min_index {
        contour.rotate_left(min_index);
    }
}

/// Reassemble the contributing edges left over from a sweep into
/// polygons with holes.
///
/// Shells are emitted counter-clockwise and holes clockwise; polygons are
/// ordered by the smallest vertex of their shell and every contour starts
/// at its smallest vertex.
pub fn connect_edges<T>(sorted_events: &[Rc<SweepEvent<T>>]) -> Vec<Polygon<T>>
where
    T: CoordinateType,
{
    // Keep the event pairs of the edges selected for the result.
    let mut result_events: Vec<_> = sorted_events
        .iter()
        .filter(|event| {
            if event.is_left_event() {
                event.is_in_result()
            } else {
                event
                    .get_other_event()
                    .map(|other| other.is_in_result())
                    .unwrap_or(false)
            }
        })
        .cloned()
        .collect();

    // Restore the strict processing order.
    result_events.sort_by(|a, b| b.cmp(a));

    debug_assert!(
        result_events.windows(2).all(|w| w[0].p <= w[1].p),
        "Selected events must stay in point order."
    );
    debug_assert!(
        result_events.len() % 2 == 0,
        "Selected events come in pairs."
    );

    // Record each event's index so the pair and below links can be
    // resolved to indices.
    for (pos, event) in result_events.iter().enumerate() {
        event.set_pos(pos);
    }

    // Mirror the events into plain records for the walk.
    let mut events: Vec<_> = result_events
        .iter()
        .map(|event| GraphEvent {
            other_index: event.get_other_event().unwrap().get_pos(),
            below_index: event
                .get_below_in_result()
                .upgrade()
                .filter(|below| below.is_in_result())
                .map(|below| below.get_pos()),
            p: event.p,
            is_left_event: event.is_left_event(),
            result_in_out: false,
            contour_id: None,
        })
        .collect();

    let connectivity = events_to_connectivity(&events);

    let mut processed = vec![false; events.len()];
    let mut contours: Vec<Vec<Point<T>>> = Vec::new();
    let mut are_internal = Vec::new();
    let mut depths = Vec::new();
    let mut holes: Vec<Vec<usize>> = Vec::new();
    let mut parents = Vec::new();

    for index in 0..events.len() {
        if processed[index] {
            continue;
        }

        let contour_id = contours.len();
        compute_relations(
            &events,
            events[index].below_index,
            contour_id,
            &mut are_internal,
            &mut depths,
            &mut holes,
            &mut parents,
        );

        let mut contour = events_to_contour(
            &mut events,
            index,
            contour_id,
            &connectivity,
            &mut processed,
        );
        shrink_collinear_vertices(&mut contour);
        if depths[contour_id] % 2 == 1 {
            // Holes are oriented clockwise.
            contour.reverse();
        }
        rotate_to_smallest_vertex(&mut contour);
        contours.push(contour);
    }

    // Assemble polygons: contours at even depth are shells carrying their
    // direct children as holes; a shell nested inside a hole becomes a
    // polygon of its own.
    let mut polygons = Vec::new();
    for (index, contour) in contours.iter().enumerate() {
        if depths[index] % 2 != 0 || contour.len() < 3 {
            continue;
        }
        let mut polygon = Polygon::new(contour.clone());
        for &hole_index in &holes[index] {
            if contours[hole_index].len() >= 3 {
                polygon
                    .interiors
                    .push(SimplePolygon::new(contours[hole_index].clone()));
            }
        }
        polygons.push(polygon);
    }

    polygons
}

#[cfg(test)]
mod test {
    use super::*;

    fn graph_event(p: (i32, i32), is_left_event: bool, other_index: usize) -> GraphEvent<i32> {
        GraphEvent {
            other_index,
            below_index: None,
            p: p.into(),
            is_left_event,
            result_in_out: false,
            contour_id: None,
        }
    }

    #[test]
    fn test_connectivity_single_point_cluster() {
        // Two right events followed by two left events at the same point.
        let events = vec![
            graph_event((0, 0), false, 4),
            graph_event((0, 0), false, 5),
            graph_event((0, 0), true, 6),
            graph_event((0, 0), true, 7),
        ];
        let connectivity = events_to_connectivity(&events);
        // Rights chain upwards, the last right jumps to the last left,
        // the first left jumps back to the first right, lefts chain
        // downwards.
        assert_eq!(connectivity, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_shrink_collinear_vertices() {
        let mut contour: Vec<Point<i32>> = vec![
            (0, 0).into(),
            (1, 0).into(),
            (2, 0).into(),
            (2, 2).into(),
            (0, 2).into(),
        ];
        shrink_collinear_vertices(&mut contour);
        let expected: Vec<Point<i32>> = vec![
            (0, 0).into(),
            (2, 0).into(),
            (2, 2).into(),
            (0, 2).into(),
        ];
        assert_eq!(contour, expected);
    }

    #[test]
    fn test_rotate_to_smallest_vertex() {
        let mut contour: Vec<Point<i32>> = vec![
            (2, 0).into(),
            (2, 2).into(),
            (0, 2).into(),
            (0, 0).into(),
        ];
        rotate_to_smallest_vertex(&mut contour);
        let expected: Vec<Point<i32>> = vec![
            (0, 0).into(),
            (2, 0).into(),
            (2, 2).into(),
            (0, 2).into(),
        ];
        assert_eq!(contour, expected);
    }
}
