// SPDX-License-Identifier: MIT OR Apache-2.0
//! Placement of newly created nodes.
//!
//! Pure functions over anchor positions. Nodes placed by one call never
//! overlap each other; pre-existing nodes are not avoided.

use texprep_graph::Position;

/// Horizontal distance between pipeline stages of a replica row
pub const STAGE_SPACING: f32 = 200.0;
/// Horizontal distance from the replication anchor to the first stage
pub const REPLICA_OFFSET: f32 = 400.0;
/// Vertical distance between replica rows
pub const ROW_SPACING: f32 = 200.0;
/// Horizontal shift used around the displacement chain and adapters
pub const DISPLACEMENT_OFFSET: f32 = 150.0;
/// Horizontal distance from a bitmap to its exposed output
pub const MAP_OUTPUT_OFFSET: f32 = 200.0;
/// Displacement anchor when no obsolete height output was found
pub const DEFAULT_ANCHOR: Position = Position::new(100.0, 100.0);

/// Positions of one replicated row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplicaRow {
    /// Constant color node
    pub constant: Position,
    /// Match node
    pub matcher: Position,
    /// Output sink
    pub sink: Position,
}

/// Rows for `count` replicas, vertically centered on the anchor
pub fn replica_rows(anchor: Position, count: usize) -> Vec<ReplicaRow> {
    let top = anchor.y - (count.saturating_sub(1) as f32 * ROW_SPACING) / 2.0;
    (0..count)
        .map(|i| {
            let y = top + ROW_SPACING * i as f32;
            let x = anchor.x + REPLICA_OFFSET;
            ReplicaRow {
                constant: Position::new(x, y),
                matcher: Position::new(x + STAGE_SPACING, y),
                sink: Position::new(x + 2.0 * STAGE_SPACING, y),
            }
        })
        .collect()
}

/// Positions for the displacement chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementLayout {
    /// New displacement output
    pub displacement: Position,
    /// Normal to height node
    pub normal_to_height: Position,
    /// Normal intensity node
    pub normal_intensity: Position,
    /// Where the existing normal output moves
    pub normal_output: Position,
}

/// Lay out the displacement chain around the old height position and the normal output
pub fn displacement_layout(height_anchor: Position, normal_output: Position, producer: Position) -> DisplacementLayout {
    DisplacementLayout {
        displacement: height_anchor,
        normal_to_height: height_anchor.offset(-DISPLACEMENT_OFFSET, 0.0),
        normal_intensity: normal_output,
        normal_output: Position::new(normal_output.x + DISPLACEMENT_OFFSET, producer.y),
    }
}

/// Position of an adapter feeding a replacement placed at `replacement`
pub fn adapter_position(replacement: Position) -> Position {
    replacement.offset(-DISPLACEMENT_OFFSET, 0.0)
}

/// A position `dx` to the right
pub fn beside(position: Position, dx: f32) -> Position {
    position.offset(dx, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_rows_centered_on_anchor() {
        let rows = replica_rows(Position::new(0.0, 0.0), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].constant, Position::new(400.0, -100.0));
        assert_eq!(rows[0].matcher, Position::new(600.0, -100.0));
        assert_eq!(rows[0].sink, Position::new(800.0, -100.0));
        assert_eq!(rows[1].sink, Position::new(800.0, 100.0));
    }

    #[test]
    fn test_rows_do_not_overlap() {
        let rows = replica_rows(Position::new(50.0, 30.0), 5);
        let all: Vec<Position> = rows.iter().flat_map(|r| [r.constant, r.matcher, r.sink]).collect();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(rows[2].constant.y, 30.0);
        assert!(replica_rows(Position::default(), 0).is_empty());
    }

    #[test]
    fn test_displacement_layout() {
        let layout = displacement_layout(
            Position::new(100.0, 300.0),
            Position::new(600.0, 500.0),
            Position::new(400.0, 480.0),
        );
        assert_eq!(layout.displacement, Position::new(100.0, 300.0));
        assert_eq!(layout.normal_to_height, Position::new(-50.0, 300.0));
        assert_eq!(layout.normal_intensity, Position::new(600.0, 500.0));
        assert_eq!(layout.normal_output, Position::new(750.0, 480.0));
    }
}
