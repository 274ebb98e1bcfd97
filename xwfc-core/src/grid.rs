use crate::rules::ConnectionType;
use crate::topology::{IncidentEdge, Topology};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Edge towards increasing `y`.
pub const NORTH: ConnectionType = 0;
/// Edge towards decreasing `y`.
pub const SOUTH: ConnectionType = 1;
/// Edge towards increasing `x`.
pub const EAST: ConnectionType = 2;
/// Edge towards decreasing `x`.
pub const WEST: ConnectionType = 3;

/// Dual map of the four grid connection types.
pub const GRID_DUALS: [ConnectionType; 4] = [SOUTH, NORTH, WEST, EAST];

/// How the grid treats its outer border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BoundaryMode {
    /// Border cells simply have fewer neighbors.
    #[default]
    Clamped,
    /// Edges wrap around (toroidal topology).
    Periodic,
}

/// A 2D grid graph with named integer attributes per cell.
///
/// Each cell owns (at most) one `NORTH` edge to the cell above it and one
/// `EAST` edge to the cell on its right; the same edges are reported as
/// incoming to the other endpoint. Vertex ids are `y * width + x`.
#[derive(Debug, Clone)]
pub struct GridTopology {
    pub width: usize,
    pub height: usize,
    boundary_mode: BoundaryMode,
    attributes: HashMap<String, Vec<Option<i64>>>,
}

impl GridTopology {
    /// Creates a grid without any attributes.
    pub fn new(width: usize, height: usize, boundary_mode: BoundaryMode) -> Self {
        Self {
            width,
            height,
            boundary_mode,
            attributes: HashMap::new(),
        }
    }

    pub fn boundary_mode(&self) -> BoundaryMode {
        self.boundary_mode
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vertex id of `(x, y)`, or `None` if out of bounds.
    pub fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Coordinates of vertex `index`.
    pub fn coords_of(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.len()).then(|| (index % self.width, index / self.width))
    }

    /// Sets (or clears, with `None`) an attribute on one cell.
    ///
    /// Returns false if `index` is out of bounds.
    pub fn set_attribute(&mut self, name: &str, index: usize, value: Option<i64>) -> bool {
        if index >= self.len() {
            return false;
        }
        let len = self.len();
        let values = self
            .attributes
            .entry(name.to_owned())
            .or_insert_with(|| vec![None; len]);
        values[index] = value;
        true
    }

    /// Reads an attribute of one cell.
    pub fn attribute(&self, name: &str, index: usize) -> Option<i64> {
        self.attributes
            .get(name)
            .and_then(|values| values.get(index).copied().flatten())
    }

    fn north_of(&self, x: usize, y: usize) -> Option<usize> {
        match self.boundary_mode {
            BoundaryMode::Clamped => self.index_of(x, y + 1),
            BoundaryMode::Periodic => self.index_of(x, (y + 1) % self.height),
        }
    }

    fn south_of(&self, x: usize, y: usize) -> Option<usize> {
        match (self.boundary_mode, y) {
            (BoundaryMode::Clamped, 0) => None,
            (BoundaryMode::Periodic, 0) => self.index_of(x, self.height - 1),
            _ => self.index_of(x, y - 1),
        }
    }

    fn east_of(&self, x: usize, y: usize) -> Option<usize> {
        match self.boundary_mode {
            BoundaryMode::Clamped => self.index_of(x + 1, y),
            BoundaryMode::Periodic => self.index_of((x + 1) % self.width, y),
        }
    }

    fn west_of(&self, x: usize, y: usize) -> Option<usize> {
        match (self.boundary_mode, x) {
            (BoundaryMode::Clamped, 0) => None,
            (BoundaryMode::Periodic, 0) => self.index_of(self.width - 1, y),
            _ => self.index_of(x - 1, y),
        }
    }

    /// Cuts out the clamped square of cells within `radius` of `(center_x, center_y)`.
    ///
    /// Returns the sub-grid (with all attributes copied) and, for every cell
    /// of the sub-grid, the id of the cell it was taken from. Used to
    /// re-generate a small region after a local edit.
    pub fn neighborhood(
        &self,
        center_x: usize,
        center_y: usize,
        radius: usize,
    ) -> Option<(Self, Vec<usize>)> {
        self.index_of(center_x, center_y)?;
        let min_x = center_x.saturating_sub(radius);
        let min_y = center_y.saturating_sub(radius);
        let max_x = (center_x + radius).min(self.width - 1);
        let max_y = (center_y + radius).min(self.height - 1);

        let mut sub = Self::new(max_x - min_x + 1, max_y - min_y + 1, BoundaryMode::Clamped);
        let mut origin = Vec::with_capacity(sub.len());
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let source = y * self.width + x;
                let target = origin.len();
                for (name, values) in &self.attributes {
                    sub.set_attribute(name, target, values[source]);
                }
                origin.push(source);
            }
        }
        Some((sub, origin))
    }
}

impl Topology for GridTopology {
    type Vertex = usize;

    fn vertices(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }

    fn int_attribute(&self, vertex: usize, name: &str) -> Option<i64> {
        self.attribute(name, vertex)
    }

    fn incident_edges(&self, vertex: usize) -> Vec<IncidentEdge<usize>> {
        let Some((x, y)) = self.coords_of(vertex) else {
            return Vec::new();
        };
        let mut edges = Vec::with_capacity(4);
        // Owned edges first, then the ones owned by the south and west neighbors.
        if let Some(other) = self.north_of(x, y) {
            edges.push(IncidentEdge {
                other,
                connection_type: NORTH,
                outgoing: true,
            });
        }
        if let Some(other) = self.east_of(x, y) {
            edges.push(IncidentEdge {
                other,
                connection_type: EAST,
                outgoing: true,
            });
        }
        if let Some(other) = self.south_of(x, y) {
            edges.push(IncidentEdge {
                other,
                connection_type: NORTH,
                outgoing: false,
            });
        }
        if let Some(other) = self.west_of(x, y) {
            edges.push(IncidentEdge {
                other,
                connection_type: EAST,
                outgoing: false,
            });
        }
        edges
    }
}
