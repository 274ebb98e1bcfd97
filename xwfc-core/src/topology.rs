//! Interface to the graph collaborator that supplies variables and their relations.

use crate::rules::ConnectionType;
use std::fmt::Debug;
use std::hash::Hash;

/// One edge (or loop) incident to a vertex, as seen from that vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentEdge<V> {
    /// The endpoint at the other side. Equal to the queried vertex for loops.
    pub other: V,
    /// Type tag stored on the edge in its own orientation.
    pub connection_type: ConnectionType,
    /// True if the edge is stored oriented away from the queried vertex.
    /// Incoming edges are traversed with the dual connection type.
    pub outgoing: bool,
}

/// Attributed graph the solver runs over.
///
/// Enumeration orders must be stable between calls: vertex order defines the
/// wave variable ids, edge order defines propagation order.
pub trait Topology {
    /// Vertex handle of the underlying graph.
    type Vertex: Copy + Eq + Hash + Debug;

    /// All vertices in a stable order.
    fn vertices(&self) -> Vec<Self::Vertex>;

    /// Reads an optional integer attribute of `vertex`.
    fn int_attribute(&self, vertex: Self::Vertex, name: &str) -> Option<i64>;

    /// Edges and loops incident to `vertex`, in a stable order.
    fn incident_edges(&self, vertex: Self::Vertex) -> Vec<IncidentEdge<Self::Vertex>>;
}
