// xwfc-core/tests/system_tests.rs
mod common;

use common::ParityRules;
use mockall::mock;
use xwfc_core::propagator::{propagate, PropagationError};
use xwfc_core::system::Connection;
use xwfc_core::{
    IncidentEdge, PureState, SuperposedState, Topology, WaveFunctionSystem, WaveVariable,
    WfcError,
};

mock! {
    pub Graph {}

    impl Topology for Graph {
        type Vertex = u32;

        fn vertices(&self) -> Vec<u32>;
        fn int_attribute(&self, vertex: u32, name: &str) -> Option<i64>;
        fn incident_edges(&self, vertex: u32) -> Vec<IncidentEdge<u32>>;
    }
}

fn edge(other: u32, connection_type: usize, outgoing: bool) -> IncidentEdge<u32> {
    IncidentEdge {
        other,
        connection_type,
        outgoing,
    }
}

/// Two vertices (10 and 20) joined by one NORTH edge owned by 10, plus a
/// dangling edge from 10 to a vertex the graph never reports.
fn two_vertex_graph(class_of_20: Option<i64>) -> MockGraph {
    let mut graph = MockGraph::new();
    graph.expect_vertices().returning(|| vec![10, 20]);
    graph.expect_incident_edges().returning(|vertex| match vertex {
        10 => vec![edge(20, 0, true), edge(99, 0, true)],
        20 => vec![edge(10, 0, false)],
        _ => Vec::new(),
    });
    graph
        .expect_int_attribute()
        .returning(move |vertex, name| match (vertex, name) {
            (20, "class") => class_of_20,
            _ => None,
        });
    graph
}

#[test]
fn test_connections_skip_dangling_edges_and_use_duals() {
    let system =
        WaveFunctionSystem::new(two_vertex_graph(None), ParityRules, 3, Some("class"), None)
            .unwrap();
    let first = system.variable_of(10).unwrap();
    let second = system.variable_of(20).unwrap();
    assert_eq!(system.vertex(second), Some(20));

    assert_eq!(
        system.outgoing_connections(first),
        &[Connection {
            destination: second,
            connection_type: 0
        }]
    );
    // Incoming NORTH is traversed as SOUTH.
    assert_eq!(
        system.outgoing_connections(second),
        &[Connection {
            destination: first,
            connection_type: 1
        }]
    );
    assert!(system.outgoing_connections(WaveVariable(7)).is_empty());
}

#[test]
fn test_exclusion_class_attribute() {
    let system =
        WaveFunctionSystem::new(two_vertex_graph(Some(1)), ParityRules, 3, Some("class"), None)
            .unwrap();
    let wave = system.wave(system.variable_of(20).unwrap()).unwrap();
    assert_eq!(wave.exclusion_class(), 1);
    assert_eq!(wave.components(), vec![PureState(3), PureState(4)]);

    let other = system.wave(system.variable_of(10).unwrap()).unwrap();
    assert_eq!(other.components().len(), 3);
}

#[test]
fn test_negative_exclusion_class_is_rejected() {
    let result =
        WaveFunctionSystem::new(two_vertex_graph(Some(-2)), ParityRules, 3, Some("class"), None);
    assert!(matches!(
        result,
        Err(WfcError::NegativeExclusionClass { class: -2, .. })
    ));
}

#[test]
fn test_class_without_states_is_rejected() {
    // A global dimension of 1 cannot hold any class of these rules.
    let result =
        WaveFunctionSystem::new(two_vertex_graph(Some(5)), ParityRules, 1, Some("class"), None);
    assert!(matches!(
        result,
        Err(WfcError::InvalidExclusionClass { .. })
    ));
}

#[test]
fn test_propagation_narrows_and_detects_contradiction() {
    let mut system =
        WaveFunctionSystem::new(two_vertex_graph(None), ParityRules, 3, Some("class"), None)
            .unwrap();
    let first = system.variable_of(10).unwrap();
    let second = system.variable_of(20).unwrap();

    let mut odd = SuperposedState::none(3, 3, 0).unwrap();
    odd.add(PureState(1));
    system.set_wave(first, odd).unwrap();
    propagate(&mut system, first).unwrap();
    assert_eq!(
        system.wave(second).unwrap().components(),
        vec![PureState(1)]
    );

    let mut even = SuperposedState::none(3, 3, 0).unwrap();
    even.add(PureState(2));
    system.set_wave(first, even).unwrap();
    assert_eq!(
        propagate(&mut system, first),
        Err(PropagationError::Contradiction(second))
    );
    assert!(system.wave(second).unwrap().is_empty());
}

#[test]
fn test_snapshot_restore_and_reset() {
    let mut system =
        WaveFunctionSystem::new(two_vertex_graph(None), ParityRules, 3, Some("class"), None)
            .unwrap();
    let snapshot = system.snapshot();
    let first = system.variable_of(10).unwrap();
    let empty = system.wave(first).unwrap().empty_like();
    system.set_wave(first, empty).unwrap();
    assert_ne!(system.snapshot(), snapshot);

    system.restore(snapshot.clone()).unwrap();
    assert_eq!(system.snapshot(), snapshot);
    assert!(matches!(
        system.restore(Vec::new()),
        Err(WfcError::SnapshotMismatch {
            expected: 2,
            found: 0
        })
    ));

    system.set_wave(first, system.wave(first).unwrap().empty_like()).unwrap();
    system.reset().unwrap();
    assert_eq!(system.snapshot(), snapshot);
    assert!(matches!(
        system.set_wave(WaveVariable(5), snapshot[0].clone()),
        Err(WfcError::UnknownVariable(WaveVariable(5)))
    ));
}
