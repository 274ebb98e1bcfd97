// Shared rule fixtures for the xwfc-core integration tests.
#![allow(dead_code)]

use xwfc_core::grid::{EAST, GRID_DUALS, NORTH, SOUTH, WEST};
use xwfc_core::{ConnectionType, EntanglementRules, PureState};

pub const N: usize = 1;
pub const E: usize = 2;
pub const S: usize = 4;
pub const W: usize = 8;

/// 16 modules, one per subset of {N, E, S, W} connectors. Two cells fit
/// when the connectors on their shared side agree.
#[derive(Debug)]
pub struct EdgeMaskRules;

impl EntanglementRules for EdgeMaskRules {
    fn allows(&self, x: PureState, connection_type: ConnectionType, y: PureState) -> bool {
        let (mine, theirs) = match connection_type {
            NORTH => (N, S),
            SOUTH => (S, N),
            EAST => (E, W),
            WEST => (W, E),
            _ => return false,
        };
        (x.0 & mine != 0) == (y.0 & theirs != 0)
    }

    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType {
        GRID_DUALS[connection_type]
    }

    fn dimension_in_exclusion_class(&self, _exclusion_class: usize) -> usize {
        16
    }

    fn connection_type_count(&self) -> usize {
        4
    }

    fn exclusion_class_count(&self) -> usize {
        1
    }
}

/// Graph coloring: neighbors must differ.
#[derive(Debug)]
pub struct ColoringRules {
    pub colors: usize,
}

impl EntanglementRules for ColoringRules {
    fn allows(&self, x: PureState, _connection_type: ConnectionType, y: PureState) -> bool {
        x != y
    }

    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType {
        GRID_DUALS[connection_type]
    }

    fn dimension_in_exclusion_class(&self, _exclusion_class: usize) -> usize {
        self.colors
    }

    fn connection_type_count(&self) -> usize {
        4
    }

    fn exclusion_class_count(&self) -> usize {
        1
    }
}

/// Two classes (3 and 2 states, stride 3). Neighbors must share the parity
/// of their offset within their class.
#[derive(Debug)]
pub struct ParityRules;

pub const PARITY_GLOBAL: usize = 3;

impl EntanglementRules for ParityRules {
    fn allows(&self, x: PureState, _connection_type: ConnectionType, y: PureState) -> bool {
        (x.0 % PARITY_GLOBAL) % 2 == (y.0 % PARITY_GLOBAL) % 2
    }

    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType {
        GRID_DUALS[connection_type]
    }

    fn dimension_in_exclusion_class(&self, exclusion_class: usize) -> usize {
        if exclusion_class == 0 {
            3
        } else {
            2
        }
    }

    fn connection_type_count(&self) -> usize {
        4
    }

    fn exclusion_class_count(&self) -> usize {
        2
    }
}
