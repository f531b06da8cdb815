// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Building the connectivity graph of a voltage level.
//!
//! Vertices are the nodes or configured buses of the voltage level, tagged
//! with the terminals attached to them.  Edges are the switches, open or
//! closed, and the internal connections.  Which edges merge their endpoints
//! into one calculated bus depends on the requested [`TopologyView`].

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::{
    equipment_kind::KindPredicates, ConnectionPoint, Error, TerminalRef, TopologyKind,
    TopologyView,
};

use super::Network;

/// A node or bus of the connectivity graph.
#[derive(Clone, Debug)]
pub(crate) struct Vertex {
    pub(crate) point: ConnectionPoint,
    pub(crate) terminals: Vec<TerminalRef>,
    pub(crate) busbar_section_count: usize,
    pub(crate) branch_count: usize,
}

/// A switch or an internal connection of the connectivity graph.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TopologyEdge {
    Switch {
        id: String,
        open: bool,
        retained: bool,
    },
    InternalConnection(usize),
}

impl TopologyEdge {
    pub(crate) fn switch_id(&self) -> Option<&str> {
        match self {
            TopologyEdge::Switch { id, .. } => Some(id.as_str()),
            TopologyEdge::InternalConnection(_) => None,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        match self {
            TopologyEdge::Switch { open, .. } => !open,
            TopologyEdge::InternalConnection(_) => true,
        }
    }

    /// Orders switches by id, and after them internal connections in the
    /// order they were added.
    pub(crate) fn sort_key(&self) -> (u8, &str, usize) {
        match self {
            TopologyEdge::Switch { id, .. } => (0, id.as_str(), 0),
            TopologyEdge::InternalConnection(position) => (1, "", *position),
        }
    }
}

/// The connectivity graph of one voltage level, for one view.
pub(crate) struct ConnectivityGraph {
    pub(crate) voltage_level_id: String,
    pub(crate) topology_kind: TopologyKind,
    pub(crate) view: TopologyView,
    pub(crate) graph: UnGraph<Vertex, TopologyEdge>,
    pub(crate) indices: HashMap<ConnectionPoint, NodeIndex>,
}

impl ConnectivityGraph {
    /// Returns true if the given edge merges its endpoints into one
    /// calculated bus, in the view the graph was built for.
    ///
    /// Open switches never merge.  In the bus-breaker view of a node-breaker
    /// voltage level, closed retained switches don't merge either.
    pub(crate) fn merges(&self, edge: &TopologyEdge) -> bool {
        match edge {
            TopologyEdge::InternalConnection(_) => true,
            TopologyEdge::Switch { open: true, .. } => false,
            TopologyEdge::Switch { retained, .. } => {
                !(*retained
                    && self.topology_kind == TopologyKind::NodeBreaker
                    && self.view == TopologyView::BusBreaker)
            }
        }
    }

    pub(crate) fn vertex_index(&self, point: &ConnectionPoint) -> Result<NodeIndex, Error> {
        self.indices.get(point).copied().ok_or_else(|| {
            Error::connection_point_not_found(format!(
                "{} has no {}.",
                self.voltage_level_id, point
            ))
        })
    }

    /// Returns the edges incident to the given vertex, each with the vertex on
    /// its other end, sorted by [`TopologyEdge::sort_key`].
    pub(crate) fn sorted_edges(
        &self,
        vertex: NodeIndex,
    ) -> Vec<(EdgeIndex, NodeIndex, &TopologyEdge)> {
        let mut edges = self
            .graph
            .edges(vertex)
            .map(|e| {
                let other = if e.source() == vertex {
                    e.target()
                } else {
                    e.source()
                };
                (e.id(), other, e.weight())
            })
            .collect::<Vec<_>>();
        edges.sort_by(|a, b| a.2.sort_key().cmp(&b.2.sort_key()));
        edges
    }
}

impl Network {
    /// Builds the connectivity graph of the given voltage level.
    ///
    /// Vertices are added in ascending order of their nodes or buses, so
    /// vertex indices follow that order.
    pub(crate) fn build_connectivity_graph(
        &self,
        voltage_level_id: &str,
        view: TopologyView,
    ) -> Result<ConnectivityGraph, Error> {
        let voltage_level = self.voltage_level(voltage_level_id)?;
        let mut graph = UnGraph::new_undirected();
        let mut indices = HashMap::new();

        for point in voltage_level.points() {
            let index = graph.add_node(Vertex {
                point: point.clone(),
                terminals: vec![],
                busbar_section_count: 0,
                branch_count: 0,
            });
            indices.insert(point.clone(), index);
        }

        let mut cg = ConnectivityGraph {
            voltage_level_id: voltage_level_id.to_string(),
            topology_kind: voltage_level.topology_kind(),
            view,
            graph,
            indices,
        };

        for switch in self.switches(voltage_level_id)? {
            let (point1, point2) = switch.endpoints();
            let a = cg.vertex_index(point1)?;
            let b = cg.vertex_index(point2)?;
            cg.graph.add_edge(
                a,
                b,
                TopologyEdge::Switch {
                    id: switch.id().to_string(),
                    open: switch.is_open(),
                    retained: switch.is_retained(),
                },
            );
        }

        for (position, &(node1, node2)) in voltage_level.internal_connections().iter().enumerate() {
            let a = cg.vertex_index(&ConnectionPoint::Node(node1))?;
            let b = cg.vertex_index(&ConnectionPoint::Node(node2))?;
            cg.graph
                .add_edge(a, b, TopologyEdge::InternalConnection(position));
        }

        for terminal_ref in voltage_level.terminals() {
            let equipment = self.equipment(&terminal_ref.equipment_id)?;
            // Detached bus-breaker terminals don't belong to any vertex.
            let Some(point) = self.terminal(terminal_ref)?.point() else {
                continue;
            };
            let index = cg.vertex_index(&point)?;
            let vertex = &mut cg.graph[index];
            vertex.terminals.push(terminal_ref.clone());
            if equipment.is_busbar_section() {
                vertex.busbar_section_count += 1;
            }
            if equipment.is_branch() {
                vertex.branch_count += 1;
            }
        }

        Ok(cg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_utils::{scenario_vl1, NetworkBuilder};

    #[test]
    fn test_vertices_and_edges() -> Result<(), Error> {
        let network = scenario_vl1()?;
        let cg = network.build_connectivity_graph("VL1", TopologyView::Bus)?;

        assert_eq!(cg.graph.node_count(), 3);
        assert_eq!(cg.graph.edge_count(), 2);

        let bbs = &cg.graph[cg.vertex_index(&ConnectionPoint::Node(0))?];
        assert_eq!(bbs.busbar_section_count, 1);
        assert_eq!(bbs.terminals, vec![TerminalRef::new("BBS1", crate::Side::One)]);

        let load = &cg.graph[cg.vertex_index(&ConnectionPoint::Node(2))?];
        assert_eq!(load.busbar_section_count, 0);
        assert_eq!(load.terminals, vec![TerminalRef::new("LD1", crate::Side::One)]);

        assert!(cg
            .vertex_index(&ConnectionPoint::Node(3))
            .is_err_and(|e| e == Error::connection_point_not_found("VL1 has no node 3.")));

        let node1 = cg.vertex_index(&ConnectionPoint::Node(1))?;
        let edges = cg.sorted_edges(node1);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].2.switch_id(), Some("SW1"));
        assert!(!edges[0].2.is_closed());
        assert_eq!(edges[1].2, &TopologyEdge::InternalConnection(0));
        assert_eq!(edges[1].1, cg.vertex_index(&ConnectionPoint::Node(0))?);

        Ok(())
    }

    #[test]
    fn test_retained_switches_per_view() -> Result<(), Error> {
        let network = NetworkBuilder::new()
            .node_breaker_level("VL", [0, 1])
            .retained_breaker("COUPLER", "VL", 0, 1, false)
            .build()?;

        let edge = TopologyEdge::Switch {
            id: "COUPLER".to_string(),
            open: false,
            retained: true,
        };
        let bus_breaker = network.build_connectivity_graph("VL", TopologyView::BusBreaker)?;
        assert!(!bus_breaker.merges(&edge));
        let bus = network.build_connectivity_graph("VL", TopologyView::Bus)?;
        assert!(bus.merges(&edge));

        let open = TopologyEdge::Switch {
            id: "COUPLER".to_string(),
            open: true,
            retained: false,
        };
        assert!(!bus.merges(&open));
        assert!(bus.merges(&TopologyEdge::InternalConnection(0)));

        Ok(())
    }

    #[test]
    fn test_detached_terminals() -> Result<(), Error> {
        let mut network = NetworkBuilder::new()
            .bus_breaker_level("VL", &["B1"])
            .bus_load("LD", "VL", "B1")
            .build()?;

        let cg = network.build_connectivity_graph("VL", TopologyView::Bus)?;
        assert_eq!(cg.graph[cg.vertex_index(&ConnectionPoint::bus("B1"))?].terminals.len(), 1);

        network.disconnect("LD", |_| true, None)?;
        let cg = network.build_connectivity_graph("VL", TopologyView::Bus)?;
        assert!(cg.graph[cg.vertex_index(&ConnectionPoint::bus("B1"))?]
            .terminals
            .is_empty());

        Ok(())
    }
}
