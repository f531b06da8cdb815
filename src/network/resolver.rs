// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Partitioning a connectivity graph into calculated buses.

use std::collections::{BTreeMap, HashMap};

use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::{ConnectionPoint, TerminalRef, TopologyView};

use super::graph_builder::ConnectivityGraph;

/// A maximal set of nodes or buses of a voltage level that are connected in
/// one [`TopologyView`].
///
/// Calculated buses are recreated every time the topology of their voltage
/// level is recalculated, and are never updated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct CalculatedBus {
    id: String,
    voltage_level_id: String,
    view: TopologyView,
    index: usize,
    points: Vec<ConnectionPoint>,
    terminals: Vec<TerminalRef>,
    busbar_section_count: usize,
    branch_count: usize,
}

impl CalculatedBus {
    /// Returns the id of the bus, `<voltage level id>_<index>`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn voltage_level_id(&self) -> &str {
        &self.voltage_level_id
    }

    pub fn view(&self) -> TopologyView {
        self.view
    }

    /// Returns the 0-based index of the bus, unique within its voltage level
    /// and view.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the nodes or buses of the calculated bus, in ascending order.
    pub fn points(&self) -> &[ConnectionPoint] {
        &self.points
    }

    /// Returns the terminals attached to the calculated bus.
    pub fn terminals(&self) -> &[TerminalRef] {
        &self.terminals
    }

    pub fn has_busbar_section(&self) -> bool {
        self.busbar_section_count > 0
    }

    pub fn branch_count(&self) -> usize {
        self.branch_count
    }
}

/// The calculated buses of one voltage level in one view, and the bus each
/// node or configured bus belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    voltage_level_id: String,
    view: TopologyView,
    buses: Vec<CalculatedBus>,
    bus_by_point: BTreeMap<ConnectionPoint, usize>,
}

impl Partition {
    pub fn voltage_level_id(&self) -> &str {
        &self.voltage_level_id
    }

    pub fn view(&self) -> TopologyView {
        self.view
    }

    /// Returns the calculated buses, ordered by index.
    pub fn buses(&self) -> &[CalculatedBus] {
        &self.buses
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    pub fn bus(&self, index: usize) -> Option<&CalculatedBus> {
        self.buses.get(index)
    }

    /// Returns the index of the calculated bus containing the given node or
    /// bus.
    ///
    /// Returns `None` if the point doesn't exist, or belongs to a hidden bus.
    pub fn bus_index(&self, point: &ConnectionPoint) -> Option<usize> {
        self.bus_by_point.get(point).copied()
    }

    /// Returns the calculated bus containing the given node or bus.
    pub fn bus_for_point(&self, point: &ConnectionPoint) -> Option<&CalculatedBus> {
        self.bus_index(point).and_then(|index| self.buses.get(index))
    }

    /// Returns the mapping from nodes or buses to bus indices.
    pub fn bus_indices(&self) -> impl Iterator<Item = (&ConnectionPoint, usize)> {
        self.bus_by_point.iter().map(|(point, index)| (point, *index))
    }
}

/// Partitions the given graph into calculated buses.
///
/// The endpoints of every edge that merges in the graph's view are united;
/// every resulting set is a calculated bus, even a single node with nothing
/// attached.  Buses are indexed by ascending smallest member.
///
/// When `hide_branchless` is set, bus-breaker view buses without any branch
/// terminal are left out.
pub(crate) fn resolve(cg: &ConnectivityGraph, hide_branchless: bool) -> Partition {
    let graph = &cg.graph;
    let mut union_find = UnionFind::<usize>::new(graph.node_count());
    for edge in graph.edge_references() {
        if cg.merges(edge.weight()) {
            union_find.union(edge.source().index(), edge.target().index());
        }
    }

    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for vertex in graph.node_indices() {
        components
            .entry(union_find.find(vertex.index()))
            .or_default()
            .push(vertex.index());
    }

    let mut components = components
        .into_values()
        .map(|members| {
            let mut points = members
                .iter()
                .map(|&m| graph[petgraph::graph::NodeIndex::new(m)].point.clone())
                .collect::<Vec<_>>();
            points.sort();
            (points, members)
        })
        .collect::<Vec<_>>();
    components.sort_by(|a, b| a.0.first().cmp(&b.0.first()));

    let mut buses = vec![];
    let mut bus_by_point = BTreeMap::new();
    for (points, members) in components {
        let mut terminals = vec![];
        let mut busbar_section_count = 0;
        let mut branch_count = 0;
        for &member in &members {
            let vertex = &graph[petgraph::graph::NodeIndex::new(member)];
            terminals.extend(vertex.terminals.iter().cloned());
            busbar_section_count += vertex.busbar_section_count;
            branch_count += vertex.branch_count;
        }
        terminals.sort();

        if hide_branchless && cg.view == TopologyView::BusBreaker && branch_count == 0 {
            tracing::trace!(
                "Hiding branchless bus {:?} of {} in the {} view.",
                points,
                cg.voltage_level_id,
                cg.view
            );
            continue;
        }

        let index = buses.len();
        for point in &points {
            bus_by_point.insert(point.clone(), index);
        }
        buses.push(CalculatedBus {
            id: format!("{}_{}", cg.voltage_level_id, index),
            voltage_level_id: cg.voltage_level_id.clone(),
            view: cg.view,
            index,
            points,
            terminals,
            busbar_section_count,
            branch_count,
        });
    }

    Partition {
        voltage_level_id: cg.voltage_level_id.clone(),
        view: cg.view,
        buses,
        bus_by_point,
    }
}
