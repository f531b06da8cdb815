// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Connecting and disconnecting equipment by operating switches.
//!
//! Bus-breaker terminals are attached to or detached from their bus.
//! Node-breaker terminals are connected by closing the open switches on a
//! path to a busbar section, and disconnected by opening enough switches to
//! cut every path to a busbar section.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use crate::{Attachment, ConnectionPoint, Error, Side, Switch, TerminalRef, TopologyView};

use super::graph_builder::{ConnectivityGraph, TopologyEdge};
use super::mutation::Mutation;
use super::Network;

/// What it takes to bring one terminal into the requested state.
#[derive(Debug, PartialEq)]
enum Plan {
    AlreadyDone,
    Impossible,
    Apply(Vec<Mutation>),
}

/// Equipment connection.
impl Network {
    /// Connects the terminals of the given equipment.
    ///
    /// A node-breaker terminal is connected by closing the open switches on
    /// the shortest path from its node to a busbar section.  Only open
    /// switches accepted by `predicate` may be closed; closed switches and
    /// internal connections are always usable.
    ///
    /// When `side` is given, only that terminal is connected.
    ///
    /// Returns `true` if anything changed.  Returns `false`, without changing
    /// anything, if all selected terminals were already connected, or if any
    /// of them can't be connected.
    pub fn connect(
        &mut self,
        equipment_id: &str,
        predicate: impl Fn(&Switch) -> bool,
        side: Option<Side>,
    ) -> Result<bool, Error> {
        let mut plans = vec![];
        for terminal_ref in self.selected_terminals(equipment_id, side)? {
            plans.push((terminal_ref.clone(), self.plan_connect(&terminal_ref, &predicate)?));
        }
        self.execute("connect", plans)
    }

    /// Disconnects the terminals of the given equipment.
    ///
    /// A node-breaker terminal is disconnected by opening, on every path of
    /// closed switches and internal connections from its node to a busbar
    /// section, the closed switch nearest to the terminal that is accepted
    /// by `predicate`.
    ///
    /// When `side` is given, only that terminal is disconnected.
    ///
    /// Returns `true` if anything changed.  Returns `false`, without changing
    /// anything, if all selected terminals were already disconnected, or if
    /// any path of any of them has no switch accepted by `predicate`.
    pub fn disconnect(
        &mut self,
        equipment_id: &str,
        predicate: impl Fn(&Switch) -> bool,
        side: Option<Side>,
    ) -> Result<bool, Error> {
        let mut plans = vec![];
        for terminal_ref in self.selected_terminals(equipment_id, side)? {
            plans.push((
                terminal_ref.clone(),
                self.plan_disconnect(&terminal_ref, &predicate)?,
            ));
        }
        self.execute("disconnect", plans)
    }

    fn selected_terminals(
        &self,
        equipment_id: &str,
        side: Option<Side>,
    ) -> Result<Vec<TerminalRef>, Error> {
        let equipment = self.equipment(equipment_id)?;
        match side {
            Some(side) => {
                let terminal_ref = TerminalRef::new(equipment_id, side);
                self.terminal(&terminal_ref)?;
                Ok(vec![terminal_ref])
            }
            None => Ok(equipment.terminal_refs().collect()),
        }
    }

    fn execute(&mut self, action: &str, plans: Vec<(TerminalRef, Plan)>) -> Result<bool, Error> {
        let mut mutations = vec![];
        for (terminal_ref, plan) in plans {
            match plan {
                Plan::AlreadyDone => {}
                Plan::Impossible => {
                    tracing::warn!("Can't {} terminal {}.", action, terminal_ref);
                    return Ok(false);
                }
                Plan::Apply(planned) => {
                    for mutation in planned {
                        if !mutations.contains(&mutation) {
                            mutations.push(mutation);
                        }
                    }
                }
            }
        }

        if mutations.is_empty() {
            return Ok(false);
        }
        tracing::debug!("Applying {} changes to {}.", mutations.len(), action);
        self.apply_all(mutations)?;
        Ok(true)
    }

    fn plan_connect(
        &self,
        terminal_ref: &TerminalRef,
        predicate: &dyn Fn(&Switch) -> bool,
    ) -> Result<Plan, Error> {
        let terminal = self.terminal(terminal_ref)?;
        let node = match terminal.attachment() {
            Attachment::Bus {
                connected: true, ..
            } => return Ok(Plan::AlreadyDone),
            Attachment::Bus { .. } => {
                return Ok(Plan::Apply(vec![Mutation::SetTerminalConnected {
                    terminal: terminal_ref.clone(),
                    connected: true,
                }]))
            }
            Attachment::Node(node) => *node,
        };
        if self.is_terminal_connected(terminal_ref)? {
            return Ok(Plan::AlreadyDone);
        }

        let cg = self.build_connectivity_graph(terminal.voltage_level_id(), TopologyView::Bus)?;
        let start = cg.vertex_index(&ConnectionPoint::Node(node))?;
        let Some(path) = self.shortest_path_to_busbar(&cg, start, predicate)? else {
            return Ok(Plan::Impossible);
        };

        let mutations = path
            .into_iter()
            .filter(|edge| !edge.is_closed())
            .filter_map(TopologyEdge::switch_id)
            .map(|switch_id| Mutation::SetSwitchOpen {
                switch_id: switch_id.to_string(),
                open: false,
            })
            .collect::<Vec<_>>();
        if mutations.is_empty() {
            return Ok(Plan::AlreadyDone);
        }
        Ok(Plan::Apply(mutations))
    }

    /// Breadth-first search from `start` to the nearest vertex with a busbar
    /// section, visiting the edges of each vertex in
    /// [`TopologyEdge::sort_key`] order.
    ///
    /// Returns the edges of the path found, from `start` on.
    fn shortest_path_to_busbar<'a>(
        &self,
        cg: &'a ConnectivityGraph,
        start: NodeIndex,
        predicate: &dyn Fn(&Switch) -> bool,
    ) -> Result<Option<Vec<&'a TopologyEdge>>, Error> {
        let mut parents: HashMap<NodeIndex, (NodeIndex, &TopologyEdge)> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(vertex) = queue.pop_front() {
            if cg.graph[vertex].busbar_section_count > 0 {
                let mut path = vec![];
                let mut current = vertex;
                while let Some(&(parent, edge)) = parents.get(&current) {
                    path.push(edge);
                    current = parent;
                }
                path.reverse();
                return Ok(Some(path));
            }

            for (_, other, edge) in cg.sorted_edges(vertex) {
                if other == start || parents.contains_key(&other) {
                    continue;
                }
                let usable = match edge.switch_id() {
                    Some(switch_id) if !edge.is_closed() => predicate(self.switch(switch_id)?),
                    _ => true,
                };
                if usable {
                    parents.insert(other, (vertex, edge));
                    queue.push_back(other);
                }
            }
        }

        Ok(None)
    }

    fn plan_disconnect(
        &self,
        terminal_ref: &TerminalRef,
        predicate: &dyn Fn(&Switch) -> bool,
    ) -> Result<Plan, Error> {
        let terminal = self.terminal(terminal_ref)?;
        let node = match terminal.attachment() {
            Attachment::Bus {
                connected: false, ..
            } => return Ok(Plan::AlreadyDone),
            Attachment::Bus { .. } => {
                return Ok(Plan::Apply(vec![Mutation::SetTerminalConnected {
                    terminal: terminal_ref.clone(),
                    connected: false,
                }]))
            }
            Attachment::Node(node) => *node,
        };
        if !self.is_terminal_connected(terminal_ref)? {
            return Ok(Plan::AlreadyDone);
        }

        let cg = self.build_connectivity_graph(terminal.voltage_level_id(), TopologyView::Bus)?;
        let start = cg.vertex_index(&ConnectionPoint::Node(node))?;

        // The region reachable from the terminal without crossing a switch
        // accepted by the predicate.  Accepted switches on its border are the
        // nearest cut of every path that leaves it.
        let mut region = HashSet::from([start]);
        let mut candidates = vec![];
        let mut queue = VecDeque::from([start]);
        while let Some(vertex) = queue.pop_front() {
            if cg.graph[vertex].busbar_section_count > 0 {
                return Ok(Plan::Impossible);
            }
            for (_, other, edge) in cg.sorted_edges(vertex) {
                if !edge.is_closed() {
                    continue;
                }
                if let Some(switch_id) = edge.switch_id() {
                    if predicate(self.switch(switch_id)?) {
                        candidates.push((switch_id, other));
                        continue;
                    }
                }
                if region.insert(other) {
                    queue.push_back(other);
                }
            }
        }

        // Vertices outside the region that reach a busbar section over closed
        // edges.  Only candidates leading there need opening.
        let mut fed = cg
            .graph
            .node_indices()
            .filter(|&v| cg.graph[v].busbar_section_count > 0)
            .collect::<HashSet<_>>();
        let mut queue = fed.iter().copied().collect::<VecDeque<_>>();
        while let Some(vertex) = queue.pop_front() {
            for (_, other, edge) in cg.sorted_edges(vertex) {
                if edge.is_closed() && !region.contains(&other) && fed.insert(other) {
                    queue.push_back(other);
                }
            }
        }

        let cuts = candidates
            .into_iter()
            .filter(|(_, other)| !region.contains(other) && fed.contains(other))
            .map(|(switch_id, _)| switch_id.to_string())
            .collect::<BTreeSet<_>>();
        if cuts.is_empty() {
            return Ok(Plan::AlreadyDone);
        }
        Ok(Plan::Apply(
            cuts.into_iter()
                .map(|switch_id| Mutation::SetSwitchOpen {
                    switch_id,
                    open: true,
                })
                .collect(),
        ))
    }
}
