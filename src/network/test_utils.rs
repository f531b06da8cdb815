// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the `network` module.
//!
//! - the `NetworkBuilder`, which can declaratively build networks for use in
//!   tests.
//! - a few ready-made networks that several tests share.
//! - the `RecordingListener`, which records the notifications it receives.

use std::cell::RefCell;

use crate::{
    ConnectionPoint, Equipment, EquipmentKind, Error, Network, Switch, SwitchKind, Terminal,
    TerminalRef, TopologyConfig, TopologyKind, TopologyListener,
};

/// A builder for creating network configurations easily, for use in tests.
///
/// Voltage levels are added first, then switches, internal connections and
/// equipment, so the order of the calls doesn't matter.
#[derive(Default)]
pub(super) struct NetworkBuilder {
    config: TopologyConfig,
    voltage_levels: Vec<(String, TopologyKind, Vec<ConnectionPoint>)>,
    switches: Vec<Switch>,
    internal_connections: Vec<(String, u32, u32)>,
    equipment: Vec<Equipment>,
}

impl NetworkBuilder {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn config(&mut self, config: TopologyConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Adds a node-breaker voltage level with the given nodes.
    pub(super) fn node_breaker_level(
        &mut self,
        id: &str,
        nodes: impl IntoIterator<Item = u32>,
    ) -> &mut Self {
        self.voltage_levels.push((
            id.to_string(),
            TopologyKind::NodeBreaker,
            nodes.into_iter().map(ConnectionPoint::Node).collect(),
        ));
        self
    }

    /// Adds a bus-breaker voltage level with the given configured buses.
    pub(super) fn bus_breaker_level(&mut self, id: &str, buses: &[&str]) -> &mut Self {
        self.voltage_levels.push((
            id.to_string(),
            TopologyKind::BusBreaker,
            buses.iter().map(|&bus| ConnectionPoint::bus(bus)).collect(),
        ));
        self
    }

    fn node_switch(
        &mut self,
        id: &str,
        voltage_level_id: &str,
        kind: SwitchKind,
        nodes: (u32, u32),
        open: bool,
    ) -> &mut Self {
        self.switches.push(
            Switch::between_nodes(id, voltage_level_id, kind, nodes.0, nodes.1).with_open(open),
        );
        self
    }

    pub(super) fn breaker(
        &mut self,
        id: &str,
        voltage_level_id: &str,
        node1: u32,
        node2: u32,
        open: bool,
    ) -> &mut Self {
        self.node_switch(id, voltage_level_id, SwitchKind::Breaker, (node1, node2), open)
    }

    pub(super) fn disconnector(
        &mut self,
        id: &str,
        voltage_level_id: &str,
        node1: u32,
        node2: u32,
        open: bool,
    ) -> &mut Self {
        self.node_switch(id, voltage_level_id, SwitchKind::Disconnector, (node1, node2), open)
    }

    pub(super) fn retained_breaker(
        &mut self,
        id: &str,
        voltage_level_id: &str,
        node1: u32,
        node2: u32,
        open: bool,
    ) -> &mut Self {
        self.switches.push(
            Switch::between_nodes(id, voltage_level_id, SwitchKind::Breaker, node1, node2)
                .with_open(open)
                .with_retained(true),
        );
        self
    }

    /// Adds a breaker between two configured buses.
    pub(super) fn bus_switch(
        &mut self,
        id: &str,
        voltage_level_id: &str,
        bus1: &str,
        bus2: &str,
        open: bool,
    ) -> &mut Self {
        self.switches.push(
            Switch::between_buses(id, voltage_level_id, SwitchKind::Breaker, bus1, bus2)
                .with_open(open),
        );
        self
    }

    pub(super) fn internal_connection(
        &mut self,
        voltage_level_id: &str,
        node1: u32,
        node2: u32,
    ) -> &mut Self {
        self.internal_connections
            .push((voltage_level_id.to_string(), node1, node2));
        self
    }

    pub(super) fn busbar_section(
        &mut self,
        id: &str,
        voltage_level_id: &str,
        node: u32,
    ) -> &mut Self {
        self.equipment.push(Equipment::new(
            id,
            EquipmentKind::BusbarSection,
            vec![Terminal::node(voltage_level_id, node)],
        ));
        self
    }

    pub(super) fn load(&mut self, id: &str, voltage_level_id: &str, node: u32) -> &mut Self {
        self.equipment.push(Equipment::new(
            id,
            EquipmentKind::Load,
            vec![Terminal::node(voltage_level_id, node)],
        ));
        self
    }

    /// Adds a load connected to a configured bus.
    pub(super) fn bus_load(&mut self, id: &str, voltage_level_id: &str, bus: &str) -> &mut Self {
        self.equipment.push(Equipment::new(
            id,
            EquipmentKind::Load,
            vec![Terminal::bus(voltage_level_id, bus)],
        ));
        self
    }

    /// Adds a line between two nodes, given as `(voltage level id, node)`.
    pub(super) fn line(&mut self, id: &str, end1: (&str, u32), end2: (&str, u32)) -> &mut Self {
        self.branch(id, EquipmentKind::Line, end1, end2)
    }

    pub(super) fn hvdc_line(
        &mut self,
        id: &str,
        end1: (&str, u32),
        end2: (&str, u32),
    ) -> &mut Self {
        self.branch(id, EquipmentKind::HvdcLine, end1, end2)
    }

    pub(super) fn equipment(&mut self, equipment: Equipment) -> &mut Self {
        self.equipment.push(equipment);
        self
    }

    fn branch(
        &mut self,
        id: &str,
        kind: EquipmentKind,
        end1: (&str, u32),
        end2: (&str, u32),
    ) -> &mut Self {
        self.equipment.push(Equipment::new(
            id,
            kind,
            vec![Terminal::node(end1.0, end1.1), Terminal::node(end2.0, end2.1)],
        ));
        self
    }

    /// Builds the network from the elements added to the builder.
    pub(super) fn build(&self) -> Result<Network, Error> {
        let mut network = Network::new(self.config.clone());
        for (id, topology_kind, points) in &self.voltage_levels {
            network.add_voltage_level(id.as_str(), *topology_kind)?;
            for point in points {
                match point {
                    ConnectionPoint::Node(node) => network.add_node(id, *node)?,
                    ConnectionPoint::Bus(bus) => network.add_bus(id, bus.as_str())?,
                }
            }
        }
        for switch in &self.switches {
            network.add_switch(switch.clone())?;
        }
        for (voltage_level_id, node1, node2) in &self.internal_connections {
            network.add_internal_connection(voltage_level_id, *node1, *node2)?;
        }
        for equipment in &self.equipment {
            network.add_equipment(equipment.clone())?;
        }
        Ok(network)
    }
}

/// A node-breaker voltage level `VL1` with three nodes: a busbar section
/// `BBS1` on node 0, an internal connection between nodes 0 and 1, an open
/// breaker `SW1` between nodes 1 and 2, and a load `LD1` on node 2.
pub(super) fn scenario_vl1() -> Result<Network, Error> {
    NetworkBuilder::new()
        .node_breaker_level("VL1", [0, 1, 2])
        .busbar_section("BBS1", "VL1", 0)
        .internal_connection("VL1", 0, 1)
        .breaker("SW1", "VL1", 1, 2, true)
        .load("LD1", "VL1", 2)
        .build()
}

/// Two node-breaker voltage levels `VL1` and `VL2`, each with a busbar
/// section on node 0 and a closed breaker towards node 1, where the line `L`
/// ends.
///
/// With `with_hvdc`, each level also gets a closed breaker towards node 2,
/// where the HVDC line `HVDC` ends.
pub(super) fn two_levels_with_line_and_hvdc(with_hvdc: bool) -> Result<Network, Error> {
    let mut builder = NetworkBuilder::new();
    for vl in ["VL1", "VL2"] {
        builder
            .node_breaker_level(vl, [0, 1, 2])
            .busbar_section(&format!("{vl}_BBS"), vl, 0)
            .breaker(&format!("{vl}_BRK_L"), vl, 0, 1, false);
        if with_hvdc {
            builder.breaker(&format!("{vl}_BRK_H"), vl, 0, 2, false);
        }
    }
    builder.line("L", ("VL1", 1), ("VL2", 1));
    if with_hvdc {
        builder.hvdc_line("HVDC", ("VL1", 2), ("VL2", 2));
    }
    builder.build()
}

/// A node-breaker voltage level `VL` with a load `LD` on node 3, fed from the
/// busbar section `BBS` on node 0 through two closed feeders: breaker `BA`
/// and disconnector `DA` through node 1, breaker `BB` and disconnector `DB`
/// through node 2.
pub(super) fn parallel_feeders() -> Result<Network, Error> {
    NetworkBuilder::new()
        .node_breaker_level("VL", [0, 1, 2, 3])
        .busbar_section("BBS", "VL", 0)
        .breaker("BA", "VL", 3, 1, false)
        .disconnector("DA", "VL", 1, 0, false)
        .breaker("BB", "VL", 3, 2, false)
        .disconnector("DB", "VL", 2, 0, false)
        .load("LD", "VL", 3)
        .build()
}

/// A listener that records every notification as a line of text.
#[derive(Default)]
pub(super) struct RecordingListener {
    events: RefCell<Vec<String>>,
}

impl RecordingListener {
    pub(super) fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl TopologyListener for RecordingListener {
    fn on_switch_changed(&self, switch: &Switch) {
        let state = if switch.is_open() { "opened" } else { "closed" };
        self.events
            .borrow_mut()
            .push(format!("switch {} {}", switch.id(), state));
    }

    fn on_terminal_changed(&self, terminal: &TerminalRef, connected: bool) {
        let state = if connected { "connected" } else { "disconnected" };
        self.events
            .borrow_mut()
            .push(format!("terminal {terminal} {state}"));
    }

    fn on_topology_invalidated(&self, voltage_level_id: &str) {
        self.events
            .borrow_mut()
            .push(format!("invalidated {voltage_level_id}"));
    }
}
