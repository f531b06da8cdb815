// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`Network`] instances and adding elements to them.

use std::rc::Rc;

use crate::{
    ConnectionPoint, Equipment, Error, Switch, TopologyConfig, TopologyKind, TopologyListener,
};

use super::mutation::Mutation;
use super::Network;

/// `Network` instantiation.
impl Network {
    /// Creates a new, empty [`Network`] with the given configuration.
    pub fn new(config: TopologyConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Returns the configuration the network was created with.
    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Registers a listener to be notified of every topology change.
    pub fn add_listener(&mut self, listener: Rc<dyn TopologyListener>) {
        self.listeners.push(listener);
    }

    /// Adds an empty voltage level.
    ///
    /// Returns an error if a voltage level with the same id exists.
    pub fn add_voltage_level(
        &mut self,
        id: impl Into<String>,
        topology_kind: TopologyKind,
    ) -> Result<(), Error> {
        self.apply(Mutation::AddVoltageLevel {
            id: id.into(),
            topology_kind,
        })
    }

    /// Adds a node to a node-breaker voltage level.
    pub fn add_node(&mut self, voltage_level_id: &str, node: u32) -> Result<(), Error> {
        self.apply(Mutation::AddPoint {
            voltage_level_id: voltage_level_id.to_string(),
            point: ConnectionPoint::Node(node),
        })
    }

    /// Adds the given nodes to a node-breaker voltage level.
    pub fn add_nodes(
        &mut self,
        voltage_level_id: &str,
        nodes: impl IntoIterator<Item = u32>,
    ) -> Result<(), Error> {
        for node in nodes {
            self.add_node(voltage_level_id, node)?;
        }
        Ok(())
    }

    /// Adds a configured bus to a bus-breaker voltage level.
    pub fn add_bus(
        &mut self,
        voltage_level_id: &str,
        bus_id: impl Into<String>,
    ) -> Result<(), Error> {
        self.apply(Mutation::AddPoint {
            voltage_level_id: voltage_level_id.to_string(),
            point: ConnectionPoint::Bus(bus_id.into()),
        })
    }

    /// Adds a switch to the voltage level it names.
    ///
    /// Both endpoints must already exist in the voltage level.
    pub fn add_switch(&mut self, switch: Switch) -> Result<(), Error> {
        self.apply(Mutation::AddSwitch(switch))
    }

    /// Adds a switchless link between two nodes of a node-breaker voltage
    /// level.
    pub fn add_internal_connection(
        &mut self,
        voltage_level_id: &str,
        node1: u32,
        node2: u32,
    ) -> Result<(), Error> {
        self.apply(Mutation::AddInternalConnection {
            voltage_level_id: voltage_level_id.to_string(),
            node1,
            node2,
        })
    }

    /// Adds a piece of equipment, attaching its terminals to their voltage
    /// levels.
    pub fn add_equipment(&mut self, equipment: Equipment) -> Result<(), Error> {
        self.apply(Mutation::AddEquipment(equipment))
    }
}
