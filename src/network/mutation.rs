// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The single path through which the network model is changed.
//!
//! Every change is described as a [`Mutation`], checked against the current
//! state, applied, and followed by the invalidation of the cached topologies
//! of every voltage level it touches, and by the listener notifications.

use std::collections::BTreeSet;

use crate::{
    ConnectionPoint, Equipment, Error, Side, Switch, TerminalRef, TopologyKind, VoltageLevel,
};

use super::Network;

/// A change to the network model.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Mutation {
    AddVoltageLevel {
        id: String,
        topology_kind: TopologyKind,
    },
    AddPoint {
        voltage_level_id: String,
        point: ConnectionPoint,
    },
    RemovePoint {
        voltage_level_id: String,
        point: ConnectionPoint,
    },
    AddSwitch(Switch),
    RemoveSwitch(String),
    SetSwitchOpen {
        switch_id: String,
        open: bool,
    },
    AddInternalConnection {
        voltage_level_id: String,
        node1: u32,
        node2: u32,
    },
    AddEquipment(Equipment),
    RemoveEquipment(String),
    SetTerminalConnected {
        terminal: TerminalRef,
        connected: bool,
    },
}

/// What listeners get told about once a mutation is applied.
enum Notification {
    Switch(String),
    Terminal(TerminalRef, bool),
}

/// Switch and element mutations.
impl Network {
    /// Opens the given switch.
    ///
    /// Returns `false` if the switch was already open.
    pub fn open_switch(&mut self, switch_id: &str) -> Result<bool, Error> {
        self.set_switch_open(switch_id, true)
    }

    /// Closes the given switch.
    ///
    /// Returns `false` if the switch was already closed.
    pub fn close_switch(&mut self, switch_id: &str) -> Result<bool, Error> {
        self.set_switch_open(switch_id, false)
    }

    /// Sets the open state of the given switch.
    ///
    /// Returns `false`, and leaves the cached topologies untouched, if the
    /// switch was already in that state.
    pub fn set_switch_open(&mut self, switch_id: &str, open: bool) -> Result<bool, Error> {
        if self.switch(switch_id)?.is_open() == open {
            return Ok(false);
        }
        self.apply(Mutation::SetSwitchOpen {
            switch_id: switch_id.to_string(),
            open,
        })?;
        Ok(true)
    }

    /// Removes a switch from its voltage level.
    pub fn remove_switch(&mut self, switch_id: &str) -> Result<(), Error> {
        self.apply(Mutation::RemoveSwitch(switch_id.to_string()))
    }

    /// Removes a node from a node-breaker voltage level.
    ///
    /// Returns an error if a switch, an internal connection or a terminal
    /// still refers to the node.
    pub fn remove_node(&mut self, voltage_level_id: &str, node: u32) -> Result<(), Error> {
        self.apply(Mutation::RemovePoint {
            voltage_level_id: voltage_level_id.to_string(),
            point: ConnectionPoint::Node(node),
        })
    }

    /// Removes a configured bus from a bus-breaker voltage level.
    ///
    /// Returns an error if a switch or a terminal still refers to the bus.
    pub fn remove_bus(&mut self, voltage_level_id: &str, bus_id: &str) -> Result<(), Error> {
        self.apply(Mutation::RemovePoint {
            voltage_level_id: voltage_level_id.to_string(),
            point: ConnectionPoint::bus(bus_id),
        })
    }

    /// Removes a piece of equipment and detaches all its terminals.
    pub fn remove_equipment(&mut self, equipment_id: &str) -> Result<(), Error> {
        self.apply(Mutation::RemoveEquipment(equipment_id.to_string()))
    }

    pub(crate) fn apply(&mut self, mutation: Mutation) -> Result<(), Error> {
        self.apply_all(vec![mutation])
    }

    /// Checks all the given mutations, then applies them in order.
    ///
    /// Nothing is applied if any of the checks fails.  The checks all run
    /// against the state before the first mutation, so the mutations of one
    /// batch must not depend on each other.  If applying a mutation fails
    /// anyway, the caches of the voltage levels touched so far are dropped
    /// before the error is returned.
    pub(crate) fn apply_all(&mut self, mutations: Vec<Mutation>) -> Result<(), Error> {
        for mutation in &mutations {
            self.check(mutation)?;
        }

        let mut affected = BTreeSet::new();
        let mut notifications = vec![];
        for mutation in mutations {
            affected.extend(self.affected_voltage_levels(&mutation));
            match self.perform(mutation) {
                Ok(Some(notification)) => notifications.push(notification),
                Ok(None) => {}
                Err(err) => {
                    for voltage_level_id in &affected {
                        self.invalidate_unchecked(voltage_level_id);
                    }
                    return Err(err);
                }
            }
        }

        for voltage_level_id in &affected {
            self.invalidate_unchecked(voltage_level_id);
        }
        for notification in notifications {
            self.notify(notification)?;
        }
        Ok(())
    }

    fn affected_voltage_levels(&self, mutation: &Mutation) -> Vec<String> {
        match mutation {
            Mutation::AddVoltageLevel { id, .. } => vec![id.clone()],
            Mutation::AddPoint {
                voltage_level_id, ..
            }
            | Mutation::RemovePoint {
                voltage_level_id, ..
            }
            | Mutation::AddInternalConnection {
                voltage_level_id, ..
            } => vec![voltage_level_id.clone()],
            Mutation::AddSwitch(switch) => vec![switch.voltage_level_id().to_string()],
            Mutation::RemoveSwitch(switch_id) | Mutation::SetSwitchOpen { switch_id, .. } => self
                .switches
                .get(switch_id)
                .map(|s| vec![s.voltage_level_id().to_string()])
                .unwrap_or_default(),
            Mutation::AddEquipment(equipment) => equipment
                .terminals()
                .iter()
                .map(|t| t.voltage_level_id().to_string())
                .collect(),
            Mutation::RemoveEquipment(equipment_id) => self
                .equipment
                .get(equipment_id)
                .map(|e| {
                    e.terminals()
                        .iter()
                        .map(|t| t.voltage_level_id().to_string())
                        .collect()
                })
                .unwrap_or_default(),
            Mutation::SetTerminalConnected { terminal, .. } => self
                .terminal(terminal)
                .map(|t| vec![t.voltage_level_id().to_string()])
                .unwrap_or_default(),
        }
    }

    fn perform(&mut self, mutation: Mutation) -> Result<Option<Notification>, Error> {
        match mutation {
            Mutation::AddVoltageLevel { id, topology_kind } => {
                self.voltage_levels
                    .insert(id.clone(), VoltageLevel::new(id, topology_kind));
            }
            Mutation::AddPoint {
                voltage_level_id,
                point,
            } => {
                self.voltage_level_mut(&voltage_level_id)?.points.insert(point);
            }
            Mutation::RemovePoint {
                voltage_level_id,
                point,
            } => {
                self.voltage_level_mut(&voltage_level_id)?.points.remove(&point);
            }
            Mutation::AddSwitch(switch) => {
                self.voltage_level_mut(switch.voltage_level_id())?
                    .switches
                    .insert(switch.id().to_string());
                self.switches.insert(switch.id().to_string(), switch);
            }
            Mutation::RemoveSwitch(switch_id) => {
                let switch = self.switches.remove(&switch_id).ok_or_else(|| {
                    Error::internal(format!("Switch {switch_id} vanished while removing it."))
                })?;
                self.voltage_level_mut(switch.voltage_level_id())?
                    .switches
                    .remove(&switch_id);
            }
            Mutation::SetSwitchOpen { switch_id, open } => {
                let switch = self.switches.get_mut(&switch_id).ok_or_else(|| {
                    Error::internal(format!("Switch {switch_id} vanished while operating it."))
                })?;
                switch.set_open(open);
                tracing::trace!(
                    "{} switch {}",
                    if open { "Opened" } else { "Closed" },
                    switch_id
                );
                return Ok(Some(Notification::Switch(switch_id)));
            }
            Mutation::AddInternalConnection {
                voltage_level_id,
                node1,
                node2,
            } => {
                self.voltage_level_mut(&voltage_level_id)?
                    .internal_connections
                    .push((node1, node2));
            }
            Mutation::AddEquipment(equipment) => {
                for (index, terminal) in equipment.terminals().iter().enumerate() {
                    let side = Side::from_index(index).ok_or_else(|| {
                        Error::internal(format!(
                            "Equipment {} has too many terminals.",
                            equipment.id()
                        ))
                    })?;
                    self.voltage_level_mut(terminal.voltage_level_id())?
                        .terminals
                        .insert(TerminalRef::new(equipment.id(), side));
                }
                self.equipment.insert(equipment.id().to_string(), equipment);
            }
            Mutation::RemoveEquipment(equipment_id) => {
                let equipment = self.equipment.remove(&equipment_id).ok_or_else(|| {
                    Error::internal(format!("Equipment {equipment_id} vanished while removing it."))
                })?;
                let terminals = equipment.terminal_refs().zip(equipment.terminals());
                for (terminal_ref, terminal) in terminals {
                    self.voltage_level_mut(terminal.voltage_level_id())?
                        .terminals
                        .remove(&terminal_ref);
                }
            }
            Mutation::SetTerminalConnected {
                terminal,
                connected,
            } => {
                self.equipment
                    .get_mut(&terminal.equipment_id)
                    .and_then(|e| e.terminals.get_mut(terminal.side.index()))
                    .ok_or_else(|| {
                        Error::internal(format!("Terminal {terminal} vanished while operating it."))
                    })?
                    .set_bus_connected(connected);
                tracing::trace!(
                    "{} terminal {}",
                    if connected { "Connected" } else { "Disconnected" },
                    terminal
                );
                return Ok(Some(Notification::Terminal(terminal, connected)));
            }
        }
        Ok(None)
    }

    fn notify(&self, notification: Notification) -> Result<(), Error> {
        match notification {
            Notification::Switch(switch_id) => {
                let switch = self.switch(&switch_id)?;
                for listener in &self.listeners {
                    listener.on_switch_changed(switch);
                }
            }
            Notification::Terminal(terminal, connected) => {
                for listener in &self.listeners {
                    listener.on_terminal_changed(&terminal, connected);
                }
            }
        }
        Ok(())
    }

    fn voltage_level_mut(&mut self, voltage_level_id: &str) -> Result<&mut VoltageLevel, Error> {
        self.voltage_levels.get_mut(voltage_level_id).ok_or_else(|| {
            Error::voltage_level_not_found(format!("Voltage level {voltage_level_id} not found."))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_utils::{scenario_vl1, NetworkBuilder, RecordingListener};
    use crate::TopologyView;
    use std::rc::Rc;

    #[test]
    fn test_switch_operation() -> Result<(), Error> {
        let mut network = scenario_vl1()?;

        assert!(network.switch("SW1")?.is_open());
        assert!(!network.open_switch("SW1")?);
        assert!(network.close_switch("SW1")?);
        assert!(!network.switch("SW1")?.is_open());
        assert!(!network.close_switch("SW1")?);
        assert!(network.set_switch_open("SW1", true)?);

        assert!(network
            .open_switch("SW9")
            .is_err_and(|e| e == Error::switch_not_found("Switch SW9 not found.")));

        Ok(())
    }

    #[test]
    fn test_switch_toggle_invalidates() -> Result<(), Error> {
        let mut network = scenario_vl1()?;

        let before = network.calculated_buses("VL1", TopologyView::Bus)?;
        assert_eq!(before.len(), 2);

        network.close_switch("SW1")?;
        let closed = network.calculated_buses("VL1", TopologyView::Bus)?;
        assert_eq!(closed.len(), 1);

        network.open_switch("SW1")?;
        let reopened = network.calculated_buses("VL1", TopologyView::Bus)?;
        assert_eq!(reopened, before);

        Ok(())
    }

    #[test]
    fn test_structural_changes_invalidate() -> Result<(), Error> {
        let mut network = scenario_vl1()?;
        assert_eq!(network.calculated_buses("VL1", TopologyView::Bus)?.len(), 2);

        // A new node shows up as a new singleton bus.
        network.add_node("VL1", 3)?;
        assert_eq!(network.calculated_buses("VL1", TopologyView::Bus)?.len(), 3);

        // Linking it merges it into the busbar's bus.
        network.add_internal_connection("VL1", 1, 3)?;
        let partition = network.calculated_buses("VL1", TopologyView::Bus)?;
        assert_eq!(partition.len(), 2);
        assert_eq!(
            partition.bus_index(&ConnectionPoint::Node(3)),
            partition.bus_index(&ConnectionPoint::Node(0))
        );

        // A new closed switch towards the load node merges everything.
        network.add_switch(Switch::between_nodes(
            "SW2",
            "VL1",
            crate::SwitchKind::Disconnector,
            3,
            2,
        ))?;
        assert_eq!(network.calculated_buses("VL1", TopologyView::Bus)?.len(), 1);

        network.remove_switch("SW2")?;
        assert_eq!(network.calculated_buses("VL1", TopologyView::Bus)?.len(), 2);

        Ok(())
    }

    #[test]
    fn test_removal() -> Result<(), Error> {
        let mut network = scenario_vl1()?;

        assert!(network.remove_node("VL1", 2).is_err_and(|e| e
            == Error::invalid_topology(
                "Can't remove node 2 from VL1: it is used by switch SW1."
            )));

        network.remove_switch("SW1")?;
        assert!(network.remove_node("VL1", 2).is_err_and(|e| e
            == Error::invalid_topology(
                "Can't remove node 2 from VL1: it is used by terminal LD1:ONE."
            )));

        network.remove_equipment("LD1")?;
        assert_eq!(network.voltage_level("VL1")?.terminals().count(), 1);
        network.remove_node("VL1", 2)?;
        assert!(network.remove_node("VL1", 1).is_err_and(|e| e
            == Error::invalid_topology(
                "Can't remove node 1 from VL1: it is used by an internal connection."
            )));

        let partition = network.calculated_buses("VL1", TopologyView::Bus)?;
        assert_eq!(partition.len(), 1);
        assert!(network
            .remove_switch("SW1")
            .is_err_and(|e| e == Error::switch_not_found("Switch SW1 not found.")));
        network.validate()?;

        Ok(())
    }

    #[test]
    fn test_failed_batch_invalidates() -> Result<(), Error> {
        let mut network = scenario_vl1()?;
        assert_eq!(network.calculated_buses("VL1", TopologyView::Bus)?.len(), 2);

        // Both removals pass the checks, but the second one finds nothing to
        // remove, after the switch is already closed.
        let result = network.apply_all(vec![
            Mutation::SetSwitchOpen {
                switch_id: "SW1".to_string(),
                open: false,
            },
            Mutation::RemoveEquipment("LD1".to_string()),
            Mutation::RemoveEquipment("LD1".to_string()),
        ]);
        assert!(result.is_err_and(|e| e
            == Error::internal("Equipment LD1 vanished while removing it.")));

        assert!(!network.switch("SW1")?.is_open());
        assert_eq!(network.calculated_buses("VL1", TopologyView::Bus)?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_listeners() -> Result<(), Error> {
        let mut network = NetworkBuilder::new()
            .bus_breaker_level("VL", &["B1", "B2"])
            .bus_switch("CPL", "VL", "B1", "B2", true)
            .bus_load("LD", "VL", "B2")
            .build()?;
        let listener = Rc::new(RecordingListener::default());
        network.add_listener(listener.clone());

        network.close_switch("CPL")?;
        network.disconnect("LD", |_| true, None)?;
        network.invalidate("VL")?;

        assert_eq!(
            listener.events(),
            vec![
                "invalidated VL",
                "switch CPL closed",
                "invalidated VL",
                "terminal LD:ONE disconnected",
                "invalidated VL",
            ]
        );

        Ok(())
    }
}
