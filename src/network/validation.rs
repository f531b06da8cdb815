// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating the structure of a [`Network`].
//!
//! Every [`Mutation`] is checked before it is applied, so that the stored
//! model never holds a switch or terminal referring to something that doesn't
//! exist.  [`Network::validate`] re-checks the whole model.

use crate::{
    equipment_kind::KindPredicates, ConnectionPoint, Equipment, Error, Switch, Terminal,
    TerminalRef, TopologyKind, VoltageLevel,
};

use super::mutation::Mutation;
use super::Network;

/// Structural checks.
impl Network {
    /// Checks that every switch, internal connection and terminal refers to
    /// existing voltage levels and nodes or buses, and that the index of
    /// attached terminals kept by each voltage level is complete.
    pub fn validate(&self) -> Result<(), Error> {
        for switch in self.switches.values() {
            self.check_switch(switch)?;
            let listed = self
                .voltage_level(switch.voltage_level_id())?
                .switches
                .contains(switch.id());
            if !listed {
                return Err(Error::invalid_topology(format!(
                    "Switch {} is not listed by {}.",
                    switch.id(),
                    switch.voltage_level_id()
                )));
            }
        }

        for voltage_level in self.voltage_levels.values() {
            for point in voltage_level.points() {
                if !point.fits(voltage_level.topology_kind()) {
                    return Err(Error::invalid_topology(format!(
                        "{} contains {}, but has a {:?} topology.",
                        voltage_level.id(),
                        point,
                        voltage_level.topology_kind()
                    )));
                }
            }
            for &(node1, node2) in voltage_level.internal_connections() {
                self.check_internal_connection(voltage_level, node1, node2)?;
            }
            for terminal_ref in voltage_level.terminals() {
                let terminal = self.terminal(terminal_ref)?;
                if terminal.voltage_level_id() != voltage_level.id() {
                    return Err(Error::invalid_topology(format!(
                        "{} lists terminal {}, which is attached to {}.",
                        voltage_level.id(),
                        terminal_ref,
                        terminal.voltage_level_id()
                    )));
                }
            }
        }

        for equipment in self.equipment.values() {
            self.check_equipment(equipment)?;
            for (terminal_ref, terminal) in equipment.terminal_refs().zip(equipment.terminals()) {
                let listed = self
                    .voltage_level(terminal.voltage_level_id())?
                    .terminals
                    .contains(&terminal_ref);
                if !listed {
                    return Err(Error::invalid_topology(format!(
                        "Terminal {} is not listed by {}.",
                        terminal_ref,
                        terminal.voltage_level_id()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Checks that the given mutation can be applied to the current state.
    pub(super) fn check(&self, mutation: &Mutation) -> Result<(), Error> {
        match mutation {
            Mutation::AddVoltageLevel { id, .. } => {
                if self.voltage_levels.contains_key(id) {
                    return Err(Error::duplicate_id(format!(
                        "Voltage level {id} already exists."
                    )));
                }
            }
            Mutation::AddPoint {
                voltage_level_id,
                point,
            } => {
                let voltage_level = self.voltage_level(voltage_level_id)?;
                if !point.fits(voltage_level.topology_kind()) {
                    return Err(Error::invalid_topology(format!(
                        "Can't add {} to {}, which has a {:?} topology.",
                        point,
                        voltage_level_id,
                        voltage_level.topology_kind()
                    )));
                }
                if voltage_level.points.contains(point) {
                    return Err(Error::duplicate_id(format!(
                        "{voltage_level_id} already contains {point}."
                    )));
                }
            }
            Mutation::RemovePoint {
                voltage_level_id,
                point,
            } => self.check_point_removal(self.voltage_level(voltage_level_id)?, point)?,
            Mutation::AddSwitch(switch) => {
                if self.switches.contains_key(switch.id()) {
                    return Err(Error::duplicate_id(format!(
                        "Switch {} already exists.",
                        switch.id()
                    )));
                }
                self.check_switch(switch)?;
            }
            Mutation::RemoveSwitch(switch_id) | Mutation::SetSwitchOpen { switch_id, .. } => {
                self.switch(switch_id)?;
            }
            Mutation::AddInternalConnection {
                voltage_level_id,
                node1,
                node2,
            } => {
                let voltage_level = self.voltage_level(voltage_level_id)?;
                if voltage_level.topology_kind() != TopologyKind::NodeBreaker {
                    return Err(Error::invalid_topology(format!(
                        "Can't add internal connection ({}, {}) to {}, which has a {:?} topology.",
                        node1,
                        node2,
                        voltage_level_id,
                        voltage_level.topology_kind()
                    )));
                }
                self.check_internal_connection(voltage_level, *node1, *node2)?;
            }
            Mutation::AddEquipment(equipment) => {
                if self.equipment.contains_key(equipment.id()) {
                    return Err(Error::duplicate_id(format!(
                        "Equipment {} already exists.",
                        equipment.id()
                    )));
                }
                self.check_equipment(equipment)?;
            }
            Mutation::RemoveEquipment(equipment_id) => {
                self.equipment(equipment_id)?;
            }
            Mutation::SetTerminalConnected { terminal, .. } => {
                if !matches!(
                    self.terminal(terminal)?.attachment(),
                    crate::Attachment::Bus { .. }
                ) {
                    return Err(Error::invalid_argument(format!(
                        "Terminal {terminal} is attached to a node, it can only be connected \
                         by operating switches."
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_switch(&self, switch: &Switch) -> Result<(), Error> {
        let voltage_level = self.voltage_level(switch.voltage_level_id())?;
        if switch.is_retained() && voltage_level.topology_kind() != TopologyKind::NodeBreaker {
            return Err(Error::invalid_topology(format!(
                "Switch {} can't be retained in {}, which has a {:?} topology.",
                switch.id(),
                voltage_level.id(),
                voltage_level.topology_kind()
            )));
        }

        let context = format!("Switch {}", switch.id());
        let (point1, point2) = switch.endpoints();
        check_point(&context, voltage_level, point1)?;
        check_point(&context, voltage_level, point2)?;
        if point1 == point2 {
            return Err(Error::invalid_topology(format!(
                "Switch {} can't connect {} to itself.",
                switch.id(),
                point1
            )));
        }
        Ok(())
    }

    fn check_internal_connection(
        &self,
        voltage_level: &VoltageLevel,
        node1: u32,
        node2: u32,
    ) -> Result<(), Error> {
        let context = format!("Internal connection ({node1}, {node2})");
        check_point(&context, voltage_level, &ConnectionPoint::Node(node1))?;
        check_point(&context, voltage_level, &ConnectionPoint::Node(node2))?;
        if node1 == node2 {
            return Err(Error::invalid_topology(format!(
                "{context} can't connect node {node1} to itself."
            )));
        }
        Ok(())
    }

    fn check_equipment(&self, equipment: &Equipment) -> Result<(), Error> {
        let expected = equipment.kind().terminal_count();
        if equipment.terminals().len() != expected {
            return Err(Error::invalid_argument(format!(
                "{} {} must have {} terminals, found {}.",
                equipment.kind(),
                equipment.id(),
                expected,
                equipment.terminals().len()
            )));
        }

        for (terminal_ref, terminal) in equipment.terminal_refs().zip(equipment.terminals()) {
            self.check_terminal(&terminal_ref, terminal)?;
        }

        if equipment.is_busbar_section() {
            let on_node = equipment
                .terminals()
                .iter()
                .all(|t| matches!(t.attachment(), crate::Attachment::Node(_)));
            if !on_node {
                return Err(Error::invalid_topology(format!(
                    "Busbar section {} must be attached to a node-breaker voltage level.",
                    equipment.id()
                )));
            }
        }
        Ok(())
    }

    fn check_terminal(&self, terminal_ref: &TerminalRef, terminal: &Terminal) -> Result<(), Error> {
        let voltage_level = self.voltage_level(terminal.voltage_level_id())?;
        check_point(
            &format!("Terminal {terminal_ref}"),
            voltage_level,
            &terminal.connectable_point(),
        )
    }

    fn check_point_removal(
        &self,
        voltage_level: &VoltageLevel,
        point: &ConnectionPoint,
    ) -> Result<(), Error> {
        if !voltage_level.points.contains(point) {
            return Err(Error::connection_point_not_found(format!(
                "{} has no {}.",
                voltage_level.id(),
                point
            )));
        }
        let in_use = |user: String| {
            Error::invalid_topology(format!(
                "Can't remove {} from {}: it is used by {}.",
                point,
                voltage_level.id(),
                user
            ))
        };

        for switch_id in voltage_level.switch_ids() {
            let (point1, point2) = self.switch(switch_id)?.endpoints();
            if point1 == point || point2 == point {
                return Err(in_use(format!("switch {switch_id}")));
            }
        }
        if let ConnectionPoint::Node(node) = point {
            if voltage_level
                .internal_connections()
                .iter()
                .any(|(node1, node2)| node1 == node || node2 == node)
            {
                return Err(in_use("an internal connection".to_string()));
            }
        }
        for terminal_ref in voltage_level.terminals() {
            if &self.terminal(terminal_ref)?.connectable_point() == point {
                return Err(in_use(format!("terminal {terminal_ref}")));
            }
        }
        Ok(())
    }
}

/// Checks that the given point can be used in the given voltage level.
fn check_point(
    context: &str,
    voltage_level: &VoltageLevel,
    point: &ConnectionPoint,
) -> Result<(), Error> {
    if !point.fits(voltage_level.topology_kind()) {
        return Err(Error::invalid_topology(format!(
            "{}: can't attach to {} of {}, which has a {:?} topology.",
            context,
            point,
            voltage_level.id(),
            voltage_level.topology_kind()
        )));
    }
    if !voltage_level.points.contains(point) {
        return Err(Error::invalid_topology(format!(
            "{}: {} has no {}.",
            context,
            voltage_level.id(),
            point
        )));
    }
    Ok(())
}
