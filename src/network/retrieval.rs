// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving voltage levels, switches, equipment and terminals
//! from a [`Network`].

use crate::{Equipment, Error, Switch, Terminal, TerminalRef, VoltageLevel};

use super::Network;

/// Element retrieval.
impl Network {
    /// Returns the voltage level with the given id, if it exists.
    pub fn voltage_level(&self, voltage_level_id: &str) -> Result<&VoltageLevel, Error> {
        self.voltage_levels.get(voltage_level_id).ok_or_else(|| {
            Error::voltage_level_not_found(format!("Voltage level {voltage_level_id} not found."))
        })
    }

    /// Returns an iterator over the voltage levels, ordered by id.
    pub fn voltage_levels(&self) -> impl Iterator<Item = &VoltageLevel> {
        self.voltage_levels.values()
    }

    /// Returns the switch with the given id, if it exists.
    pub fn switch(&self, switch_id: &str) -> Result<&Switch, Error> {
        self.switches
            .get(switch_id)
            .ok_or_else(|| Error::switch_not_found(format!("Switch {switch_id} not found.")))
    }

    /// Returns an iterator over the switches of the given voltage level,
    /// ordered by id.
    ///
    /// Returns an error if the given voltage level does not exist.
    pub fn switches(&self, voltage_level_id: &str) -> Result<impl Iterator<Item = &Switch>, Error> {
        let voltage_level = self.voltage_level(voltage_level_id)?;
        Ok(voltage_level
            .switches
            .iter()
            .filter_map(|id| self.switches.get(id)))
    }

    /// Returns the equipment with the given id, if it exists.
    pub fn equipment(&self, equipment_id: &str) -> Result<&Equipment, Error> {
        self.equipment.get(equipment_id).ok_or_else(|| {
            Error::equipment_not_found(format!("Equipment {equipment_id} not found."))
        })
    }

    /// Returns an iterator over all equipment, ordered by id.
    pub fn all_equipment(&self) -> impl Iterator<Item = &Equipment> {
        self.equipment.values()
    }

    /// Returns the referenced terminal.
    ///
    /// Returns an error if the equipment does not exist, or doesn't have a
    /// terminal on the given side.
    pub fn terminal(&self, terminal: &TerminalRef) -> Result<&Terminal, Error> {
        let equipment = self.equipment(&terminal.equipment_id)?;
        equipment.terminal(terminal.side).ok_or_else(|| {
            Error::invalid_argument(format!(
                "{} {} has no terminal on side {}.",
                equipment.kind(),
                equipment.id(),
                terminal.side
            ))
        })
    }
}
