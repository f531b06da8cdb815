// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Network-wide numbering of connected and synchronous components.
//!
//! Every bus view calculated bus of the network is a vertex, and every branch
//! links the buses its terminals are attached to.  A branch end behind an
//! open breaker sits on a bus of its own, so it doesn't join the rest of its
//! voltage level.
//! HVDC lines link buses of the same connected component, but not of the same
//! synchronous component.

use std::collections::HashMap;
use std::rc::Rc;

use petgraph::unionfind::UnionFind;

use crate::{equipment_kind::KindPredicates, CalculatedBus, Error, TopologyView};

use super::Network;

/// Component numbers of every bus view calculated bus, by bus id.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ComponentNumbering {
    connected: HashMap<String, usize>,
    synchronous: HashMap<String, usize>,
}

/// Component numbering.
impl Network {
    /// Returns the connected component number of the bus view calculated bus
    /// with the given id.
    ///
    /// Buses linked through any chain of attached branches, AC or DC, share
    /// the same number.  Numbers start at 0 and follow the order of the
    /// voltage level ids and bus indices.
    pub fn connected_component_number(&self, bus_id: &str) -> Result<usize, Error> {
        let numbering = self.component_numbering()?;
        lookup(&numbering.connected, bus_id)
    }

    /// Returns the synchronous component number of the bus view calculated
    /// bus with the given id.
    ///
    /// Like [`connected_component_number`][Self::connected_component_number],
    /// but only AC branches link buses.
    pub fn synchronous_component_number(&self, bus_id: &str) -> Result<usize, Error> {
        let numbering = self.component_numbering()?;
        lookup(&numbering.synchronous, bus_id)
    }

    fn component_numbering(&self) -> Result<Rc<ComponentNumbering>, Error> {
        if let Some(numbering) = self.cache.components() {
            return Ok(numbering);
        }
        let numbering = Rc::new(self.compute_component_numbering()?);
        self.cache.store_components(numbering.clone());
        Ok(numbering)
    }

    fn compute_component_numbering(&self) -> Result<ComponentNumbering, Error> {
        let mut bus_ids = vec![];
        let mut positions = HashMap::new();
        for voltage_level in self.voltage_levels() {
            let partition = self.calculated_buses(voltage_level.id(), TopologyView::Bus)?;
            for bus in partition.buses() {
                positions.insert(bus.id().to_string(), bus_ids.len());
                bus_ids.push(bus.id().to_string());
            }
        }

        let mut connected = UnionFind::<usize>::new(bus_ids.len());
        let mut synchronous = UnionFind::<usize>::new(bus_ids.len());
        for equipment in self.all_equipment().filter(|e| e.is_branch()) {
            let mut linked = vec![];
            // Node-breaker terminals always link their bus, detached
            // bus-breaker terminals never do.
            for terminal_ref in equipment.terminal_refs() {
                if let Some(bus) = self.bus_for_terminal(&terminal_ref, TopologyView::Bus)? {
                    linked.push(position(&positions, &bus)?);
                }
            }

            for pair in linked.windows(2) {
                connected.union(pair[0], pair[1]);
                if !equipment.is_dc_link() {
                    synchronous.union(pair[0], pair[1]);
                }
            }
        }

        let numbering = ComponentNumbering {
            connected: number(&bus_ids, &connected),
            synchronous: number(&bus_ids, &synchronous),
        };
        tracing::debug!(
            "Numbered components of {} buses: {} connected, {} synchronous.",
            bus_ids.len(),
            count(&numbering.connected),
            count(&numbering.synchronous)
        );
        Ok(numbering)
    }
}

fn position(positions: &HashMap<String, usize>, bus: &CalculatedBus) -> Result<usize, Error> {
    positions
        .get(bus.id())
        .copied()
        .ok_or_else(|| Error::internal(format!("Bus {} is missing from the numbering.", bus.id())))
}

/// Numbers the sets of the given union-find, in the order of their first
/// member.
fn number(bus_ids: &[String], sets: &UnionFind<usize>) -> HashMap<String, usize> {
    let mut numbers = HashMap::new();
    let mut by_root = HashMap::new();
    for (position, bus_id) in bus_ids.iter().enumerate() {
        let next = by_root.len();
        let number = *by_root.entry(sets.find(position)).or_insert(next);
        numbers.insert(bus_id.clone(), number);
    }
    numbers
}

fn count(numbers: &HashMap<String, usize>) -> usize {
    numbers.values().max().map_or(0, |max| max + 1)
}

fn lookup(numbers: &HashMap<String, usize>, bus_id: &str) -> Result<usize, Error> {
    numbers.get(bus_id).copied().ok_or_else(|| {
        Error::bus_not_found(format!("Bus view calculated bus {bus_id} not found."))
    })
}
