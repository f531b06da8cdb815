// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Caching of calculated topologies, and the methods reading them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{
    Attachment, CalculatedBus, ConnectionPoint, Error, Partition, TerminalRef, TopologyView,
};

use super::components::ComponentNumbering;
use super::resolver::resolve;
use super::Network;

/// The calculated topologies of one network state.
///
/// Entries are either valid or absent: invalidation drops them wholesale and
/// they are recalculated on the next read.
#[derive(Clone, Default)]
pub(crate) struct TopologyCache {
    partitions: RefCell<HashMap<(String, TopologyView), Rc<Partition>>>,
    components: RefCell<Option<Rc<ComponentNumbering>>>,
}

impl TopologyCache {
    fn partition(&self, voltage_level_id: &str, view: TopologyView) -> Option<Rc<Partition>> {
        self.partitions
            .borrow()
            .get(&(voltage_level_id.to_string(), view))
            .cloned()
    }

    fn store_partition(&self, partition: Rc<Partition>) {
        self.partitions.borrow_mut().insert(
            (partition.voltage_level_id().to_string(), partition.view()),
            partition,
        );
    }

    pub(super) fn components(&self) -> Option<Rc<ComponentNumbering>> {
        self.components.borrow().clone()
    }

    pub(super) fn store_components(&self, components: Rc<ComponentNumbering>) {
        *self.components.borrow_mut() = Some(components);
    }

    /// Drops both views of the given voltage level, and the network-wide
    /// component numbering.
    fn invalidate(&self, voltage_level_id: &str) {
        let mut partitions = self.partitions.borrow_mut();
        for view in [TopologyView::BusBreaker, TopologyView::Bus] {
            partitions.remove(&(voltage_level_id.to_string(), view));
        }
        *self.components.borrow_mut() = None;
    }
}

/// Topology reads and invalidation.
impl Network {
    /// Returns the calculated buses of the given voltage level in the given
    /// view.
    ///
    /// The result is cached until the voltage level is invalidated, which
    /// every mutation touching the voltage level does.
    pub fn calculated_buses(
        &self,
        voltage_level_id: &str,
        view: TopologyView,
    ) -> Result<Rc<Partition>, Error> {
        if let Some(partition) = self.cache.partition(voltage_level_id, view) {
            return Ok(partition);
        }

        let cg = self.build_connectivity_graph(voltage_level_id, view)?;
        let hide_branchless = self.config.hide_branchless_bus_breaker_buses;
        let partition = Rc::new(resolve(&cg, hide_branchless));
        tracing::debug!(
            "Calculated {} buses for {} in the {} view.",
            partition.len(),
            voltage_level_id,
            view
        );

        self.cache.store_partition(partition.clone());
        Ok(partition)
    }

    /// Returns the calculated bus containing the given node or bus.
    ///
    /// Returns `None` if the point belongs to a hidden bus-breaker view bus,
    /// and an error if the point doesn't exist in the voltage level.
    pub fn bus_for_point(
        &self,
        voltage_level_id: &str,
        view: TopologyView,
        point: &ConnectionPoint,
    ) -> Result<Option<CalculatedBus>, Error> {
        if !self.voltage_level(voltage_level_id)?.points.contains(point) {
            return Err(Error::connection_point_not_found(format!(
                "{voltage_level_id} has no {point}."
            )));
        }
        let partition = self.calculated_buses(voltage_level_id, view)?;
        Ok(partition.bus_for_point(point).cloned())
    }

    /// Returns the calculated bus the given terminal is attached to.
    ///
    /// Returns `None` for detached bus-breaker terminals.
    pub fn bus_for_terminal(
        &self,
        terminal_ref: &TerminalRef,
        view: TopologyView,
    ) -> Result<Option<CalculatedBus>, Error> {
        let terminal = self.terminal(terminal_ref)?;
        let Some(point) = terminal.point() else {
            return Ok(None);
        };
        self.bus_for_point(terminal.voltage_level_id(), view, &point)
    }

    /// Returns true if the given terminal is connected.
    ///
    /// A bus-breaker terminal is connected while it is attached to its bus.  A
    /// node-breaker terminal is connected when its bus view bus contains a
    /// busbar section.
    pub fn is_terminal_connected(&self, terminal_ref: &TerminalRef) -> Result<bool, Error> {
        match self.terminal(terminal_ref)?.attachment() {
            Attachment::Bus { connected, .. } => Ok(*connected),
            Attachment::Node(_) => Ok(self
                .bus_for_terminal(terminal_ref, TopologyView::Bus)?
                .is_some_and(|bus| bus.has_busbar_section())),
        }
    }

    /// Drops the calculated topologies of the given voltage level, and the
    /// network-wide component numbering.
    ///
    /// Mutations made through the `Network` invalidate what they touch by
    /// themselves.  This is for callers that know the topology has to be
    /// recalculated for some other reason.
    pub fn invalidate(&self, voltage_level_id: &str) -> Result<(), Error> {
        self.voltage_level(voltage_level_id)?;
        self.invalidate_unchecked(voltage_level_id);
        Ok(())
    }

    pub(super) fn invalidate_unchecked(&self, voltage_level_id: &str) {
        tracing::debug!("Invalidating the topology of {}.", voltage_level_id);
        self.cache.invalidate(voltage_level_id);
        for listener in &self.listeners {
            listener.on_topology_invalidated(voltage_level_id);
        }
    }
}
