// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A mutable model of the voltage levels of a power network, and the
//! topologies calculated from it.

mod cache;
mod components;
mod creation;
mod graph_builder;
mod mutation;
mod resolver;
mod retrieval;
mod traversal;
mod validation;

#[cfg(test)]
mod test_utils;

pub use resolver::{CalculatedBus, Partition};

use crate::{Equipment, Switch, TopologyConfig, TopologyListener, VoltageLevel};
use cache::TopologyCache;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One state of a power network, with the calculated buses and component
/// numbers derived from it.
///
/// All reads observe the latest mutation: every mutating method drops the
/// cached topologies it affects before returning, and they are recalculated
/// on the next read.
///
/// A `Network` is meant to be used from a single thread. Cloning it creates
/// an independent copy of the network state, sharing only the registered
/// listeners.
#[derive(Clone, Default)]
pub struct Network {
    config: TopologyConfig,
    voltage_levels: BTreeMap<String, VoltageLevel>,
    switches: BTreeMap<String, Switch>,
    equipment: BTreeMap<String, Equipment>,
    cache: TopologyCache,
    listeners: Vec<Rc<dyn TopologyListener>>,
}
