// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Grid Topology

This is a library for calculating the electrical topology of the voltage
levels of a power network: which nodes and buses are electrically joined into
calculated buses, which buses are linked across the network, and which
switches to operate to connect or disconnect a piece of equipment.

## The network model

The main struct is [`Network`], which holds [`VoltageLevel`]s, the
[`Switch`]es inside them and the [`Equipment`] attached to them through
[`Terminal`]s.

Voltage levels come in two flavours, given by their [`TopologyKind`]:

- node-breaker voltage levels, made of integer nodes linked by switches and
  switchless internal connections, with busbar sections attached to nodes.
- bus-breaker voltage levels, made of named buses linked by switches, with
  terminals attached directly to buses.

All changes go through the methods of [`Network`], which check them before
applying them.  A change that would make a switch or terminal refer to a node
or bus that doesn't exist is rejected with an [`Error`].

## Calculated buses

[`calculated_buses`][Network::calculated_buses] partitions the nodes or buses
of a voltage level into [`CalculatedBus`]es, in one of two
[`TopologyView`]s:

- the bus-breaker view, in which retained switches stay boundaries.
- the bus view, which merges across every closed switch.

Results are cached per voltage level and view, and dropped whenever a change
touches the voltage level.  [`TopologyListener`]s registered with
[`add_listener`][Network::add_listener] are told about every change and every
dropped cache entry.

## Components

Bus view buses linked by branches with attached terminals share a connected
component number, and a synchronous component number unless the link is an
HVDC line:

- [`connected_component_number`][Network::connected_component_number]
- [`synchronous_component_number`][Network::synchronous_component_number]

## Connecting and disconnecting equipment

[`connect`][Network::connect] and [`disconnect`][Network::disconnect] operate
the switches between a piece of equipment and the busbar sections of its
voltage levels, restricted to the switches accepted by a caller-supplied
predicate.  Changes are all-or-nothing.
*/

mod config;
pub use config::TopologyConfig;

mod equipment_kind;
pub use equipment_kind::{EquipmentKind, SwitchKind};

mod error;
pub use error::Error;

mod listener;
pub use listener::TopologyListener;

mod model;
pub use model::{
    Attachment, ConnectionPoint, Equipment, Side, Switch, Terminal, TerminalRef, TopologyKind,
    TopologyView, VoltageLevel,
};

mod network;
pub use network::{CalculatedBus, Network, Partition};
