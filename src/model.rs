// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The raw network model that topologies are calculated from: voltage levels,
//! the switches inside them, and the equipment attached to them through
//! terminals.

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::{equipment_kind::KindPredicates, EquipmentKind, SwitchKind};

/// How the wiring of a voltage level is described.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopologyKind {
    /// Equipment and busbar sections attach to integer nodes, linked by
    /// switches and internal connections.
    NodeBreaker,
    /// Equipment attaches directly to named buses, linked by switches.
    BusBreaker,
}

/// The view a topology is calculated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopologyView {
    /// The "as wired" view. In node-breaker voltage levels, retained switches
    /// stay boundaries between calculated buses even when closed.
    BusBreaker,
    /// The simplified view used for network-wide analysis, that merges across
    /// every closed switch.
    Bus,
}

impl Display for TopologyView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyView::BusBreaker => write!(f, "bus-breaker"),
            TopologyView::Bus => write!(f, "bus"),
        }
    }
}

/// A node of a node-breaker voltage level, or a configured bus of a
/// bus-breaker voltage level.
///
/// Nodes order before buses, nodes by number and buses by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionPoint {
    Node(u32),
    Bus(String),
}

impl ConnectionPoint {
    /// Creates a [`ConnectionPoint::Bus`] from the given bus id.
    pub fn bus(id: impl Into<String>) -> Self {
        ConnectionPoint::Bus(id.into())
    }

    pub(crate) fn is_node(&self) -> bool {
        matches!(self, ConnectionPoint::Node(_))
    }

    /// Returns true if this kind of point is allowed in a voltage level with
    /// the given topology kind.
    pub(crate) fn fits(&self, topology_kind: TopologyKind) -> bool {
        self.is_node() == (topology_kind == TopologyKind::NodeBreaker)
    }
}

impl Display for ConnectionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionPoint::Node(node) => write!(f, "node {node}"),
            ConnectionPoint::Bus(bus) => write!(f, "bus {bus}"),
        }
    }
}

/// The side of a terminal of multi-terminal equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    One,
    Two,
    Three,
}

impl Side {
    /// Returns the 0-based position of the side's terminal.
    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
            Side::Three => 2,
        }
    }

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::One),
            1 => Some(Side::Two),
            2 => Some(Side::Three),
            _ => None,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::One => write!(f, "ONE"),
            Side::Two => write!(f, "TWO"),
            Side::Three => write!(f, "THREE"),
        }
    }
}

/// Identifies a terminal by its equipment and side.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalRef {
    pub equipment_id: String,
    pub side: Side,
}

impl TerminalRef {
    pub fn new(equipment_id: impl Into<String>, side: Side) -> Self {
        Self {
            equipment_id: equipment_id.into(),
            side,
        }
    }
}

impl Display for TerminalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.equipment_id, self.side)
    }
}

/// Where a terminal is attached inside its voltage level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attachment {
    /// Attached to a node. Node-breaker terminals never detach, they are
    /// connected or disconnected by operating switches.
    Node(u32),
    /// Attached to `connectable_bus` while `connected` is set.
    Bus {
        connectable_bus: String,
        connected: bool,
    },
}

/// A terminal of a piece of equipment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terminal {
    voltage_level_id: String,
    attachment: Attachment,
}

impl Terminal {
    /// Creates a terminal attached to a node of a node-breaker voltage level.
    pub fn node(voltage_level_id: impl Into<String>, node: u32) -> Self {
        Self {
            voltage_level_id: voltage_level_id.into(),
            attachment: Attachment::Node(node),
        }
    }

    /// Creates a terminal connected to a bus of a bus-breaker voltage level.
    pub fn bus(voltage_level_id: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            voltage_level_id: voltage_level_id.into(),
            attachment: Attachment::Bus {
                connectable_bus: bus.into(),
                connected: true,
            },
        }
    }

    /// Creates a terminal of a bus-breaker voltage level that is disconnected,
    /// but can be connected to the given bus.
    pub fn disconnected_bus(voltage_level_id: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            voltage_level_id: voltage_level_id.into(),
            attachment: Attachment::Bus {
                connectable_bus: bus.into(),
                connected: false,
            },
        }
    }

    pub fn voltage_level_id(&self) -> &str {
        &self.voltage_level_id
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    /// Returns the node or bus the terminal is currently attached to, or
    /// `None` for a disconnected bus-breaker terminal.
    pub fn point(&self) -> Option<ConnectionPoint> {
        match &self.attachment {
            Attachment::Node(node) => Some(ConnectionPoint::Node(*node)),
            Attachment::Bus {
                connectable_bus,
                connected: true,
            } => Some(ConnectionPoint::Bus(connectable_bus.clone())),
            Attachment::Bus { .. } => None,
        }
    }

    /// Returns the node or bus the terminal is attached to when connected.
    pub fn connectable_point(&self) -> ConnectionPoint {
        match &self.attachment {
            Attachment::Node(node) => ConnectionPoint::Node(*node),
            Attachment::Bus {
                connectable_bus, ..
            } => ConnectionPoint::Bus(connectable_bus.clone()),
        }
    }

    pub(crate) fn set_bus_connected(&mut self, value: bool) {
        if let Attachment::Bus { connected, .. } = &mut self.attachment {
            *connected = value;
        }
    }
}

/// A switch between two nodes or two buses of a voltage level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Switch {
    id: String,
    voltage_level_id: String,
    kind: SwitchKind,
    endpoints: (ConnectionPoint, ConnectionPoint),
    open: bool,
    retained: bool,
}

impl Switch {
    /// Creates a closed, non-retained switch between two nodes.
    pub fn between_nodes(
        id: impl Into<String>,
        voltage_level_id: impl Into<String>,
        kind: SwitchKind,
        node1: u32,
        node2: u32,
    ) -> Self {
        Self {
            id: id.into(),
            voltage_level_id: voltage_level_id.into(),
            kind,
            endpoints: (ConnectionPoint::Node(node1), ConnectionPoint::Node(node2)),
            open: false,
            retained: false,
        }
    }

    /// Creates a closed switch between two configured buses.
    pub fn between_buses(
        id: impl Into<String>,
        voltage_level_id: impl Into<String>,
        kind: SwitchKind,
        bus1: impl Into<String>,
        bus2: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            voltage_level_id: voltage_level_id.into(),
            kind,
            endpoints: (ConnectionPoint::bus(bus1), ConnectionPoint::bus(bus2)),
            open: false,
            retained: false,
        }
    }

    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub fn with_retained(mut self, retained: bool) -> Self {
        self.retained = retained;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn voltage_level_id(&self) -> &str {
        &self.voltage_level_id
    }

    pub fn kind(&self) -> SwitchKind {
        self.kind
    }

    pub fn endpoints(&self) -> &(ConnectionPoint, ConnectionPoint) {
        &self.endpoints
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_retained(&self) -> bool {
        self.retained
    }

    pub fn is_breaker(&self) -> bool {
        self.kind == SwitchKind::Breaker
    }

    pub fn is_disconnector(&self) -> bool {
        self.kind == SwitchKind::Disconnector
    }

    pub(crate) fn set_open(&mut self, open: bool) {
        self.open = open;
    }
}

/// A voltage level and the index of what it contains.
///
/// Switches and equipment are stored by the [`Network`][crate::Network]; the
/// voltage level only keeps their ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoltageLevel {
    id: String,
    topology_kind: TopologyKind,
    pub(crate) points: BTreeSet<ConnectionPoint>,
    pub(crate) switches: BTreeSet<String>,
    pub(crate) internal_connections: Vec<(u32, u32)>,
    pub(crate) terminals: BTreeSet<TerminalRef>,
}

impl VoltageLevel {
    pub(crate) fn new(id: String, topology_kind: TopologyKind) -> Self {
        Self {
            id,
            topology_kind,
            points: BTreeSet::new(),
            switches: BTreeSet::new(),
            internal_connections: vec![],
            terminals: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topology_kind(&self) -> TopologyKind {
        self.topology_kind
    }

    /// Returns the nodes or configured buses of the voltage level, in
    /// ascending order.
    pub fn points(&self) -> impl Iterator<Item = &ConnectionPoint> {
        self.points.iter()
    }

    pub fn switch_ids(&self) -> impl Iterator<Item = &str> {
        self.switches.iter().map(String::as_str)
    }

    pub fn internal_connections(&self) -> &[(u32, u32)] {
        &self.internal_connections
    }

    /// Returns the terminals attached to the voltage level, connected or not.
    pub fn terminals(&self) -> impl Iterator<Item = &TerminalRef> {
        self.terminals.iter()
    }
}

/// A piece of equipment and its terminals, ordered by side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equipment {
    id: String,
    kind: EquipmentKind,
    pub(crate) terminals: Vec<Terminal>,
}

impl Equipment {
    pub fn new(id: impl Into<String>, kind: EquipmentKind, terminals: Vec<Terminal>) -> Self {
        Self {
            id: id.into(),
            kind,
            terminals,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EquipmentKind {
        self.kind
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn terminal(&self, side: Side) -> Option<&Terminal> {
        self.terminals.get(side.index())
    }

    /// Returns references to all terminals of the equipment.
    pub fn terminal_refs(&self) -> impl Iterator<Item = TerminalRef> + '_ {
        (0..self.terminals.len())
            .filter_map(Side::from_index)
            .map(|side| TerminalRef::new(self.id.clone(), side))
    }
}

impl KindPredicates for Equipment {
    fn equipment_kind(&self) -> EquipmentKind {
        self.kind
    }
}
