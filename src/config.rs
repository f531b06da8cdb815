// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `Network`.

/// Configuration options for the `Network`.
#[derive(Clone, Default, Debug)]
pub struct TopologyConfig {
    /// Whether to hide calculated buses of the bus-breaker view that have no
    /// branch (line, transformer or HVDC line) terminal attached.
    ///
    /// Hidden buses are not listed and get no index, and the nodes or buses
    /// they contain don't map to any calculated bus in the bus-breaker view.
    /// The bus view is never filtered.
    pub hide_branchless_bus_breaker_buses: bool,
}
