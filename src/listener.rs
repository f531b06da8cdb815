// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the trait that needs to be implemented by the types
//! that want to be notified of topology changes.

use crate::{Switch, TerminalRef};

/**
This trait can be implemented by types that mirror the network elsewhere, for
example an attribute store that persists switch states and terminal
attachments.

Listeners are registered with
[`Network::add_listener`][crate::Network::add_listener] and are called after a
change has been applied and the affected cached topologies have been dropped.
All methods have empty default implementations.

<details>
<summary>Example implementation that records switch changes:</summary>

```ignore
use std::cell::RefCell;

#[derive(Default)]
struct SwitchJournal(RefCell<Vec<(String, bool)>>);

impl grid_topology::TopologyListener for SwitchJournal {
    fn on_switch_changed(&self, switch: &grid_topology::Switch) {
        self.0
            .borrow_mut()
            .push((switch.id().to_string(), switch.is_open()));
    }
}
```

</details>
*/
pub trait TopologyListener {
    /// Called after a switch has been opened or closed.
    fn on_switch_changed(&self, _switch: &Switch) {}
    /// Called after a bus-breaker terminal has been attached to or detached
    /// from its bus.
    fn on_terminal_changed(&self, _terminal: &TerminalRef, _connected: bool) {}
    /// Called after the cached topologies of a voltage level have been
    /// dropped.
    fn on_topology_invalidated(&self, _voltage_level_id: &str) {}
}
