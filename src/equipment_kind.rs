// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `EquipmentKind` and `SwitchKind` enums, which
//! represent the kind of a piece of equipment and of a switch.

use std::fmt::Display;

/// Represents the kind of a switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwitchKind {
    Breaker,
    Disconnector,
    LoadBreakSwitch,
}

impl Display for SwitchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchKind::Breaker => write!(f, "Breaker"),
            SwitchKind::Disconnector => write!(f, "Disconnector"),
            SwitchKind::LoadBreakSwitch => write!(f, "LoadBreakSwitch"),
        }
    }
}

/// Represents the kind of a piece of equipment attached to voltage levels
/// through its terminals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EquipmentKind {
    BusbarSection,
    Load,
    Generator,
    Battery,
    ShuntCompensator,
    StaticVarCompensator,
    DanglingLine,
    Line,
    TwoWindingsTransformer,
    ThreeWindingsTransformer,
    HvdcLine,
}

impl EquipmentKind {
    /// Returns the number of terminals a piece of equipment of this kind has.
    pub fn terminal_count(&self) -> usize {
        match self {
            EquipmentKind::Line
            | EquipmentKind::TwoWindingsTransformer
            | EquipmentKind::HvdcLine => 2,
            EquipmentKind::ThreeWindingsTransformer => 3,
            _ => 1,
        }
    }
}

impl Display for EquipmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquipmentKind::BusbarSection => write!(f, "BusbarSection"),
            EquipmentKind::Load => write!(f, "Load"),
            EquipmentKind::Generator => write!(f, "Generator"),
            EquipmentKind::Battery => write!(f, "Battery"),
            EquipmentKind::ShuntCompensator => write!(f, "ShuntCompensator"),
            EquipmentKind::StaticVarCompensator => write!(f, "StaticVarCompensator"),
            EquipmentKind::DanglingLine => write!(f, "DanglingLine"),
            EquipmentKind::Line => write!(f, "Line"),
            EquipmentKind::TwoWindingsTransformer => write!(f, "TwoWindingsTransformer"),
            EquipmentKind::ThreeWindingsTransformer => write!(f, "ThreeWindingsTransformer"),
            EquipmentKind::HvdcLine => write!(f, "HvdcLine"),
        }
    }
}

/// Predicates for checking the kind of a piece of equipment.
pub(crate) trait KindPredicates {
    fn equipment_kind(&self) -> EquipmentKind;

    fn is_busbar_section(&self) -> bool {
        self.equipment_kind() == EquipmentKind::BusbarSection
    }

    /// Branches are the equipment that link calculated buses together, across
    /// voltage levels.
    fn is_branch(&self) -> bool {
        matches!(
            self.equipment_kind(),
            EquipmentKind::Line
                | EquipmentKind::TwoWindingsTransformer
                | EquipmentKind::ThreeWindingsTransformer
                | EquipmentKind::HvdcLine
        )
    }

    fn is_dc_link(&self) -> bool {
        self.equipment_kind() == EquipmentKind::HvdcLine
    }
}

impl KindPredicates for EquipmentKind {
    fn equipment_kind(&self) -> EquipmentKind {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(EquipmentKind::BusbarSection.is_busbar_section());
        assert!(!EquipmentKind::BusbarSection.is_branch());

        assert!(EquipmentKind::Line.is_branch());
        assert!(EquipmentKind::ThreeWindingsTransformer.is_branch());
        assert!(!EquipmentKind::DanglingLine.is_branch());
        assert!(!EquipmentKind::Line.is_dc_link());

        assert!(EquipmentKind::HvdcLine.is_branch());
        assert!(EquipmentKind::HvdcLine.is_dc_link());
    }

    #[test]
    fn test_terminal_count() {
        assert_eq!(EquipmentKind::Load.terminal_count(), 1);
        assert_eq!(EquipmentKind::BusbarSection.terminal_count(), 1);
        assert_eq!(EquipmentKind::HvdcLine.terminal_count(), 2);
        assert_eq!(EquipmentKind::ThreeWindingsTransformer.terminal_count(), 3);
    }
}
