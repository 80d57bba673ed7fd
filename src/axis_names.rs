/// Centralized axis naming utilities
///
/// Provides consistent axis names across the analysis, CLI and report writers.

/// Number of rotational axes analysed per log.
pub const AXIS_COUNT: usize = 3;

/// Get all axis names as a static array
pub const AXIS_NAMES: [&str; AXIS_COUNT] = ["Roll", "Pitch", "Yaw"];

/// A rotational control axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAxis {
    Roll,
    Pitch,
    Yaw,
}

impl ControlAxis {
    pub const ALL: [ControlAxis; AXIS_COUNT] = [ControlAxis::Roll, ControlAxis::Pitch, ControlAxis::Yaw];

    pub fn index(&self) -> usize {
        match self {
            ControlAxis::Roll => 0,
            ControlAxis::Pitch => 1,
            ControlAxis::Yaw => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        AXIS_NAMES[self.index()]
    }
}
