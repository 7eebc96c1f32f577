//! Configuration for the resource decrypter.
//!
//! This module provides the knobs that control how a decrypter method is recognised and how
//! much work the abstract interpreter may do per magic-word calculation.

use bitflags::bitflags;

use crate::emulation::EmulationLimits;

bitflags! {
    /// Loop-locating strategies that may be tried, always in the order listed here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LocateStrategies: u8 {
        /// Byte-shift loop body with a branch back to the accumulator update
        const TWO_PHASE = 0x1;
        /// Floating-point round trip closing the update (`conv.r.un; conv.r8; conv.u4; add`)
        const SINGLE_PHASE = 0x2;
    }
}

impl Default for LocateStrategies {
    fn default() -> Self {
        Self::all()
    }
}

/// Configuration for [`crate::deobfuscation::ResourceDecrypter`].
///
/// # Example
///
/// ```rust
/// use keyscope::deobfuscation::{DecrypterConfig, LocateStrategies};
/// use keyscope::emulation::EmulationLimits;
///
/// let config = DecrypterConfig::single_phase_only()
///     .with_limits(EmulationLimits::new().with_max_instructions(512));
///
/// assert_eq!(config.strategies, LocateStrategies::SINGLE_PHASE);
/// assert_eq!(config.limits.max_instructions, 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecrypterConfig {
    /// Which locating strategies are enabled (default: both).
    pub strategies: LocateStrategies,

    /// Limits handed to the interpreter for every calculation.
    pub limits: EmulationLimits,
}

impl Default for DecrypterConfig {
    fn default() -> Self {
        Self {
            strategies: LocateStrategies::default(),
            limits: EmulationLimits::default(),
        }
    }
}

impl DecrypterConfig {
    /// Only recognise two-phase (byte-shift) loops.
    #[must_use]
    pub fn two_phase_only() -> Self {
        Self {
            strategies: LocateStrategies::TWO_PHASE,
            ..Self::default()
        }
    }

    /// Only recognise single-phase (floating-point round trip) loops.
    #[must_use]
    pub fn single_phase_only() -> Self {
        Self {
            strategies: LocateStrategies::SINGLE_PHASE,
            ..Self::default()
        }
    }

    /// Replaces the enabled strategies.
    #[must_use]
    pub fn with_strategies(mut self, strategies: LocateStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    /// Replaces the interpreter limits.
    #[must_use]
    pub fn with_limits(mut self, limits: EmulationLimits) -> Self {
        self.limits = limits;
        self
    }
}
