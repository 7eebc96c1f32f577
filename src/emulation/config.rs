//! Execution limits for the interpreter.

/// Bounds on a single magic-word calculation.
///
/// A keystream window is a few dozen instructions; the limits only matter for hostile or
/// misidentified input, where they turn runaway execution into an error.
///
/// # Default Values
///
/// | Setting | Default Value |
/// |---------|---------------|
/// | `max_stack_depth` | 1024 |
/// | `max_instructions` | 100,000 |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmulationLimits {
    /// Maximum evaluation stack depth.
    ///
    /// Pushing beyond this depth fails with a stack overflow error.
    pub max_stack_depth: usize,

    /// Maximum instructions to execute between two initialisations.
    ///
    /// Set to 0 for unlimited execution. When exceeded, emulation
    /// stops with an instruction limit error.
    pub max_instructions: u64,
}

impl Default for EmulationLimits {
    /// Creates default execution limits.
    ///
    /// See the struct documentation for default values.
    fn default() -> Self {
        Self {
            max_stack_depth: 1024,
            max_instructions: 100_000,
        }
    }
}

impl EmulationLimits {
    /// Creates limits with default values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use keyscope::emulation::EmulationLimits;
    ///
    /// let limits = EmulationLimits::new()
    ///     .with_max_instructions(5_000)
    ///     .with_max_stack_depth(64);
    /// assert_eq!(limits.max_stack_depth, 64);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum instruction count.
    ///
    /// # Arguments
    ///
    /// * `max` - Maximum instructions to execute (0 for unlimited)
    ///
    /// # Returns
    ///
    /// Returns `self` for method chaining.
    #[must_use]
    pub fn with_max_instructions(mut self, max: u64) -> Self {
        self.max_instructions = max;
        self
    }

    /// Sets the maximum evaluation stack depth.
    #[must_use]
    pub fn with_max_stack_depth(mut self, max: usize) -> Self {
        self.max_stack_depth = max;
        self
    }
}
