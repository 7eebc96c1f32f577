//! CIL evaluation stack.
//!
//! [`EvaluationStack`] is the working area of the interpreter: instructions pop their operands
//! from it and push their results. The depth is bounded by
//! [`EmulationLimits::max_stack_depth`](crate::emulation::EmulationLimits::max_stack_depth);
//! exceeding it returns [`EmulationError::StackOverflow`].

use crate::{
    emulation::{EmValue, EmulationError},
    Result,
};

/// Evaluation stack with overflow protection.
///
/// # Example
///
/// ```rust
/// use keyscope::emulation::{EmValue, EvaluationStack};
///
/// let mut stack = EvaluationStack::new(2);
/// stack.push(EmValue::i32(1))?;
/// stack.push(EmValue::I64(2))?;
/// assert!(stack.push(EmValue::i32(3)).is_err());
///
/// assert_eq!(stack.pop()?, EmValue::I64(2));
/// assert_eq!(stack.depth(), 1);
/// # Ok::<(), keyscope::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct EvaluationStack {
    values: Vec<EmValue>,
    max_depth: usize,
}

impl EvaluationStack {
    /// Creates an empty stack holding at most `max_depth` values.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        EvaluationStack {
            values: Vec::with_capacity(max_depth.min(64)),
            max_depth,
        }
    }

    /// Pushes a value onto the stack.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::StackOverflow`] if the stack is full.
    pub fn push(&mut self, value: EmValue) -> Result<()> {
        if self.values.len() >= self.max_depth {
            return Err(EmulationError::StackOverflow {
                limit: self.max_depth,
            }
            .into());
        }
        self.values.push(value);
        Ok(())
    }

    /// Pops the top value.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::StackUnderflow`] if the stack is empty.
    pub fn pop(&mut self) -> Result<EmValue> {
        self.values
            .pop()
            .ok_or_else(|| EmulationError::StackUnderflow.into())
    }

    /// Pops `count` values and discards them.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::StackUnderflow`] if fewer than `count` values are present;
    /// the stack is left unchanged in that case.
    pub fn discard(&mut self, count: usize) -> Result<()> {
        let remaining = self
            .values
            .len()
            .checked_sub(count)
            .ok_or(EmulationError::StackUnderflow)?;
        self.values.truncate(remaining);
        Ok(())
    }

    /// Duplicates the top value.
    ///
    /// # Errors
    ///
    /// Returns an underflow error on an empty stack and an overflow error on a full one.
    pub fn dup(&mut self) -> Result<()> {
        let top = *self.peek()?;
        self.push(top)
    }

    /// The top value, without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::StackUnderflow`] if the stack is empty.
    pub fn peek(&self) -> Result<&EmValue> {
        self.values
            .last()
            .ok_or_else(|| EmulationError::StackUnderflow.into())
    }

    /// Number of values on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the stack holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Changes the depth limit; values already on the stack are kept.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }
}

impl Default for EvaluationStack {
    fn default() -> Self {
        Self::new(crate::emulation::EmulationLimits::default().max_stack_depth)
    }
}
