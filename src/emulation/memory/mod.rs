//! Interpreter state: the evaluation stack and the local/argument slots.

mod slots;
mod stack;

pub use slots::{SlotKind, SlotTable};
pub use stack::EvaluationStack;
