//! Storage for local variables and arguments.
//!
//! A [`SlotTable`] holds one [`EmValue`] per declared slot. Declared indices may be sparse;
//! accessing an index that was never declared is an error, just like an index past the end.
//! Every store is coerced to the declared [`CilFlavor`] of the slot.

use crate::{
    emulation::{EmValue, EmulationError},
    metadata::{method::Local, typesystem::CilFlavor},
    Result,
};

/// What a [`SlotTable`] stores; selects the error reported for bad indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SlotKind {
    /// Local variables (`ldloc`/`stloc`)
    #[default]
    Local,
    /// Parameters (`ldarg`/`starg`)
    Argument,
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    flavor: CilFlavor,
    value: EmValue,
}

/// Declared locals or arguments of the method being emulated.
///
/// # Example
///
/// ```rust
/// use keyscope::emulation::{EmValue, SlotKind, SlotTable};
/// use keyscope::metadata::{method::Local, typesystem::CilFlavor};
///
/// let mut locals = SlotTable::new(SlotKind::Local);
/// locals.reset(&[Local::new(0, CilFlavor::U1), Local::new(2, CilFlavor::I4)], true);
///
/// locals.set(0, EmValue::u32(0x1FF))?;
/// assert_eq!(locals.get(0)?, &EmValue::u32(0xFF));
/// assert_eq!(locals.get(2)?, &EmValue::u32(0));
/// assert!(locals.get(1).is_err());
/// # Ok::<(), keyscope::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct SlotTable {
    kind: SlotKind,
    slots: Vec<Option<Slot>>,
    declared: usize,
}

impl SlotTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(kind: SlotKind) -> Self {
        SlotTable {
            kind,
            slots: Vec::new(),
            declared: 0,
        }
    }

    /// Replaces the slots with `declared`.
    ///
    /// With `zero_init` every slot starts at the zero of its flavor, otherwise unknown.
    pub fn reset(&mut self, declared: &[Local], zero_init: bool) {
        self.slots.clear();
        self.declared = declared.len();

        for local in declared {
            let index = usize::from(local.index);
            if self.slots.len() <= index {
                self.slots.resize(index + 1, None);
            }

            let value = if zero_init {
                EmValue::zero_of(local.flavor)
            } else {
                EmValue::Unknown
            };
            self.slots[index].get_or_insert(Slot {
                flavor: local.flavor,
                value,
            });
        }
    }

    /// The current value of slot `index`.
    ///
    /// # Errors
    ///
    /// Returns an out-of-bounds error if the slot was not declared.
    pub fn get(&self, index: u16) -> Result<&EmValue> {
        self.slot(index)
            .map(|slot| &slot.value)
            .ok_or_else(|| Self::index_error(self.kind, index, self.declared))
    }

    /// Stores `value` into slot `index`, coerced to the slot's flavor.
    ///
    /// # Errors
    ///
    /// Returns an out-of-bounds error if the slot was not declared.
    pub fn set(&mut self, index: u16, value: EmValue) -> Result<()> {
        let (kind, count) = (self.kind, self.declared);
        let slot = self
            .slots
            .get_mut(usize::from(index))
            .and_then(Option::as_mut)
            .ok_or_else(|| Self::index_error(kind, index, count))?;
        slot.value = value.coerce_to(slot.flavor);
        Ok(())
    }

    /// Declared flavor of slot `index`.
    #[must_use]
    pub fn flavor(&self, index: u16) -> Option<CilFlavor> {
        self.slot(index).map(|slot| slot.flavor)
    }

    /// Number of declared slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declared
    }

    /// Returns `true` if no slot is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared == 0
    }

    fn slot(&self, index: u16) -> Option<&Slot> {
        self.slots.get(usize::from(index)).and_then(Option::as_ref)
    }

    fn index_error(kind: SlotKind, index: u16, count: usize) -> crate::Error {
        match kind {
            SlotKind::Local => EmulationError::LocalIndexOutOfBounds { index, count },
            SlotKind::Argument => EmulationError::ArgumentIndexOutOfBounds { index, count },
        }
        .into()
    }
}
