//! Supporting types for method bodies: header flags and declared storage slots.

use bitflags::bitflags;

use crate::metadata::typesystem::CilFlavor;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags that a method body can have
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// Flag of the fat method header, showing that there are more data sections appended to the header
        const MORE_SECTS = 0x8;
        /// Flag to indicate that this method should call the default constructor on all local variables
        const INIT_LOCALS = 0x10;
    }
}

/// A declared local variable (or parameter) slot of a method.
///
/// Slots are unique by `index` and kept in declaration order by [`crate::metadata::method::Method`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Local {
    /// Zero-based slot index as referenced by `ldloc`/`stloc` (or `ldarg`/`starg`)
    pub index: u16,
    /// Declared kind of the slot
    pub flavor: CilFlavor,
}

impl Local {
    /// Create a new slot descriptor.
    #[must_use]
    pub const fn new(index: u16, flavor: CilFlavor) -> Self {
        Local { index, flavor }
    }
}
