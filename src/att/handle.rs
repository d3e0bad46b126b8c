use std::fmt::{Debug, Display, Formatter};
use std::num::NonZeroU16;

use crate::util::name_of;

/// Attribute handle ([Vol 3] Part F, Section 3.2.2).
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Handle(NonZeroU16);

impl Handle {
    /// Lowest valid handle.
    pub const MIN: Self = match Self::new(0x0001) {
        Some(h) => h,
        None => unreachable!(),
    };

    /// Wraps a raw handle. Returns `None` if the handle is invalid.
    #[inline]
    #[must_use]
    pub const fn new(h: u16) -> Option<Self> {
        match NonZeroU16::new(h) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Returns the next handle or `None` if the maximum handle was reached.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0.get().wrapping_add(1))
    }
}

impl Debug for Handle {
    #[allow(clippy::use_self)]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#06X})", name_of!(Handle), self.0.get())
    }
}

impl Display for Handle {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl From<Handle> for u16 {
    #[inline]
    fn from(h: Handle) -> Self {
        h.0.get()
    }
}

/// Link-layer connection handle ([Vol 4] Part E, Section 5.4.2). Assigned by
/// the connection manager and only used by the service as a lookup key.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ConnHandle(u16);

impl ConnHandle {
    /// Marker for an unused connection slot.
    pub const INVALID: Self = Self(0xFFFF);

    /// Largest handle value that may be assigned to a connection.
    const MAX: u16 = 0x0EFF;

    /// Wraps a raw connection handle.
    #[inline(always)]
    #[must_use]
    pub const fn new(h: u16) -> Self {
        Self(h)
    }

    /// Returns whether the handle can refer to an active connection.
    #[inline(always)]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 <= Self::MAX
    }
}

impl Debug for ConnHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "{}({:#06X})", name_of!(ConnHandle), self.0)
        } else {
            write!(f, "{}(INVALID)", name_of!(ConnHandle))
        }
    }
}

impl Display for ConnHandle {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Default for ConnHandle {
    #[inline(always)]
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<ConnHandle> for u16 {
    #[inline]
    fn from(h: ConnHandle) -> Self {
        h.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle() {
        assert_eq!(std::mem::size_of::<Option<Handle>>(), 2);
        assert!(Handle::new(0).is_none());
        assert_eq!(u16::from(Handle::MIN), 1);
        assert_eq!(Handle::MIN.next(), Handle::new(2));
        assert_eq!(Handle::new(0xFFFF).unwrap().next(), None);
        assert_eq!(Handle::new(0x2A).unwrap().to_string(), "Handle(0x002A)");
    }

    #[test]
    fn conn_handle() {
        assert!(ConnHandle::new(0).is_valid());
        assert!(ConnHandle::new(0x0EFF).is_valid());
        assert!(!ConnHandle::new(0x0F00).is_valid());
        assert!(!ConnHandle::INVALID.is_valid());
        assert_eq!(ConnHandle::default(), ConnHandle::INVALID);
        assert_eq!(ConnHandle::INVALID.to_string(), "ConnHandle(INVALID)");
    }
}
