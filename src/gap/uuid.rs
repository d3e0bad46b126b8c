#![allow(clippy::use_self)]

use std::fmt::{Debug, Display, Formatter};
use std::num::{NonZeroU128, NonZeroU16};

const SHIFT: u32 = u128::BITS - u32::BITS;
const BASE: u128 = 0x00000000_0000_1000_8000_00805F9B34FB;
const MASK_16: u128 = !((u16::MAX as u128) << SHIFT);

/// Texas Instruments vendor base UUID `F000xxxx-0451-4000-B000-000000000000`.
const TI_BASE: u128 = 0xF0000000_0451_4000_B000_000000000000;

/// 16- or 128-bit UUID ([Vol 3] Part B, Section 2.5.1).
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Uuid(NonZeroU128);

impl Uuid {
    /// Creates a UUID from a `u128`.
    #[inline]
    #[must_use]
    pub const fn new(v: u128) -> Option<Self> {
        match NonZeroU128::new(v) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Creates a 128-bit vendor UUID derived from the TI base UUID.
    #[inline]
    #[must_use]
    pub const fn ti(v: u16) -> Self {
        match Self::new(TI_BASE | (v as u128) << SHIFT) {
            Some(u) => u,
            None => unreachable!(),
        }
    }

    /// Returns a [`Uuid16`] representation or [`None`] if the UUID is not an
    /// assigned 16-bit UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid16(self) -> Option<Uuid16> {
        match self.as_u16() {
            Some(v) => Uuid16::new(v),
            None => None,
        }
    }

    /// Converts an assigned 16-bit Bluetooth SIG UUID to `u16`.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> Option<u16> {
        #[allow(clippy::cast_possible_truncation)]
        let v = (self.0.get() >> SHIFT) as u16;
        if self.0.get() & MASK_16 == BASE && v > 0 {
            Some(v)
        } else {
            None
        }
    }

    /// Returns the UUID as a `u128`.
    #[inline(always)]
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0.get()
    }

    /// Returns the number of bytes used to encode the UUID in an attribute
    /// value: 2 for assigned 16-bit UUIDs and 16 otherwise.
    #[inline]
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        if self.as_u16().is_some() {
            2
        } else {
            16
        }
    }

    /// Returns the shortest little-endian encoding of the UUID.
    #[must_use]
    pub fn to_bytes(self) -> Vec<u8> {
        match self.as_u16() {
            Some(v) => v.to_le_bytes().to_vec(),
            None => self.0.get().to_le_bytes().to_vec(),
        }
    }
}

impl From<Uuid16> for Uuid {
    #[inline]
    fn from(u: Uuid16) -> Self {
        u.as_uuid()
    }
}

impl Debug for Uuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        #[allow(clippy::cast_possible_truncation)]
        if let Some(v) = self.as_u16() {
            write!(f, "{v:#06X}")
        } else {
            let v = self.0.get();
            write!(
                f,
                "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
                (v >> 96) as u32,
                (v >> 80) as u16,
                (v >> 64) as u16,
                (v >> 48) as u16,
                v & ((1 << 48) - 1)
            )
        }
    }
}

impl Display for Uuid {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// 16-bit Bluetooth SIG UUID.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Uuid16(NonZeroU16);

impl Uuid16 {
    /// Primary Service declaration ([Vol 3] Part G, Section 3.1).
    pub const PRIMARY_SERVICE: Self = uuid16(0x2800);
    /// Characteristic declaration ([Vol 3] Part G, Section 3.3.1).
    pub const CHARACTERISTIC: Self = uuid16(0x2803);
    /// Characteristic User Description ([Vol 3] Part G, Section 3.3.3.2).
    pub const USER_DESCRIPTION: Self = uuid16(0x2901);
    /// Client Characteristic Configuration ([Vol 3] Part G, Section 3.3.3.3).
    pub const CLIENT_CHARACTERISTIC_CONFIGURATION: Self = uuid16(0x2902);

    /// Creates a 16-bit SIG UUID from a `u16`.
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Option<Self> {
        match NonZeroU16::new(v) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Returns the 128-bit UUID representation.
    #[inline]
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        match Uuid::new((self.0.get() as u128) << SHIFT | BASE) {
            Some(u) => u,
            None => unreachable!(),
        }
    }

    /// Returns the raw 16-bit UUID value.
    #[inline(always)]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0.get()
    }
}

impl Debug for Uuid16 {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X}", self.0.get())
    }
}

impl Display for Uuid16 {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl From<Uuid16> for u16 {
    #[inline]
    fn from(u: Uuid16) -> Self {
        u.raw()
    }
}

impl PartialEq<Uuid16> for Uuid {
    #[inline]
    fn eq(&self, rhs: &Uuid16) -> bool {
        *self == rhs.as_uuid()
    }
}

/// Creates an assigned 16-bit SIG UUID from a non-zero `u16`.
const fn uuid16(v: u16) -> Uuid16 {
    match Uuid16::new(v) {
        Some(u) => u,
        None => panic!("zero UUID"),
    }
}
