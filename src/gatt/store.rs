use tracing::debug;

use crate::att::{ErrorCode, MAX_VAL_LEN};

use super::io::{update, window};
use super::*;

/// Fixed-capacity characteristic value definition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Param {
    id: ParamId,
    cap: usize,
}

impl Param {
    /// Defines parameter `id` with a value of exactly `cap` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `cap` is zero or greater than the maximum attribute value
    /// length.
    #[inline]
    #[must_use]
    pub const fn new(id: ParamId, cap: usize) -> Self {
        assert!(0 < cap && cap <= MAX_VAL_LEN, "invalid parameter capacity");
        Self { id, cap }
    }

    /// Returns the parameter identifier.
    #[inline(always)]
    #[must_use]
    pub const fn id(self) -> ParamId {
        self.id
    }

    /// Returns the value capacity.
    #[inline(always)]
    #[must_use]
    pub const fn capacity(self) -> usize {
        self.cap
    }
}

/// Backing buffers of all parameter values. Every value is a fixed-width
/// record: its length is always equal to its capacity.
#[derive(Clone, Debug)]
pub struct Store {
    vals: Box<[Slot]>,
    completion: Completion,
}

/// Parameter value with optional write coverage tracking.
#[derive(Clone, Debug)]
struct Slot {
    id: ParamId,
    buf: Box<[u8]>,
    /// Bytes written since the last completion when using
    /// `Completion::FullyWritten`.
    written: Box<[bool]>,
}

impl Store {
    /// Creates zero-initialized values for all parameters.
    #[must_use]
    pub fn new(params: impl IntoIterator<Item = Param>, completion: Completion) -> Self {
        let track = completion == Completion::FullyWritten;
        let vals = (params.into_iter())
            .map(|p| Slot {
                id: p.id,
                buf: vec![0; p.cap].into_boxed_slice(),
                written: vec![false; if track { p.cap } else { 0 }].into_boxed_slice(),
            })
            .collect();
        Self { vals, completion }
    }

    /// Returns the capacity of parameter `id`.
    #[inline]
    #[must_use]
    pub fn capacity(&self, id: ParamId) -> Option<usize> {
        self.slot(id).map(|s| s.buf.len())
    }

    /// Returns the current value of parameter `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ParamId) -> Option<&[u8]> {
        self.slot(id).map(|s| &*s.buf)
    }

    /// Returns at most `max_len` bytes of parameter `id` starting at `off`.
    pub fn read(&self, id: ParamId, off: u16, max_len: usize) -> Result<&[u8], ErrorCode> {
        let s = self.slot(id).ok_or(ErrorCode::AttributeNotFound)?;
        window(&s.buf, off, max_len)
    }

    /// Writes `val` into parameter `id` at `off`. The value is unchanged if the
    /// write does not fit. Returns whether the write completed the value
    /// according to the configured completion rule.
    pub fn write(&mut self, id: ParamId, off: u16, val: &[u8]) -> Result<bool, ErrorCode> {
        let completion = self.completion;
        let s = self.slot_mut(id).ok_or(ErrorCode::AttributeNotFound)?;
        let at_end = update(&mut s.buf, off, val)?;
        Ok(match completion {
            Completion::EndOfValue => at_end,
            Completion::FullyWritten => {
                let start = usize::from(off);
                s.written[start..start + val.len()].fill(true);
                let done = s.written.iter().all(|&w| w);
                if done {
                    s.written.fill(false);
                }
                done
            }
        })
    }

    /// Replaces the entire value of parameter `id`.
    pub fn set(&mut self, id: ParamId, val: &[u8]) -> Result<()> {
        let s = self.slot_mut(id).ok_or(Error::InvalidParameter(id))?;
        if val.len() != s.buf.len() {
            return Err(Error::InvalidRange {
                param: id,
                len: val.len(),
                cap: s.buf.len(),
            });
        }
        s.buf.copy_from_slice(val);
        s.written.fill(false);
        debug!("Parameter {id} set to {val:02X?}");
        Ok(())
    }

    #[inline]
    fn slot(&self, id: ParamId) -> Option<&Slot> {
        self.vals.iter().find(|s| s.id == id)
    }

    #[inline]
    fn slot_mut(&mut self, id: ParamId) -> Option<&mut Slot> {
        self.vals.iter_mut().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: ParamId = 7;

    fn store(completion: Completion) -> Store {
        Store::new([Param::new(ID, 4), Param::new(ID + 1, 2)], completion)
    }

    #[test]
    fn read_bounds() {
        let mut s = store(Completion::EndOfValue);
        s.set(ID, &[1, 2, 3, 4]).unwrap();
        for off in 0..=4_u16 {
            for max_len in 0..=8 {
                let v = s.read(ID, off, max_len).unwrap();
                assert_eq!(v.len(), max_len.min(4 - usize::from(off)));
            }
        }
        assert_eq!(s.read(ID, 1, 2).unwrap(), &[2, 3]);
        assert_eq!(s.read(ID, 4, 8).unwrap(), &[] as &[u8]);
        assert_eq!(s.read(ID, 5, 8), Err(ErrorCode::InvalidOffset));
        assert_eq!(s.read(0xFF, 0, 8), Err(ErrorCode::AttributeNotFound));
    }

    #[test]
    fn write_end_of_value() {
        let mut s = store(Completion::EndOfValue);
        assert_eq!(s.write(ID, 2, &[0xAA, 0xBB]), Ok(true));
        assert_eq!(s.get(ID).unwrap(), &[0, 0, 0xAA, 0xBB]);

        assert_eq!(s.write(ID, 3, &[0xCC, 0xDD]), Err(ErrorCode::InvalidOffset));
        assert_eq!(s.get(ID).unwrap(), &[0, 0, 0xAA, 0xBB]);

        // Covering the whole value without ending at capacity never completes
        assert_eq!(s.write(ID, 2, &[1]), Ok(false));
        assert_eq!(s.write(ID, 0, &[1, 2]), Ok(false));
        assert_eq!(s.write(ID, 0, &[1, 2, 3, 4]), Ok(true));
        assert_eq!(s.get(ID + 1).unwrap(), &[0, 0]);
    }

    #[test]
    fn write_fully_written() {
        let mut s = store(Completion::FullyWritten);
        assert_eq!(s.write(ID, 2, &[3, 4]), Ok(false));
        assert_eq!(s.write(ID, 0, &[1, 2]), Ok(true));
        assert_eq!(s.get(ID).unwrap(), &[1, 2, 3, 4]);

        // Coverage restarts after completion
        assert_eq!(s.write(ID, 2, &[5, 6]), Ok(false));
        assert_eq!(s.write(ID, 1, &[9, 9, 9, 9]), Err(ErrorCode::InvalidOffset));
        s.set(ID, &[0; 4]).unwrap();
        assert_eq!(s.write(ID, 0, &[1, 1]), Ok(false));
        assert_eq!(s.write(ID, 0, &[1, 1, 1, 1]), Ok(true));
    }

    #[test]
    fn set() {
        let mut s = store(Completion::EndOfValue);
        assert_eq!(
            s.set(ID, &[1, 2, 3]),
            Err(Error::InvalidRange {
                param: ID,
                len: 3,
                cap: 4
            })
        );
        assert_eq!(s.get(ID).unwrap(), &[0; 4]);
        assert_eq!(s.set(0xFF, &[1]), Err(Error::InvalidParameter(0xFF)));
        s.set(ID + 1, &[1, 2]).unwrap();
        assert_eq!(s.get(ID + 1).unwrap(), &[1, 2]);
        assert_eq!(s.capacity(ID), Some(4));
        assert_eq!(s.capacity(0xFF), None);
    }
}
