use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use crate::att::{ConnHandle, ErrorCode, Handle, Method};
use crate::gap::Uuid;
use crate::util::name_of;

/// I/O callback result type.
pub type IoResult = std::result::Result<(), ErrorCode>;

/// Read and write callback registered with the attribute server.
#[derive(Clone)]
#[repr(transparent)]
pub struct Io(Arc<dyn for<'a> Fn(IoReq<'a>) -> IoResult + Send + Sync>);

impl Io {
    /// Returns an I/O callback for a method of `T`. The callback holds a weak
    /// reference and fails with `UnlikelyError` once `this` is dropped.
    #[inline]
    pub fn with<T: Send + Sync + 'static>(
        this: &Arc<T>,
        f: impl Fn(&T, IoReq) -> IoResult + Send + Sync + 'static,
    ) -> Self {
        let this: Weak<T> = Arc::downgrade(this);
        Self(Arc::new(move |req: IoReq| {
            this.upgrade()
                .map_or(Err(ErrorCode::UnlikelyError), |this| f(&this, req))
        }))
    }

    /// Executes a read request.
    #[inline(always)]
    pub fn read(&self, r: &mut ReadReq) -> IoResult {
        (self.0)(IoReq::Read(r))
    }

    /// Executes a write request.
    #[inline(always)]
    pub fn write(&self, w: &WriteReq) -> IoResult {
        (self.0)(IoReq::Write(w))
    }
}

impl Debug for Io {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        (f.debug_tuple(name_of!(Io)).field(&Arc::as_ptr(&self.0))).finish()
    }
}

impl<T: Fn(IoReq) -> IoResult + Send + Sync + 'static> From<T> for Io {
    #[inline(always)]
    fn from(f: T) -> Self {
        Self(Arc::new(f))
    }
}

/// Characteristic or descriptor I/O request.
#[derive(Debug)]
#[non_exhaustive]
pub enum IoReq<'a> {
    Read(&'a mut ReadReq),
    Write(&'a WriteReq<'a>),
}

/// Attribute read request from a connected client.
#[derive(Clone, Debug)]
pub struct ReadReq {
    conn: ConnHandle,
    hdl: Handle,
    uuid: Uuid,
    method: Method,
    off: u16,
    max_len: usize,
    buf: Vec<u8>,
}

impl ReadReq {
    /// Creates a read request for at most `max_len` bytes of the attribute
    /// value starting at `off`.
    #[inline]
    #[must_use]
    pub const fn new(
        conn: ConnHandle,
        hdl: Handle,
        uuid: Uuid,
        method: Method,
        off: u16,
        max_len: usize,
    ) -> Self {
        Self {
            conn,
            hdl,
            uuid,
            method,
            off,
            max_len,
            buf: Vec::new(),
        }
    }

    /// Returns the connection that issued the request.
    #[inline(always)]
    #[must_use]
    pub const fn conn(&self) -> ConnHandle {
        self.conn
    }

    /// Returns the attribute handle.
    #[inline(always)]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.hdl
    }

    /// Returns the attribute type.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the access method.
    #[inline(always)]
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the value offset.
    #[inline(always)]
    #[must_use]
    pub const fn offset(&self) -> u16 {
        self.off
    }

    /// Returns the maximum response value length.
    #[inline(always)]
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Returns the response value. This is empty until the request is
    /// completed and after a failed completion.
    #[inline(always)]
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.buf
    }

    /// Provides the complete attribute value with automatic offset and length
    /// handling.
    pub fn complete(&mut self, v: impl AsRef<[u8]>) -> IoResult {
        self.buf.clear();
        let v = window(v.as_ref(), self.off, self.max_len)?;
        self.buf.extend_from_slice(v);
        Ok(())
    }

    /// Sets the response to `v`, which already starts at the requested offset.
    /// The value is truncated to the maximum response length.
    pub fn respond(&mut self, v: &[u8]) {
        self.buf.clear();
        self.buf.extend_from_slice(&v[..v.len().min(self.max_len)]);
    }
}

/// Attribute write request from a connected client.
#[derive(Clone, Debug)]
pub struct WriteReq<'a> {
    conn: ConnHandle,
    hdl: Handle,
    uuid: Uuid,
    method: Method,
    off: u16,
    val: &'a [u8],
}

impl<'a> WriteReq<'a> {
    /// Creates a request to write `val` at offset `off`.
    #[inline]
    #[must_use]
    pub const fn new(
        conn: ConnHandle,
        hdl: Handle,
        uuid: Uuid,
        method: Method,
        off: u16,
        val: &'a [u8],
    ) -> Self {
        Self {
            conn,
            hdl,
            uuid,
            method,
            off,
            val,
        }
    }

    /// Returns the connection that issued the request.
    #[inline(always)]
    #[must_use]
    pub const fn conn(&self) -> ConnHandle {
        self.conn
    }

    /// Returns the attribute handle.
    #[inline(always)]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.hdl
    }

    /// Returns the attribute type.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the access method.
    #[inline(always)]
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the value offset.
    #[inline(always)]
    #[must_use]
    pub const fn offset(&self) -> u16 {
        self.off
    }

    /// Returns the value to be written at the specified offset.
    #[inline(always)]
    #[must_use]
    pub const fn value(&self) -> &'a [u8] {
        self.val
    }
}

/// Returns at most `max_len` bytes of `v` starting at `off`. Fails with
/// `InvalidOffset` if `off` is past the end of `v`. An offset equal to the
/// length returns an empty slice.
#[inline]
pub(crate) fn window(v: &[u8], off: u16, max_len: usize) -> Result<&[u8], ErrorCode> {
    let v = v.get(usize::from(off)..).ok_or(ErrorCode::InvalidOffset)?;
    Ok(&v[..v.len().min(max_len)])
}

/// Copies `val` into `dst` at `off`. Fails with `InvalidOffset`, leaving `dst`
/// unchanged, if the written range does not fit within `dst`. Returns whether
/// the written range ends at the end of `dst`.
#[inline]
pub(crate) fn update(dst: &mut [u8], off: u16, val: &[u8]) -> Result<bool, ErrorCode> {
    let start = usize::from(off);
    let end = start.checked_add(val.len()).ok_or(ErrorCode::InvalidOffset)?;
    let cap = dst.len();
    (dst.get_mut(start..end))
        .ok_or(ErrorCode::InvalidOffset)?
        .copy_from_slice(val);
    Ok(end == cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds() {
        let v = [0_u8, 1, 2, 3];
        for off in 0..=4_u16 {
            for max_len in 0..=6 {
                let r = window(&v, off, max_len).unwrap();
                let n = max_len.min(v.len() - usize::from(off));
                assert_eq!(r.len(), n);
                assert_eq!(r, &v[usize::from(off)..usize::from(off) + n]);
            }
        }
        for off in [5, 6, 0x100, u16::MAX] {
            assert_eq!(window(&v, off, 16), Err(ErrorCode::InvalidOffset));
        }
    }

    #[test]
    fn update_bounds() {
        let mut v = [0_u8; 4];
        assert_eq!(update(&mut v, 2, &[0xAA, 0xBB]), Ok(true));
        assert_eq!(v, [0, 0, 0xAA, 0xBB]);
        assert_eq!(update(&mut v, 0, &[1]), Ok(false));
        assert_eq!(v, [1, 0, 0xAA, 0xBB]);
        assert_eq!(update(&mut v, 4, &[]), Ok(true));

        assert_eq!(update(&mut v, 3, &[0xCC, 0xDD]), Err(ErrorCode::InvalidOffset));
        assert_eq!(update(&mut v, 5, &[]), Err(ErrorCode::InvalidOffset));
        assert_eq!(update(&mut v, u16::MAX, &[1]), Err(ErrorCode::InvalidOffset));
        assert_eq!(update(&mut v, 0, &[0; 5]), Err(ErrorCode::InvalidOffset));
        assert_eq!(v, [1, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn read_req() {
        let uuid = Uuid::ti(0x1191);
        let mut r = ReadReq::new(
            ConnHandle::new(1),
            Handle::MIN,
            uuid,
            Method::ReadBlob,
            2,
            1,
        );
        r.complete([1, 2, 3, 4]).unwrap();
        assert_eq!(r.value(), &[3]);

        let mut r = ReadReq::new(ConnHandle::new(1), Handle::MIN, uuid, Method::Read, 5, 22);
        assert_eq!(r.complete([1, 2, 3, 4]), Err(ErrorCode::InvalidOffset));
        assert!(r.value().is_empty());

        let mut r = ReadReq::new(ConnHandle::new(1), Handle::MIN, uuid, Method::ReadBlob, 1, 2);
        assert_eq!(r.max_len(), 2);
        r.respond(&[2, 3, 4]);
        assert_eq!(r.value(), &[2, 3]);
    }

    #[test]
    fn io_weak() {
        let this = Arc::new(());
        let io = Io::with(&this, |_, req| match req {
            IoReq::Read(r) => r.complete([7]),
            IoReq::Write(_) => Err(ErrorCode::WriteNotPermitted),
        });
        let uuid = Uuid::ti(0x1191);
        let mut r = ReadReq::new(ConnHandle::new(0), Handle::MIN, uuid, Method::Read, 0, 8);
        assert_eq!(io.read(&mut r), Ok(()));
        assert_eq!(r.value(), &[7]);
        let w = WriteReq::new(ConnHandle::new(0), Handle::MIN, uuid, Method::Write, 0, &[1]);
        assert_eq!(io.write(&w), Err(ErrorCode::WriteNotPermitted));
        drop(this);
        assert_eq!(io.read(&mut r), Err(ErrorCode::UnlikelyError));
    }
}
