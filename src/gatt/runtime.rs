use std::fmt::Debug;

use crate::att::{ConnHandle, ErrorCode, Handle, DEFAULT_MTU, NTF_HDR_LEN};

use super::*;

/// Attribute server and transport used by a [`Service`].
pub trait Runtime: Debug + Send + Sync {
    /// Returns the maximum number of concurrent connections.
    fn max_connections(&self) -> usize;

    /// Registers the attribute table with the attribute server. Client
    /// accesses of the table must be forwarded to `io`. Attributes require an
    /// encryption key of at least `key_len` bytes.
    fn register(&self, tbl: &AttrTable, key_len: u8, io: Io) -> Result<(), ErrorCode>;

    /// Sends a notification of attribute `hdl` to connection `conn`.
    fn notify(&self, conn: ConnHandle, hdl: Handle, val: &[u8]) -> Result<(), ErrorCode>;

    /// Returns the maximum notification value length for connection `conn`.
    #[inline]
    fn max_payload(&self, _: ConnHandle) -> usize {
        usize::from(DEFAULT_MTU) - NTF_HDR_LEN
    }
}
