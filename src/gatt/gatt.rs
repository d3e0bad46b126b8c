//! Generic Attribute Profile ([Vol 3] Part G) service core.
//!
//! A [`Service`] owns an immutable [`AttrTable`], the parameter values
//! referenced by its characteristics, and per-connection subscription state.
//! Client accesses arrive through the [`Io`] callback registered with the
//! [`Runtime`] and local updates are fanned out as notifications to all
//! subscribed connections.

use std::collections::TryReserveError;

use crate::att::ErrorCode;

pub use {
    config::*, consts::*, dispatch::*, io::*, runtime::*, service::*, store::*, subscription::*,
    table::*,
};

mod config;
mod consts;
mod dispatch;
mod io;
mod runtime;
mod service;
mod store;
mod subscription;
mod table;

#[cfg(test)]
pub(crate) mod tests;

/// Error type returned by the service API.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid length {len} for parameter {param} with capacity {cap}")]
    InvalidRange { param: ParamId, len: usize, cap: usize },
    #[error("invalid parameter {0}")]
    InvalidParameter(ParamId),
    #[error("failed to allocate subscription state: {0}")]
    Alloc(#[from] TryReserveError),
    #[error("application callback already registered")]
    AlreadyRegistered,
    #[error("attribute registration failed: {0}")]
    Register(ErrorCode),
    #[error(transparent)]
    Att(#[from] ErrorCode),
}

/// Common service result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
