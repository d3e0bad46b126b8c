use std::collections::TryReserveError;

use tracing::{debug, warn};

use crate::att::{ConnHandle, ErrorCode};

use super::*;

/// Per-connection notification configuration of one characteristic.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Subscription {
    pub conn: ConnHandle,
    pub cfg: Cccd,
}

/// Client Characteristic Configuration state of one notifiable characteristic
/// for every concurrent connection. The number of slots is fixed when the
/// table is created.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionTable {
    slots: Box<[Subscription]>,
}

impl SubscriptionTable {
    /// Allocates a table with `n` slots, all set to an invalid connection
    /// handle with notifications off.
    pub fn new(n: usize) -> std::result::Result<Self, TryReserveError> {
        let mut v = Vec::new();
        v.try_reserve_exact(n)?;
        v.resize(n, Subscription::default());
        Ok(Self {
            slots: v.into_boxed_slice(),
        })
    }

    /// Returns the number of slots.
    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the configuration of connection `conn`.
    #[must_use]
    pub fn get(&self, conn: ConnHandle) -> Cccd {
        self.find(conn).map_or(Cccd::empty(), |s| s.cfg)
    }

    /// Sets the configuration of connection `conn`. An empty configuration
    /// releases the connection's slot. Fails with `InsufficientResources` if
    /// all slots are taken by other connections.
    pub fn set(&mut self, conn: ConnHandle, cfg: Cccd) -> Result<(), ErrorCode> {
        if !conn.is_valid() {
            return Err(ErrorCode::UnlikelyError);
        }
        if cfg.is_empty() {
            self.remove(conn);
            return Ok(());
        }
        let i = (self.slots.iter().position(|s| s.conn == conn))
            .or_else(|| self.slots.iter().position(|s| !s.conn.is_valid()))
            .ok_or(ErrorCode::InsufficientResources)?;
        self.slots[i] = Subscription { conn, cfg };
        Ok(())
    }

    /// Processes a client write of the configuration descriptor
    /// ([Vol 3] Part G, Section 3.3.3.3). Only configuration bits in `allow`
    /// are accepted.
    pub fn write(
        &mut self,
        conn: ConnHandle,
        off: u16,
        val: &[u8],
        allow: Cccd,
    ) -> Result<Cccd, ErrorCode> {
        if off != 0 {
            warn!("CCCD write at offset {off} from {conn}");
            return Err(ErrorCode::AttributeNotLong);
        }
        let Ok(raw) = <[u8; Cccd::LEN]>::try_from(val) else {
            warn!("CCCD write with invalid length {} from {conn}", val.len());
            return Err(ErrorCode::InvalidAttributeValueLength);
        };
        let raw = u16::from_le_bytes(raw);
        let cfg = match Cccd::from_bits(raw) {
            Some(cfg) if allow.contains(cfg) => cfg,
            _ => {
                warn!("CCCD write of {raw:#06X} from {conn} not allowed (allow {allow:?})");
                return Err(ErrorCode::CccdImproperlyConfigured);
            }
        };
        self.set(conn, cfg)?;
        debug!("{conn} configured {cfg:?}");
        Ok(cfg)
    }

    /// Resets the slot of connection `conn`, if any.
    pub fn remove(&mut self, conn: ConnHandle) {
        if let Some(s) = self.slots.iter_mut().find(|s| s.conn == conn) {
            *s = Subscription::default();
        }
    }

    /// Returns an iterator over valid connections whose configuration
    /// intersects `want`.
    pub fn subscribers(&self, want: Cccd) -> impl Iterator<Item = ConnHandle> + '_ {
        (self.slots.iter())
            .filter(move |s| s.conn.is_valid() && s.cfg.intersects(want))
            .map(|s| s.conn)
    }

    #[inline]
    fn find(&self, conn: ConnHandle) -> Option<&Subscription> {
        (conn.is_valid())
            .then(|| self.slots.iter().find(|s| s.conn == conn))
            .flatten()
    }
}

/// Subscription tables of all notifiable characteristics in a service.
#[derive(Clone, Debug, Default)]
pub struct Subscriptions(Vec<(ParamId, SubscriptionTable)>);

impl Subscriptions {
    /// Allocates an `n`-slot table for each parameter in `ids`.
    pub fn new(
        ids: impl IntoIterator<Item = ParamId>,
        n: usize,
    ) -> std::result::Result<Self, TryReserveError> {
        let tables = (ids.into_iter())
            .map(|id| SubscriptionTable::new(n).map(|t| (id, t)))
            .collect::<std::result::Result<_, _>>()?;
        Ok(Self(tables))
    }

    /// Returns the table of parameter `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ParamId) -> Option<&SubscriptionTable> {
        (self.0.iter()).find_map(|(p, t)| (*p == id).then_some(t))
    }

    /// Returns the mutable table of parameter `id`.
    #[inline]
    pub fn get_mut(&mut self, id: ParamId) -> Option<&mut SubscriptionTable> {
        (self.0.iter_mut()).find_map(|(p, t)| (*p == id).then_some(t))
    }

    /// Removes connection `conn` from every table.
    pub fn remove(&mut self, conn: ConnHandle) {
        for (_, t) in &mut self.0 {
            t.remove(conn);
        }
    }
}
