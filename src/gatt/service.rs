use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::att::ConnHandle;
use crate::util::name_of;

use super::*;

/// Application callback invoked with the identifier of a changed parameter.
pub type ChangeCb = Box<dyn Fn(ParamId) + Send + Sync>;

/// GATT service exposing a fixed attribute table to all connected clients.
///
/// All state is guarded by a single lock. The change callback and the
/// transport are always called with the lock released. Local updates are
/// serialized by a separate lock so that notifications are sent in the order
/// in which values were stored.
pub struct Service {
    tbl: AttrTable,
    dsp: Dispatcher,
    cfg: Config,
    rt: Arc<dyn Runtime>,
    st: Mutex<State>,
    set: Mutex<()>,
    cb: OnceCell<ChangeCb>,
}

impl Service {
    /// Creates a service for attribute table `tbl` with all parameter values
    /// zeroed. The service is not visible to clients until
    /// [`Self::add_service`] is called.
    #[must_use]
    pub fn new(rt: Arc<dyn Runtime>, tbl: AttrTable, cfg: Config) -> Arc<Self> {
        let st = State {
            store: Store::new(tbl.params().iter().map(|c| c.param), cfg.completion),
            subs: Subscriptions::default(),
        };
        Arc::new(Self {
            dsp: Dispatcher::new(&tbl),
            tbl,
            cfg,
            rt,
            st: Mutex::new(st),
            set: Mutex::new(()),
            cb: OnceCell::new(),
        })
    }

    /// Allocates subscription state for all connections and registers the
    /// attribute table with the attribute server. Calling this again resets
    /// all subscriptions and registers the table again.
    pub fn add_service(self: &Arc<Self>) -> Result<()> {
        let n = (self.cfg.max_connections).unwrap_or_else(|| self.rt.max_connections());
        let subs = Subscriptions::new(self.tbl.notifiable(), n).map_err(|e| {
            warn!("Failed to allocate {n} subscription slots: {e}");
            Error::Alloc(e)
        })?;
        self.st.lock().subs = subs;
        let io = Io::with(self, |this, req| match req {
            IoReq::Read(r) => this.read(r),
            IoReq::Write(w) => this.write(w),
        });
        if let Err(e) = self.rt.register(&self.tbl, self.cfg.key_len, io) {
            warn!("Service registration failed: {e}");
            return Err(Error::Register(e));
        }
        self.tbl.dump();
        info!(
            "Registered service with {} attributes and {n} connection slots",
            self.tbl.len()
        );
        Ok(())
    }

    /// Registers the application change callback. Only one registration is
    /// allowed.
    pub fn register_app_callbacks(
        &self,
        cb: impl Fn(ParamId) + Send + Sync + 'static,
    ) -> Result<()> {
        self.cb.set(Box::new(cb)).map_err(|_| {
            warn!("Application callback already registered");
            Error::AlreadyRegistered
        })
    }

    /// Replaces the value of parameter `id` and notifies all subscribed
    /// connections. Notification failures are logged and do not affect other
    /// connections or the result.
    pub fn set_parameter(&self, id: ParamId, v: &[u8]) -> Result<()> {
        let seq = self.set.lock();
        let conns: Vec<ConnHandle> = {
            let mut st = self.st.lock();
            st.store.set(id, v)?;
            (st.subs.get(id))
                .map(|t| t.subscribers(Cccd::NOTIFY).collect())
                .unwrap_or_default()
        };
        if let Some(c) = self.tbl.param(id) {
            for conn in conns {
                let n = self.rt.max_payload(conn).min(v.len());
                match self.rt.notify(conn, c.hdl, &v[..n]) {
                    Ok(()) => debug!("Notified {conn} of parameter {id}"),
                    Err(e) => warn!("Failed to notify {conn} of parameter {id}: {e}"),
                }
            }
        }
        drop(seq);
        if self.cfg.callback_on_set {
            self.changed(id);
        }
        Ok(())
    }

    /// Returns the value of parameter `id`.
    pub fn get_parameter(&self, id: ParamId) -> Result<Vec<u8>> {
        (self.st.lock().store.get(id))
            .map(<[u8]>::to_vec)
            .ok_or(Error::InvalidParameter(id))
    }

    /// Handles a client read.
    pub fn read(&self, r: &mut ReadReq) -> IoResult {
        let st = self.st.lock();
        self.dsp.read(&self.tbl, &st, r)
    }

    /// Handles a client write. The change callback is invoked if the write
    /// completed a parameter value.
    pub fn write(&self, w: &WriteReq) -> IoResult {
        let done = self.dsp.write(&mut self.st.lock(), w)?;
        if let Some(id) = done {
            self.changed(id);
        }
        Ok(())
    }

    /// Releases all subscriptions of connection `conn`.
    pub fn disconnected(&self, conn: ConnHandle) {
        self.st.lock().subs.remove(conn);
        debug!("Released subscriptions of {conn}");
    }

    /// Returns the attribute table.
    #[inline(always)]
    #[must_use]
    pub const fn table(&self) -> &AttrTable {
        &self.tbl
    }

    /// Returns the service configuration.
    #[inline(always)]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the configuration of parameter `id` for connection `conn`.
    #[must_use]
    pub fn subscription(&self, id: ParamId, conn: ConnHandle) -> Cccd {
        (self.st.lock().subs.get(id)).map_or(Cccd::empty(), |t| t.get(conn))
    }

    fn changed(&self, id: ParamId) {
        if let Some(cb) = self.cb.get() {
            debug!("Parameter {id} changed");
            cb(id);
        }
    }
}

impl Debug for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(name_of!(Service))
            .field("tbl", &self.tbl)
            .field("cfg", &self.cfg)
            .field("rt", &self.rt)
            .field("cb", &self.cb.get().is_some())
            .finish_non_exhaustive()
    }
}
