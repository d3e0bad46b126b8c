use tracing::{debug, warn};

use crate::att::{ErrorCode, Handle, Method, Perm};
use crate::gap::Uuid;

use super::*;

/// Mutable service state guarded by the service lock.
#[derive(Clone, Debug)]
pub struct State {
    pub store: Store,
    pub subs: Subscriptions,
}

/// Destination of a routed client access.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    /// Parameter value.
    Value(ParamId),
    /// Requesting connection's configuration of a parameter.
    Cccd(ParamId),
    /// Value stored in the attribute table.
    Static,
}

/// Access route. Parameter values are matched by type only because the
/// characteristic value UUID addresses the whole characteristic. All other
/// attributes also match the handle.
#[derive(Clone, Copy, Debug)]
struct Route {
    uuid: Uuid,
    hdl: Option<Handle>,
    target: Target,
}

impl Route {
    #[inline]
    fn matches(&self, uuid: Uuid, hdl: Handle) -> bool {
        self.uuid == uuid && self.hdl.map_or(true, |h| h == hdl)
    }
}

/// Routes client reads and writes to the attribute store, subscription
/// tables, or static table values. Routes are derived from the attribute
/// table, so every readable and writable attribute is reachable.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    rd: Box<[Route]>,
    wr: Box<[Route]>,
}

impl Dispatcher {
    /// Creates read and write routes for all attributes in `tbl`.
    #[must_use]
    pub fn new(tbl: &AttrTable) -> Self {
        let (mut rd, mut wr) = (Vec::new(), Vec::new());
        for at in tbl.iter() {
            let (hdl, target) = match *at.value() {
                Value::Param(id) => (None, Target::Value(id)),
                Value::Cccd(id) => (Some(at.handle()), Target::Cccd(id)),
                Value::Static(_) => (Some(at.handle()), Target::Static),
            };
            let r = Route {
                uuid: at.uuid(),
                hdl,
                target,
            };
            if at.perms().contains(Perm::READ) {
                rd.push(r);
            }
            if at.perms().contains(Perm::WRITE) {
                wr.push(r);
            }
        }
        Self {
            rd: rd.into_boxed_slice(),
            wr: wr.into_boxed_slice(),
        }
    }

    /// Returns the first route for an access of attribute `uuid` at `hdl`.
    pub fn route(&self, m: Method, uuid: Uuid, hdl: Handle) -> Result<Target, ErrorCode> {
        let routes = if m.is_read() { &self.rd } else { &self.wr };
        (routes.iter().find(|r| r.matches(uuid, hdl)))
            .map(|r| r.target)
            .ok_or_else(|| {
                warn!("No {m:?} route for {uuid} at {hdl}");
                ErrorCode::AttributeNotFound
            })
    }

    /// Completes a read request.
    pub fn read(&self, tbl: &AttrTable, st: &State, r: &mut ReadReq) -> IoResult {
        let res = match self.route(r.method(), r.uuid(), r.handle())? {
            Target::Value(id) => (st.store.read(id, r.offset(), r.max_len()))
                .map(|v| r.respond(v)),
            Target::Cccd(id) => {
                let cfg = st.subs.get(id).map_or(Cccd::empty(), |t| t.get(r.conn()));
                r.complete(cfg.to_bytes())
            }
            Target::Static => match tbl.get(r.handle()).map(Attr::value) {
                Some(Value::Static(v)) => r.complete(v),
                _ => Err(ErrorCode::AttributeNotFound),
            },
        };
        if let Err(e) = res {
            warn!(
                "Read of {} at {} offset {} from {} failed: {e}",
                r.uuid(),
                r.handle(),
                r.offset(),
                r.conn()
            );
        }
        res
    }

    /// Executes a write request and returns the parameter whose value was
    /// completed by the write, if any.
    pub fn write(&self, st: &mut State, w: &WriteReq) -> Result<Option<ParamId>, ErrorCode> {
        let res = match self.route(w.method(), w.uuid(), w.handle())? {
            Target::Cccd(id) => (st.subs.get_mut(id))
                .ok_or(ErrorCode::AttributeNotFound)
                .and_then(|t| t.write(w.conn(), w.offset(), w.value(), Cccd::NOTIFY))
                .map(|_| None),
            Target::Value(id) => (st.store.write(id, w.offset(), w.value()))
                .map(|done| done.then_some(id)),
            Target::Static => Err(ErrorCode::WriteNotPermitted),
        };
        match res {
            Ok(done) => debug!(
                "{:?} of {} bytes to {} at offset {} from {}{}",
                w.method(),
                w.value().len(),
                w.uuid(),
                w.offset(),
                w.conn(),
                if done.is_some() { " (complete)" } else { "" }
            ),
            Err(e) => warn!(
                "Write of {} bytes to {} at offset {} from {} failed: {e}",
                w.value().len(),
                w.uuid(),
                w.offset(),
                w.conn()
            ),
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use crate::att::ConnHandle;
    use crate::gap::Uuid16;

    use super::*;

    const VAL: Uuid = Uuid::ti(0xAAA1);
    const CFG: Uuid = Uuid::ti(0xAAA2);
    const EXT: Uuid = Uuid::ti(0xAAA3);
    const C1: ConnHandle = ConnHandle::new(1);

    fn setup() -> (AttrTable, Dispatcher, State) {
        let mut b = AttrTable::build();
        b.primary_service(Uuid16::new(0x1190).unwrap(), |s| {
            s.characteristic(VAL, Prop::READ | Prop::NOTIFY, Perm::READ, Param::new(0, 4), |c| {
                c.cccd();
                c.user_description("Value");
            });
            s.characteristic(CFG, Prop::READ | Prop::WRITE, Perm::READ_WRITE, Param::new(1, 4), |c| {
                c.descriptor(EXT, Perm::READ_WRITE, [0x01]);
            });
        });
        let tbl = b.freeze();
        let st = State {
            store: Store::new(tbl.params().iter().map(|c| c.param), Completion::EndOfValue),
            subs: Subscriptions::new(tbl.notifiable(), 2).unwrap(),
        };
        let d = Dispatcher::new(&tbl);
        (tbl, d, st)
    }

    fn read(d: &Dispatcher, t: &AttrTable, st: &State, at: &Attr, off: u16) -> IoResult {
        let mut r = ReadReq::new(C1, at.handle(), at.uuid(), Method::Read, off, 22);
        d.read(t, st, &mut r)
    }

    #[test]
    fn every_readable_attribute_routes() {
        let (t, d, st) = setup();
        for at in t.iter() {
            assert_eq!(read(&d, &t, &st, at, 0), Ok(()), "{at:?}");
        }
    }

    #[test]
    fn read_value() {
        let (t, d, mut st) = setup();
        st.store.set(1, &[1, 2, 3, 4]).unwrap();
        let at = t.lookup(CFG).unwrap();
        let mut r = ReadReq::new(C1, at.handle(), CFG, Method::ReadBlob, 1, 2);
        assert_eq!(d.read(&t, &st, &mut r), Ok(()));
        assert_eq!(r.value(), &[2, 3]);

        let mut r = ReadReq::new(C1, at.handle(), CFG, Method::ReadBlob, 4, 2);
        assert_eq!(d.read(&t, &st, &mut r), Ok(()));
        assert!(r.value().is_empty());

        let mut r = ReadReq::new(C1, at.handle(), CFG, Method::ReadBlob, 5, 2);
        assert_eq!(d.read(&t, &st, &mut r), Err(ErrorCode::InvalidOffset));
        assert!(r.value().is_empty());
    }

    #[test]
    fn unknown_attribute() {
        let (t, d, st) = setup();
        let mut r = ReadReq::new(C1, Handle::MIN, Uuid::ti(0xBBBB), Method::Read, 0, 22);
        assert_eq!(d.read(&t, &st, &mut r), Err(ErrorCode::AttributeNotFound));
        let descr = Uuid16::USER_DESCRIPTION.as_uuid();
        let mut r = ReadReq::new(C1, Handle::MIN, descr, Method::Read, 0, 22);
        assert_eq!(d.read(&t, &st, &mut r), Err(ErrorCode::AttributeNotFound));
    }

    #[test]
    fn write_value() {
        let (t, d, mut st) = setup();
        let hdl = t.lookup(CFG).unwrap().handle();
        let w = WriteReq::new(C1, hdl, CFG, Method::Write, 2, &[0xAA, 0xBB]);
        assert_eq!(d.write(&mut st, &w), Ok(Some(1)));
        assert_eq!(st.store.get(1).unwrap(), &[0, 0, 0xAA, 0xBB]);

        let w = WriteReq::new(C1, hdl, CFG, Method::PrepareWrite, 0, &[0x11]);
        assert_eq!(d.write(&mut st, &w), Ok(None));
        assert_eq!(st.store.get(1).unwrap(), &[0x11, 0, 0xAA, 0xBB]);

        let w = WriteReq::new(C1, hdl, CFG, Method::Write, 3, &[0xCC, 0xDD]);
        assert_eq!(d.write(&mut st, &w), Err(ErrorCode::InvalidOffset));
        assert_eq!(st.store.get(1).unwrap(), &[0x11, 0, 0xAA, 0xBB]);

        // Read-only value
        let hdl = t.lookup(VAL).unwrap().handle();
        let w = WriteReq::new(C1, hdl, VAL, Method::Write, 0, &[1, 2, 3, 4]);
        assert_eq!(d.write(&mut st, &w), Err(ErrorCode::AttributeNotFound));
    }

    #[test]
    fn write_static() {
        let (t, d, mut st) = setup();
        let at = t.lookup(EXT).unwrap();
        let w = WriteReq::new(C1, at.handle(), EXT, Method::Write, 0, &[0x02]);
        assert_eq!(d.write(&mut st, &w), Err(ErrorCode::WriteNotPermitted));
        assert_eq!(read(&d, &t, &st, at, 0), Ok(()));
        assert_eq!(at.value(), &Value::Static(Box::new([0x01])));
    }

    #[test]
    fn write_cccd() {
        let (t, d, mut st) = setup();
        let typ = Uuid16::CLIENT_CHARACTERISTIC_CONFIGURATION.as_uuid();
        let at = t.lookup(typ).unwrap();
        let hdl = at.handle();

        let w = WriteReq::new(C1, hdl, typ, Method::Write, 0, &[0x01, 0x00]);
        assert_eq!(d.write(&mut st, &w), Ok(None));
        assert_eq!(st.subs.get(0).unwrap().get(C1), Cccd::NOTIFY);

        let mut r = ReadReq::new(C1, hdl, typ, Method::Read, 0, 22);
        assert_eq!(d.read(&t, &st, &mut r), Ok(()));
        assert_eq!(r.value(), &[0x01, 0x00]);

        let w = WriteReq::new(C1, hdl, typ, Method::Write, 0, &[0x02, 0x00]);
        assert_eq!(d.write(&mut st, &w), Err(ErrorCode::CccdImproperlyConfigured));
        let w = WriteReq::new(C1, hdl, typ, Method::Write, 1, &[0x00]);
        assert_eq!(d.write(&mut st, &w), Err(ErrorCode::AttributeNotLong));
        assert_eq!(st.subs.get(0).unwrap().get(C1), Cccd::NOTIFY);

        let w = WriteReq::new(C1, hdl, typ, Method::Write, 0, &[0x00, 0x00]);
        assert_eq!(d.write(&mut st, &w), Ok(None));
        assert_eq!(st.subs.get(0).unwrap().get(C1), Cccd::empty());
    }
}
