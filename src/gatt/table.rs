use std::marker::PhantomData;
use std::mem;

use structbuf::{Pack, StructBuf};
use tracing::info;

use crate::att::{Handle, Perm};
use crate::gap::{Uuid, Uuid16};

use super::*;

/// Attribute value storage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// Immutable value stored in the table (declarations and descriptors).
    Static(Box<[u8]>),
    /// Characteristic value backed by a parameter buffer.
    Param(ParamId),
    /// Per-connection Client Characteristic Configuration of a parameter.
    Cccd(ParamId),
}

/// An entry in the attribute table.
#[derive(Clone, Debug)]
pub struct Attr {
    hdl: Handle,
    typ: Uuid,
    perms: Perm,
    val: Value,
}

impl Attr {
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
        self.typ
    }

    /// Returns the attribute permissions.
    #[inline(always)]
    #[must_use]
    pub const fn perms(&self) -> Perm {
        self.perms
    }

    /// Returns the attribute value storage.
    #[inline(always)]
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.val
    }
}

/// Parameter-backed characteristic.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CharParam {
    pub param: Param,
    pub props: Prop,
    /// Characteristic value handle.
    pub hdl: Handle,
    pub uuid: Uuid,
    /// Whether the characteristic has a configuration descriptor.
    pub cccd: bool,
}

/// Immutable, ordered attribute table of a single service.
///
/// Layout follows [Vol 3] Part G, Section 3: service declaration followed by
/// a characteristic declaration, value, and optional descriptors for each
/// characteristic. Handles are contiguous.
#[derive(Clone, Debug)]
pub struct AttrTable {
    attr: Box<[Attr]>,
    params: Box<[CharParam]>,
}

impl AttrTable {
    /// Returns a table builder assigning handles from [`Handle::MIN`].
    #[inline(always)]
    #[must_use]
    pub fn build() -> Builder<Self> {
        Self::build_at(Handle::MIN)
    }

    /// Returns a table builder assigning handles from `first`.
    #[inline(always)]
    #[must_use]
    pub fn build_at(first: Handle) -> Builder<Self> {
        Builder::new(first)
    }

    /// Returns the number of attributes.
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.attr.len()
    }

    /// Returns whether the table is empty.
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attr.is_empty()
    }

    /// Returns an iterator over all attributes in handle order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attr.iter()
    }

    /// Returns the attribute with handle `hdl`.
    #[must_use]
    pub fn get(&self, hdl: Handle) -> Option<&Attr> {
        let first = u16::from(self.attr.first()?.hdl);
        let i = u16::from(hdl).checked_sub(first)?;
        self.attr.get(usize::from(i))
    }

    /// Returns the first attribute of type `uuid` in table order.
    #[must_use]
    pub fn lookup(&self, uuid: Uuid) -> Option<&Attr> {
        self.attr.iter().find(|at| at.typ == uuid)
    }

    /// Returns all parameter-backed characteristics in table order.
    #[inline(always)]
    #[must_use]
    pub fn params(&self) -> &[CharParam] {
        &self.params
    }

    /// Returns the parameter-backed characteristic `id`.
    #[must_use]
    pub fn param(&self, id: ParamId) -> Option<&CharParam> {
        self.params.iter().find(|c| c.param.id() == id)
    }

    /// Returns an iterator over parameters with a configuration descriptor.
    pub fn notifiable(&self) -> impl Iterator<Item = ParamId> + '_ {
        (self.params.iter())
            .filter(|c| c.cccd)
            .map(|c| c.param.id())
    }

    /// Logs table contents.
    pub fn dump(&self) {
        info!("Attribute table:");
        for at in self.attr.iter() {
            let hdl = u16::from(at.hdl);
            match at.val {
                Value::Static(ref v) => {
                    info!("[{hdl:#06X}] {} {:?} {v:02X?}", at.typ, at.perms);
                }
                Value::Param(id) => {
                    info!("[{hdl:#06X}] {} {:?} <parameter {id}>", at.typ, at.perms);
                }
                Value::Cccd(id) => {
                    info!("[{hdl:#06X}] {} {:?} <CCCD of {id}>", at.typ, at.perms);
                }
            }
        }
    }
}

/// Table builder service definition marker type.
#[derive(Debug)]
pub struct ServiceDef;

/// Table builder characteristic definition marker type.
#[derive(Debug)]
pub struct CharacteristicDef;

/// Attribute table builder used to define services, characteristics, and
/// descriptors.
#[derive(Debug)]
#[repr(transparent)]
pub struct Builder<T>(TableBuilder, PhantomData<T>);

#[derive(Debug, Default)]
struct TableBuilder {
    attr: Vec<Attr>,
    params: Vec<CharParam>,
    /// Next handle to assign or `None` if the handle space is exhausted.
    next: Option<Handle>,
    /// Parameter of the characteristic being defined.
    cur: Option<usize>,
}

impl<T> Builder<T> {
    /// Appends an attribute with the next handle.
    fn attr(&mut self, typ: impl Into<Uuid>, perms: Perm, val: Value) -> Handle {
        let hdl = self.0.next.expect("maximum handle reached");
        self.0.next = hdl.next();
        self.0.attr.push(Attr {
            hdl,
            typ: typ.into(),
            perms,
            val,
        });
        hdl
    }

    /// Calls `f` with a builder for a nested definition.
    fn nested<U, R>(&mut self, f: impl FnOnce(&mut Builder<U>) -> R) -> R {
        let mut b = Builder(mem::take(&mut self.0), PhantomData);
        let r = f(&mut b);
        self.0 = b.0;
        r
    }
}

impl Builder<AttrTable> {
    #[inline]
    fn new(first: Handle) -> Self {
        Self(
            TableBuilder {
                next: Some(first),
                ..TableBuilder::default()
            },
            PhantomData,
        )
    }

    /// Defines a primary service ([Vol 3] Part G, Section 3.1).
    pub fn primary_service<T>(
        &mut self,
        uuid: impl Into<Uuid>,
        chars: impl FnOnce(&mut Builder<ServiceDef>) -> T,
    ) -> (Handle, T) {
        let uuid = uuid.into();
        let hdl = self.attr(
            Uuid16::PRIMARY_SERVICE,
            Perm::READ,
            Value::Static(uuid.to_bytes().into_boxed_slice()),
        );
        (hdl, self.nested(chars))
    }

    /// Returns the final immutable table.
    #[must_use]
    pub fn freeze(self) -> AttrTable {
        AttrTable {
            attr: self.0.attr.into_boxed_slice(),
            params: self.0.params.into_boxed_slice(),
        }
    }
}

impl Builder<ServiceDef> {
    /// Defines a characteristic whose value is the fixed-capacity parameter
    /// `param` ([Vol 3] Part G, Section 3.3).
    ///
    /// # Panics
    ///
    /// Panics if the parameter or value UUID is already used by another
    /// parameter-backed characteristic.
    pub fn characteristic<T>(
        &mut self,
        uuid: impl Into<Uuid>,
        props: Prop,
        perms: Perm,
        param: Param,
        descs: impl FnOnce(&mut Builder<CharacteristicDef>) -> T,
    ) -> (Handle, T) {
        let uuid = uuid.into();
        assert!(
            !(self.0.params.iter()).any(|c| c.param.id() == param.id() || c.uuid == uuid),
            "duplicate parameter {} or characteristic {uuid}",
            param.id()
        );
        let hdl = self.decl_value(uuid, props);
        self.attr(uuid, perms, Value::Param(param.id()));
        self.0.params.push(CharParam {
            param,
            props,
            hdl,
            uuid,
            cccd: false,
        });
        self.0.cur = Some(self.0.params.len() - 1);
        let v = self.nested(descs);
        self.0.cur = None;
        (hdl, v)
    }

    /// Defines a read-only characteristic with a table-stored value.
    pub fn ro_characteristic<T>(
        &mut self,
        uuid: impl Into<Uuid>,
        val: impl AsRef<[u8]>,
        descs: impl FnOnce(&mut Builder<CharacteristicDef>) -> T,
    ) -> (Handle, T) {
        let uuid = uuid.into();
        let hdl = self.decl_value(uuid, Prop::READ);
        self.attr(uuid, Perm::READ, Value::Static(val.as_ref().into()));
        (hdl, self.nested(descs))
    }

    /// Adds the characteristic declaration and returns the handle that the
    /// value attribute will receive ([Vol 3] Part G, Section 3.3.1).
    fn decl_value(&mut self, uuid: Uuid, props: Prop) -> Handle {
        let decl = self.0.next.expect("maximum handle reached");
        let val_hdl = decl.next().expect("maximum handle reached");
        let mut v = StructBuf::new(1 + 2 + 16);
        let mut p = v.append();
        p.u8(props.bits()).u16(val_hdl);
        match uuid.as_u16() {
            Some(u) => p.u16(u),
            None => p.u128(uuid.as_u128()),
        };
        let v: &[u8] = v.as_ref();
        self.attr(Uuid16::CHARACTERISTIC, Perm::READ, Value::Static(v.into()));
        val_hdl
    }
}

impl Builder<CharacteristicDef> {
    /// Adds a Client Characteristic Configuration descriptor
    /// ([Vol 3] Part G, Section 3.3.3.3).
    ///
    /// # Panics
    ///
    /// Panics if the characteristic is not parameter-backed, does not support
    /// notifications or indications, or already has a configuration
    /// descriptor.
    pub fn cccd(&mut self) -> Handle {
        let i = self.0.cur.expect("CCCD requires a parameter-backed characteristic");
        let c = &mut self.0.params[i];
        assert!(
            c.props.intersects(Prop::NOTIFY | Prop::INDICATE),
            "CCCD requires NOTIFY or INDICATE properties"
        );
        assert!(!c.cccd, "duplicate CCCD");
        c.cccd = true;
        let id = c.param.id();
        self.attr(
            Uuid16::CLIENT_CHARACTERISTIC_CONFIGURATION,
            Perm::READ_WRITE,
            Value::Cccd(id),
        )
    }

    /// Adds a Characteristic User Description descriptor
    /// ([Vol 3] Part G, Section 3.3.3.2).
    #[inline]
    pub fn user_description(&mut self, desc: impl AsRef<[u8]>) -> Handle {
        self.descriptor(Uuid16::USER_DESCRIPTION, Perm::READ, desc)
    }

    /// Adds a descriptor with a table-stored value.
    pub fn descriptor(
        &mut self,
        uuid: impl Into<Uuid>,
        perms: Perm,
        val: impl AsRef<[u8]>,
    ) -> Handle {
        self.attr(uuid, perms, Value::Static(val.as_ref().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NTF: Uuid = Uuid::ti(0xAAA1);
    const RW: Uuid = Uuid::ti(0xAAA2);

    fn table() -> AttrTable {
        let mut b = AttrTable::build();
        b.primary_service(Uuid16::new(0x1190).unwrap(), |s| {
            s.characteristic(NTF, Prop::READ | Prop::NOTIFY, Perm::READ, Param::new(0, 4), |c| {
                c.cccd();
                c.user_description("Characteristic 1");
            });
            s.characteristic(RW, Prop::READ | Prop::WRITE, Perm::READ_WRITE, Param::new(1, 2), |_| {});
        });
        b.freeze()
    }

    #[test]
    fn layout() {
        let t = table();
        assert_eq!(t.len(), 7);
        let typs: Vec<_> = t.iter().map(Attr::uuid).collect();
        assert_eq!(
            typs,
            [
                Uuid16::PRIMARY_SERVICE.as_uuid(),
                Uuid16::CHARACTERISTIC.as_uuid(),
                NTF,
                Uuid16::CLIENT_CHARACTERISTIC_CONFIGURATION.as_uuid(),
                Uuid16::USER_DESCRIPTION.as_uuid(),
                Uuid16::CHARACTERISTIC.as_uuid(),
                RW,
            ]
        );
        for (i, at) in t.iter().enumerate() {
            assert_eq!(usize::from(u16::from(at.handle())), i + 1);
        }
        assert_eq!(t.iter().next().unwrap().value(), &Value::Static(Box::new([0x90, 0x11])));
        assert_eq!(t.get(Handle::new(3).unwrap()).unwrap().value(), &Value::Param(0));
        assert_eq!(t.get(Handle::new(4).unwrap()).unwrap().value(), &Value::Cccd(0));
        assert!(t.get(Handle::new(8).unwrap()).is_none());
        assert_eq!(t.notifiable().collect::<Vec<_>>(), [0]);
        assert_eq!(t.param(1).unwrap().hdl, Handle::new(7).unwrap());
        assert!(t.param(2).is_none());
    }

    #[test]
    fn declaration() {
        let t = table();
        let Value::Static(ref v) = *t.get(Handle::new(2).unwrap()).unwrap().value() else {
            panic!("declaration value not stored in table");
        };
        assert_eq!(v.len(), 19);
        assert_eq!(v[0], (Prop::READ | Prop::NOTIFY).bits());
        assert_eq!(&v[1..3], &[0x03, 0x00]);
        assert_eq!(&v[3..], &NTF.as_u128().to_le_bytes());

        let mut b = AttrTable::build_at(Handle::new(0x20).unwrap());
        b.primary_service(Uuid16::new(0x180F).unwrap(), |s| {
            s.ro_characteristic(Uuid16::new(0x2A19).unwrap(), [100], |_| {});
        });
        let t = b.freeze();
        let Value::Static(ref v) = *t.get(Handle::new(0x21).unwrap()).unwrap().value() else {
            panic!("declaration value not stored in table");
        };
        assert_eq!(&**v, &[0x02, 0x22, 0x00, 0x19, 0x2A]);
        assert!(t.get(Handle::MIN).is_none());
    }

    #[test]
    fn lookup() {
        let t = table();
        assert_eq!(u16::from(t.lookup(RW).unwrap().handle()), 7);
        assert_eq!(
            u16::from(t.lookup(Uuid16::CHARACTERISTIC.as_uuid()).unwrap().handle()),
            2
        );
        assert!(t.lookup(Uuid::ti(0xBBBB)).is_none());
    }

    #[test]
    #[should_panic(expected = "CCCD requires NOTIFY or INDICATE properties")]
    fn cccd_without_notify() {
        let mut b = AttrTable::build();
        b.primary_service(Uuid16::new(0x1190).unwrap(), |s| {
            s.characteristic(RW, Prop::READ, Perm::READ, Param::new(0, 1), |c| {
                c.cccd();
            });
        });
    }

    #[test]
    #[should_panic(expected = "duplicate parameter")]
    fn duplicate_param() {
        let mut b = AttrTable::build();
        b.primary_service(Uuid16::new(0x1190).unwrap(), |s| {
            s.characteristic(NTF, Prop::READ, Perm::READ, Param::new(0, 1), |_| {});
            s.characteristic(RW, Prop::READ, Perm::READ, Param::new(0, 1), |_| {});
        });
    }
}
