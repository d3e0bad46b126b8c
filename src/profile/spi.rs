//! SPI Service.
//!
//! Vendor service that publishes data frames read from a sensor over SPI
//! (`IwrData`, notified to subscribed clients) and lets the client configure
//! how often new frames are produced (`UpdatePeriod`).

use std::sync::Arc;

use crate::att::{Handle, Perm};
use crate::gap::{Uuid, Uuid16};
use crate::gatt::{
    AttrTable, Builder, Config, Param, ParamId, Prop, Result, Runtime, Service,
};

/// SPI Service UUID.
pub const SERVICE_UUID: Uuid16 = match Uuid16::new(0x1190) {
    Some(u) => u,
    None => unreachable!(),
};

/// SPI Service parameters.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum SpiParam {
    /// Latest sensor data frame.
    IwrData = 0,
    /// Frame update period.
    UpdatePeriod = 1,
}

impl SpiParam {
    /// Returns the characteristic value UUID.
    #[inline]
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::IwrData => Uuid::ti(0x1191),
            Self::UpdatePeriod => Uuid::ti(0x1192),
        }
    }

    /// Returns the fixed value length.
    #[inline]
    #[must_use]
    pub const fn capacity(self) -> usize {
        match self {
            Self::IwrData => 20,
            Self::UpdatePeriod => 2,
        }
    }

    #[inline(always)]
    const fn param(self) -> Param {
        Param::new(self as ParamId, self.capacity())
    }
}

/// SPI Service instance.
#[derive(Debug)]
pub struct SpiService(Arc<Service>);

impl SpiService {
    /// Creates the service. Clients cannot access it until
    /// [`Self::add_service`] is called.
    #[must_use]
    pub fn new(rt: Arc<dyn Runtime>, cfg: Config) -> Self {
        let mut b = AttrTable::build();
        Self::define(&mut b);
        Self(Service::new(rt, b.freeze(), cfg))
    }

    /// Defines the service attributes and returns the service handle.
    pub fn define(b: &mut Builder<AttrTable>) -> Handle {
        let (hdl, _) = b.primary_service(SERVICE_UUID, |b| {
            use SpiParam::*;
            b.characteristic(
                IwrData.uuid(),
                Prop::READ | Prop::NOTIFY,
                Perm::READ,
                IwrData.param(),
                |b| {
                    b.cccd();
                    b.user_description("Characteristic 1");
                },
            );
            b.characteristic(
                UpdatePeriod.uuid(),
                Prop::READ | Prop::WRITE,
                Perm::READ_WRITE,
                UpdatePeriod.param(),
                |_| {},
            );
        });
        hdl
    }

    /// Allocates subscription state and registers the service with the
    /// attribute server.
    #[inline]
    pub fn add_service(&self) -> Result<()> {
        self.0.add_service()
    }

    /// Registers the callback invoked when a client completes a parameter
    /// write.
    pub fn register_app_callbacks(
        &self,
        cb: impl Fn(SpiParam) + Send + Sync + 'static,
    ) -> Result<()> {
        self.0.register_app_callbacks(move |id| {
            if let Ok(p) = SpiParam::try_from(id) {
                cb(p);
            }
        })
    }

    /// Sets a parameter value, notifying subscribed clients of `IwrData`
    /// changes.
    #[inline]
    pub fn set_parameter(&self, id: impl Into<ParamId>, v: &[u8]) -> Result<()> {
        self.0.set_parameter(id.into(), v)
    }

    /// Returns a parameter value.
    #[inline]
    pub fn get_parameter(&self, id: impl Into<ParamId>) -> Result<Vec<u8>> {
        self.0.get_parameter(id.into())
    }

    /// Returns the underlying service.
    #[inline(always)]
    #[must_use]
    pub const fn service(&self) -> &Arc<Service> {
        &self.0
    }
}
