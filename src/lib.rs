//! GATT SPI Service.
//!
//! A single GATT peripheral service with a fixed attribute table, bounds
//! checked client reads and writes of fixed-capacity parameter values, and
//! per-connection notification subscriptions. The attribute server and
//! transport are supplied by the application through [`gatt::Runtime`].

#[path = "att/att.rs"]
pub mod att;
#[path = "gap/gap.rs"]
pub mod gap;
#[path = "gatt/gatt.rs"]
pub mod gatt;

/// GATT service profiles.
pub mod profile {
    pub mod spi;
}

#[path = "util/util.rs"]
mod util;
