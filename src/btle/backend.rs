//! The radio-driver seam: [`BtleBackend`] stands in for the vendor SDK's
//! scan/connect/GATT vtable. [`Central`] drives one against its connection
//! pool; this crate ships no concrete implementation.

/// A Bluetooth EUI-48 device address.
pub type BtleAddr = [u8; 6];

/// Which GATT operation produced a [`BtleEvent::CharacteristicValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattOp {
    Read,
    Write,
    Notify,
}

/// Events a backend surfaces to [`Central::poll`]. Lifecycle events carry
/// the peer address; the central demultiplexes by address for pre-open
/// bookkeeping and by the matching connection slot once open.
#[derive(Debug, Clone, Copy)]
pub enum BtleEvent<'a> {
    ScanResponse {
        addr: BtleAddr,
        rssi: i8,
        data: &'a [u8],
    },
    ConnectionOpened {
        addr: BtleAddr,
    },
    ConnectionClosed {
        addr: BtleAddr,
        reason: u8,
    },
    ServiceResolved {
        addr: BtleAddr,
        uuid: crate::btle::advert::Uuid128,
        handle: u16,
    },
    CharacteristicResolved {
        addr: BtleAddr,
        uuid: crate::btle::advert::Uuid128,
        handle: u16,
    },
    CharacteristicValue {
        addr: BtleAddr,
        handle: u16,
        op: GattOp,
        data: &'a [u8],
    },
    GattProcedureCompleted {
        addr: BtleAddr,
        success: bool,
    },
}

/// Non-blocking radio driver surface. Every mutator returns `bool`: `true`
/// means the request was accepted and a completion will arrive later via
/// [`poll_event`](BtleBackend::poll_event); `false` means the radio
/// rejected it outright (busy, unsupported, out of resources).
pub trait BtleBackend {
    fn start_scan(&mut self, active: bool) -> bool;
    fn stop_scan(&mut self);

    fn connect(&mut self, addr: BtleAddr, is_random: bool) -> bool;
    fn disconnect(&mut self, addr: BtleAddr) -> bool;

    fn resolve_service(&mut self, addr: BtleAddr, uuid: crate::btle::advert::Uuid128) -> bool;
    fn resolve_characteristic(
        &mut self,
        addr: BtleAddr,
        service_handle: u16,
        uuid: crate::btle::advert::Uuid128,
    ) -> bool;

    fn read_characteristic(&mut self, addr: BtleAddr, handle: u16) -> bool;
    fn write_characteristic(&mut self, addr: BtleAddr, handle: u16, data: &[u8]) -> bool;
    fn write_cccd(&mut self, addr: BtleAddr, handle: u16, enable: bool) -> bool;

    /// Drain the next pending event, if any. Called once per
    /// `Central::poll` iteration until it returns `None`.
    fn poll_event(&mut self) -> Option<BtleEvent<'_>>;
}
