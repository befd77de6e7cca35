//! A BTLE central: a fixed pool of connection slots, each advanced by its
//! own lifecycle sub-state as [`BtleBackend`] events arrive. The central
//! owns the pool and indexes into it by slot — connections never hold a
//! pointer back to the central, only the address the central demultiplexes
//! events by.

use crate::btle::advert::Uuid128;
use crate::btle::backend::{BtleAddr, BtleBackend, BtleEvent};
use crate::config::{
    MAX_BTLE_CACHED_HANDLES_PER_CONNECTION, MAX_BTLE_CONNECTIONS, MAX_BTLE_GATT_WRITE_BYTES,
};
use crate::containers::FixedArray;
use crate::error::BtleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Connecting,
    Connected,
    ResolvingService(Uuid128),
    ResolvingCharacteristic(u16, Uuid128),
    GattBusy,
    Closing,
}

/// The operation a resolve chain is working towards, carried on the slot
/// so `poll()` knows what to do once a service/characteristic handle comes
/// back, and which `CentralEvent` to surface once the chain ends.
enum PendingOp {
    Read,
    Write(FixedArray<u8, MAX_BTLE_GATT_WRITE_BYTES>),
    Notify(bool),
}

struct PendingGatt {
    chr_uuid: Uuid128,
    op: PendingOp,
}

struct ConnectionSlot {
    addr: BtleAddr,
    state: ConnState,
    service_handles: FixedArray<(Uuid128, u16), MAX_BTLE_CACHED_HANDLES_PER_CONNECTION>,
    char_handles: FixedArray<(Uuid128, u16), MAX_BTLE_CACHED_HANDLES_PER_CONNECTION>,
    pending: Option<PendingGatt>,
}

/// An event surfaced by [`Central::poll`] after demultiplexing a backend
/// event to its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralEvent {
    ScanStarted(bool),
    ScanResponse(BtleAddr),
    ConnectionOpened(BtleAddr),
    ConnectionClosed(BtleAddr, u8),
    ReadComplete(BtleAddr, bool),
    WriteComplete(BtleAddr, bool),
    NotificationsChanged(BtleAddr, bool),
    ProcedureRejectedBusy(BtleAddr),
}

pub struct Central<B: BtleBackend> {
    backend: B,
    slots: FixedArray<ConnectionSlot, MAX_BTLE_CONNECTIONS>,
    scanning: bool,
}

impl<B: BtleBackend> Central<B> {
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            slots: FixedArray::new(),
            scanning: false,
        }
    }

    pub fn start_scan(&mut self, active: bool) -> CentralEvent {
        let started = self.backend.start_scan(active);
        self.scanning = started;
        CentralEvent::ScanStarted(started)
    }

    pub fn stop_scan(&mut self) {
        self.backend.stop_scan();
        self.scanning = false;
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Access the backing radio driver, e.g. to inspect a test fixture's
    /// recorded calls.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn find_slot(&self, addr: BtleAddr) -> Option<usize> {
        (0..self.slots.len()).find(|&i| self.slots.get(i).map(|s| s.addr) == Some(addr))
    }

    pub fn start_connection(&mut self, addr: BtleAddr, is_random: bool) -> Result<(), BtleError> {
        if self.find_slot(addr).is_some() {
            return Err(BtleError::ProcedureBusy);
        }
        if self.slots.is_full() {
            return Err(BtleError::PoolExhausted);
        }
        if !self.backend.connect(addr, is_random) {
            return Err(BtleError::GattProcedureFailed);
        }
        self.slots.append(ConnectionSlot {
            addr,
            state: ConnState::Connecting,
            service_handles: FixedArray::new(),
            char_handles: FixedArray::new(),
            pending: None,
        });
        Ok(())
    }

    pub fn stop_connection(&mut self, addr: BtleAddr) -> Result<(), BtleError> {
        let idx = self.find_slot(addr).ok_or(BtleError::NoSuchConnection)?;
        self.slots.get_mut(idx).unwrap().state = ConnState::Closing;
        if !self.backend.disconnect(addr) {
            return Err(BtleError::GattProcedureFailed);
        }
        Ok(())
    }

    fn cached_service(&self, idx: usize, uuid: Uuid128) -> Option<u16> {
        self.slots
            .get(idx)?
            .service_handles
            .iter()
            .find(|(u, _)| *u == uuid)
            .map(|(_, h)| *h)
    }

    fn cached_characteristic(&self, idx: usize, uuid: Uuid128) -> Option<u16> {
        self.slots
            .get(idx)?
            .char_handles
            .iter()
            .find(|(u, _)| *u == uuid)
            .map(|(_, h)| *h)
    }

    /// Issue the terminal GATT op the slot's pending intent names, now that
    /// a characteristic handle is in hand (cached or just resolved).
    fn issue_terminal(&mut self, idx: usize, addr: BtleAddr, handle: u16) -> bool {
        let slot = match self.slots.get(idx) {
            Some(s) => s,
            None => return false,
        };
        match &slot.pending {
            Some(PendingGatt { op: PendingOp::Read, .. }) => {
                self.backend.read_characteristic(addr, handle)
            }
            Some(PendingGatt { op: PendingOp::Write(data), .. }) => {
                let mut buf = [0u8; MAX_BTLE_GATT_WRITE_BYTES];
                let len = data.len();
                for (dst, src) in buf.iter_mut().zip(data.iter()) {
                    *dst = *src;
                }
                self.backend.write_characteristic(addr, handle, &buf[..len])
            }
            Some(PendingGatt { op: PendingOp::Notify(enable), .. }) => {
                let enable = *enable;
                self.backend.write_cccd(addr, handle, enable)
            }
            None => false,
        }
    }

    /// Clear a slot's pending GATT intent and report the `CentralEvent`
    /// that matches the operation it named, at whatever outcome the chain
    /// ended with. Returns `None` if the slot had no pending intent.
    fn complete_pending(&mut self, idx: usize, addr: BtleAddr, success: bool) -> Option<CentralEvent> {
        let slot = self.slots.get_mut(idx)?;
        let op = slot.pending.take()?.op;
        slot.state = ConnState::Connected;
        Some(match op {
            PendingOp::Read => CentralEvent::ReadComplete(addr, success),
            PendingOp::Write(_) => CentralEvent::WriteComplete(addr, success),
            PendingOp::Notify(_) => CentralEvent::NotificationsChanged(addr, success),
        })
    }

    /// Start a resolve-then-act chain for `op` against `chr_uuid` under
    /// `svc_uuid`: issues the terminal op directly on a full cache hit,
    /// otherwise resolves the characteristic (or the service first, then
    /// the characteristic) and lets `poll()` carry the chain to its end.
    fn start_chain(
        &mut self,
        addr: BtleAddr,
        svc_uuid: Uuid128,
        chr_uuid: Uuid128,
        op: PendingOp,
    ) -> Result<(), BtleError> {
        let idx = self.find_slot(addr).ok_or(BtleError::NoSuchConnection)?;
        let busy = {
            let slot = self.slots.get(idx).ok_or(BtleError::NoSuchConnection)?;
            slot.state == ConnState::GattBusy
                || matches!(
                    slot.state,
                    ConnState::ResolvingService(_) | ConnState::ResolvingCharacteristic(_, _)
                )
        };
        if busy {
            return Err(BtleError::ProcedureBusy);
        }

        if let Some(handle) = self.cached_characteristic(idx, chr_uuid) {
            let slot = self.slots.get_mut(idx).unwrap();
            slot.pending = Some(PendingGatt { chr_uuid, op });
            slot.state = ConnState::GattBusy;
            if !self.issue_terminal(idx, addr, handle) {
                self.slots.get_mut(idx).unwrap().pending = None;
                self.slots.get_mut(idx).unwrap().state = ConnState::Connected;
                return Err(BtleError::GattProcedureFailed);
            }
            return Ok(());
        }

        if let Some(service_handle) = self.cached_service(idx, svc_uuid) {
            let slot = self.slots.get_mut(idx).unwrap();
            slot.pending = Some(PendingGatt { chr_uuid, op });
            slot.state = ConnState::ResolvingCharacteristic(service_handle, chr_uuid);
            if !self
                .backend
                .resolve_characteristic(addr, service_handle, chr_uuid)
            {
                self.slots.get_mut(idx).unwrap().pending = None;
                self.slots.get_mut(idx).unwrap().state = ConnState::Connected;
                return Err(BtleError::GattProcedureFailed);
            }
            return Ok(());
        }

        let slot = self.slots.get_mut(idx).unwrap();
        slot.pending = Some(PendingGatt { chr_uuid, op });
        slot.state = ConnState::ResolvingService(svc_uuid);
        if !self.backend.resolve_service(addr, svc_uuid) {
            self.slots.get_mut(idx).unwrap().pending = None;
            self.slots.get_mut(idx).unwrap().state = ConnState::Connected;
            return Err(BtleError::GattProcedureFailed);
        }
        Ok(())
    }

    /// Reads `chr_uuid` under `svc_uuid`, resolving and caching handles on
    /// a cache miss before issuing the read. A single call drives the
    /// whole chain to completion as `poll()` drains the backend's resolve
    /// events; only the final read surfaces a `CentralEvent`.
    pub fn read_characteristic(
        &mut self,
        addr: BtleAddr,
        svc_uuid: Uuid128,
        chr_uuid: Uuid128,
    ) -> Result<(), BtleError> {
        self.start_chain(addr, svc_uuid, chr_uuid, PendingOp::Read)
    }

    /// Same as [`read_characteristic`](Self::read_characteristic): resolves
    /// service and characteristic handles on a cache miss before writing.
    pub fn write_characteristic(
        &mut self,
        addr: BtleAddr,
        svc_uuid: Uuid128,
        chr_uuid: Uuid128,
        data: &[u8],
    ) -> Result<(), BtleError> {
        if data.len() > MAX_BTLE_GATT_WRITE_BYTES {
            return Err(BtleError::GattProcedureFailed);
        }
        let mut write_data = FixedArray::new();
        for &b in data {
            write_data.append(b);
        }
        self.start_chain(addr, svc_uuid, chr_uuid, PendingOp::Write(write_data))
    }

    /// Same as [`read_characteristic`](Self::read_characteristic): resolves
    /// on a cache miss before toggling the CCCD.
    pub fn change_notifications(
        &mut self,
        addr: BtleAddr,
        svc_uuid: Uuid128,
        chr_uuid: Uuid128,
        enable: bool,
    ) -> Result<(), BtleError> {
        self.start_chain(addr, svc_uuid, chr_uuid, PendingOp::Notify(enable))
    }

    /// Drain one backend event and advance its connection's sub-state.
    /// Call repeatedly until it returns `None` to drain a burst.
    pub fn poll(&mut self) -> Option<CentralEvent> {
        match self.backend.poll_event()? {
            BtleEvent::ScanResponse { addr, .. } => Some(CentralEvent::ScanResponse(addr)),
            BtleEvent::ConnectionOpened { addr } => {
                if let Some(idx) = self.find_slot(addr) {
                    self.slots.get_mut(idx).unwrap().state = ConnState::Connected;
                }
                Some(CentralEvent::ConnectionOpened(addr))
            }
            BtleEvent::ConnectionClosed { addr, reason } => {
                if let Some(idx) = self.find_slot(addr) {
                    self.slots.remove(idx);
                }
                Some(CentralEvent::ConnectionClosed(addr, reason))
            }
            BtleEvent::ServiceResolved { addr, uuid, handle } => {
                let idx = self.find_slot(addr)?;
                self.slots
                    .get_mut(idx)
                    .unwrap()
                    .service_handles
                    .append((uuid, handle));
                let chr_uuid = self.slots.get(idx)?.pending.as_ref()?.chr_uuid;
                self.slots.get_mut(idx).unwrap().state =
                    ConnState::ResolvingCharacteristic(handle, chr_uuid);
                if !self.backend.resolve_characteristic(addr, handle, chr_uuid) {
                    return self.complete_pending(idx, addr, false);
                }
                None
            }
            BtleEvent::CharacteristicResolved { addr, uuid, handle } => {
                let idx = self.find_slot(addr)?;
                self.slots
                    .get_mut(idx)
                    .unwrap()
                    .char_handles
                    .append((uuid, handle));
                self.slots.get_mut(idx).unwrap().state = ConnState::GattBusy;
                if !self.issue_terminal(idx, addr, handle) {
                    return self.complete_pending(idx, addr, false);
                }
                None
            }
            BtleEvent::CharacteristicValue { addr, .. } => {
                let idx = self.find_slot(addr)?;
                self.complete_pending(idx, addr, true)
            }
            BtleEvent::GattProcedureCompleted { addr, success } => {
                let idx = self.find_slot(addr)?;
                self.complete_pending(idx, addr, success)
            }
        }
    }
}
