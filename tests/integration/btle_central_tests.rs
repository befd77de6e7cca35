//! Drives `Central` through a scan → connect → resolve → read sequence
//! against a scripted fake radio backend.

use embedcore::btle::{BtleAddr, BtleBackend, BtleEvent, Central, CentralEvent, GattOp, Uuid128};
use embedcore::error::BtleError;

struct ScriptedBackend {
    pending: heapless::Vec<BtleEventOwned, 8>,
    resolve_service_calls: u32,
    resolve_characteristic_calls: u32,
    read_calls: u32,
    write_calls: u32,
    notify_calls: u32,
    call_order: heapless::Vec<&'static str, 8>,
}

#[derive(Clone, Copy)]
enum BtleEventOwned {
    Opened(BtleAddr),
    ServiceResolved(BtleAddr, Uuid128, u16),
    CharacteristicResolved(BtleAddr, Uuid128, u16),
    Value(BtleAddr, u16),
    Completed(BtleAddr, bool),
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            pending: heapless::Vec::new(),
            resolve_service_calls: 0,
            resolve_characteristic_calls: 0,
            read_calls: 0,
            write_calls: 0,
            notify_calls: 0,
            call_order: heapless::Vec::new(),
        }
    }
}

impl BtleBackend for ScriptedBackend {
    fn start_scan(&mut self, _active: bool) -> bool {
        true
    }
    fn stop_scan(&mut self) {}

    fn connect(&mut self, addr: BtleAddr, _is_random: bool) -> bool {
        self.pending.push(BtleEventOwned::Opened(addr)).ok();
        true
    }
    fn disconnect(&mut self, _addr: BtleAddr) -> bool {
        true
    }

    fn resolve_service(&mut self, addr: BtleAddr, uuid: Uuid128) -> bool {
        self.resolve_service_calls += 1;
        self.call_order.push("resolve_service").ok();
        self.pending
            .push(BtleEventOwned::ServiceResolved(addr, uuid, 0x10))
            .ok();
        true
    }

    fn resolve_characteristic(&mut self, addr: BtleAddr, _service_handle: u16, uuid: Uuid128) -> bool {
        self.resolve_characteristic_calls += 1;
        self.call_order.push("resolve_characteristic").ok();
        self.pending
            .push(BtleEventOwned::CharacteristicResolved(addr, uuid, 0x11))
            .ok();
        true
    }

    fn read_characteristic(&mut self, addr: BtleAddr, handle: u16) -> bool {
        self.read_calls += 1;
        self.call_order.push("read_characteristic").ok();
        self.pending.push(BtleEventOwned::Value(addr, handle)).ok();
        true
    }

    fn write_characteristic(&mut self, addr: BtleAddr, _handle: u16, _data: &[u8]) -> bool {
        self.write_calls += 1;
        self.call_order.push("write_characteristic").ok();
        self.pending.push(BtleEventOwned::Completed(addr, true)).ok();
        true
    }
    fn write_cccd(&mut self, addr: BtleAddr, _handle: u16, _enable: bool) -> bool {
        self.notify_calls += 1;
        self.call_order.push("write_cccd").ok();
        self.pending.push(BtleEventOwned::Completed(addr, true)).ok();
        true
    }

    fn poll_event(&mut self) -> Option<BtleEvent<'_>> {
        if self.pending.is_empty() {
            return None;
        }
        Some(match self.pending.remove(0) {
            BtleEventOwned::Opened(addr) => BtleEvent::ConnectionOpened { addr },
            BtleEventOwned::ServiceResolved(addr, uuid, handle) => {
                BtleEvent::ServiceResolved { addr, uuid, handle }
            }
            BtleEventOwned::CharacteristicResolved(addr, uuid, handle) => {
                BtleEvent::CharacteristicResolved { addr, uuid, handle }
            }
            BtleEventOwned::Value(addr, handle) => BtleEvent::CharacteristicValue {
                addr,
                handle,
                op: GattOp::Read,
                data: &[],
            },
            BtleEventOwned::Completed(addr, success) => {
                BtleEvent::GattProcedureCompleted { addr, success }
            }
        })
    }
}

const ADDR: BtleAddr = [0xAA; 6];
const SERVICE: Uuid128 = [0x11; 16];
const CHAR: Uuid128 = [0x22; 16];

fn drain(central: &mut Central<ScriptedBackend>) -> heapless::Vec<CentralEvent, 16> {
    let mut out = heapless::Vec::new();
    while let Some(event) = central.poll() {
        out.push(event).ok();
    }
    out
}

#[test]
fn read_characteristic_resolves_service_then_characteristic_before_reading() {
    let mut central = Central::new(ScriptedBackend::new());
    central.start_connection(ADDR, false).unwrap();
    assert_eq!(
        drain(&mut central).as_slice(),
        [CentralEvent::ConnectionOpened(ADDR)]
    );

    central.read_characteristic(ADDR, SERVICE, CHAR).unwrap();
    let surfaced = drain(&mut central);

    assert_eq!(surfaced.as_slice(), [CentralEvent::ReadComplete(ADDR, true)]);
    let backend = central.backend();
    assert_eq!(backend.resolve_service_calls, 1);
    assert_eq!(backend.resolve_characteristic_calls, 1);
    assert_eq!(backend.read_calls, 1);
    assert_eq!(
        backend.call_order.as_slice(),
        ["resolve_service", "resolve_characteristic", "read_characteristic"]
    );
}

#[test]
fn write_characteristic_resolves_service_then_characteristic_before_writing() {
    let mut central = Central::new(ScriptedBackend::new());
    central.start_connection(ADDR, false).unwrap();
    drain(&mut central);

    central
        .write_characteristic(ADDR, SERVICE, CHAR, b"on")
        .unwrap();
    let surfaced = drain(&mut central);

    assert_eq!(surfaced.as_slice(), [CentralEvent::WriteComplete(ADDR, true)]);
    let backend = central.backend();
    assert_eq!(backend.resolve_service_calls, 1);
    assert_eq!(backend.resolve_characteristic_calls, 1);
    assert_eq!(backend.write_calls, 1);
    assert_eq!(
        backend.call_order.as_slice(),
        ["resolve_service", "resolve_characteristic", "write_characteristic"]
    );
}

#[test]
fn change_notifications_resolves_service_then_characteristic_before_toggling() {
    let mut central = Central::new(ScriptedBackend::new());
    central.start_connection(ADDR, false).unwrap();
    drain(&mut central);

    central
        .change_notifications(ADDR, SERVICE, CHAR, true)
        .unwrap();
    let surfaced = drain(&mut central);

    assert_eq!(
        surfaced.as_slice(),
        [CentralEvent::NotificationsChanged(ADDR, true)]
    );
    let backend = central.backend();
    assert_eq!(backend.resolve_service_calls, 1);
    assert_eq!(backend.resolve_characteristic_calls, 1);
    assert_eq!(backend.notify_calls, 1);
    assert_eq!(
        backend.call_order.as_slice(),
        ["resolve_service", "resolve_characteristic", "write_cccd"]
    );
}

#[test]
fn concurrent_gatt_procedure_is_rejected_as_busy() {
    let mut central = Central::new(ScriptedBackend::new());
    central.start_connection(ADDR, false).unwrap();
    drain(&mut central);

    central.read_characteristic(ADDR, SERVICE, CHAR).unwrap();
    let err = central
        .read_characteristic(ADDR, SERVICE, CHAR)
        .unwrap_err();
    assert_eq!(err, BtleError::ProcedureBusy);
}
