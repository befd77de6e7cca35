//! Capability interfaces for the platform collaborators this crate consumes
//! but never implements: a GPIO pin, an I2C bus. The byte-stream and clock
//! capabilities live in [`crate::io`] and [`crate::time`] respectively since
//! they are used pervasively enough to warrant their own modules.

/// Logical direction of a [`GpioPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioDirection {
    Input,
    Output,
}

/// Whether a pin's logical value is inverted relative to its electrical level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioPolarity {
    NonInverted,
    Inverted,
}

/// A single GPIO pin, abstracted over direction/polarity/value. Concrete
/// MCU drivers implement this; this crate only calls through it.
pub trait GpioPort {
    fn set_direction(&mut self, direction: GpioDirection);
    fn set_polarity(&mut self, polarity: GpioPolarity);
    fn set_value(&mut self, value: bool);
    fn value(&self) -> bool;

    fn toggle(&mut self) {
        let v = self.value();
        self.set_value(!v);
    }
}

/// Outcome of an I2C transaction, delivered to the caller's completion
/// callback on the same run-loop thread that issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cResult {
    Success,
    NoAck,
    BusError,
}

/// A non-blocking I2C bus. Every operation takes a completion callback
/// invoked exactly once, from a later run-loop tick, never re-entrantly
/// from within the call that submitted the request.
pub trait I2cBus {
    /// Read `len` bytes from `addr`. `cb(result, bytes)` is called once;
    /// `bytes` is only meaningful on `I2cResult::Success`.
    fn read_bytes(&mut self, addr: u8, send_stop: bool, len: usize, cb: &mut dyn FnMut(I2cResult, &[u8]));

    /// Write `ctrl_bytes` (e.g. a register address) then read `len` bytes,
    /// without releasing the bus between the two phases.
    fn read_bytes_with_control(
        &mut self,
        addr: u8,
        ctrl_bytes: &[u8],
        len: usize,
        cb: &mut dyn FnMut(I2cResult, &[u8]),
    );

    fn write_bytes(&mut self, addr: u8, send_stop: bool, data: &[u8], cb: &mut dyn FnMut(I2cResult));

    /// Reset the bus after a stuck-SCL/SDA condition.
    fn reset_bus(&mut self);
}
