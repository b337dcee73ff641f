//! Capabilities a device driver needs from its environment: a two-wire
//! (I²C) bus master and the GPIO driving the device's reset input.
//!
//! I²C write transfer: START, address byte (7-bit address + W), data bytes
//! (each ACKed by the slave), STOP. A read transfer returns up to the
//! requested number of bytes; slaves are free to NACK early.

mod hardware;
mod operations;

pub use self::hardware::{
	BusTransport,
	Level,
	NoResetLine,
	ResetLine,
	reliable_sleep,
};

pub use self::operations::{
	BusOperations,
};
