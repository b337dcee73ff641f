mod gpio;
mod i2c;

pub use self::gpio::SysfsGpio;
pub use self::i2c::I2cDevice;

use crate::adg2128::{
	Adg2128,
	State,
};

pub type LinuxAdg2128 = Adg2128<I2cDevice, SysfsGpio>;

pub const DEFAULT_BUS: &str = "/dev/i2c-1";

/// Attach to a switch that may already carry routes: the current switch
/// state is read back instead of resetting the device, and kept when the
/// driver is dropped.
pub fn open_switch(bus_path: &str, address: u8, reset_pin: Option<u8>) -> crate::AResult<LinuxAdg2128> {
	let bus = I2cDevice::open(bus_path)?;
	let mut switch = Adg2128::with_reset(address, reset_pin, SysfsGpio::new());
	switch.set_preserve_on_teardown(true);
	switch.init(Some(bus)).map_err(|e| {
		format_err!("ADG2128 0x{:02x} on {}: init failed: {}", address, bus_path, e)
	})?;
	Ok(switch)
}

/// Create a switch from saved state and write that state to the device.
pub fn restore_switch(bus_path: &str, blob: &[u8]) -> crate::AResult<LinuxAdg2128> {
	let bus = I2cDevice::open(bus_path)?;
	let mut switch = Adg2128::from_blob(blob, SysfsGpio::new());
	ensure!(switch.state() == State::PendingBlobReplay, "invalid saved switch state");
	// the saved preserve flag only matters for drivers living on in-process
	switch.set_preserve_on_teardown(true);
	let address = switch.address();
	switch.init(Some(bus)).map_err(|e| {
		format_err!("ADG2128 0x{:02x} on {}: restoring saved state failed: {}", address, bus_path, e)
	})?;
	Ok(switch)
}
