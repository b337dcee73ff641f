//! Analog Devices ADG2128, an 8x12 analog cross-point switch controlled via I²C
//!
//! The 8-pin group are the columns (X0-X7), the 12-pin group are the rows
//! (Y0-Y11).
//!
//! Switch command: two bytes written to the device address
//! - byte 0: bit 7: switch state (1 = closed), bits 6..3: row, bits 2..0: column
//!   - rows 6..11 are at 8..13 on the wire; 6, 7, 14 and 15 select the
//!     readback registers instead
//! - byte 1: 1 latches all pending switch changes (including this one), 0
//!   only queues the change
//!
//! Readback: write the row's readback address and a 0x00 byte, then read two
//! bytes; the second is the column bitmap of that row.

use std::fmt;

use crate::bus::{
	BusOperations,
	BusTransport,
	Level,
	NoResetLine,
	ResetLine,
};

mod error;
mod flags;

#[cfg(test)]
mod sim;

pub use self::error::{
	Error,
	UnserializeError,
};

pub use self::flags::Flags;

pub mod consts {
	use std::time::Duration;

	pub const DEFAULT_ADDRESS: u8 = 0x70;

	pub const COLUMNS: u8 = 8;
	pub const ROWS: u8 = 12;

	pub const SERIALIZE_VERSION: u8 = 0x01;
	pub const SERIALIZE_SIZE: usize = 17;
	// reset pin byte in saved state if there is none
	pub const NO_RESET_PIN: u8 = 0xff;

	// hold time for each reset edge
	pub const RESET_SETTLE: Duration = Duration::from_millis(10);

	// indexed by physical row
	pub const READBACK_ADDRESS: [u8; 12] = [
		0x34, 0x3c, 0x74, 0x7c, 0x35, 0x3d,
		0x75, 0x7d, 0x36, 0x3e, 0x76, 0x7e,
	];
}

use self::consts::*;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum State {
	Uninitialized,
	/// saved state was loaded, `init` will write it to the device
	PendingBlobReplay,
	Initialized,
}

pub fn encode_command(col: u8, row: u8, closed: bool) -> Result<u8, Error> {
	if col >= COLUMNS {
		return Err(Error::BadColumn);
	}
	if row >= ROWS {
		return Err(Error::BadRow);
	}
	// skip the readback addresses in the middle
	let wire_row = if row >= 6 { row + 2 } else { row };
	let state = if closed { 0x80 } else { 0x00 };
	Ok(state | (wire_row << 3) | col)
}

fn decode_reset_pin(pin: u8) -> Option<u8> {
	if NO_RESET_PIN == pin {
		None
	} else {
		Some(pin)
	}
}

pub struct Adg2128<B, R = NoResetLine>
where
	B: BusTransport,
	R: ResetLine,
{
	address: u8,
	reset_pin: Option<u8>,
	reset_line: R,
	flags: Flags,
	bus: Option<B>,
	shadow: [u8; ROWS as usize],
}

impl<B: BusTransport> Adg2128<B, NoResetLine> {
	/// Device without a reset line; `reset` opens the switches one by one.
	pub fn new(address: u8) -> Self {
		Self::with_reset(address, None, NoResetLine)
	}
}

impl<B: BusTransport, R: ResetLine> Adg2128<B, R> {
	/// A reset pin only counts if `reset_line` is connected; without one
	/// `reset` opens the switches one by one.
	pub fn with_reset(address: u8, reset_pin: Option<u8>, reset_line: R) -> Self {
		let reset_pin = if reset_line.is_connected() {
			reset_pin.and_then(decode_reset_pin)
		} else {
			None
		};
		Adg2128 {
			address,
			reset_pin,
			reset_line,
			flags: Flags::default(),
			bus: None,
			shadow: [0u8; ROWS as usize],
		}
	}

	/// Restore a driver from `serialize` output; `init` then writes the saved
	/// switch state to the device.
	///
	/// Invalid saved state is logged and results in a fresh driver.
	pub fn from_blob(buf: &[u8], reset_line: R) -> Self {
		let (address, reset_pin) = if buf.len() >= 3 {
			(buf[1], decode_reset_pin(buf[2]))
		} else {
			(DEFAULT_ADDRESS, None)
		};

		let mut dev = Self::with_reset(address, reset_pin, reset_line);
		if let Err(e) = dev.unserialize(buf) {
			warn!("ADG2128 0x{:02x}: ignoring saved state: {}", address, e);
		}
		dev
	}

	pub fn address(&self) -> u8 {
		self.address
	}

	pub fn reset_pin(&self) -> Option<u8> {
		self.reset_pin
	}

	pub fn flags(&self) -> Flags {
		self.flags
	}

	pub fn state(&self) -> State {
		if self.flags.initialized {
			State::Initialized
		} else if self.flags.from_blob {
			State::PendingBlobReplay
		} else {
			State::Uninitialized
		}
	}

	pub fn initialized(&self) -> bool {
		self.flags.initialized
	}

	pub fn preserve_on_teardown(&self) -> bool {
		self.flags.preserve_on_teardown
	}

	pub fn set_preserve_on_teardown(&mut self, preserve: bool) {
		self.flags.preserve_on_teardown = preserve;
	}

	pub fn allow_many_rows_to_one_column(&self) -> bool {
		self.flags.allow_many_rows_to_one_column
	}

	pub fn set_allow_many_rows_to_one_column(&mut self, allow: bool) {
		self.flags.allow_many_rows_to_one_column = allow;
	}

	pub fn allow_one_row_to_many_columns(&self) -> bool {
		self.flags.allow_one_row_to_many_columns
	}

	pub fn set_allow_one_row_to_many_columns(&mut self, allow: bool) {
		self.flags.allow_one_row_to_many_columns = allow;
	}

	/// Bring shadow and device in sync.
	///
	/// Saved state loaded before the bus was available is written to the
	/// device; otherwise the device is reset, unless it should keep its
	/// switches, in which case they are only read back.
	pub fn init(&mut self, bus: Option<B>) -> Result<(), Error> {
		self.flags.initialized = false;
		if !self.flags.pins_configured {
			self.configure_pins();
		}
		if let Some(bus) = bus {
			self.bus = Some(bus);
		}

		if self.flags.from_blob {
			self.flags.from_blob = false;
			let saved = self.shadow;
			self.replay(&saved)?;
			self.flags.initialized = true;
			info!("ADG2128 0x{:02x}: restored saved switch state", self.address);
			Ok(())
		} else if !self.flags.preserve_on_teardown {
			self.reset()
		} else {
			self.read_all_rows()
		}
	}

	/// Open all switches and read back the result.
	pub fn reset(&mut self) -> Result<(), Error> {
		self.flags.initialized = false;
		match self.reset_pin {
			Some(pin) => {
				debug!("ADG2128 0x{:02x}: pulsing reset pin {}", self.address, pin);
				self.reset_line.set_level(pin, Level::Low);
				self.reset_line.settle(RESET_SETTLE);
				self.reset_line.set_level(pin, Level::High);
				self.reset_line.settle(RESET_SETTLE);
			},
			None => {
				debug!("ADG2128 0x{:02x}: no reset pin, opening switches one by one", self.address);
				self.replay(&[0u8; ROWS as usize])?;
			},
		}
		self.read_all_rows()?;
		info!("ADG2128 0x{:02x}: reset", self.address);
		Ok(())
	}

	/// Reload the shadow from the device.
	pub fn refresh(&mut self) -> Result<(), Error> {
		self.read_all_rows()
	}

	pub fn change_route(&mut self, col: u8, row: u8, closed: bool, defer: bool) -> Result<(), Error> {
		let command = encode_command(col, row, closed)?;
		if let Err(e) = self.write_command(command, !defer) {
			debug!("ADG2128 0x{:02x}: switch command 0x{:02x} failed: {}", self.address, command, e);
			return Err(Error::Bus);
		}

		let mask = 1u8 << col;
		let columns = &mut self.shadow[row as usize];
		if closed {
			*columns |= mask;
		} else {
			*columns &= !mask;
		}
		Ok(())
	}

	pub fn set_route(&mut self, col: u8, row: u8, defer: bool) -> Result<(), Error> {
		self.change_route(col, row, true, defer)
	}

	pub fn unset_route(&mut self, col: u8, row: u8, defer: bool) -> Result<(), Error> {
		self.change_route(col, row, false, defer)
	}

	/// Bitmask of the columns connected to `row`; 0 for invalid rows.
	pub fn columns_for_row(&self, row: u8) -> u8 {
		if row >= ROWS {
			return 0;
		}
		self.shadow[row as usize]
	}

	/// Bitmask of the rows connected to `col`; 0 for invalid columns.
	pub fn rows_for_column(&self, col: u8) -> u16 {
		if col >= COLUMNS {
			return 0;
		}
		let mut rows = 0u16;
		for (row, columns) in self.shadow.iter().enumerate() {
			if 0 != (columns >> col) & 1 {
				rows |= 1 << row;
			}
		}
		rows
	}

	/// Store identity, persisted flags and switch state in `buf`.
	///
	/// Returns the number of bytes written: `SERIALIZE_SIZE`, or 0 if the
	/// buffer is too small or the shadow isn't in sync with the device.
	///
	/// Layout:
	/// - 0: version
	/// - 1: I2C address
	/// - 2: reset pin (0xff: none)
	/// - 3-4: flags (big endian)
	/// - 5-16: rows 0 to 11
	pub fn serialize(&self, buf: &mut [u8]) -> usize {
		if buf.len() < SERIALIZE_SIZE || !self.flags.initialized {
			return 0;
		}
		let flags = self.flags.persisted();
		buf[0] = SERIALIZE_VERSION;
		buf[1] = self.address;
		buf[2] = self.reset_pin.unwrap_or(NO_RESET_PIN);
		buf[3] = (flags >> 8) as u8;
		buf[4] = flags as u8;
		buf[5..SERIALIZE_SIZE].copy_from_slice(&self.shadow);
		SERIALIZE_SIZE
	}

	pub fn to_blob(&self) -> Option<[u8; SERIALIZE_SIZE]> {
		let mut blob = [0u8; SERIALIZE_SIZE];
		if self.serialize(&mut blob) == SERIALIZE_SIZE {
			Some(blob)
		} else {
			None
		}
	}

	/// Load persisted flags and switch state from `serialize` output.
	///
	/// Address and reset pin in `buf` are ignored, they are fixed for the
	/// lifetime of the driver. An initialized driver writes the loaded state
	/// to the device right away, otherwise `init` will.
	pub fn unserialize(&mut self, buf: &[u8]) -> Result<(), UnserializeError> {
		if buf.len() < SERIALIZE_SIZE {
			return Err(UnserializeError::TooShort { len: buf.len() });
		}
		match buf[0] {
			SERIALIZE_VERSION => (),
			version => return Err(UnserializeError::UnknownVersion(version)),
		}

		let mut rows = [0u8; ROWS as usize];
		rows.copy_from_slice(&buf[5..SERIALIZE_SIZE]);
		self.flags.apply_persisted(u16::from_be_bytes([buf[3], buf[4]]));

		if self.flags.initialized {
			self.replay(&rows).map_err(|_| UnserializeError::Bus)
		} else {
			self.shadow = rows;
			self.flags.from_blob = true;
			Ok(())
		}
	}

	fn configure_pins(&mut self) {
		if let Some(pin) = self.reset_pin {
			self.reset_line.configure_as_output(pin);
		}
		self.flags.pins_configured = true;
	}

	// write all 96 switches; every change stays pending until the last
	// (row 11, column 7) latches them together. a failed write aborts, and
	// whatever was already latched stays latched.
	fn replay(&mut self, target: &[u8; ROWS as usize]) -> Result<(), Error> {
		const LAST: (u8, u8) = (ROWS - 1, COLUMNS - 1);

		for row in 0..ROWS {
			let columns = target[row as usize];
			for col in 0..COLUMNS {
				let closed = 0 != (columns >> col) & 1;
				self.change_route(col, row, closed, (row, col) != LAST)?;
			}
		}
		debug!("ADG2128 0x{:02x}: wrote all switches", self.address);
		Ok(())
	}

	fn write_command(&mut self, command: u8, commit: bool) -> crate::AResult<()> {
		let address = self.address;
		let bus = match self.bus.as_mut() {
			Some(bus) => bus,
			None => bail!("no I2C bus"),
		};
		debug!("ADG2128 0x{:02x}: command 0x{:02x} (latch: {})", address, command, commit);
		bus.write_bytes(address, &[command, if commit { 1 } else { 0 }])
	}

	fn read_row(&mut self, row: u8) -> crate::AResult<u8> {
		let address = self.address;
		let bus = match self.bus.as_mut() {
			Some(bus) => bus,
			None => bail!("no I2C bus"),
		};
		bus.write_bytes(address, &[READBACK_ADDRESS[row as usize], 0x00])?;
		let data = bus.read_bytes(address, 2)?;
		Ok(data[1])
	}

	// rows read before a failure keep their new value
	fn read_all_rows(&mut self) -> Result<(), Error> {
		for row in 0..ROWS {
			match self.read_row(row) {
				Ok(columns) => self.shadow[row as usize] = columns,
				Err(e) => {
					debug!("ADG2128 0x{:02x}: readback of row {} failed: {}", self.address, row, e);
					return Err(Error::Bus);
				},
			}
		}
		self.flags.initialized = true;
		Ok(())
	}
}

impl<B: BusTransport, R: ResetLine> Drop for Adg2128<B, R> {
	fn drop(&mut self) {
		if self.flags.preserve_on_teardown || !self.flags.pins_configured {
			return;
		}
		if let Some(pin) = self.reset_pin {
			// hold the part in reset: all switches open
			self.reset_line.set_level(pin, Level::Low);
		}
	}
}

impl<B: BusTransport, R: ResetLine> fmt::Display for Adg2128<B, R> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		writeln!(f, "ADG2128 8x12 cross-point switch @ 0x{:02x}", self.address)?;
		writeln!(f, "\tState:      {:?}", self.state())?;
		match self.reset_pin {
			Some(pin) => writeln!(f, "\tReset pin:  {}", pin)?,
			None => writeln!(f, "\tReset pin:  none")?,
		}
		writeln!(f, "\tFlags:      {:?}", self.flags)?;
		if self.flags.initialized {
			for (row, columns) in self.shadow.iter().enumerate() {
				writeln!(f, "\tRow {:2}     0x{:02x}", row, columns)?;
			}
		}
		Ok(())
	}
}
