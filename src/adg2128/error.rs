use failure::Fail;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Fail)]
pub enum Error {
	// not detected yet; the bus only reports failed transfers
	#[fail(display = "ADG2128 not responding")]
	Absent,
	#[fail(display = "I2C bus transfer failed")]
	Bus,
	#[fail(display = "column out of range (0-7)")]
	BadColumn,
	#[fail(display = "row out of range (0-11)")]
	BadRow,
}

impl Error {
	pub fn code(&self) -> i8 {
		match self {
			Error::Absent => -1,
			Error::Bus => -2,
			Error::BadColumn => -3,
			Error::BadRow => -4,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Error::Absent => "ABSENT",
			Error::Bus => "BUS",
			Error::BadColumn => "BAD_COLUMN",
			Error::BadRow => "BAD_ROW",
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Fail)]
pub enum UnserializeError {
	#[fail(display = "saved state too short: {} bytes", len)]
	TooShort {
		len: usize,
	},
	#[fail(display = "unknown saved state version 0x{:02x}", _0)]
	UnknownVersion(u8),
	#[fail(display = "replaying saved state failed: I2C bus transfer failed")]
	Bus,
}

impl UnserializeError {
	pub fn code(&self) -> i8 {
		match self {
			UnserializeError::TooShort { .. } => -1,
			UnserializeError::UnknownVersion(_) => -1,
			UnserializeError::Bus => -2,
		}
	}
}
