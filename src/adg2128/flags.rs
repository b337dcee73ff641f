use std::fmt;

const FLAG_INITIALIZED:                u16 = 0x0001;
const FLAG_ALLOW_MANY_ROWS_TO_COLUMN:  u16 = 0x0002;
const FLAG_ALLOW_ROW_TO_MANY_COLUMNS:  u16 = 0x0004;
const FLAG_PRESERVE_ON_TEARDOWN:       u16 = 0x0008;
const FLAG_PINS_CONFIGURED:            u16 = 0x0010;
const FLAG_FROM_BLOB:                  u16 = 0x0020;

// runtime state never leaves the process
const PERSISTED_MASK: u16 = 0
	| FLAG_ALLOW_MANY_ROWS_TO_COLUMN
	| FLAG_ALLOW_ROW_TO_MANY_COLUMNS
	| FLAG_PRESERVE_ON_TEARDOWN
;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags {
	/// shadow matches the hardware
	pub initialized: bool,
	pub pins_configured: bool,
	/// shadow was loaded from saved state and waits for `init` to replay it
	pub from_blob: bool,
	/// keep the switches as they are when the driver goes away
	pub preserve_on_teardown: bool,
	// routing policy; stored, not enforced
	pub allow_many_rows_to_one_column: bool,
	pub allow_one_row_to_many_columns: bool,
}

impl Flags {
	pub fn bits(&self) -> u16 {
		let mut bits = 0;
		if self.initialized { bits |= FLAG_INITIALIZED; }
		if self.allow_many_rows_to_one_column { bits |= FLAG_ALLOW_MANY_ROWS_TO_COLUMN; }
		if self.allow_one_row_to_many_columns { bits |= FLAG_ALLOW_ROW_TO_MANY_COLUMNS; }
		if self.preserve_on_teardown { bits |= FLAG_PRESERVE_ON_TEARDOWN; }
		if self.pins_configured { bits |= FLAG_PINS_CONFIGURED; }
		if self.from_blob { bits |= FLAG_FROM_BLOB; }
		bits
	}

	pub fn persisted(&self) -> u16 {
		self.bits() & PERSISTED_MASK
	}

	// only touches the persisted subset; other bits in `bits` are ignored
	pub fn apply_persisted(&mut self, bits: u16) {
		self.allow_many_rows_to_one_column = 0 != bits & FLAG_ALLOW_MANY_ROWS_TO_COLUMN;
		self.allow_one_row_to_many_columns = 0 != bits & FLAG_ALLOW_ROW_TO_MANY_COLUMNS;
		self.preserve_on_teardown = 0 != bits & FLAG_PRESERVE_ON_TEARDOWN;
	}
}

impl fmt::Debug for Flags {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x} (", self.bits())?;
		if self.initialized { write!(f, " [INITIALIZED]")?; }
		if self.allow_many_rows_to_one_column { write!(f, " [MANY_ROWS_TO_COLUMN]")?; }
		if self.allow_one_row_to_many_columns { write!(f, " [ROW_TO_MANY_COLUMNS]")?; }
		if self.preserve_on_teardown { write!(f, " [PRESERVE]")?; }
		if self.pins_configured { write!(f, " [PINS]")?; }
		if self.from_blob { write!(f, " [FROM_BLOB]")?; }
		write!(f, " )")
	}
}
