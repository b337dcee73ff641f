use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::bus::{
	BusTransport,
	Level,
	ResetLine,
};

use super::consts::*;

/// Behaves like an ADG2128 on the bus, records every transfer and can be
/// told to fail a given write or read.
#[derive(Debug, Default)]
pub struct SimulatedChip {
	pub address: u8,
	pub live: [u8; 12],
	pending: Vec<(u8, u8, bool)>,
	selected_row: Option<usize>,
	// every write transfer, failed ones included
	pub writes: Vec<Vec<u8>>,
	pub reads: usize,
	// index into `writes` / read count that fails
	pub fail_write: Option<usize>,
	pub fail_read: Option<usize>,
	pub short_read: bool,
	pub reset_levels: Vec<(u8, Level)>,
	pub configured_pins: Vec<u8>,
	pub settled: Duration,
}

pub type Chip = Rc<RefCell<SimulatedChip>>;

impl SimulatedChip {
	pub fn new(address: u8) -> Chip {
		Rc::new(RefCell::new(SimulatedChip {
			address,
			..SimulatedChip::default()
		}))
	}

	// switch commands only, readback selections filtered out
	pub fn switch_writes(&self) -> Vec<Vec<u8>> {
		self.writes.iter()
			.filter(|w| !READBACK_ADDRESS.contains(&w[0]))
			.cloned()
			.collect()
	}

	fn write(&mut self, address: u8, data: Vec<u8>) -> crate::AResult<()> {
		let index = self.writes.len();
		self.writes.push(data.clone());
		ensure!(Some(index) != self.fail_write, "NACK (scripted)");
		ensure!(address == self.address, "NACK from 0x{:02x}", address);
		ensure!(data.len() == 2, "unexpected transfer length {}", data.len());

		if let Some(row) = READBACK_ADDRESS.iter().position(|a| *a == data[0]) {
			self.selected_row = Some(row);
			return Ok(());
		}

		let closed = 0 != data[0] & 0x80;
		let wire_row = (data[0] >> 3) & 0x0f;
		let col = data[0] & 0x07;
		let row = match wire_row {
			0..=5 => wire_row,
			8..=13 => wire_row - 2,
			_ => bail!("invalid row 0x{:x} in command 0x{:02x}", wire_row, data[0]),
		};
		self.pending.push((row, col, closed));
		if 1 == data[1] {
			for (row, col, closed) in self.pending.drain(..) {
				let columns = &mut self.live[row as usize];
				if closed {
					*columns |= 1 << col;
				} else {
					*columns &= !(1 << col);
				}
			}
		}
		Ok(())
	}

	fn read(&mut self, address: u8, count: usize) -> crate::AResult<Vec<u8>> {
		let index = self.reads;
		self.reads += 1;
		ensure!(Some(index) != self.fail_read, "NACK (scripted)");
		ensure!(address == self.address, "NACK from 0x{:02x}", address);
		let row = match self.selected_row {
			Some(row) => row,
			None => bail!("no readback row selected"),
		};
		let mut data = vec![0xff, self.live[row]];
		if self.short_read {
			data.truncate(1);
		}
		data.truncate(count);
		Ok(data)
	}
}

pub struct FakeBus {
	chip: Chip,
	transfer: Option<(u8, Vec<u8>)>,
}

impl FakeBus {
	pub fn new(chip: &Chip) -> Self {
		FakeBus {
			chip: chip.clone(),
			transfer: None,
		}
	}
}

impl BusTransport for FakeBus {
	fn begin_transaction(&mut self, address: u8) {
		self.transfer = Some((address, Vec::new()));
	}

	fn write_byte(&mut self, data: u8) {
		if let Some((_, buf)) = self.transfer.as_mut() {
			buf.push(data);
		}
	}

	fn end_transaction(&mut self) -> crate::AResult<()> {
		let (address, data) = match self.transfer.take() {
			Some(t) => t,
			None => bail!("no transfer started"),
		};
		self.chip.borrow_mut().write(address, data)
	}

	fn request_bytes(&mut self, address: u8, count: usize) -> crate::AResult<Vec<u8>> {
		self.chip.borrow_mut().read(address, count)
	}
}

pub struct FakeResetLine {
	chip: Chip,
}

impl FakeResetLine {
	pub fn new(chip: &Chip) -> Self {
		FakeResetLine {
			chip: chip.clone(),
		}
	}
}

impl ResetLine for FakeResetLine {
	fn configure_as_output(&mut self, pin: u8) {
		self.chip.borrow_mut().configured_pins.push(pin);
	}

	fn set_level(&mut self, pin: u8, level: Level) {
		let mut chip = self.chip.borrow_mut();
		chip.reset_levels.push((pin, level));
		if Level::Low == level {
			chip.live = [0u8; 12];
			chip.pending.clear();
		}
	}

	fn settle(&mut self, duration: Duration) {
		self.chip.borrow_mut().settled += duration;
	}
}
