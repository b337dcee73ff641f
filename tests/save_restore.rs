extern crate adg2128_crosspoint;

use std::cell::RefCell;
use std::rc::Rc;

use adg2128_crosspoint::adg2128::consts::SERIALIZE_SIZE;
use adg2128_crosspoint::bus::{
	BusTransport,
	NoResetLine,
};
use adg2128_crosspoint::*;

// latched switch state plus the raw transfers, shared with the test
#[derive(Default)]
struct Device {
	rows: [u8; 12],
	pending: Vec<u8>,
	readback_row: usize,
	writes: Vec<Vec<u8>>,
}

struct Bus {
	device: Rc<RefCell<Device>>,
	buf: Vec<u8>,
}

const READBACK: [u8; 12] = [0x34, 0x3c, 0x74, 0x7c, 0x35, 0x3d, 0x75, 0x7d, 0x36, 0x3e, 0x76, 0x7e];

impl BusTransport for Bus {
	fn begin_transaction(&mut self, _address: u8) {
		self.buf.clear();
	}

	fn write_byte(&mut self, data: u8) {
		self.buf.push(data);
	}

	fn end_transaction(&mut self) -> AResult<()> {
		let mut dev = self.device.borrow_mut();
		dev.writes.push(self.buf.clone());
		let (command, latch) = (self.buf[0], self.buf[1]);
		if let Some(row) = READBACK.iter().position(|a| *a == command) {
			dev.readback_row = row;
			return Ok(());
		}
		dev.pending.push(command);
		if 1 == latch {
			for command in std::mem::replace(&mut dev.pending, Vec::new()) {
				let wire_row = ((command >> 3) & 0x0f) as usize;
				let row = if wire_row >= 8 { wire_row - 2 } else { wire_row };
				let mask = 1u8 << (command & 0x07);
				if 0 != command & 0x80 {
					dev.rows[row] |= mask;
				} else {
					dev.rows[row] &= !mask;
				}
			}
		}
		Ok(())
	}

	fn request_bytes(&mut self, _address: u8, count: usize) -> AResult<Vec<u8>> {
		let dev = self.device.borrow();
		let mut data = vec![0x00, dev.rows[dev.readback_row]];
		data.truncate(count);
		Ok(data)
	}
}

fn attach(device: &Rc<RefCell<Device>>) -> Option<Bus> {
	Some(Bus {
		device: device.clone(),
		buf: Vec::new(),
	})
}

#[test]
fn saved_routes_survive_a_new_driver() {
	let first = Rc::new(RefCell::new(Device::default()));
	let mut switch: Adg2128<Bus> = Adg2128::new(0x70);
	switch.init(attach(&first)).unwrap();

	// stage a 2x2 cross connection and latch it with the last change
	switch.set_route(0, 0, true).unwrap();
	switch.set_route(1, 6, true).unwrap();
	switch.set_route(6, 9, true).unwrap();
	switch.set_route(7, 11, false).unwrap();
	assert_eq!(first.borrow().rows[6], 0x02);

	let mut blob = [0u8; SERIALIZE_SIZE];
	assert_eq!(switch.serialize(&mut blob), SERIALIZE_SIZE);
	drop(switch);

	// before the bus is available
	let mut restored: Adg2128<Bus> = Adg2128::from_blob(&blob, NoResetLine);
	assert_eq!(restored.state(), State::PendingBlobReplay);
	assert_eq!(restored.serialize(&mut [0u8; SERIALIZE_SIZE]), 0);

	let second = Rc::new(RefCell::new(Device::default()));
	restored.init(attach(&second)).unwrap();
	assert_eq!(restored.state(), State::Initialized);
	assert_eq!(second.borrow().rows, first.borrow().rows);
	assert_eq!(restored.columns_for_row(9), 0x40);
	assert_eq!(restored.rows_for_column(6), 0x0200);

	let latched = second.borrow().writes.iter().filter(|w| 1 == w[1]).count();
	assert_eq!(latched, 1);
}

#[test]
fn bad_coordinates_and_reset() {
	let device = Rc::new(RefCell::new(Device::default()));
	let mut switch: Adg2128<Bus> = Adg2128::new(0x70);
	switch.init(attach(&device)).unwrap();

	switch.set_route(3, 5, false).unwrap();
	assert_eq!(switch.columns_for_row(5), 0x08);
	assert_eq!(switch.change_route(8, 0, true, false), Err(Error::BadColumn));
	assert_eq!(switch.columns_for_row(0), 0x00);

	switch.reset().unwrap();
	for row in 0..12 {
		assert_eq!(switch.columns_for_row(row), 0);
	}
	assert_eq!(device.borrow().rows, [0u8; 12]);
}
