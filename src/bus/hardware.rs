use std::thread;
use std::time::{
	Duration,
	Instant,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
	Low,
	High,
}

/// Two-wire bus as seen by a single master.
///
/// Bytes written between `begin_transaction` and `end_transaction` form one
/// write transfer; `end_transaction` reports whether the device acknowledged
/// it.
pub trait BusTransport {
	fn begin_transaction(&mut self, address: u8);
	fn write_byte(&mut self, data: u8);
	fn end_transaction(&mut self) -> crate::AResult<()>;

	// may return fewer bytes than requested
	fn request_bytes(&mut self, address: u8, count: usize) -> crate::AResult<Vec<u8>>;
}

/// Digital outputs driving a chip's (active low) reset input.
pub trait ResetLine {
	fn configure_as_output(&mut self, pin: u8);
	fn set_level(&mut self, pin: u8, level: Level);

	// false if `set_level` doesn't reach the chip; its reset pin is ignored
	fn is_connected(&self) -> bool {
		true
	}

	// keep the current level for (at least) `duration`
	fn settle(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

/// For boards without a wired reset line.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct NoResetLine;

impl ResetLine for NoResetLine {
	fn configure_as_output(&mut self, _pin: u8) {
	}

	fn set_level(&mut self, _pin: u8, _level: Level) {
	}

	fn is_connected(&self) -> bool {
		false
	}
}
