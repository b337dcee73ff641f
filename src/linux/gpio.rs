use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::bus::{
	Level,
	ResetLine,
};

const SYSFS_GPIO: &str = "/sys/class/gpio";

/// GPIO through the (legacy) sysfs interface; pins are kernel GPIO numbers.
///
/// Failures are logged: the reset line has no way to report them, and the
/// readback after a reset shows whether it worked.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SysfsGpio {
	root: PathBuf,
}

impl Default for SysfsGpio {
	fn default() -> Self {
		SysfsGpio::new()
	}
}

impl SysfsGpio {
	pub fn new() -> Self {
		SysfsGpio {
			root: PathBuf::from(SYSFS_GPIO),
		}
	}

	fn pin_dir(&self, pin: u8) -> PathBuf {
		self.root.join(format!("gpio{}", pin))
	}

	fn write_file(&self, path: PathBuf, value: &str) -> crate::AResult<()> {
		with_context!(("couldn't write {:?} to {}", value, path.display()), {
			// one syscall per value
			fs::OpenOptions::new().write(true).open(&path)?.write_all(value.as_bytes())?;
			Ok(())
		})
	}

	fn export(&self, pin: u8) -> crate::AResult<()> {
		if self.pin_dir(pin).exists() {
			return Ok(());
		}
		self.write_file(self.root.join("export"), &pin.to_string())
	}
}

impl ResetLine for SysfsGpio {
	fn configure_as_output(&mut self, pin: u8) {
		// "high" switches to output without pulsing the (active low) reset
		let res = self.export(pin)
			.and_then(|()| self.write_file(self.pin_dir(pin).join("direction"), "high"));
		if let Err(e) = res {
			warn!("GPIO {}: couldn't configure as output: {}", pin, e);
		}
	}

	fn set_level(&mut self, pin: u8, level: Level) {
		let value = match level {
			Level::Low => "0",
			Level::High => "1",
		};
		if let Err(e) = self.write_file(self.pin_dir(pin).join("value"), value) {
			warn!("GPIO {}: couldn't set {:?}: {}", pin, level, e);
		}
	}
}
