use std::fs;
use std::io::{
	self,
	Read,
	Write,
};
use std::os::unix::io::AsRawFd;
use std::path::{
	Path,
	PathBuf,
};

use crate::bus::BusTransport;

// from <linux/i2c-dev.h>
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// I2C bus master through the i2c-dev interface (`/dev/i2c-N`).
///
/// Every `read`/`write` on the device file is one transfer to the currently
/// selected slave address.
#[derive(Debug)]
pub struct I2cDevice {
	file: fs::File,
	path: PathBuf,
	selected: Option<u8>,
	transfer: Option<(u8, Vec<u8>)>,
}

impl I2cDevice {
	pub fn open<P: AsRef<Path>>(path: P) -> crate::AResult<Self> {
		let path = path.as_ref().to_path_buf();
		let file = with_context!(("couldn't open I2C bus {}", path.display()), {
			Ok(fs::OpenOptions::new()
				.read(true)
				.write(true)
				.open(&path)?)
		})?;

		Ok(I2cDevice {
			file,
			path,
			selected: None,
			transfer: None,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn select(&mut self, address: u8) -> io::Result<()> {
		if Some(address) == self.selected {
			return Ok(());
		}
		let res = unsafe {
			libc::ioctl(self.file.as_raw_fd(), I2C_SLAVE as _, libc::c_ulong::from(address))
		};
		if res < 0 {
			self.selected = None;
			return Err(io::Error::last_os_error());
		}
		self.selected = Some(address);
		Ok(())
	}
}

impl BusTransport for I2cDevice {
	fn begin_transaction(&mut self, address: u8) {
		self.transfer = Some((address, Vec::with_capacity(2)));
	}

	fn write_byte(&mut self, data: u8) {
		if let Some((_, buf)) = self.transfer.as_mut() {
			buf.push(data);
		}
	}

	fn end_transaction(&mut self) -> crate::AResult<()> {
		let (address, data) = match self.transfer.take() {
			Some(t) => t,
			None => bail!("I2C write without begin_transaction"),
		};
		let path = self.path.display().to_string();
		with_context!(("write to 0x{:02x} on {}", address, path), {
			self.select(address)?;
			// the whole transfer goes out in one syscall (one START ... STOP)
			let written = self.file.write(&data)?;
			ensure!(written == data.len(), "short write: {} of {} bytes", written, data.len());
			Ok(())
		})
	}

	fn request_bytes(&mut self, address: u8, count: usize) -> crate::AResult<Vec<u8>> {
		let path = self.path.display().to_string();
		with_context!(("read from 0x{:02x} on {}", address, path), {
			self.select(address)?;
			let mut buf = vec![0u8; count];
			let read = self.file.read(&mut buf)?;
			buf.truncate(read);
			Ok(buf)
		})
	}
}
