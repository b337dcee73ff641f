use super::BusTransport;

pub trait BusOperations: BusTransport {
	fn write_bytes(&mut self, address: u8, data: &[u8]) -> crate::AResult<()> {
		self.begin_transaction(address);
		for b in data {
			self.write_byte(*b);
		}
		self.end_transaction()
	}

	// like `request_bytes`, but a short read is an error
	fn read_bytes(&mut self, address: u8, count: usize) -> crate::AResult<Vec<u8>> {
		let data = self.request_bytes(address, count)?;
		ensure!(data.len() == count,
			"short read from 0x{:02x}: got {} of {} bytes", address, data.len(), count
		);
		Ok(data)
	}
}

impl<B: BusTransport + ?Sized> BusOperations for B {
}
