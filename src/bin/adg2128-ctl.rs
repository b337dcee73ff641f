#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate adg2128_crosspoint;
use adg2128_crosspoint::*;

use std::fs;
use std::process::exit;

use adg2128_crosspoint::adg2128::consts::{
	COLUMNS,
	DEFAULT_ADDRESS,
	ROWS,
};
use adg2128_crosspoint::linux::{
	DEFAULT_BUS,
	LinuxAdg2128,
};

// decimal or 0x-prefixed hex
fn parse_u8(name: &str, value: &str) -> AResult<u8> {
	let parsed = if value.starts_with("0x") || value.starts_with("0X") {
		u8::from_str_radix(&value[2..], 16)
	} else {
		value.parse::<u8>()
	};
	parsed.map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {:?}: {}", name, value, e);
		e.context(msg).into()
	})
}

fn get_param(matches: &clap::ArgMatches, name: &str) -> AResult<u8> {
	match matches.value_of(name) {
		Some(p) => parse_u8(name, p),
		None => bail!("missing parameter {}", name),
	}
}

fn get_coordinates(matches: &clap::ArgMatches) -> AResult<(u8, u8)> {
	let col = get_param(matches, "COL")?;
	let row = get_param(matches, "ROW")?;
	ensure!(col < COLUMNS, "column {} out of range (0-{})", col, COLUMNS - 1);
	ensure!(row < ROWS, "row {} out of range (0-{})", row, ROWS - 1);
	Ok((col, row))
}

fn open(matches: &clap::ArgMatches) -> AResult<LinuxAdg2128> {
	let bus = matches.value_of("bus").unwrap_or(DEFAULT_BUS);
	let address = match matches.value_of("address") {
		Some(a) => parse_u8("address", a)?,
		None => DEFAULT_ADDRESS,
	};
	let reset_pin = match matches.value_of("reset_pin") {
		Some(p) => Some(parse_u8("gpio", p)?),
		None => None,
	};
	debug!("opening ADG2128 0x{:02x} on {} (reset pin: {:?})", address, bus, reset_pin);
	linux::open_switch(bus, address, reset_pin)
}

fn print_columns(switch: &LinuxAdg2128, row: u8) {
	println!("row {:2}: 0x{:02x}", row, switch.columns_for_row(row));
}

fn route(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches, closed: bool) -> AResult<()> {
	let (col, row) = get_coordinates(sub_m)?;
	let defer = sub_m.is_present("defer");
	let mut switch = open(matches)?;
	switch.change_route(col, row, closed, defer)?;
	if defer {
		info!("switch X{} / Y{} queued, not latched yet", col, row);
	} else {
		// also latched changes queued by earlier runs
		switch.refresh()?;
	}
	print_columns(&switch, row);
	Ok(())
}

fn show(matches: &clap::ArgMatches) -> AResult<()> {
	let switch = open(matches)?;
	print!("{}", switch);
	Ok(())
}

fn reset(matches: &clap::ArgMatches) -> AResult<()> {
	let mut switch = open(matches)?;
	switch.reset()?;
	for row in 0..ROWS {
		print_columns(&switch, row);
	}
	Ok(())
}

fn refresh(matches: &clap::ArgMatches) -> AResult<()> {
	let mut switch = open(matches)?;
	switch.refresh()?;
	for row in 0..ROWS {
		print_columns(&switch, row);
	}
	Ok(())
}

fn rows(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let col = get_param(sub_m, "COL")?;
	ensure!(col < COLUMNS, "column {} out of range (0-{})", col, COLUMNS - 1);
	let switch = open(matches)?;
	println!("column {}: 0x{:03x}", col, switch.rows_for_column(col));
	Ok(())
}

fn save(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let file = match sub_m.value_of("FILE") {
		Some(f) => f,
		None => bail!("missing parameter FILE"),
	};
	let switch = open(matches)?;
	let blob = match switch.to_blob() {
		Some(b) => b,
		None => bail!("switch state not in sync with the device"),
	};
	fs::write(file, &blob[..]).map_err(|e| format_err!("couldn't write {}: {}", file, e))?;
	info!("saved switch state of 0x{:02x} to {}", switch.address(), file);
	Ok(())
}

fn restore(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let file = match sub_m.value_of("FILE") {
		Some(f) => f,
		None => bail!("missing parameter FILE"),
	};
	let bus = matches.value_of("bus").unwrap_or(DEFAULT_BUS);
	let blob = fs::read(file).map_err(|e| format_err!("couldn't read {}: {}", file, e))?;
	let switch = linux::restore_switch(bus, &blob)?;
	info!("restored switch state of 0x{:02x} from {}", switch.address(), file);
	for row in 0..ROWS {
		print_columns(&switch, row);
	}
	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg bus: -b --bus +takes_value "I2C bus device (default: /dev/i2c-1)")
		(@arg address: -a --address +takes_value "I2C address of the switch (default: 0x70)")
		(@arg reset_pin: -r --gpio +takes_value "sysfs GPIO number wired to RESET (default: none, reset in software)")
		(@subcommand show =>
			(about: "show switch state")
		)
		(@subcommand set =>
			(about: "close switch between column and row")
			(@arg defer: -d --defer "queue the change, latch it with the next non-deferred change")
			(@arg COL: +required "column (X, 0-7)")
			(@arg ROW: +required "row (Y, 0-11)")
		)
		(@subcommand unset =>
			(about: "open switch between column and row")
			(@arg defer: -d --defer "queue the change, latch it with the next non-deferred change")
			(@arg COL: +required "column (X, 0-7)")
			(@arg ROW: +required "row (Y, 0-11)")
		)
		(@subcommand rows =>
			(about: "show rows connected to a column")
			(@arg COL: +required "column (X, 0-7)")
		)
		(@subcommand reset =>
			(about: "open all switches")
		)
		(@subcommand refresh =>
			(about: "read switch state back from the device")
		)
		(@subcommand save =>
			(about: "save switch state to file")
			(@arg FILE: +required "target file")
		)
		(@subcommand restore =>
			(about: "write switch state from file to the device")
			(@arg FILE: +required "saved state")
		)
	).get_matches();

	match matches.subcommand() {
		("show", _) => show(&matches),
		("set", Some(sub_m)) => route(&matches, sub_m, true),
		("unset", Some(sub_m)) => route(&matches, sub_m, false),
		("rows", Some(sub_m)) => rows(&matches, sub_m),
		("reset", _) => reset(&matches),
		("refresh", _) => refresh(&matches),
		("save", Some(sub_m)) => save(&matches, sub_m),
		("restore", Some(sub_m)) => restore(&matches, sub_m),
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
