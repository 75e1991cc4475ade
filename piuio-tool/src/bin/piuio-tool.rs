use clap::{Args, Parser, Subcommand, ValueEnum};
use piuio_common::{
    LampId, OUTPUT_REPORT_LEN,
    usb_vendor_message::{PRODUCT_ID, VENDOR_ID},
};
use piuio_tool::{
    parse_hex_u16,
    vendor_coms::{self, PiuioCtl},
};
use std::{process, thread::sleep, time::Duration};

use anyhow::{Result, anyhow};

/// Talk to a PIUIO compatible IO board
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// The USB vendor_id of the device to find in 4 hex digits
    #[clap(long, short)]
    vendor_id: Option<String>,
    /// The USB product_id of the device to find in 4 hex digits
    #[clap(long, short)]
    product_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List PIUIO devices
    List,
    /// Show the switches that are pressed
    Inputs(InputsArgs),
    /// Write a raw output report
    Lamps(LampsArgs),
    /// Light the named lamps; every other lamp is turned off
    Light(LightArgs),
    /// Turn every lamp on or off
    AllLamps(AllLampsArgs),
}

#[derive(Args)]
struct InputsArgs {
    /// Keep polling and print each change
    #[clap(long, short)]
    watch: bool,

    /// Print the raw report too
    #[clap(long, short)]
    raw: bool,
}

#[derive(Args)]
struct LampsArgs {
    /// Up to 8 hex bytes; missing bytes are zero
    #[clap(required = true)]
    bytes: Vec<String>,
}

#[derive(Args)]
struct LightArgs {
    /// Lamp names such as p1-center or neon
    lamps: Vec<String>,
}

#[derive(Copy, Clone, ValueEnum)]
enum OnOff {
    On,
    Off,
}

#[derive(Args)]
struct AllLampsArgs {
    state: OnOff,
}

struct DeviceFinder {
    vendor_id: u16,
    product_id: u16,
}
impl DeviceFinder {
    fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            vendor_id: cli
                .vendor_id
                .as_deref()
                .map(parse_hex_u16)
                .transpose()?
                .unwrap_or(VENDOR_ID),
            product_id: cli
                .product_id
                .as_deref()
                .map(parse_hex_u16)
                .transpose()?
                .unwrap_or(PRODUCT_ID),
        })
    }

    fn no_found(&self) -> anyhow::Error {
        anyhow!(
            "No matching PIUIO usb device found!\n  vendor_id: {:04x}, product_id: {:04x}",
            self.vendor_id,
            self.product_id
        )
    }

    fn iter_devices(&self) -> Result<impl Iterator<Item = nusb::DeviceInfo> + '_> {
        Ok(nusb::list_devices()?
            .filter(|d| d.vendor_id() == self.vendor_id && d.product_id() == self.product_id))
    }

    fn get_device(&self) -> Result<PiuioCtl<nusb::Interface>> {
        let Some(info) = self.iter_devices()?.next() else {
            return Err(self.no_found());
        };
        let dev = info.open()?;
        PiuioCtl::<nusb::Interface>::find_vendor_interface(&dev)
    }

    fn list(&self) -> Result<()> {
        println!("PIUIO devices:");
        for dev in self.iter_devices()? {
            print_dev_info(&dev);
        }
        println!();
        Ok(())
    }

    fn inputs(&self, args: &InputsArgs) -> Result<()> {
        let ctl = self.get_device()?;
        let mut last = None;
        loop {
            let report = ctl.read_inputs()?;
            if last != Some(report) {
                last = Some(report);
                let names: Vec<_> = piuio_common::switches::pressed_in(&report)
                    .map(|s| s.name())
                    .collect();
                if args.raw {
                    print!("[{}] ", vendor_coms::to_hex(&report));
                }
                if names.is_empty() {
                    println!("(none)");
                } else {
                    println!("{}", names.join(" "));
                }
            }
            if !args.watch {
                return Ok(());
            }
            sleep(Duration::from_millis(16));
        }
    }

    fn lamps(&self, args: &LampsArgs) -> Result<()> {
        let report = vendor_coms::parse_report(&args.bytes)?;
        self.get_device()?.write_lamps(&report)
    }

    fn light(&self, args: &LightArgs) -> Result<()> {
        let lamps = vendor_coms::parse_lamps(&args.lamps)?;
        self.get_device()?.set_lamps(lamps)
    }

    fn all_lamps(&self, args: &AllLampsArgs) -> Result<()> {
        let ctl = self.get_device()?;
        match args.state {
            OnOff::On => ctl.set_lamps(LampId::ALL),
            OnOff::Off => ctl.write_lamps(&[0; OUTPUT_REPORT_LEN]),
        }
    }
}

fn print_dev_info(dev: &nusb::DeviceInfo) {
    println!(
        "Device: {:03}.{:03}, Id: {:04x}:{:04x}, Name: {} - {}, Serial: {} ",
        dev.bus_number(),
        dev.device_address(),
        dev.vendor_id(),
        dev.product_id(),
        dev.manufacturer_string().unwrap_or(""),
        dev.product_string().unwrap_or(""),
        dev.serial_number().unwrap_or(""),
    );
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = run(&cli);

    if let Err(message) = result {
        eprintln!("{message}");
        process::exit(1);
    };
}

fn run(cli: &Cli) -> Result<()> {
    let finder = DeviceFinder::from_cli(cli)?;
    log::debug!(
        "looking for {:04x}:{:04x}",
        finder.vendor_id,
        finder.product_id
    );

    match &cli.command {
        Commands::List => finder.list(),
        Commands::Inputs(args) => finder.inputs(args),
        Commands::Lamps(args) => finder.lamps(args),
        Commands::Light(args) => finder.light(args),
        Commands::AllLamps(args) => finder.all_lamps(args),
    }
}
