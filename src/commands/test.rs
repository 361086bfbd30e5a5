//! Test command implementation.
//!
//! Runs the sampler against the live host without starting the server and
//! prints what would be published.

use herakles_netspeed_exporter::{
    Direction, Family, GaugeSink, ProcNetDev, SampleStore, Sampler, SysfsResolver,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config::Config;

/// Gauge sink that keeps the latest values for printing.
#[derive(Default)]
struct TableSink {
    values: Mutex<BTreeMap<String, BTreeMap<(u8, u8), f64>>>,
    info: Mutex<BTreeMap<String, String>>,
}

fn family_key(family: Family) -> u8 {
    match family {
        Family::Speed => 0,
        Family::Packets => 1,
        Family::Errors => 2,
        Family::Drops => 3,
    }
}

fn direction_key(direction: Direction) -> u8 {
    match direction {
        Direction::Receive => 0,
        Direction::Transmit => 1,
    }
}

impl GaugeSink for TableSink {
    fn set(&self, family: Family, interface: &str, direction: Direction, value: f64) {
        if let Ok(mut values) = self.values.lock() {
            values
                .entry(interface.to_string())
                .or_default()
                .insert((family_key(family), direction_key(direction)), value);
        }
    }

    fn set_info(&self, interface: &str, description: &str) {
        if let Ok(mut info) = self.info.lock() {
            info.insert(interface.to_string(), description.to_string());
        }
    }
}

impl TableSink {
    fn print(&self, verbose: bool) {
        let values = match self.values.lock() {
            Ok(v) => v,
            Err(_) => return,
        };
        let info = self.info.lock().map(|i| i.clone()).unwrap_or_default();
        let get = |m: &BTreeMap<(u8, u8), f64>, f: u8, d: u8| m.get(&(f, d)).copied().unwrap_or(0.0);

        for (iface, m) in values.iter() {
            let description = info.get(iface).map(String::as_str).unwrap_or("");
            println!("   ├─ {} ({})", iface, description);
            println!(
                "   │  ├─ RX: {:.1} kbit/s   TX: {:.1} kbit/s",
                get(m, 0, 0) / 1000.0,
                get(m, 0, 1) / 1000.0
            );
            if verbose {
                println!(
                    "   │  ├─ Packets RX/TX: {:.0}/{:.0}",
                    get(m, 1, 0),
                    get(m, 1, 1)
                );
                println!(
                    "   │  ├─ Errors  RX/TX: {:.0}/{:.0}",
                    get(m, 2, 0),
                    get(m, 2, 1)
                );
                println!(
                    "   │  └─ Drops   RX/TX: {:.0}/{:.0}",
                    get(m, 3, 0),
                    get(m, 3, 1)
                );
            }
        }
    }
}

/// Tests metrics collection.
pub fn command_test(
    iterations: usize,
    verbose: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 Herakles Netspeed Exporter - Test Mode");
    println!("=========================================");

    let sink = Arc::new(TableSink::default());
    let sampler_config = config.sampler_config();
    let sampler = Sampler::new(
        Arc::new(SampleStore::new()),
        Box::new(ProcNetDev::new(config.proc_net_dev_path(), config.read_timeout())),
        Arc::new(SysfsResolver::new(config.sys_class_net_path())),
        sink.clone(),
        sampler_config,
    );

    // The first cycle only seeds the store.
    let seed = sampler.run_cycle()?;
    println!(
        "\n🌱 Seeded {} of {} interfaces ({} filtered)",
        seed.stored, seed.seen, seed.filtered
    );

    for iteration in 1..=iterations {
        thread::sleep(sampler_config.interval);
        let report = sampler.run_cycle()?;
        println!(
            "\n🔄 Iteration {}/{}: {} interfaces published",
            iteration, iterations, report.published
        );
        sink.print(verbose);
    }

    println!("\n✅ Test completed successfully");
    Ok(())
}
