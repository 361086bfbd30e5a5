//! Check command implementation.
//!
//! Validates system requirements and configuration.

use herakles_netspeed_exporter::{InterfaceResolver, SysfsResolver};

use crate::config::{validate_effective_config, Config};
use crate::startup_checks::validate_requirements;

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Netspeed Exporter - System Check");
    println!("=============================================");

    let mut all_ok = true;
    let proc_net_dev = config.proc_net_dev_path();
    let sys_class_net = config.sys_class_net_path();

    println!("\n📁 Checking counter source and sysfs...");
    match validate_requirements(&proc_net_dev, &sys_class_net) {
        Ok(()) => println!("   ✅ {} and {} readable", proc_net_dev.display(), sys_class_net.display()),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n🌐 Interfaces that would be sampled...");
    let resolver = SysfsResolver::new(&sys_class_net);
    let content = std::fs::read_to_string(&proc_net_dev).unwrap_or_default();
    for (name, _) in herakles_netspeed_exporter::netdev::parse_netdev(&content) {
        match resolver.info(&name) {
            Some(info) if info.is_sampled() => println!("   ✅ {}", name),
            Some(info) if info.loopback => println!("   ⏭️  {} (loopback)", name),
            Some(_) => println!("   ⏭️  {} (down)", name),
            None => println!("   ⚠️  {} (flags unavailable)", name),
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    let allowlist = config.allowlist();
    if allowlist.is_empty() {
        println!("   ⚠️  No allowlist configured - every client may scrape");
    } else {
        println!("   ✅ Allowlist: {}", allowlist.entries().join(", "));
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
