//! Check command implementation.
//!
//! Validates system requirements and configuration.

use herakles_top::{CounterSource, ScriptedSource, StaticSystemInfo};

use crate::config::{validate_effective_config, Config};
use crate::state::build_source;

/// Validates system requirements and configuration.
pub fn command_check(all: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Top - System Check");
    println!("==============================");

    let mut all_ok = true;

    // Check configuration first: a broken config makes the source checks moot
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

    if let Some(path) = &config.test_data_file {
        println!("\n🧪 Checking test data file...");
        match ScriptedSource::from_file(path) {
            Ok(source) => println!(
                "   ✅ {} frame(s) loaded from {}",
                source.data().frames.len(),
                path.display()
            ),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    match build_source(config) {
        Ok(source) => {
            if !check_source(source.as_ref(), all) {
                all_ok = false;
            }
        }
        Err(e) => {
            println!("   ❌ Cannot open counter source: {:#}", e);
            all_ok = false;
        }
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

/// Reads every counter once and reports what is available.
fn check_source(source: &(dyn CounterSource + Send + Sync), all: bool) -> bool {
    let mut ok = true;

    println!("\n📁 Checking process list...");
    let pids = match source.process_ids() {
        Ok(pids) if !pids.is_empty() => {
            println!("   ✅ Can list {} processes", pids.len());
            pids
        }
        Ok(_) => {
            println!("   ❌ Process list is empty");
            return false;
        }
        Err(e) => {
            println!("   ❌ {}", e);
            return false;
        }
    };

    println!("\n💾 Checking per-process counters...");
    let readable = pids
        .iter()
        .filter_map(|&pid| source.process_counters(pid).ok())
        .collect::<Vec<_>>();
    if readable.is_empty() {
        println!("   ❌ No process counters readable");
        ok = false;
    } else {
        println!(
            "   ✅ Counters readable for {}/{} processes",
            readable.len(),
            pids.len()
        );
        let with_disk = readable.iter().filter(|c| c.disk_bytes.is_some()).count();
        if with_disk == readable.len() {
            println!("   ✅ Disk counters available for all of them");
        } else {
            println!(
                "   ⚠️  Disk counters available for {}/{} (others show 0 MB/s)",
                with_disk,
                readable.len()
            );
        }
    }

    println!("\n🖥️  Checking system counters...");
    match source.system_counters() {
        Ok(system) => {
            println!(
                "   ✅ CPU time {} ticks, memory total {} kB, uptime {:.0} s",
                system.cpu.total(),
                system.memory_total_kb,
                system.uptime_seconds
            );
            if all {
                match system.temperature_celsius {
                    Some(t) => println!("   ✅ Temperature {:.1} °C", t),
                    None => println!("   ⚠️  No thermal sensors found"),
                }
                match system.cpu_mhz {
                    Some(mhz) => println!("   ✅ Clock speed {:.0} MHz", mhz),
                    None => println!("   ⚠️  Current clock speed unavailable"),
                }
            }
        }
        Err(e) => {
            println!("   ❌ {}", e);
            ok = false;
        }
    }

    if all {
        println!("\n🔧 Checking hardware description...");
        match source.describe_hardware() {
            Ok(description) => {
                let info = StaticSystemInfo::parse(&description);
                println!(
                    "   ✅ {} ({} cores / {} threads)",
                    if info.model_name.is_empty() {
                        "unknown model"
                    } else {
                        info.model_name.as_str()
                    },
                    info.physical_cores.map_or("?".to_string(), |n| n.to_string()),
                    info.logical_processors
                        .map_or("?".to_string(), |n| n.to_string())
                );
            }
            Err(e) => println!("   ⚠️  {}", e),
        }
    }

    ok
}
