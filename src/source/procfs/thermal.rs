//! Thermal sensor readings.
//!
//! Temperatures come from:
//! - `<sys>/class/thermal/thermal_zone*/temp`
//! - `<sys>/class/hwmon/hwmon*/temp*_input`
//!
//! Both report millidegrees Celsius.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn read_millidegrees(path: &Path) -> Option<f64> {
    let content = fs::read_to_string(path).ok()?;
    let millidegrees = content.trim().parse::<i64>().ok()?;
    Some(millidegrees as f64 / 1000.0)
}

/// Reads temperature from all thermal zones, keyed by zone name.
pub fn read_thermal_zones(sys_root: &Path) -> Result<HashMap<String, f64>, String> {
    let mut temperatures = HashMap::new();
    let thermal_base = sys_root.join("class/thermal");

    if !thermal_base.exists() {
        return Ok(temperatures);
    }

    let entries = fs::read_dir(&thermal_base)
        .map_err(|e| format!("Failed to read thermal directory: {}", e))?;

    for entry in entries.flatten() {
        let zone_name = entry.file_name().to_string_lossy().to_string();
        if !zone_name.starts_with("thermal_zone") {
            continue;
        }
        if let Some(celsius) = read_millidegrees(&entry.path().join("temp")) {
            temperatures.insert(zone_name, celsius);
        }
    }

    Ok(temperatures)
}

/// Reads temperature from hardware monitoring devices, keyed by
/// `<device name>_<file name>`.
pub fn read_hwmon_temps(sys_root: &Path) -> Result<HashMap<String, f64>, String> {
    let mut temperatures = HashMap::new();
    let hwmon_base = sys_root.join("class/hwmon");

    if !hwmon_base.exists() {
        return Ok(temperatures);
    }

    let entries =
        fs::read_dir(&hwmon_base).map_err(|e| format!("Failed to read hwmon directory: {}", e))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let hwmon_name = entry.file_name().to_string_lossy().to_string();
        if !hwmon_name.starts_with("hwmon") {
            continue;
        }

        let device_name = fs::read_to_string(path.join("name"))
            .map(|s| s.trim().to_string())
            .unwrap_or(hwmon_name);

        let dir_entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for temp_entry in dir_entries.flatten() {
            let temp_filename = temp_entry.file_name().to_string_lossy().to_string();
            if !temp_filename.starts_with("temp") || !temp_filename.ends_with("_input") {
                continue;
            }
            if let Some(celsius) = read_millidegrees(&temp_entry.path()) {
                temperatures.insert(format!("{}_{}", device_name, temp_filename), celsius);
            }
        }
    }

    Ok(temperatures)
}

/// Collects all temperature readings from both thermal zones and hwmon.
pub fn collect_temperatures(sys_root: &Path) -> HashMap<String, f64> {
    let mut all_temps = HashMap::new();
    if let Ok(thermal_temps) = read_thermal_zones(sys_root) {
        all_temps.extend(thermal_temps);
    }
    if let Ok(hwmon_temps) = read_hwmon_temps(sys_root) {
        all_temps.extend(hwmon_temps);
    }
    all_temps
}

/// Hottest reading across all sensors, `None` without sensors.
pub fn hottest(sys_root: &Path) -> Option<f64> {
    collect_temperatures(sys_root)
        .into_values()
        .reduce(f64::max)
}
