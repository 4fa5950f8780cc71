//! Human-readable formatting for table cells and the system summary.

/// Formats a CPU share, e.g. `"12.5 %"`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{:.1} %", value)
}

/// Formats a KB amount with an adaptive unit: `"512 KB"`, `"1.5 MB"`,
/// `"2.0 GB"`.
#[must_use]
pub fn format_memory_kb(kb: u64) -> String {
    const KB_PER_MB: u64 = 1024;
    const KB_PER_GB: u64 = 1024 * 1024;

    if kb < KB_PER_MB {
        format!("{} KB", kb)
    } else if kb < KB_PER_GB {
        format!("{:.1} MB", kb as f64 / KB_PER_MB as f64)
    } else {
        format!("{:.1} GB", kb as f64 / KB_PER_GB as f64)
    }
}

/// Formats a KB amount in GB with one decimal.
#[must_use]
pub fn format_gigabytes(kb: u64) -> String {
    format!("{:.1} GB", kb as f64 / (1024.0 * 1024.0))
}

#[must_use]
pub fn format_disk_rate(mb_per_sec: f64) -> String {
    format!("{:.1} MB/s", mb_per_sec)
}

#[must_use]
pub fn format_network_rate(mbps: f64) -> String {
    format!("{:.1} Mbps", mbps)
}

/// Clock speed in MHz below 1000, otherwise in GHz.
#[must_use]
pub fn format_speed_mhz(mhz: f64) -> String {
    if mhz < 1000.0 {
        format!("{:.0} MHz", mhz)
    } else {
        format!("{:.1} GHz", mhz / 1000.0)
    }
}

#[must_use]
pub fn format_temperature(celsius: Option<f64>) -> String {
    match celsius {
        Some(c) => format!("{:.1} °C", c),
        None => "n/a".to_string(),
    }
}

/// Formats seconds since boot as `D:HH:MM:SS`.
#[must_use]
pub fn format_uptime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;
    format!("{}:{:02}:{:02}:{:02}", days, hours, minutes, secs)
}

/// Background intensity bucket (0 to 4) for a cell, where `max` is the
/// value that saturates the scale.
#[must_use]
pub fn heat_level(value: f64, max: f64) -> u8 {
    if value.is_nan() || value <= 0.0 || max.is_nan() || max <= 0.0 {
        return 0;
    }
    let level = (value / (max / 5.0)).floor();
    level.min(4.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_memory_kb_units() {
        assert_eq!(format_memory_kb(0), "0 KB");
        assert_eq!(format_memory_kb(512), "512 KB");
        assert_eq!(format_memory_kb(1023), "1023 KB");
        assert_eq!(format_memory_kb(1024), "1.0 MB");
        assert_eq!(format_memory_kb(1536), "1.5 MB");
        assert_eq!(format_memory_kb(2 * 1024 * 1024), "2.0 GB");
    }

    #[test]
    fn test_rate_formats() {
        assert_eq!(format_percent(12.5), "12.5 %");
        assert_eq!(format_disk_rate(0.42), "0.4 MB/s");
        assert_eq!(format_network_rate(0.0), "0.0 Mbps");
    }

    #[test]
    fn test_format_speed_mhz() {
        assert_eq!(format_speed_mhz(800.0), "800 MHz");
        assert_eq!(format_speed_mhz(2500.0), "2.5 GHz");
    }

    #[test]
    fn test_format_gigabytes_and_temperature() {
        assert_eq!(format_gigabytes(16 * 1024 * 1024), "16.0 GB");
        assert_eq!(format_temperature(Some(45.0)), "45.0 °C");
        assert_eq!(format_temperature(None), "n/a");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0.0), "0:00:00:00");
        assert_eq!(format_uptime(59.9), "0:00:00:59");
        assert_eq!(format_uptime(90_061.0), "1:01:01:01");
        assert_eq!(format_uptime(-5.0), "0:00:00:00");
    }

    #[test]
    fn test_heat_level_buckets() {
        assert_eq!(heat_level(0.0, 100.0), 0);
        assert_eq!(heat_level(19.9, 100.0), 0);
        assert_eq!(heat_level(20.0, 100.0), 1);
        assert_eq!(heat_level(79.0, 100.0), 3);
        assert_eq!(heat_level(100.0, 100.0), 4);
        assert_eq!(heat_level(5000.0, 100.0), 4);
        assert_eq!(heat_level(f64::NAN, 100.0), 0);
        assert_eq!(heat_level(10.0, 0.0), 0);
    }
}
