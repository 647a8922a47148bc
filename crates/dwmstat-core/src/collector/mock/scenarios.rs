//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/sys` states for a single
//! desktop machine.

use super::filesystem::MockFs;

/// Aggregate `/proc/stat` of the typical desktop.
pub const TYPICAL_STAT: &str = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
";

/// `/proc/meminfo` of the typical desktop.
pub const TYPICAL_MEMINFO: &str = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
Active:          4096000 kB
Inactive:        2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
";

impl MockFs {
    /// Creates a typical desktop: one AMD CPU (`k10temp`), one AMD GPU
    /// (`amdgpu`), 16 GB of RAM and two mounted filesystems.
    ///
    /// Paths are rooted at `/proc` and `/sys`.
    pub fn typical_desktop() -> Self {
        let fs = Self::new();

        fs.add_file("/proc/stat", TYPICAL_STAT);
        fs.add_file("/proc/meminfo", TYPICAL_MEMINFO);

        fs.add_hwmon("/sys", 0, "k10temp", &[("temp1_input", 41300)]);
        fs.add_hwmon(
            "/sys",
            1,
            "amdgpu",
            &[("temp1_input", 52000), ("temp2_input", 60000)],
        );
        fs.add_hwmon("/sys", 2, "nvme", &[("temp1_input", 35850)]);

        fs.add_mount("/", 1_000_000, 600_000);
        fs.add_mount("/home", 4_000_000, 1_000_000);

        fs
    }
}
