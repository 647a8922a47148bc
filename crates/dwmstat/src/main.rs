//! dwmstat - status line feeder for dwm.
//!
//! Refreshes a fixed set of blocks (CPU, GPU, RAM, mounts, clock, weather)
//! at their own intervals and sets the root window name whenever the
//! composed line changes.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use dwmstat_core::collector::{
    FileSystem, HttpFetch, Offline, RealFs, ReqwestFetch, ThermalSource,
};
use dwmstat_core::manifest::{MountPoint, WeatherFormat, parse_interval};
use dwmstat_core::publish::{StdoutSink, TitleSink, XsetrootSink};
use dwmstat_core::{BlockKind, Daemon, Manifest, Shutdown};

/// Status line feeder for the dwm window manager.
#[derive(Parser, Debug)]
#[command(name = "dwmstat", about = "Status line feeder for dwm", version)]
struct Args {
    /// Blocks to show, in order (cpu, gpu, ram, mount, clock, weather).
    #[arg(short, long, value_delimiter = ',', value_name = "LIST")]
    blocks: Vec<BlockKind>,

    /// Refresh interval override, e.g. "weather=3600". Repeatable.
    #[arg(long, value_name = "KIND=SECS", value_parser = parse_interval_arg)]
    interval: Vec<(BlockKind, Duration)>,

    /// Filesystem watched by the mount block. Repeatable.
    #[arg(long, value_name = "PATH:LABEL")]
    mount: Vec<MountPoint>,

    /// CPU usage alert threshold, percent.
    #[arg(long, value_name = "PERCENT")]
    cpu_alert: Option<f64>,

    /// CPU temperature alert threshold, degrees Celsius.
    #[arg(long, value_name = "CELSIUS")]
    cpu_temp_alert: Option<f64>,

    /// GPU temperature alert threshold, degrees Celsius.
    #[arg(long, value_name = "CELSIUS")]
    gpu_temp_alert: Option<f64>,

    /// RAM usage alert threshold, percent.
    #[arg(long, value_name = "PERCENT")]
    ram_alert: Option<f64>,

    /// Filesystem usage alert threshold, percent.
    #[arg(long, value_name = "PERCENT")]
    disk_alert: Option<f64>,

    /// Text placed before a fragment whose value crossed its threshold.
    #[arg(long, value_name = "TEXT")]
    alert_marker: Option<String>,

    /// CPU temperature input file(s), averaged. Repeatable.
    #[arg(long, value_name = "PATH", conflicts_with = "cpu_thermal_driver")]
    cpu_thermal: Vec<PathBuf>,

    /// hwmon driver name of the CPU sensor.
    #[arg(long, value_name = "NAME")]
    cpu_thermal_driver: Option<String>,

    /// GPU temperature input file(s), averaged. Repeatable.
    #[arg(long, value_name = "PATH", conflicts_with = "gpu_thermal_driver")]
    gpu_thermal: Vec<PathBuf>,

    /// hwmon driver name of the GPU sensor.
    #[arg(long, value_name = "NAME")]
    gpu_thermal_driver: Option<String>,

    /// URL returning the weather text.
    #[arg(long, env = "DWMSTAT_WEATHER_URL", value_name = "URL")]
    weather_url: Option<String>,

    /// Weather request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    weather_timeout: Option<u64>,

    /// How the weather response is shown: raw or icon-temp.
    #[arg(long, value_name = "FORMAT")]
    weather_format: Option<WeatherFormat>,

    /// Byte limit for the weather text.
    #[arg(long, value_name = "BYTES")]
    weather_max_len: Option<usize>,

    /// strftime pattern of the clock block, brackets included.
    #[arg(long, value_name = "FORMAT")]
    clock_format: Option<String>,

    /// Locale for day and month names (e.g. en_US, de_DE).
    #[arg(long, env = "DWMSTAT_LOCALE", value_name = "LOCALE")]
    locale: Option<String>,

    /// Byte capacity of each block's fragment.
    #[arg(long, value_name = "BYTES")]
    capacity: Option<usize>,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// Path to /sys filesystem (for testing/mocking).
    #[arg(long, default_value = "/sys")]
    sys_path: PathBuf,

    /// Print each status line to stdout instead of setting the root window name.
    #[arg(long)]
    stdout: bool,

    /// Refresh every block once, publish, and exit.
    #[arg(long)]
    once: bool,

    /// Print the effective manifest as JSON and exit.
    #[arg(long)]
    print_manifest: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_interval_arg(s: &str) -> Result<(BlockKind, Duration), String> {
    parse_interval(s).map_err(|e| e.to_string())
}

/// Initializes the tracing subscriber on stderr.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = log_level(verbose, quiet);

    let filter = ["dwmstat", "dwmstat_core"]
        .iter()
        .filter_map(|target| format!("{}={}", target, level).parse::<Directive>().ok())
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn thermal_source(files: &[PathBuf], driver: Option<&str>, default: ThermalSource) -> ThermalSource {
    if !files.is_empty() {
        ThermalSource::Files(files.to_vec())
    } else if let Some(driver) = driver {
        ThermalSource::hwmon(driver)
    } else {
        default
    }
}

/// Applies command line overrides on top of the built-in defaults.
fn build_manifest(args: &Args) -> Manifest {
    let mut manifest = Manifest::default();

    if !args.blocks.is_empty() {
        manifest = manifest.with_blocks(&args.blocks);
    }
    for &(kind, interval) in &args.interval {
        manifest.set_interval(kind, interval);
    }
    if !args.mount.is_empty() {
        manifest.mounts = args.mount.clone();
    }

    let limits = &mut manifest.thresholds;
    limits.cpu_usage = args.cpu_alert.unwrap_or(limits.cpu_usage);
    limits.cpu_temp = args.cpu_temp_alert.unwrap_or(limits.cpu_temp);
    limits.gpu_temp = args.gpu_temp_alert.unwrap_or(limits.gpu_temp);
    limits.ram_usage = args.ram_alert.unwrap_or(limits.ram_usage);
    limits.disk_usage = args.disk_alert.unwrap_or(limits.disk_usage);

    if let Some(marker) = &args.alert_marker {
        manifest.alert_marker = marker.clone();
    }

    manifest.cpu_thermal = thermal_source(
        &args.cpu_thermal,
        args.cpu_thermal_driver.as_deref(),
        manifest.cpu_thermal,
    );
    manifest.gpu_thermal = thermal_source(
        &args.gpu_thermal,
        args.gpu_thermal_driver.as_deref(),
        manifest.gpu_thermal,
    );

    if let Some(url) = &args.weather_url {
        manifest.weather.url = url.clone();
    }
    if let Some(secs) = args.weather_timeout {
        manifest.weather.timeout = Duration::from_secs(secs);
    }
    if let Some(format) = args.weather_format {
        manifest.weather.format = format;
    }
    if let Some(max_len) = args.weather_max_len {
        manifest.weather.max_len = max_len;
    }

    if let Some(format) = &args.clock_format {
        manifest.clock_format = format.clone();
    }
    if let Some(locale) = &args.locale {
        manifest.locale = locale.clone();
    }
    if let Some(capacity) = args.capacity {
        manifest.capacity = capacity;
    }

    manifest.proc_path = args.proc_path.clone();
    manifest.sys_path = args.sys_path.clone();
    manifest
}

fn describe_manifest(manifest: &Manifest) -> String {
    manifest
        .blocks
        .iter()
        .map(|b| format!("{}/{}s", b.kind, b.interval.as_secs()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() {
    let args = Args::parse();

    let manifest = build_manifest(&args);
    if let Err(e) = manifest.validate() {
        eprintln!("dwmstat: {}", e);
        std::process::exit(1);
    }

    if args.print_manifest {
        match serde_json::to_string_pretty(&manifest) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("dwmstat: cannot serialize manifest: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    init_logging(args.verbose, args.quiet);

    info!("dwmstat {} starting", env!("CARGO_PKG_VERSION"));
    info!("Blocks: {}", describe_manifest(&manifest));
    debug!(
        "Config: proc={}, sys={}, locale={}",
        manifest.proc_path.display(),
        manifest.sys_path.display(),
        manifest.locale
    );

    let fs = RealFs::new();
    for root in [&manifest.proc_path, &manifest.sys_path] {
        if !fs.exists(root) {
            warn!("{} does not exist, affected blocks will stay empty", root.display());
        }
    }

    let http: Box<dyn HttpFetch> = if manifest.is_enabled(BlockKind::Weather) {
        match ReqwestFetch::new() {
            Ok(client) => Box::new(client),
            Err(e) => {
                error!("Failed to create HTTP client: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Box::new(Offline)
    };

    let sink: Box<dyn TitleSink> = if args.stdout {
        Box::new(StdoutSink::new())
    } else {
        match XsetrootSink::connect() {
            Ok(sink) => {
                debug!("Publishing through {}", sink.program().display());
                Box::new(sink)
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    };

    let mut daemon = match Daemon::new(&manifest, fs, http, sink) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Invalid manifest: {}", e);
            std::process::exit(1);
        }
    };

    if args.once {
        let outcome = daemon.run_once();
        if outcome.publish_failed {
            error!("Failed to publish status line");
            std::process::exit(1);
        }
        debug!("published: {}", outcome.published);
        return;
    }

    let shutdown = match Shutdown::install() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            warn!("Failed to set signal handler: {}", e);
            Shutdown::new()
        }
    };

    daemon.run(&shutdown);
    info!("dwmstat stopped");
}
