//! hwprobe - prints a one-shot hardware and OS report.
//!
//! Builds the collectors for the running platform, takes one snapshot and
//! writes it to stdout as text or JSON. Logs go to stderr.

use std::fmt::Write as _;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;

use hwprobe_core::model::{TickType, cpu_load_between};
use hwprobe_core::{HardwareSnapshot, ProbeConfig, SystemInfo};

/// Output format of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Hardware and OS probe.
#[derive(Parser)]
#[command(name = "hwprobe", about = "Hardware and OS information probe", version)]
struct Args {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Resolver configuration read for DNS servers.
    #[arg(long, default_value = "/etc/resolv.conf")]
    resolv_conf: String,

    /// Kill external commands (xrandr, route, netstat) after this many milliseconds.
    #[arg(long, default_value_t = hwprobe_core::config::DEFAULT_COMMAND_TIMEOUT_MS)]
    command_timeout_ms: u64,

    /// Minimum interval between two memory samples, in milliseconds.
    #[arg(long, default_value_t = hwprobe_core::config::DEFAULT_MEMORY_REFRESH_MS)]
    memory_interval_ms: u64,

    /// Sample CPU ticks twice this many milliseconds apart and report the
    /// load in between. 0 disables it.
    #[arg(long, default_value_t = 0)]
    cpu_sample_ms: u64,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            proc_path: self.proc_path.clone(),
            resolv_conf_path: self.resolv_conf.clone(),
            memory_refresh_interval_ms: self.memory_interval_ms,
            command_timeout_ms: self.command_timeout_ms,
        }
    }
}

/// Binary unit suffixes, one step per factor of 1024.
const SIZE_UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Formats a byte count with a binary unit, e.g. "15.6 GiB".
fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", SIZE_UNITS[unit])
    }
}

/// Formats a duration in seconds as "3d 04:05:06".
fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let rem = secs % 86_400;
    format!(
        "{}d {:02}:{:02}:{:02}",
        days,
        rem / 3600,
        rem % 3600 / 60,
        rem % 60
    )
}

fn format_epoch(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

/// Renders a snapshot as an aligned text report.
fn render_text(snapshot: &HardwareSnapshot, cpu_load: Option<f64>) -> String {
    let mut out = String::new();
    let cpu = &snapshot.cpu;

    let _ = writeln!(out, "os:            {}", snapshot.os);
    let _ = writeln!(out, "taken at:      {}", format_epoch(snapshot.timestamp));
    let _ = writeln!(out, "booted:        {}", format_epoch(snapshot.boot_time));
    let _ = writeln!(out, "uptime:        {}", format_uptime(snapshot.uptime));

    let _ = writeln!(out, "\n[cpu]");
    let _ = writeln!(out, "vendor:        {}", or_dash(&cpu.vendor));
    let _ = writeln!(out, "name:          {}", or_dash(&cpu.name));
    let _ = writeln!(
        out,
        "family/model/stepping: {}/{}/{}",
        or_dash(&cpu.family),
        or_dash(&cpu.model),
        or_dash(&cpu.stepping)
    );
    let _ = writeln!(out, "processor id:  {}", cpu.processor_id);
    let _ = writeln!(out, "64-bit:        {}", cpu.cpu64bit);
    let _ = writeln!(
        out,
        "processors:    {} logical, {} physical",
        cpu.logical_processor_count, cpu.physical_processor_count
    );
    let load: Vec<String> = snapshot
        .load_average
        .iter()
        .map(|l| if *l < 0.0 { "-".to_string() } else { format!("{:.2}", l) })
        .collect();
    let _ = writeln!(out, "load average:  {}", load.join(" "));
    let ticks = &snapshot.system_ticks;
    let _ = writeln!(
        out,
        "ticks:         user {} nice {} system {} idle {} iowait {} irq {} softirq {} steal {}",
        ticks[TickType::User],
        ticks[TickType::Nice],
        ticks[TickType::System],
        ticks[TickType::Idle],
        ticks[TickType::IoWait],
        ticks[TickType::Irq],
        ticks[TickType::SoftIrq],
        ticks[TickType::Steal]
    );
    if let Some(load) = cpu_load {
        let _ = writeln!(out, "cpu load:      {:.1}%", load * 100.0);
    }

    let memory = &snapshot.memory;
    let _ = writeln!(out, "\n[memory]");
    let _ = writeln!(
        out,
        "physical:      {} total, {} available",
        format_size(memory.total),
        format_size(memory.available)
    );
    let _ = writeln!(
        out,
        "swap:          {} total, {} used",
        format_size(memory.swap_total),
        format_size(memory.swap_used)
    );

    let _ = writeln!(out, "\n[displays]");
    if snapshot.displays.is_empty() {
        let _ = writeln!(out, "none detected");
    }
    for (i, display) in snapshot.displays.iter().enumerate() {
        match display.edid_info() {
            Some(info) => {
                let _ = writeln!(
                    out,
                    "{}: {} {:04X} serial {} ({}x{} cm, {} wk {}), EDID {}.{}",
                    i,
                    info.manufacturer_id,
                    info.product_code,
                    info.serial_number,
                    info.width_cm,
                    info.height_cm,
                    info.year,
                    info.week,
                    info.version,
                    info.revision
                );
            }
            None => {
                let _ = writeln!(out, "{}: {} bytes of EDID", i, display.edid().len());
            }
        }
    }

    let network = &snapshot.network;
    let _ = writeln!(out, "\n[network]");
    let _ = writeln!(out, "host name:     {}", or_dash(&network.host_name));
    let _ = writeln!(out, "domain name:   {}", or_dash(&network.domain_name));
    let _ = writeln!(
        out,
        "dns servers:   {}",
        if network.dns_servers.is_empty() {
            "-".to_string()
        } else {
            network.dns_servers.join(", ")
        }
    );
    let _ = writeln!(out, "ipv4 gateway:  {}", or_dash(&network.ipv4_default_gateway));
    let _ = writeln!(out, "ipv6 gateway:  {}", or_dash(&network.ipv6_default_gateway));

    out
}

/// Initializes the tracing subscriber on stderr. Default level is WARN so
/// the report on stdout stays readable; -q shows errors only.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for crate_name in ["hwprobe", "hwprobe_core"] {
        match format!("{}={}", crate_name, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", crate_name, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = args.probe_config();
    debug!(?config, "hwprobe {} starting", env!("CARGO_PKG_VERSION"));
    let system = SystemInfo::new(config);

    let cpu_load = (args.cpu_sample_ms > 0).then(|| {
        let before = system.cpu().system_cpu_load_ticks();
        std::thread::sleep(std::time::Duration::from_millis(args.cpu_sample_ms));
        let after = system.cpu().system_cpu_load_ticks();
        cpu_load_between(&before, &after)
    });

    let snapshot = system.snapshot();
    match args.format {
        Format::Text => print!("{}", render_text(&snapshot, cpu_load)),
        Format::Json => match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!(error = %e, "failed to encode snapshot");
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}
