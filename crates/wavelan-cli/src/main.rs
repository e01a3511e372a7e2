use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use wavelan_core::{
    error_to_string, get_platform, has_wireless_backend, LinkStats, QualityUnit, WavelanError,
    WavelanResult,
};
use wavelan_probe::{close, open, query, LinkSnapshot, WirelessBackend};

/// Wireless link statistics for the current platform.
#[derive(Parser, Debug)]
#[command(name = "wavelan", version, about, long_about = None)]
struct Cli {
    /// The format for log output.
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// The minimum log level to display.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query link statistics once.
    ///
    /// Exits 0 when associated, 1 without carrier, 2 if the interface is
    /// missing or not wireless.
    Query(QueryArgs),

    /// Poll link statistics until interrupted.
    ///
    /// Failed samples are reported and polling continues; the exit code
    /// reflects the last sample.
    Watch(WatchArgs),

    /// Print the message for a status code.
    Strerror(StrerrorArgs),
}

#[derive(Args, Debug)]
struct InterfaceArg {
    /// Wireless interface to query (e.g., wlan0, iwn0, en0).
    #[arg(short = 'i', long, env = "WAVELAN_INTERFACE", value_name = "IFACE")]
    interface: String,
}

#[derive(Parser, Debug)]
struct QueryArgs {
    #[command(flatten)]
    iface: InterfaceArg,

    /// Output a JSON snapshot instead of the text summary.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct WatchArgs {
    #[command(flatten)]
    iface: InterfaceArg,

    /// Poll interval (e.g., "250ms", "1s", "2m", or plain seconds).
    #[arg(long, value_name = "DURATION", default_value = "250ms")]
    interval: String,

    /// Stop after this many samples.
    #[arg(short = 'n', long, value_name = "N")]
    count: Option<u64>,

    /// Output one JSON snapshot per line.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct StrerrorArgs {
    /// Status code (0, -1, -2, -3; anything else is unknown).
    #[arg(value_name = "CODE", allow_negative_numbers = true)]
    code: i32,
}

#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Eq)]
enum LogFormat {
    /// Human-readable text format.
    Text,
    /// Machine-readable JSON format.
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Initialize the tracing subscriber
    let filter = EnvFilter::from_default_env().add_directive(cli.log_level.into());

    match cli.log_format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }

    info!("Initialization complete. Starting main logic.");
    if let Some(command) = cli.command {
        match run_command(command) {
            Ok(exit_code) => {
                info!("Main logic finished.");
                std::process::exit(exit_code);
            }
            Err(err) => {
                eprintln!("Error: {err}");
                std::process::exit(exit_codes::for_code(err.error_code()));
            }
        }
    } else {
        println!("Platform: {}", get_platform());
        if !has_wireless_backend() {
            println!("No wireless backend for this platform");
        }
    }
    info!("Main logic finished.");
}

fn run_command(command: Command) -> Result<i32, WavelanError> {
    match command {
        Command::Query(args) => run_query(args),
        Command::Watch(args) => run_watch(args),
        Command::Strerror(args) => run_strerror(args),
    }
}

/// Process exit codes, one per status.
///
/// - 0: Associated, statistics valid
/// - 1: No carrier signal
/// - 2: No such device, or the channel could not be opened
/// - 3: Invalid parameter
mod exit_codes {
    use wavelan_core::ErrorCode;

    pub const OK: i32 = 0;
    pub const NO_CARRIER: i32 = 1;
    pub const NO_SUCH_DEVICE: i32 = 2;
    pub const INVALID_PARAMETER: i32 = 3;

    pub fn for_code(code: ErrorCode) -> i32 {
        match code {
            ErrorCode::Ok => OK,
            ErrorCode::NoCarrier => NO_CARRIER,
            ErrorCode::NoSuchDevice => NO_SUCH_DEVICE,
            ErrorCode::InvalidParameter => INVALID_PARAMETER,
        }
    }
}

fn exit_code_for(result: &WavelanResult<LinkStats>) -> i32 {
    match result {
        Ok(_) => exit_codes::OK,
        Err(e) => exit_codes::for_code(e.error_code()),
    }
}

fn run_query(args: QueryArgs) -> Result<i32, WavelanError> {
    let interface = args.iface.interface;

    let result = open(&interface).and_then(|mut device| {
        let result = query(&mut device);
        close(device);
        result
    });
    if let Err(e) = &result {
        debug!(interface = %interface, error = %e, "query failed");
    }

    if args.json {
        print_json(&LinkSnapshot::from_result(&interface, &result));
    } else {
        println!("{}", format_summary(&interface, &result));
    }

    Ok(exit_code_for(&result))
}

fn run_watch(args: WatchArgs) -> Result<i32, WavelanError> {
    let interval = parse_duration(&args.interval)?;
    if interval.is_zero() {
        return Err(WavelanError::invalid_parameter("interval must be > 0"));
    }
    if args.count == Some(0) {
        return Err(WavelanError::invalid_parameter("count must be > 0"));
    }

    // Open failures are not per-sample: without a channel there is nothing
    // to poll.
    let mut device = open(&args.iface.interface)?;
    let interface = device.interface().to_string();
    info!(interface = %interface, ?interval, count = ?args.count, "polling");

    let mut samples = 0u64;
    let last = loop {
        let result = query(&mut device);
        if let Err(e) = &result {
            debug!(interface = %interface, sample = samples, error = %e, "sample failed");
        }

        if args.json {
            print_json_line(&LinkSnapshot::from_result(&interface, &result));
        } else {
            println!("{}", format_line(&interface, &result));
        }

        samples += 1;
        if args.count.is_some_and(|count| samples >= count) {
            break exit_code_for(&result);
        }
        thread::sleep(interval);
    };

    close(device);
    Ok(last)
}

fn run_strerror(args: StrerrorArgs) -> Result<i32, WavelanError> {
    println!("{}", error_to_string(args.code));
    Ok(exit_codes::OK)
}

// ============================================================================
// Output
// ============================================================================

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("serialize json")
    );
}

fn print_json_line<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string(value).expect("serialize json"));
}

fn format_quality(quality: i32, unit: QualityUnit) -> String {
    match unit {
        QualityUnit::Percent => format!("{quality}%"),
        QualityUnit::Dbm => format!("{quality} dBm"),
    }
}

/// Multi-line summary for a single query.
fn format_summary(interface: &str, result: &WavelanResult<LinkStats>) -> String {
    match result {
        Ok(stats) => format!(
            "Interface: {interface}\n\
             Vendor:    {}\n\
             Quality:   {}\n\
             Network:   {}\n\
             Rate:      {} Mb/s",
            stats.vendor,
            format_quality(stats.quality, stats.quality_unit),
            stats.network_name,
            stats.rate,
        ),
        Err(e) => match e.partial() {
            Some(partial) => format!(
                "Interface: {interface}\n\
                 Vendor:    {}\n\
                 Status:    {}",
                partial.vendor,
                e.error_code().as_str(),
            ),
            None => format!(
                "Interface: {interface}\n\
                 Status:    {}",
                e.error_code().as_str(),
            ),
        },
    }
}

/// One-line form used by `watch`.
fn format_line(interface: &str, result: &WavelanResult<LinkStats>) -> String {
    match result {
        Ok(stats) => format!(
            "{interface}: {} {} {} Mb/s",
            stats.network_name,
            format_quality(stats.quality, stats.quality_unit),
            stats.rate,
        ),
        Err(e) => format!("{interface}: {}", e.error_code().as_str()),
    }
}

/// Parse a duration string like "250ms", "1s", "2m", "1h", or just "5" (seconds).
fn parse_duration(s: &str) -> Result<Duration, WavelanError> {
    let s = s.trim();

    // Try to parse as plain number (seconds)
    if let Ok(secs) = s.parse::<f64>() {
        return seconds(secs, s);
    }

    // Try to parse with suffix
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("ms") {
        (n, 0.001)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600.0)
    } else {
        return Err(WavelanError::invalid_parameter(format!(
            "invalid duration '{}': expected number or number with suffix (ms, s, m, h)",
            s
        )));
    };

    let num: f64 = num_str.trim().parse().map_err(|_| {
        WavelanError::invalid_parameter(format!("invalid duration '{}': not a valid number", s))
    })?;

    seconds(num * multiplier, s)
}

fn seconds(secs: f64, raw: &str) -> Result<Duration, WavelanError> {
    if secs < 0.0 {
        return Err(WavelanError::invalid_parameter(
            "duration cannot be negative",
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| {
        WavelanError::invalid_parameter(format!("invalid duration '{}': out of range", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavelan_core::{ErrorCode, PartialStats};

    fn stats() -> LinkStats {
        LinkStats::new("TestNet", 80, QualityUnit::Percent, 54, "Unknown")
    }

    #[test]
    fn query_requires_interface() {
        std::env::remove_var("WAVELAN_INTERFACE");
        assert!(Cli::try_parse_from(["wavelan", "query"]).is_err());
    }

    #[test]
    fn query_parses_interface_and_json() {
        let cli = Cli::try_parse_from(["wavelan", "query", "-i", "wlan0", "--json"]).unwrap();
        let Command::Query(args) = cli.command.unwrap() else {
            panic!("expected query command");
        };
        assert_eq!(args.iface.interface, "wlan0");
        assert!(args.json);
    }

    #[test]
    fn watch_defaults() {
        let cli = Cli::try_parse_from(["wavelan", "watch", "--interface", "ath0"]).unwrap();
        let Command::Watch(args) = cli.command.unwrap() else {
            panic!("expected watch command");
        };
        assert_eq!(args.interval, "250ms");
        assert_eq!(args.count, None);
        assert!(!args.json);
        assert_eq!(parse_duration(&args.interval).unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn strerror_accepts_negative_codes() {
        let cli = Cli::try_parse_from(["wavelan", "strerror", "-2"]).unwrap();
        let Command::Strerror(args) = cli.command.unwrap() else {
            panic!("expected strerror command");
        };
        assert_eq!(args.code, -2);
    }

    #[test]
    fn parse_duration_accepts_suffixes() {
        assert_eq!(parse_duration("5").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("0.5").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 1s ").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        for bad in ["", "abc", "-1", "-5s", "5x", "ms", "1e400"] {
            let err = parse_duration(bad).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::InvalidParameter, "{bad}");
        }
    }

    #[test]
    fn exit_codes_per_status() {
        assert_eq!(exit_codes::for_code(ErrorCode::Ok), 0);
        assert_eq!(exit_codes::for_code(ErrorCode::NoCarrier), 1);
        assert_eq!(exit_codes::for_code(ErrorCode::NoSuchDevice), 2);
        assert_eq!(exit_codes::for_code(ErrorCode::InvalidParameter), 3);
    }

    #[test]
    fn format_quality_uses_unit() {
        assert_eq!(format_quality(80, QualityUnit::Percent), "80%");
        assert_eq!(format_quality(-55, QualityUnit::Dbm), "-55 dBm");
    }

    #[test]
    fn summary_for_associated_link() {
        let text = format_summary("wlan0", &Ok(stats()));
        assert!(text.contains("Interface: wlan0"));
        assert!(text.contains("Vendor:    Unknown"));
        assert!(text.contains("Quality:   80%"));
        assert!(text.contains("Network:   TestNet"));
        assert!(text.contains("Rate:      54 Mb/s"));
    }

    #[test]
    fn summary_without_carrier_keeps_vendor() {
        let mut partial = PartialStats::new(QualityUnit::Dbm);
        partial.vendor = "Lucent (ID 1, version 6.16)".to_string();
        let text = format_summary("wi0", &Err(WavelanError::no_carrier("wi0", partial)));
        assert!(text.contains("Vendor:    Lucent (ID 1, version 6.16)"));
        assert!(text.contains("Status:    No carrier signal"));
        assert!(!text.contains("Network"));
    }

    #[test]
    fn summary_for_missing_device() {
        let text = format_summary("nope0", &Err(WavelanError::no_such_device("nope0")));
        assert_eq!(text, "Interface: nope0\nStatus:    No such WaveLAN device");
    }

    #[test]
    fn line_format() {
        assert_eq!(format_line("wlan0", &Ok(stats())), "wlan0: TestNet 80% 54 Mb/s");
        assert_eq!(
            format_line("wlan0", &Err(WavelanError::no_such_device("wlan0"))),
            "wlan0: No such WaveLAN device"
        );
    }
}
