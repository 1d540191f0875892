use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};

use rtpcap_core::{
    ReplayConfig, ReplayError, ReplaySession, RtpReceiver, StreamFilter, StreamReport, SystemClock,
    VirtualClock, scan_streams,
};

#[derive(Parser, Debug)]
#[command(name = "rtpcap")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("RTPCAP_BUILD_COMMIT"), " ", env!("RTPCAP_BUILD_DATE"), ")"
))]
#[command(
    about = "Enumerate and replay RTP streams from pcap capture files.",
    long_about = None,
    after_help = "Examples:\n  rtpcap streams media.pcap\n  rtpcap streams media.pcap --json -o report.json\n  rtpcap play media.pcap --ssrc 0xdeadbeef --payload-type 96"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the RTP streams observed in a capture file.
    #[command(
        after_help = "Examples:\n  rtpcap streams media.pcap\n  rtpcap streams media.pcap --json\n  rtpcap streams media.pcap --json --pretty -o report.json"
    )]
    Streams {
        /// Path to a .pcap file
        input: PathBuf,

        /// Emit the full JSON report instead of the text table
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,

        /// Write the JSON report to a file instead of stdout
        #[arg(short = 'o', long, requires = "json")]
        report: Option<PathBuf>,
    },

    /// Replay one RTP stream with the capture's original pacing.
    #[command(
        after_help = "Examples:\n  rtpcap play media.pcap\n  rtpcap play media.pcap --ssrc 0xdeadbeef --forward 127.0.0.1:5004\n  rtpcap play media.pcap --instant --loop-count 3"
    )]
    Play {
        /// Path to a .pcap file
        input: PathBuf,

        /// Only deliver packets with this SSRC (hex with 0x prefix, or decimal)
        #[arg(long, value_parser = parse_ssrc)]
        ssrc: Option<u32>,

        /// Only deliver packets with this RTP payload type (0-127)
        #[arg(long)]
        payload_type: Option<u8>,

        /// Sleep this long before delivering the first packet
        #[arg(long)]
        preroll_ms: Option<u64>,

        /// Replay the file this many times (0 = forever)
        #[arg(long, default_value_t = 1)]
        loop_count: u32,

        /// Forward each delivered datagram to this UDP address
        #[arg(long)]
        forward: Option<SocketAddr>,

        /// Skip real-time pacing and replay as fast as possible
        #[arg(long)]
        instant: bool,

        /// Suppress the per-iteration summary
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Streams {
            input,
            json,
            pretty,
            report,
        } => cmd_streams(input, json, pretty, report),
        Commands::Play {
            input,
            ssrc,
            payload_type,
            preroll_ms,
            loop_count,
            forward,
            instant,
            quiet,
        } => cmd_play(
            input,
            ssrc,
            payload_type,
            preroll_ms,
            loop_count,
            forward,
            instant,
            quiet,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_streams(
    input: PathBuf,
    json: bool,
    pretty: bool,
    report: Option<PathBuf>,
) -> Result<(), CliError> {
    validate_input_file(&input)?;

    let rep = scan_streams(&input)
        .with_context(|| format!("failed to scan {}", input.display()))?;

    if json {
        let serialized = if pretty {
            serde_json::to_string_pretty(&rep)
        } else {
            serde_json::to_string(&rep)
        }
        .context("JSON serialization failed")?;

        match report {
            Some(path) => {
                fs::write(&path, serialized)
                    .with_context(|| format!("failed to write report: {}", path.display()))?;
                eprintln!("OK: report written -> {}", path.display());
            }
            None => println!("{serialized}"),
        }
        return Ok(());
    }

    print_stream_table(&rep);
    Ok(())
}

fn print_stream_table(report: &StreamReport) {
    println!(
        "{}: {} packets, {} skipped",
        report.input.path, report.capture.packets_total, report.capture.packets_skipped
    );
    if let (Some(start), Some(end)) = (
        report.capture.time_start.as_deref(),
        report.capture.time_end.as_deref(),
    ) {
        println!("capture: {start} .. {end}");
    }
    if report.streams.is_empty() {
        println!("no RTP streams found");
        return;
    }
    for stream in &report.streams {
        println!(
            "{:#010x}  {} -> {}  {} packets  PTs {:?}",
            stream.ssrc, stream.src, stream.dst, stream.packet_count, stream.payload_types
        );
    }
}

fn cmd_play(
    input: PathBuf,
    ssrc: Option<u32>,
    payload_type: Option<u8>,
    preroll_ms: Option<u64>,
    loop_count: u32,
    forward: Option<SocketAddr>,
    instant: bool,
    quiet: bool,
) -> Result<(), CliError> {
    validate_input_file(&input)?;

    if let Some(pt) = payload_type {
        if pt > 127 {
            return Err(CliError::new(
                format!("payload type {pt} out of range"),
                Some("RTP payload types are 0-127".to_string()),
            ));
        }
    }

    let config = ReplayConfig {
        filter: StreamFilter { ssrc, payload_type },
        preroll: preroll_ms.map(Duration::from_millis),
    };

    let socket = match forward {
        Some(_) => Some(
            UdpSocket::bind("0.0.0.0:0")
                .context("failed to bind forwarding socket")?,
        ),
        None => None,
    };

    let mut iteration = 0u32;
    loop {
        iteration += 1;
        let stats = play_once(&input, config, forward, socket.as_ref(), instant)?;
        if !quiet {
            eprintln!(
                "iteration {}: {} packets, {} bytes",
                iteration, stats.packets, stats.bytes
            );
        }
        if loop_count != 0 && iteration >= loop_count {
            break;
        }
        info!("replay iteration {iteration} finished, restarting");
    }
    Ok(())
}

struct PlayStats {
    packets: u64,
    bytes: u64,
}

fn play_once(
    input: &PathBuf,
    config: ReplayConfig,
    forward: Option<SocketAddr>,
    socket: Option<&UdpSocket>,
    instant: bool,
) -> Result<PlayStats, CliError> {
    let mut session = if instant {
        ReplaySession::open_with_clock(input, config, Box::new(VirtualClock::new()))
    } else {
        ReplaySession::open_with_clock(input, config, Box::new(SystemClock::new()))
    }
    .map_err(replay_error)?;

    let mut stats = PlayStats {
        packets: 0,
        bytes: 0,
    };
    while let Some(packet) = session.receive().map_err(replay_error)? {
        debug!(
            "delivered {} bytes, ssrc {:#010x}, pt {}, {}:{} -> {}:{}",
            packet.len(),
            packet.ssrc,
            packet.payload_type,
            packet.src_ip,
            packet.src_port,
            packet.dst_ip,
            packet.dst_port
        );
        if let (Some(addr), Some(socket)) = (forward, socket) {
            socket
                .send_to(&packet.data, addr)
                .with_context(|| format!("failed to forward datagram to {addr}"))?;
        }
        stats.packets += 1;
        stats.bytes += packet.len() as u64;
    }
    session.close();
    Ok(stats)
}

fn replay_error(err: ReplayError) -> CliError {
    CliError::new(
        format!("replay failed: {err}"),
        Some("the capture may be truncated or not a legacy pcap file".to_string()),
    )
}

fn parse_ssrc(value: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse::<u32>()
    };
    parsed.map_err(|_| format!("invalid SSRC '{value}' (use decimal or 0x-prefixed hex)"))
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap capture file".to_string()),
        ));
    }
    let meta = fs::metadata(input)
        .with_context(|| format!("failed to read input file: {}", input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap capture file".to_string()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_ssrc;

    #[test]
    fn parse_ssrc_accepts_hex_and_decimal() {
        assert_eq!(parse_ssrc("0xdeadbeef").unwrap(), 0xDEAD_BEEF);
        assert_eq!(parse_ssrc("0XDEADBEEF").unwrap(), 0xDEAD_BEEF);
        assert_eq!(parse_ssrc("1234").unwrap(), 1234);
    }

    #[test]
    fn parse_ssrc_rejects_garbage() {
        assert!(parse_ssrc("not-an-ssrc").is_err());
        assert!(parse_ssrc("0x").is_err());
        assert!(parse_ssrc("-1").is_err());
    }
}
