//! RTU slave host program
//!
//! Serves input and holding registers on a serial port. Input registers 0 and
//! 1 carry the uptime in seconds (high word, low word); everything else starts
//! at zero and holding registers can be written by the master.
//!
//! Usage: cargo run --features cli --bin rtu_slave -- --port /dev/ttyUSB0
//! Example: cargo run --features cli --bin rtu_slave -- --port /dev/ttyUSB0 --slave-id 17 --baud-rate 9600

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use rtu_slave::{
    ByteSink, ByteSource, FnSink, FnSource, ModbusResult, MonotonicClock, RegisterBank,
    RegisterKind, RegisterObserver, RtuSlave, SerialLink, SlaveConfig, Transaction,
};

/// Modbus RTU slave on a serial port.
#[derive(Parser, Debug)]
#[command(name = "rtu_slave")]
#[command(about = "Serve Modbus RTU registers on a serial port")]
#[command(version)]
struct Args {
    /// Serial port path.
    #[arg(short, long)]
    port: String,

    /// Line speed (8E1).
    #[arg(short, long, default_value_t = 115_200)]
    baud_rate: u32,

    /// Slave address (1-247).
    #[arg(short, long, default_value_t = 1)]
    slave_id: u8,

    /// Number of input registers.
    #[arg(long, default_value_t = 64)]
    input_registers: usize,

    /// Number of holding registers.
    #[arg(long, default_value_t = 64)]
    holding_registers: usize,

    /// Poll interval in microseconds; keep it well below the inter-frame timeout.
    #[arg(long, default_value_t = 100)]
    poll_interval_us: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log every frame in and out as hex.
    #[arg(long)]
    packet_logging: bool,
}

/// Logs register traffic at debug level
struct TrafficLog;

impl RegisterObserver for TrafficLog {
    fn on_holding_read(&mut self, response: &[u8]) {
        debug!("Holding read answered ({} bytes)", response.len());
    }

    fn on_input_read(&mut self, response: &[u8]) {
        debug!("Input read answered ({} bytes)", response.len());
    }

    fn before_holding_write(&mut self, request: &[u8]) {
        debug!("Holding write requested: {:02X?}", request);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("rtu_slave={}", log_level).parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("{}", rtu_slave::info());

    let config = SlaveConfig::new(args.slave_id).with_baud_rate(args.baud_rate);
    config.validate()?;

    let running = Arc::new(AtomicBool::new(true));
    let shutdown = running.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
        }
        shutdown.store(false, Ordering::Relaxed);
    });

    // Tokio timers are too coarse for the inter-frame timeout; poll from a blocking section
    tokio::task::block_in_place(|| serve(&args, config, &running))?;
    Ok(())
}

fn serve(args: &Args, config: SlaveConfig, running: &AtomicBool) -> ModbusResult<()> {
    let link = RefCell::new(SerialLink::open(&args.port, config.baud_rate)?);
    let mut input = vec![0u16; args.input_registers];
    let mut holding = vec![0u16; args.holding_registers];
    let registers = RegisterBank::new(&mut input, &mut holding)?;

    // One port serves as both source and sink
    let source = FnSource(|buf: &mut [u8]| match link.borrow_mut().try_read(buf) {
        Ok(n) => n,
        Err(e) => {
            warn!("Read failed: {}", e);
            0
        }
    });
    let sink = FnSink(|frame: &[u8]| {
        if let Err(e) = link.borrow_mut().write_frame(frame) {
            warn!("Write failed: {}", e);
        }
    });

    let mut slave = RtuSlave::new(config, registers, source, sink, MonotonicClock::new())?
        .with_observer(TrafficLog);
    slave.set_packet_logging(args.packet_logging);

    info!(
        "Serving slave {} on {} (inter-frame timeout {:?})",
        config.slave_id,
        args.port,
        config.inter_frame_timeout()
    );

    let started = Instant::now();
    let poll_interval = Duration::from_micros(args.poll_interval_us);
    let mut last_uptime = None;

    while running.load(Ordering::Relaxed) {
        match slave.poll() {
            Ok(Transaction::Written { register, value }) => {
                info!("Holding register {} written: 0x{:04X}", register, value);
            }
            Ok(_) => {}
            Err(e) if e.is_recoverable() => warn!("Poll failed: {}", e),
            Err(e) => {
                error!("Poll failed: {}", e);
                return Err(e);
            }
        }

        let uptime = started.elapsed().as_secs() as u32;
        if last_uptime != Some(uptime) {
            last_uptime = Some(uptime);
            let words = [(uptime >> 16) as u16, uptime as u16];
            if !slave.registers_mut().bulk_load(RegisterKind::Input, 0, &words) {
                debug!("Input table too small for uptime");
            }
        }

        std::thread::sleep(poll_interval);
    }

    let stats = slave.stats();
    info!(
        "Frames: {} received, {} answered ({} exceptions), {} CRC errors, {} framing errors",
        stats.frames_received,
        stats.responses_sent,
        stats.exceptions_sent,
        stats.crc_errors,
        stats.framing_errors
    );

    Ok(())
}
