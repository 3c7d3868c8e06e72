use clap::{App, Arg, ArgMatches};
use colored::*;
use groundlink::handlers::MissionState;
use groundlink::station::StationStatus;
use groundlink::{
    BandwidthMode, GroundStation, IterationReport, LinkTransition, MissionRecorder, SimulatedTransceiver,
    StationConfig, TransmitIntent,
};
use serde::Serialize;
use tokio::{signal, time};
use tracing::{info, Level};

#[derive(Serialize)]
struct FinalReport<'a> {
    status: StationStatus,
    mission: &'a MissionState,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = build_cli().get_matches();

    let level = if matches.is_present("verbose") { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match matches.value_of("config") {
        Some(path) => StationConfig::from_file(path)?,
        None => StationConfig::default(),
    };

    // Only the scripted transceiver ships with the crate
    let script = matches.value_of("script").unwrap_or_default();
    let radio = SimulatedTransceiver::from_file(script)?;

    let mut station = GroundStation::new(config, radio, MissionRecorder::new())?;

    println!("🛰️  Ground Station Link Controller");
    println!("==================================");

    if let Err(e) = station.begin() {
        // Fail-stop: never run the loop with an unconfigured radio
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }
    println!("{} Transceiver online", "✓".green().bold());

    queue_requested_intents(&matches, &mut station);

    let max_iterations = matches
        .value_of("iterations")
        .map(str::parse::<u64>)
        .transpose()?;

    let mut interval = time::interval(station.config().loop_delay());
    let mut completed = 0u64;

    loop {
        if max_iterations.is_some_and(|max| completed >= max) {
            break;
        }

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
            _ = interval.tick() => {
                let report = tokio::task::block_in_place(|| station.step())?;
                print_report(&report);
                completed += 1;
            }
        }
    }

    let format = matches.value_of("format").unwrap_or("table");
    print_status(station.status(), station.handler().get_state(), format)?;

    Ok(())
}

fn build_cli() -> App<'static, 'static> {
    App::new("groundlink")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  Ground station control loop for a half-duplex LoRa satellite link")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Station configuration (JSON)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("script")
                .short("s")
                .long("script")
                .value_name("FILE")
                .help("Receive script for the simulated transceiver (JSON)")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("iterations")
                .short("n")
                .long("iterations")
                .value_name("COUNT")
                .help("Stop after this many loop iterations")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Iteration count must be a valid number".into()),
                }),
        )
        .arg(
            Arg::with_name("ping")
                .long("ping")
                .help("Queue a ping for the first received frame"),
        )
        .arg(
            Arg::with_name("start")
                .long("start")
                .help("Queue a start-transmitting request"),
        )
        .arg(
            Arg::with_name("stop")
                .long("stop")
                .help("Queue a stop-transmitting request"),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Final status output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging"),
        )
}

fn queue_requested_intents(
    matches: &ArgMatches<'_>,
    station: &mut GroundStation<SimulatedTransceiver, MissionRecorder>,
) {
    let requested = [
        ("ping", TransmitIntent::Ping),
        ("stop", TransmitIntent::StopTransmitting),
        ("start", TransmitIntent::StartTransmitting),
    ];

    for (flag, intent) in requested {
        if matches.is_present(flag) {
            station.request_transmit(intent);
        }
    }
}

fn print_report(report: &IterationReport) {
    match report.transition {
        LinkTransition::Acquired { carrier_frequency_mhz } => {
            println!("{} Satellite acquired at {:.6} MHz", "📡".green(), carrier_frequency_mhz);
        }
        LinkTransition::Lost => {
            println!("{} Signal lost, back to wide search", "⚠".yellow());
        }
        LinkTransition::Retuned { .. } | LinkTransition::None => {}
    }

    for intent in &report.transmitted {
        println!("{} Sent {:?}", "📤".cyan(), intent);
    }
}

fn print_status(status: StationStatus, mission: &MissionState, format: &str) -> Result<(), serde_json::Error> {
    match format {
        "json" => {
            let report = FinalReport { status, mission };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "compact" => {
            println!(
                "mode={:?} carrier={:.6}MHz bw={}kHz rx={} tx={} timeouts={} crc={}",
                status.mode,
                status.carrier_frequency_mhz,
                status.bandwidth_khz,
                status.stats.frames_received,
                status.stats.frames_transmitted,
                status.stats.timeouts,
                status.stats.crc_errors,
            );
        }
        _ => {
            let mode = match status.mode {
                BandwidthMode::Wide => "WIDE (searching)".yellow(),
                BandwidthMode::Narrow => "NARROW (tracking)".green(),
            };
            println!();
            println!("{}", "📊 Link Status".bold());
            println!("  Mode:              {}", mode);
            println!("  Carrier:           {:.6} MHz", status.carrier_frequency_mhz);
            println!("  Bandwidth:         {} kHz", status.bandwidth_khz);
            println!("  Iterations:        {}", status.stats.iterations);
            println!("  Frames received:   {}", status.stats.frames_received);
            println!("  Frames ignored:    {}", status.stats.frames_ignored);
            println!("  Timeouts:          {}", status.stats.timeouts);
            println!("  CRC errors:        {}", status.stats.crc_errors);
            println!("  Acquisitions:      {}", status.stats.acquisitions);
            println!("  Link losses:       {}", status.stats.link_losses);
            println!("  Frames sent:       {}", status.stats.frames_transmitted);
            println!();
            println!("{}", "🛰️  Satellite".bold());
            println!("  Online:            {}", yes_no(mission.satellite_online));
            println!("  Deployed:          {}", yes_no(mission.deployment_succeeded));
            println!("  Pongs:             {}", mission.pongs_received);
            if let Some(power) = &mission.last_power_info {
                println!("  Last power info:   {}", power);
            }
        }
    }

    Ok(())
}

fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}
