//! Xenakis CLI - sieve listings, cloud playback and MIDI export

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use xenakis::cloud::{CloudFields, RunOptions, StochasticCloud};
use xenakis::config::OutputConfig;
use xenakis::field::ProbabilityField;
use xenakis::midi_file::{export_events, sequence_to_smf, write_smf, ExportSettings};
use xenakis::scheduler::{breathing_intensity, PoissonScheduler};
use xenakis::sieve::Sieve;
use xenakis::sieve_input::{parse_clause_str, parse_clauses_json, sieve_from_strs};
use xenakis::sink::{list_devices, EventSink, JsonLinesSink, MidiDeviceSink, OscSink, PrintSink};

#[derive(Parser)]
#[command(name = "xenakis")]
#[command(about = "Sieve and stochastic cloud event generator", long_about = None)]
struct Cli {
    /// Output settings (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a sieve and optionally write it as a step sequence
    Sieve {
        /// Clause as op:modulus:residues, e.g. union:5:0,2 (repeatable, in order)
        #[arg(long = "clause")]
        clauses: Vec<String>,

        /// JSON clause list, appended after --clause entries
        #[arg(long)]
        clauses_json: Option<PathBuf>,

        /// Metabola offset
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        shift: i64,

        /// Window start (inclusive)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        start: i64,

        /// Window end (inclusive)
        #[arg(long, default_value = "127", allow_hyphen_values = true)]
        end: i64,

        /// Number of steps to tile into a sequence
        #[arg(long)]
        tile: Option<usize>,

        /// Lowest pitch of the tiled register
        #[arg(long, default_value = "48")]
        low: i64,

        /// Highest pitch of the tiled register
        #[arg(long, default_value = "84")]
        high: i64,

        /// Write the tiled sequence to this MIDI file
        #[arg(long, requires = "tile")]
        midi: Option<PathBuf>,

        /// Tempo of the written sequence
        #[arg(long, default_value = "96")]
        bpm: f64,

        /// MIDI channel of the written sequence (0-15)
        #[arg(long, default_value = "0")]
        channel: u8,
    },

    /// Generate a stochastic cloud
    Cloud {
        /// Length of the cloud in seconds
        #[arg(short, long, default_value = "20.0")]
        duration: f64,

        /// Base seed; each field and the scheduler derive their own from it
        #[arg(long)]
        seed: Option<u64>,

        /// Sieve clause restricting pitches (repeatable, in order)
        #[arg(long = "clause")]
        clauses: Vec<String>,

        /// Sieve shift
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        shift: i64,

        /// Lowest pitch
        #[arg(long, default_value = "36")]
        low: i64,

        /// Highest pitch
        #[arg(long, default_value = "96")]
        high: i64,

        #[arg(long, default_value = "66.0")]
        pitch_mean: f64,

        #[arg(long, default_value = "12.0")]
        pitch_sd: f64,

        /// Exponential rate of note durations (mean 1/rate seconds)
        #[arg(long, default_value = "2.0")]
        duration_rate: f64,

        #[arg(long, default_value = "90.0")]
        velocity_mean: f64,

        #[arg(long, default_value = "25.0")]
        velocity_sd: f64,

        /// Candidate MIDI channels
        #[arg(long, value_delimiter = ',', default_value = "0,1")]
        channels: Vec<f64>,

        /// Weights of the candidate channels
        #[arg(long, value_delimiter = ',', default_value = "3,1")]
        channel_weights: Vec<f64>,

        /// Lowest event density (events per second)
        #[arg(long, default_value = "0.5")]
        density_min: f64,

        /// Highest event density (events per second)
        #[arg(long, default_value = "6.0")]
        density_max: f64,

        /// Time constant of the density swell in seconds
        #[arg(long, default_value = "10.0")]
        breath: f64,

        /// Where events go
        #[arg(long, value_enum, default_value = "print")]
        sink: SinkKind,

        /// Generate without waiting for wall-clock time
        #[arg(long)]
        offline: bool,

        /// Stop after this many events
        #[arg(long)]
        max_events: Option<usize>,

        /// Render offline and write a MIDI file instead of playing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List MIDI output devices
    Devices,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SinkKind {
    Print,
    Jsonl,
    Midi,
    Osc,
}

/// Command-line clauses first, then any clauses from a JSON file
fn build_sieve(clauses: &[String], json: Option<&PathBuf>, shift: i64) -> Result<Sieve, Box<dyn std::error::Error>> {
    let mut parsed = clauses
        .iter()
        .map(|c| parse_clause_str(c))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(path) = json {
        parsed.extend(parse_clauses_json(&std::fs::read_to_string(path)?)?);
    }
    let mut sieve = Sieve::new(parsed);
    sieve.shift(shift);
    Ok(sieve)
}

fn open_sink(kind: SinkKind, config: &OutputConfig) -> Result<Box<dyn EventSink>, Box<dyn std::error::Error>> {
    Ok(match kind {
        SinkKind::Print => Box::new(PrintSink::stdout()),
        SinkKind::Jsonl => Box::new(JsonLinesSink::new(std::io::stdout())),
        SinkKind::Midi => Box::new(MidiDeviceSink::connect(config.midi_device.port.as_deref())?),
        SinkKind::Osc => {
            let sink = OscSink::new(&config.osc.target, &config.osc.address)?;
            info!("Sending OSC {} to {}", config.osc.address, sink.target());
            Box::new(sink)
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => OutputConfig::load(path)?,
        None => OutputConfig::default(),
    };

    match cli.command {
        Commands::Sieve {
            clauses,
            clauses_json,
            shift,
            start,
            end,
            tile,
            low,
            high,
            midi,
            bpm,
            channel,
        } => {
            let sieve = build_sieve(&clauses, clauses_json.as_ref(), shift)?;
            let members = sieve.generate(start, end);

            println!("Sieve:   {}", sieve);
            println!("Period:  {}", sieve.period());
            println!("Window:  [{}, {}] -> {} members", start, end, members.len());
            println!("{:?}", members);

            if let Some(steps) = tile {
                let pitches = sieve.tile_sequence(steps, low, high);
                if pitches.is_empty() {
                    eprintln!("Sieve produced no notes - check clauses, residues and shift");
                    return Ok(());
                }
                let preview: Vec<i64> = pitches.iter().take(16).copied().collect();
                println!("First {} pitches: {:?}", preview.len(), preview);

                if let Some(path) = midi {
                    // one beat per step
                    let step_ticks = ExportSettings::default().ticks_per_beat as u32;
                    let smf = sequence_to_smf(&pitches, bpm, channel, step_ticks)?;
                    write_smf(&smf, &path)?;
                    println!("Wrote {}", path.display());
                }
            }
        }

        Commands::Cloud {
            duration,
            seed,
            clauses,
            shift,
            low,
            high,
            pitch_mean,
            pitch_sd,
            duration_rate,
            velocity_mean,
            velocity_sd,
            channels,
            channel_weights,
            density_min,
            density_max,
            breath,
            sink,
            offline,
            max_events,
            output,
        } => {
            let base = seed.unwrap_or_else(rand::random);
            info!("Cloud seed: {}", base);

            let fields = CloudFields {
                pitch: ProbabilityField::normal(pitch_mean, pitch_sd, base)?
                    .with_clip(low as f64, high as f64)?,
                duration: ProbabilityField::exponential(duration_rate, base.wrapping_add(1))?
                    .with_clip(0.05, 2.5)?,
                velocity: ProbabilityField::normal(velocity_mean, velocity_sd, base.wrapping_add(2))?
                    .with_clip(20.0, 127.0)?,
                channel: ProbabilityField::categorical(&channels, Some(&channel_weights), base.wrapping_add(3))?,
            };
            let scheduler = PoissonScheduler::seeded(
                breathing_intensity(density_min, density_max, breath),
                density_max,
                base.wrapping_add(4),
            )?;
            info!(
                pitch_mean = fields.pitch.distribution().mean(),
                duration_mean = fields.duration.distribution().mean(),
                velocity_mean = fields.velocity.distribution().mean(),
                channel_mean = fields.channel.distribution().mean(),
                "cloud fields"
            );
            info!(
                max_rate = scheduler.max_rate(),
                density_at_start = scheduler.intensity_at(0.0),
                "cloud scheduler"
            );

            let mut cloud = StochasticCloud::new(fields, scheduler).with_pitch_span(low, high)?;
            if !clauses.is_empty() {
                let sieve = sieve_from_strs(&clauses, shift)?;
                let (span_low, span_high) = cloud.pitch_span();
                let allowed = sieve.generate(span_low, span_high);
                info!("Sieve {} allows {} pitches in [{}, {}]", sieve, allowed.len(), span_low, span_high);
                cloud = cloud.with_allowed_pitches(allowed);
            }

            if let Some(path) = output {
                let events = cloud.render_offline(0.0, duration);
                export_events(&events, &config.midi_file, &path)?;
                println!("Wrote {} events to {}", events.len(), path.display());
                return Ok(());
            }

            let mut sink = open_sink(sink, &config)?;
            if offline {
                let mut events = cloud.render_offline(0.0, duration);
                if let Some(max) = max_events {
                    events.truncate(max);
                }
                for event in &events {
                    sink.handle(event);
                }
            } else {
                let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs_f64();
                let options = RunOptions {
                    t_start: Some(now),
                    t_end: Some(now + duration),
                    max_events,
                };
                cloud.run_realtime(sink.as_mut(), options);
            }
            sink.finish()?;
        }

        Commands::Devices => {
            let devices = list_devices()?;
            if devices.is_empty() {
                println!("No MIDI output devices found");
            }
            for device in devices {
                println!("  - {}", device.name);
            }
        }
    }

    Ok(())
}
