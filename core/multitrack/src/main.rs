use std::{error::Error, path::PathBuf, sync::Arc};

use clap::Parser;
use log::info;
use multitrack::{
    config::EngineConfig,
    constants::COMMAND_QUEUE_CAPACITY,
    decoder::WavDecoder,
    device_manager::{AudioDeviceManager as _, cpal_dm::CpalAudioDeviceManager},
    graph::PanStage,
    mixer::Mixer,
    scheduler::{Scheduler, command::SchedulerCommand},
    track::Track,
};
use transport::{AudioClock, SampleClock};

/// Plays WAV files as synchronized tracks through the default output device.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// WAV files, one track each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Seconds between opening the stream and the synchronized start
    #[arg(long, default_value_t = 0.1)]
    start_delay: f64,

    /// Gain pushed into every track
    #[arg(long, default_value_t = 1.0)]
    master_gain: f32,

    /// Index of the track to solo
    #[arg(long)]
    solo: Option<usize>,

    /// Position in seconds to start from
    #[arg(long, default_value_t = 0.0)]
    offset: f64,

    /// Slots in the control command queue
    #[arg(long, default_value_t = COMMAND_QUEUE_CAPACITY)]
    command_capacity: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut manager = CpalAudioDeviceManager::new();
    let config = EngineConfig::default()
        .with_sample_rate(manager.output_sample_rate()?)
        .with_command_capacity(args.command_capacity);
    let clock = Arc::new(SampleClock::new(config.sample_rate));

    let decoder = WavDecoder::new();
    let mut mixer = Mixer::new();
    let mut ids = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let mut track = Track::new(
            name,
            Arc::clone(&clock) as Arc<dyn AudioClock>,
            Arc::new(PanStage::default()),
        );
        track.init(&decoder, std::fs::read(path)?).await?;
        info!("loaded '{}' ({:.2}s)", track.name(), track.duration().unwrap_or_default());
        ids.push(mixer.add_track(track));
    }

    mixer.set_track_gain(args.master_gain);
    if let Some(index) = args.solo {
        mixer.set_solo(ids.get(index).cloned());
    }

    let (scheduler, mut producer) =
        Scheduler::with_channel(mixer, Arc::clone(&clock), config.command_capacity);
    producer
        .push(SchedulerCommand::PlayAll {
            when: clock.current_time() + args.start_delay,
            offset: args.offset,
        })
        .map_err(|_| "command queue is full")?;

    manager.start_output_stream(Box::new(scheduler))?;
    info!("Audio stream started.");
    std::thread::park(); // Keep main alive to keep stream alive
    Ok(())
}
