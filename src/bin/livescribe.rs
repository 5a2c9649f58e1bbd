//! CLI entry point: open the microphone, run the transcription loop until
//! Ctrl+C, then shut down in order (stream first, then the loop).

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use livescribe::audio::AudioSource;
use livescribe::config::AppConfig;
use livescribe::report::ConsoleSink;
use livescribe::stt::Transcriber;
use livescribe::{init_logging, init_tracing, log_debug, log_panic, run_pipeline, StopCause};
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        default_hook(info);
    }));

    if config.list_input_devices {
        return list_input_devices();
    }

    let model_path = config
        .model_path
        .clone()
        .context("--model-path is required")?;
    let transcriber =
        Transcriber::new(&model_path).with_context(|| format!("failed to load '{model_path}'"))?;

    let source = AudioSource::open(config.input_device, config.sample_rate)
        .context("failed to open audio input device")?;

    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop = stop_flag.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("failed to install interrupt handler")?;
    }

    let (sender, receiver) = bounded(config.channel_capacity);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut stream = source
        .start(sender, dropped.clone())
        .context("failed to start capture")?;

    println!(
        "Recording on '{}' at {} Hz... Press Ctrl+C to stop.",
        source.device_name(),
        source.sample_rate()
    );

    let mut sink = ConsoleSink::new();
    let opts = config.decode_options();
    let pipeline_cfg = config.pipeline_config();
    let result = run_pipeline(
        &receiver,
        &pipeline_cfg,
        &transcriber,
        &opts,
        &mut sink,
        &stop_flag,
        &dropped,
    );

    // Close the device before inspecting the loop result so it is released
    // exactly once on every path, error or not.
    stream.close();

    let metrics = result?;
    tracing::info!(
        stop_cause = metrics.stop_cause.label(),
        windows = metrics.windows_transcribed,
        frames = metrics.frames_processed,
        "session ended"
    );
    if metrics.stop_cause == StopCause::Interrupted {
        println!("Stopped.");
    }
    Ok(())
}

fn list_input_devices() -> Result<()> {
    match AudioSource::list_devices() {
        Ok(devices) if devices.is_empty() => {
            println!("No audio input devices detected.");
        }
        Ok(devices) => {
            println!("Detected audio input devices:");
            for (index, name) in devices.iter().enumerate() {
                println!("  [{index}] {name}");
            }
        }
        Err(err) => {
            log_debug(&format!("list_input_devices failed: {err:#}"));
            println!("Failed to list audio input devices: {err:#}");
        }
    }
    Ok(())
}
