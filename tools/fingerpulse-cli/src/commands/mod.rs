pub mod config;
pub mod replay;
pub mod simulate;

use fingerpulse_measurement::{
    AppConfig, MeasurementSession, ScriptedBackend, SessionEvent, SessionHandle, SessionState,
};
use fingerpulse_model::Sample;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Drive a full session over `samples` and print what it reported.
///
/// When the stream ends before the session finishes on its own, the
/// session is stopped explicitly.
pub async fn measure(
    config: &AppConfig,
    samples: impl IntoIterator<Item = Sample>,
    json: bool,
) -> anyhow::Result<()> {
    let session = MeasurementSession::new(
        config.session.clone(),
        Box::new(ScriptedBackend::succeeding()),
    )?;
    let handle = SessionHandle::spawn(session);
    let mut events = handle.subscribe();

    handle.start().await?;
    let mut frames = 0usize;
    for sample in samples {
        handle.push_frame(sample).await?;
        frames += 1;
    }

    let mut session = handle.shutdown().await?;
    if session.state() == SessionState::Measuring {
        tracing::info!(frames, "Sample stream ended before the measurement duration");
        session.stop()?;
    }

    print_events(&mut events, json)?;
    if !json {
        println!();
        println!("Frames: {frames}");
        println!("Valid time: {:.1}s", session.valid_elapsed_secs());
        println!("Readings: {}", session.history().len());
    }
    Ok(())
}

fn print_events(
    events: &mut broadcast::Receiver<SessionEvent>,
    json: bool,
) -> anyhow::Result<()> {
    loop {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event stream lagged, some events were dropped");
                continue;
            }
            Err(_) => break,
        };
        if json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        match event {
            SessionEvent::StateChanged(state) => println!("State: {state:?}"),
            SessionEvent::QualityChanged(quality) => {
                println!("Quality: {quality} ({})", quality.hint())
            }
            SessionEvent::Progress(_) => {}
            SessionEvent::BpmUpdate(reading) => {
                println!("  {:>5.1}s  {} BPM", reading.elapsed_secs, reading.bpm)
            }
            SessionEvent::Finished {
                average_bpm,
                summary,
            } => {
                println!();
                println!("Average: {average_bpm} BPM");
                println!(
                    "Result: {} ± {:.1} BPM (confidence {:.0}%, {} readings)",
                    summary.bpm,
                    summary.margin_bpm,
                    summary.confidence * 100.0,
                    summary.readings
                );
            }
            SessionEvent::Error(reason) => println!("Error: {reason}"),
        }
    }
    Ok(())
}
