use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use rep_coach::models::{Recording, SessionEvent, SessionSummary};
use rep_coach::services::{
    frame_channel, spawn_feedback_worker, ExerciseSession, FeedbackScheduler, Frame,
    JsonModelStore, LoggingSpeechSink, ModelStore,
};

use crate::config;

#[derive(Args)]
pub struct AnalyzeCommand {
    /// Exercise id, e.g. pushup or squat
    exercise: String,

    /// Recording to replay frame by frame
    recording: PathBuf,

    /// Number of reps in the set; 0 means no target
    #[arg(short, long, default_value = "0")]
    target: u32,

    /// Directory holding trained models (defaults to `models_dir` from config)
    #[arg(long)]
    models: Option<PathBuf>,

    /// Frame width in pixels used to scale landmark coordinates
    #[arg(long, default_value = "1.0")]
    width: f64,

    /// Frame height in pixels used to scale landmark coordinates
    #[arg(long, default_value = "1.0")]
    height: f64,

    /// Print each event as JSON instead of a report
    #[arg(long)]
    json: bool,
}

impl AnalyzeCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let config = config::load(config_path)?;
        let store = JsonModelStore::new(self.models.clone().unwrap_or_else(|| config.models_dir.clone()));
        let model = store.load(&self.exercise)?.map(std::sync::Arc::new);
        let session = ExerciseSession::start(&config, &self.exercise, model, self.target)
            .with_context(|| format!("Cannot start a '{}' session", self.exercise))?;

        let recording = Recording::from_csv_file(&self.recording)
            .with_context(|| format!("Failed to read recording {}", self.recording.display()))?;

        let cancel = CancellationToken::new();
        let (frame_tx, frame_rx) = frame_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (speech_tx, speech_rx) = mpsc::unbounded_channel();

        let worker = spawn_feedback_worker(
            FeedbackScheduler::new(&config.feedback),
            speech_rx,
            LoggingSpeechSink,
            cancel.child_token(),
        );
        let printer = tokio::spawn(print_events(event_rx, speech_tx, self.json));
        let runner = tokio::spawn(session.run(frame_rx, event_tx, cancel.clone()));

        let (width, height) = (self.width, self.height);
        for recorded in recording.frames {
            let frame = match recorded.landmarks {
                Some(landmarks) => Frame::detected(landmarks, width, height),
                None => Frame::empty(width, height),
            };
            // Session stops taking frames once the target is reached
            if frame_tx.send(frame).await.is_err() {
                break;
            }
        }
        drop(frame_tx);

        let summary = runner.await.context("Session task failed")?;
        printer.await.context("Event printer failed")?;
        worker.await.context("Feedback worker failed")?;

        if !self.json {
            print_summary(&summary);
        }
        Ok(())
    }
}

/// Print every event and forward it to the feedback worker
async fn print_events(
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    speech: mpsc::UnboundedSender<SessionEvent>,
    json: bool,
) {
    while let Some(event) = events.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Cannot serialize event: {}", e),
            }
        } else {
            match &event {
                SessionEvent::Started {
                    exercise_id,
                    target_reps,
                    ..
                } => {
                    println!("Session started: {} (target {})", exercise_id.as_str().bold(), target_reps);
                    println!("────────────────────────────────");
                }
                SessionEvent::RepScored {
                    rep_number, result, ..
                } => {
                    let report = result.report(*rep_number);
                    let colored = if result.deviations.is_empty() {
                        report.as_str().green()
                    } else {
                        report.as_str().yellow()
                    };
                    print!("{}", colored);
                    println!(
                        "  similarity {:.1}% ({}), cue: \"{}\"",
                        result.similarity_percent,
                        result.rating.label(),
                        result.feedback.text()
                    );
                }
                SessionEvent::SessionComplete { total_reps, .. } => {
                    println!("{} Set complete: {} reps", "✓".green(), total_reps);
                }
            }
        }
        let _ = speech.send(event);
    }
}

fn print_summary(summary: &SessionSummary) {
    println!("────────────────────────────────");
    println!("Reps counted: {}", summary.reps_counted);
    println!("Reps scored:  {}", summary.reps_scored);
    match summary.mean_quality {
        Some(mean) => println!("Mean quality: {:.0}", mean),
        None => println!("Mean quality: -"),
    }
}
