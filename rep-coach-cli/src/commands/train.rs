use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use rep_coach::models::Recording;
use rep_coach::services::{JsonModelStore, TrainingService};

use crate::config;

#[derive(Args)]
pub struct TrainCommand {
    /// Exercise id, e.g. pushup or squat
    exercise: String,

    /// Recording files or directories of `.csv` recordings
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Override the minimum peak prominence in degrees
    #[arg(long)]
    prominence: Option<f64>,

    /// Directory to write the model to (defaults to `models_dir` from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Frame width in pixels used to scale landmark coordinates
    #[arg(long, default_value = "1.0")]
    width: f64,

    /// Frame height in pixels used to scale landmark coordinates
    #[arg(long, default_value = "1.0")]
    height: f64,
}

impl TrainCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let mut config = config::load(config_path)?;
        if let Some(prominence) = self.prominence {
            config.segmentation.prominence_deg = prominence;
            config.validate()?;
        }

        let files = collect_recordings(&self.inputs)?;
        if files.is_empty() {
            bail!("No .csv recordings found in the given inputs");
        }

        let recordings = files
            .iter()
            .map(|path| {
                Recording::from_csv_file(path)
                    .with_context(|| format!("Failed to read recording {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        let service = TrainingService::new(&config, &self.exercise)?
            .with_frame_size(self.width, self.height);
        let store = JsonModelStore::new(self.output.unwrap_or(config.models_dir));

        println!("Training reference model for: {}", self.exercise.as_str().bold());
        println!("────────────────────────────────");

        let report = service
            .train_and_save(&recordings, &store)
            .with_context(|| format!("Training failed for '{}'", self.exercise))?;

        for recording in &report.recordings {
            let min_angle = recording
                .min_angle
                .map(|a| format!("{:.1}°", a))
                .unwrap_or_else(|| "-".to_string());
            let reps = if recording.reps == 0 {
                "0 reps".yellow()
            } else {
                format!("{} reps", recording.reps).as_str().normal()
            };
            println!(
                "  {}: {}, {}/{} frames, min angle {}",
                recording.name, reps, recording.detected_frames, recording.frames, min_angle
            );
        }

        println!("────────────────────────────────");
        println!(
            "{} Model saved: {}",
            "✓".green(),
            store.path_for(&self.exercise).display()
        );
        println!("  Samples: {}", report.model.sample_count);
        if let Some(bottom) = &report.model.bottom_angle {
            println!("  Bottom angle: {:.1}° ± {:.1}°", bottom.mean_deg, bottom.std_deg);
        }

        Ok(())
    }
}

/// Expand directories into their `.csv` files, sorted by name
fn collect_recordings(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_recordings_expands_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.csv"), "").unwrap();
        fs::write(dir.path().join("a.csv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let single = dir.path().join("extra.csv");

        let files = collect_recordings(&[dir.path().to_path_buf(), single.clone()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "extra.csv"]);
    }
}
