use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use rep_coach::services::{JsonModelStore, ModelStore};

use crate::config;

pub async fn show_model(explicit: Option<&Path>, exercise: &str, json: bool) -> Result<()> {
    let config = config::load(explicit)?;
    config.exercise(exercise)?;

    let store = JsonModelStore::new(&config.models_dir);
    let Some(model) = store.load(exercise)? else {
        bail!(
            "No reference model for '{}' in {}. Run `rep-coach train {}` first",
            exercise,
            store.dir().display(),
            exercise
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&model)?);
        return Ok(());
    }

    let mean_std = model.std_curve.iter().sum::<f64>() / model.len() as f64;
    let max_std = model.std_curve.iter().copied().fold(0.0, f64::max);

    println!("{}", format!("Reference model: {}", model.exercise_id).as_str().bold());
    println!("────────────────────────────────");
    println!("Trained:      {}", model.trained_at.format("%Y-%m-%d %H:%M"));
    println!("Reps:         {}", model.sample_count);
    println!("Points:       {}", model.len());
    println!("Std (mean):   {:.3}", mean_std);
    println!("Std (max):    {:.3}", max_std);
    if let Some(bottom) = &model.bottom_angle {
        println!(
            "Bottom angle: {:.1}° ± {:.1}°",
            bottom.mean_deg, bottom.std_deg
        );
    }
    println!();
    println!("{}", sparkline(&model.mean_curve));

    Ok(())
}

/// One block character per point of a [0, 1] curve
fn sparkline(curve: &[f64]) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    curve
        .iter()
        .map(|v| {
            let level = (v.clamp(0.0, 1.0) * (BLOCKS.len() - 1) as f64).round() as usize;
            BLOCKS[level]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_levels() {
        assert_eq!(sparkline(&[1.0, 0.0, 0.5, 1.0]), "█▁▅█");
    }
}
