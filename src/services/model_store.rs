use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{CoachError, Result};
use crate::models::ReferenceModel;

/// Persistence boundary for trained reference models.
///
/// `load` returns `None` for an exercise that has not been trained yet;
/// there is no implicit default model.
pub trait ModelStore: Send + Sync {
    fn save(&self, model: &ReferenceModel) -> Result<()>;
    fn load(&self, exercise_id: &str) -> Result<Option<ReferenceModel>>;

    /// Load for a live session, failing when the exercise is untrained
    fn require(&self, exercise_id: &str) -> Result<Arc<ReferenceModel>> {
        self.load(exercise_id)?
            .map(Arc::new)
            .ok_or_else(|| CoachError::ModelUnavailable(exercise_id.to_string()))
    }
}

/// Stores each model as `<dir>/<exercise>_reference.json`
#[derive(Debug, Clone)]
pub struct JsonModelStore {
    dir: PathBuf,
}

impl JsonModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, exercise_id: &str) -> PathBuf {
        self.dir.join(format!("{}_reference.json", exercise_id))
    }
}

impl ModelStore for JsonModelStore {
    fn save(&self, model: &ReferenceModel) -> Result<()> {
        model.validate()?;
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(&model.exercise_id);
        let json = serde_json::to_string_pretty(model)?;
        fs::write(&path, json)?;

        tracing::info!(
            "Saved {} reference model ({} reps) to {}",
            model.exercise_id,
            model.sample_count,
            path.display()
        );
        Ok(())
    }

    fn load(&self, exercise_id: &str) -> Result<Option<ReferenceModel>> {
        let path = self.path_for(exercise_id);
        if !path.exists() {
            tracing::debug!("No reference model at {}", path.display());
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let model: ReferenceModel = serde_json::from_str(&contents)?;
        model.validate()?;
        Ok(Some(model))
    }
}

/// Process-local store, used by tests and one-shot pipelines
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    models: RwLock<HashMap<String, ReferenceModel>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for InMemoryModelStore {
    fn save(&self, model: &ReferenceModel) -> Result<()> {
        model.validate()?;
        let mut models = self
            .models
            .write()
            .map_err(|_| CoachError::InvalidModel("model store lock poisoned".to_string()))?;
        models.insert(model.exercise_id.clone(), model.clone());
        Ok(())
    }

    fn load(&self, exercise_id: &str) -> Result<Option<ReferenceModel>> {
        let models = self
            .models
            .read()
            .map_err(|_| CoachError::InvalidModel("model store lock poisoned".to_string()))?;
        Ok(models.get(exercise_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn model(exercise_id: &str) -> ReferenceModel {
        ReferenceModel {
            exercise_id: exercise_id.to_string(),
            mean_curve: vec![1.0, 0.2, 0.0, 0.4, 1.0],
            std_curve: vec![0.0, 0.05, 0.02, 0.1, 0.0],
            sample_count: 4,
            bottom_angle: None,
            trained_at: Utc::now(),
        }
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonModelStore::new(dir.path());
        let saved = model("squat");
        store.save(&saved).unwrap();

        assert!(dir.path().join("squat_reference.json").exists());
        assert_eq!(store.load("squat").unwrap(), Some(saved));
    }

    #[test]
    fn test_untrained_exercise_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonModelStore::new(dir.path().join("missing"));
        assert_eq!(store.load("pushup").unwrap(), None);
        assert_matches!(store.require("pushup"), Err(CoachError::ModelUnavailable(id)) if id == "pushup");
    }

    #[test]
    fn test_invalid_model_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let store = JsonModelStore::new(dir.path());
        let mut broken = model("pushup");
        broken.std_curve.pop();

        assert_matches!(store.save(&broken), Err(CoachError::InvalidModel(_)));
        assert!(!store.path_for("pushup").exists());
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryModelStore::new();
        assert!(store.load("pushup").unwrap().is_none());
        store.save(&model("pushup")).unwrap();
        let loaded = store.require("pushup").unwrap();
        assert_eq!(loaded.sample_count, 4);
    }
}
