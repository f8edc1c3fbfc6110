/// Recorded landmark files
///
/// One row per video frame: `frame,x_0,y_0,...,x_32,y_32` with normalized
/// coordinates. A row whose coordinate cells are empty is a frame where no
/// person was detected.

use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use serde::{Deserialize, Serialize};

use crate::error::{CoachError, Result};
use crate::models::landmark::{Landmark, LandmarkSet, PoseLandmark};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub frame: u64,
    pub landmarks: Option<LandmarkSet>,
}

/// All frames of one source recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub name: String,
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn new(name: impl Into<String>, frames: Vec<RecordedFrame>) -> Self {
        Self {
            name: name.into(),
            frames,
        }
    }

    /// Read a recording, naming it after the file stem
    pub fn from_csv_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_csv_reader(name, file)
    }

    pub fn from_csv_str(name: impl Into<String>, contents: &str) -> Result<Self> {
        Self::from_csv_reader(name, contents.as_bytes())
    }

    pub fn from_csv_reader<R: io::Read>(name: impl Into<String>, source: R) -> Result<Self> {
        let name = name.into();
        let invalid = |e: String| CoachError::InvalidRecording(format!("{}: {}", name, e));

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        let header = reader.headers().map_err(|e| invalid(e.to_string()))?;
        if header.is_empty() {
            return Err(invalid("empty file".to_string()));
        }
        let landmark_count = parse_header(header).map_err(invalid)?;

        let mut frames = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| invalid(e.to_string()))?;
            let line = record.position().map_or(0, |p| p.line());
            let frame = parse_row(&record, landmark_count).map_err(|e| {
                CoachError::InvalidRecording(format!("{} row {}: {}", name, line, e))
            })?;
            frames.push(frame);
        }

        tracing::debug!("Read {} frames from {}", frames.len(), name);
        Ok(Self { name, frames })
    }

    pub fn write_csv<W: io::Write>(&self, sink: W) -> Result<()> {
        let count = self
            .frames
            .iter()
            .filter_map(|f| f.landmarks.as_ref().map(LandmarkSet::len))
            .max()
            .unwrap_or(PoseLandmark::COUNT);

        let mut wtr = Writer::from_writer(sink);

        let mut header = vec!["frame".to_string()];
        for i in 0..count {
            header.push(format!("x_{}", i));
            header.push(format!("y_{}", i));
        }
        wtr.write_record(&header)?;

        for frame in &self.frames {
            let mut row = Vec::with_capacity(1 + count * 2);
            row.push(frame.frame.to_string());
            for i in 0..count {
                match frame.landmarks.as_ref().and_then(|set| set.get(i)) {
                    Some(lm) => {
                        row.push(lm.x.to_string());
                        row.push(lm.y.to_string());
                    }
                    None => row.extend([String::new(), String::new()]),
                }
            }
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| CoachError::InvalidRecording(e.to_string()))
    }

    /// Frames where a person was detected
    pub fn detected(&self) -> impl Iterator<Item = &LandmarkSet> {
        self.frames.iter().filter_map(|f| f.landmarks.as_ref())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn parse_header(header: &StringRecord) -> std::result::Result<usize, String> {
    let columns: Vec<&str> = header.iter().collect();
    if columns.first() != Some(&"frame") {
        return Err("header must start with 'frame'".to_string());
    }
    let coords = &columns[1..];
    if coords.is_empty() || coords.len() % 2 != 0 {
        return Err(format!("expected x/y column pairs, got {} columns", coords.len()));
    }
    for (i, pair) in coords.chunks(2).enumerate() {
        if pair[0] != format!("x_{}", i) || pair[1] != format!("y_{}", i) {
            return Err(format!("expected x_{0},y_{0} but found {1},{2}", i, pair[0], pair[1]));
        }
    }
    Ok(coords.len() / 2)
}

fn parse_coordinate(cell: &str) -> std::result::Result<f32, String> {
    match cell.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("invalid coordinate '{}'", cell)),
    }
}

fn parse_row(record: &StringRecord, landmark_count: usize) -> std::result::Result<RecordedFrame, String> {
    let cells: Vec<&str> = record.iter().collect();
    if cells.len() != 1 + landmark_count * 2 {
        return Err(format!(
            "expected {} cells, got {}",
            1 + landmark_count * 2,
            cells.len()
        ));
    }

    let frame: u64 = cells[0]
        .parse()
        .map_err(|_| format!("invalid frame number '{}'", cells[0]))?;

    if cells[1..].iter().all(|c| c.is_empty()) {
        return Ok(RecordedFrame {
            frame,
            landmarks: None,
        });
    }

    let mut landmarks = Vec::with_capacity(landmark_count);
    for pair in cells[1..].chunks(2) {
        landmarks.push(Landmark::new(parse_coordinate(pair[0])?, parse_coordinate(pair[1])?));
    }

    Ok(RecordedFrame {
        frame,
        landmarks: Some(LandmarkSet::new(landmarks)),
    })
}
