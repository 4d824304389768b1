//! Durable per-tick telemetry log.
//!
//! Two record layouts exist and are selected by configuration:
//!
//! - `text`: one line per tick, `left_step_delta,right_step_delta,heading_delta`
//!   with the heading delta in radians to 6 decimals. This is what the
//!   offline model fitting reads.
//! - `binary`: 18 packed little-endian bytes per tick, no header:
//!
//! ```text
//! offset  size  field
//!      0     4  timestamp_ms   u32
//!      4     4  heading        f32, radians in (-π, π]
//!      8     4  left_pos       i32, encoder steps
//!     12     4  right_pos      i32, encoder steps
//!     16     2  z              i16, vertical field
//! ```
//!
//! Every append is followed by a flush and an fsync, so a power cut loses at
//! most the record being written. Reopening a log for appending cuts that
//! partial record off first.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};

use serde::Deserialize;

use crate::config::TelemetryConfig;
use crate::encoder::EncoderState;
use crate::error::{Error, Result};
use crate::heading::heading_delta;

pub const POSE_RECORD_SIZE: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    Text,
    Binary,
}

/// Everything measured during one tick. Each layout persists a subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_ms: u32,
    pub heading: f64,
    pub heading_delta: f64,
    pub position: EncoderState,
    pub left_step_delta: i32,
    pub right_step_delta: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaRecord {
    pub left_step_delta: i32,
    pub right_step_delta: i32,
    pub heading_delta: f64,
}

impl DeltaRecord {
    pub fn encode(&self) -> String {
        format!(
            "{},{},{:.6}\n",
            self.left_step_delta, self.right_step_delta, self.heading_delta
        )
    }

    pub fn parse(line: &str) -> Result<Self> {
        let mut fields = line.trim().split(',');
        let mut next = |name: &str| {
            fields
                .next()
                .map(str::trim)
                .ok_or_else(|| Error::Record(format!("missing {} in {:?}", name, line)))
        };

        let left = next("left_step_delta")?;
        let right = next("right_step_delta")?;
        let heading = next("heading_delta")?;
        if fields.next().is_some() {
            return Err(Error::Record(format!("too many fields in {:?}", line)));
        }

        let bad = |field: &str| Error::Record(format!("bad field {:?} in {:?}", field, line));
        Ok(Self {
            left_step_delta: left.parse().map_err(|_| bad(left))?,
            right_step_delta: right.parse().map_err(|_| bad(right))?,
            heading_delta: heading.parse().map_err(|_| bad(heading))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRecord {
    pub timestamp_ms: u32,
    pub heading: f32,
    pub left_pos: i32,
    pub right_pos: i32,
    pub z: i16,
}

impl PoseRecord {
    pub fn encode(&self) -> [u8; POSE_RECORD_SIZE] {
        let mut bytes = [0u8; POSE_RECORD_SIZE];
        bytes[0..4].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.heading.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.left_pos.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.right_pos.to_le_bytes());
        bytes[16..18].copy_from_slice(&self.z.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8; POSE_RECORD_SIZE]) -> Self {
        let word = |at: usize| [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
        Self {
            timestamp_ms: u32::from_le_bytes(word(0)),
            heading: f32::from_le_bytes(word(4)),
            left_pos: i32::from_le_bytes(word(8)),
            right_pos: i32::from_le_bytes(word(12)),
            z: i16::from_le_bytes([bytes[16], bytes[17]]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryRecord {
    Delta(DeltaRecord),
    Pose(PoseRecord),
}

impl TelemetryRecord {
    pub fn from_sample(format: RecordFormat, sample: &Sample) -> Self {
        match format {
            RecordFormat::Text => TelemetryRecord::Delta(DeltaRecord {
                left_step_delta: sample.left_step_delta,
                right_step_delta: sample.right_step_delta,
                heading_delta: sample.heading_delta,
            }),
            RecordFormat::Binary => TelemetryRecord::Pose(PoseRecord {
                timestamp_ms: sample.timestamp_ms,
                heading: sample.heading as f32,
                left_pos: sample.position.left_steps,
                right_pos: sample.position.right_steps,
                z: sample.z.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            }),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            TelemetryRecord::Delta(record) => record.encode().into_bytes(),
            TelemetryRecord::Pose(record) => record.encode().to_vec(),
        }
    }
}

/// A write target that can push written data down to the storage medium.
pub trait LogSink: Write {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl LogSink for Vec<u8> {}

pub struct TelemetryRecorder<W: LogSink> {
    sink: W,
    format: RecordFormat,
    records_written: u64,
}

impl TelemetryRecorder<File> {
    /// Open the log file. Any previous log is replaced unless
    /// `config.truncate` is off, in which case new records are appended
    /// after the last complete record already in the file.
    pub fn create(config: &TelemetryConfig) -> Result<Self> {
        let file = if config.truncate {
            File::create(&config.path)?
        } else {
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(&config.path)?;
            drop_partial_record(&mut file, config.format)?;
            file
        };

        log::info!(
            "Telemetry: {} ({:?} records{})",
            config.path.display(),
            config.format,
            if config.truncate { "" } else { ", appending" }
        );

        Ok(Self::new(file, config.format))
    }
}

/// Length of the leading run of whole records in `bytes`.
fn complete_len(bytes: &[u8], format: RecordFormat) -> usize {
    match format {
        RecordFormat::Binary => bytes.len() - bytes.len() % POSE_RECORD_SIZE,
        RecordFormat::Text => bytes
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |newline| newline + 1),
    }
}

/// Cut off a record left half-written by a power cut, so appended records
/// stay aligned.
fn drop_partial_record(file: &mut File, format: RecordFormat) -> Result<()> {
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let keep = complete_len(&bytes, format);
    if keep < bytes.len() {
        log::warn!(
            "Dropping {} bytes of a partial record at the end of the log",
            bytes.len() - keep
        );
        file.set_len(keep as u64)?;
        file.sync_data()?;
    }
    Ok(())
}

impl<W: LogSink> TelemetryRecorder<W> {
    pub fn new(sink: W, format: RecordFormat) -> Self {
        Self {
            sink,
            format,
            records_written: 0,
        }
    }

    /// Write one record and wait until it reaches storage.
    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        let record = TelemetryRecord::from_sample(self.format, sample);
        self.sink.write_all(&record.encode())?;
        self.sink.flush()?;
        self.sink.sync()?;
        self.records_written += 1;
        log::trace!("Record {}: {:?}", self.records_written, record);
        Ok(())
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }
}

/// Read a binary log as whole 18-byte records.
///
/// Returns the records and the length of a trailing partial record, which
/// is what a power cut in the middle of a write leaves behind.
pub fn read_pose_records(mut reader: impl Read) -> Result<(Vec<PoseRecord>, usize)> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let chunks = bytes.chunks_exact(POSE_RECORD_SIZE);
    let trailing = chunks.remainder().len();
    let records = chunks
        .map(|chunk| {
            let mut record = [0u8; POSE_RECORD_SIZE];
            record.copy_from_slice(chunk);
            PoseRecord::decode(&record)
        })
        .collect();

    Ok((records, trailing))
}

/// Per-tick deltas between consecutive pose records, in text layout form.
pub fn pose_deltas(records: &[PoseRecord]) -> Vec<DeltaRecord> {
    records
        .windows(2)
        .map(|pair| {
            let previous = EncoderState::new(pair[0].left_pos, pair[0].right_pos);
            let current = EncoderState::new(pair[1].left_pos, pair[1].right_pos);
            let (left, right) = current.delta_since(&previous);
            DeltaRecord {
                left_step_delta: left,
                right_step_delta: right,
                heading_delta: heading_delta(pair[0].heading as f64, pair[1].heading as f64),
            }
        })
        .collect()
}
