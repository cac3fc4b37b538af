use serde::{Deserialize, Serialize};

/// Why an ingested coordinate was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    NonFinite,
    OutOfBounds,
}

/// A single flagged input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Position of the record in the input sequence
    pub position: usize,
    pub kind: RejectionKind,
    pub message: String,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Number of records stored
    pub accepted: usize,
    /// Records with a NaN or infinite coordinate
    pub rejected_non_finite: usize,
    /// Records outside the configured bounding box
    pub rejected_out_of_bounds: usize,
    /// Every rejected record, in input order
    pub rejections: Vec<Rejection>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejected(&self) -> usize {
        self.rejected_non_finite + self.rejected_out_of_bounds
    }

    pub fn total(&self) -> usize {
        self.accepted + self.rejected()
    }

    /// True when no record had to be rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected() == 0
    }

    pub fn record_rejection(&mut self, rejection: Rejection) {
        match rejection.kind {
            RejectionKind::NonFinite => self.rejected_non_finite += 1,
            RejectionKind::OutOfBounds => self.rejected_out_of_bounds += 1,
        }
        self.rejections.push(rejection);
    }
}

/// Aggregate statistics over an assignment job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    /// Subject points that received a reference point
    pub assigned: usize,
    /// Subject points skipped because of non-finite coordinates
    pub rejected: usize,
    /// Distinct reference points used by at least one subject
    pub unique_references: usize,
    pub mean_distance_deg: f64,
    pub max_distance_deg: f64,
    pub mean_distance_m: f64,
}
