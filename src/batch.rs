//! Chunked nearest-reference assignment.
//!
//! Every subject point is matched to its nearest reference point through a
//! k-d tree built once over the reference set. Subjects are processed in
//! fixed-size chunks so peak extra memory stays proportional to the chunk
//! size plus the reference set, never to subjects × references.

use crate::compute::spatial::kdtree::SpatialIndex;
use crate::compute::validation::validate_chunk_size;
use crate::config::Config;
use crate::error::{GeoNearError, Result};
use crate::store::PointStore;
use geonear_types::PointId;
use geonear_types::assignment::AssignmentRecord;
use geonear_types::geo::GeoPoint;
use geonear_types::stats::AssignmentSummary;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Cooperative stop signal for long-running assignment jobs.
///
/// Clones share the same flag. The engine checks it before each chunk.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Reported after every completed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignProgress {
    /// 0-based index of the chunk just finished
    pub chunk_index: usize,
    /// Subject points handled so far, including rejected ones
    pub processed: usize,
    pub total: usize,
}

/// Per-job settings for [`AssignmentEngine::assign`].
pub struct AssignOptions<'a> {
    chunk_size: usize,
    start: PointId,
    cancel: Option<CancellationToken>,
    progress: Option<&'a mut dyn FnMut(AssignProgress)>,
}

impl<'a> AssignOptions<'a> {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            start: 0,
            cancel: None,
            progress: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress(mut self, callback: &'a mut dyn FnMut(AssignProgress)) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Skip the subjects before position `start`. Ids of the remaining
    /// subjects are still their positions in the full slice.
    pub fn resume_from(mut self, start: PointId) -> Self {
        self.start = start;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn start(&self) -> PointId {
        self.start
    }
}

/// Output of an assignment job.
///
/// `records` follow subject order. A cancelled job keeps every record of the
/// chunks it completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub records: Vec<AssignmentRecord>,
    /// Subject ids skipped because of non-finite coordinates
    pub rejected: Vec<PointId>,
    pub cancelled: bool,
    pub chunks_processed: usize,
    pub total_subjects: usize,
    /// Position of the first subject this result covers
    #[serde(default)]
    pub first_subject: PointId,
}

impl AssignmentResult {
    /// Every subject point was either assigned or rejected.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.first_subject == 0 && self.next_subject() == self.total_subjects
    }

    pub fn processed(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    /// Position a resumed job starts from.
    pub fn next_subject(&self) -> PointId {
        self.first_subject + self.processed()
    }

    /// Number of subjects assigned to each reference point.
    pub fn reference_counts(&self) -> FxHashMap<PointId, usize> {
        let mut counts = FxHashMap::default();
        for record in &self.records {
            *counts.entry(record.reference_id).or_insert(0) += 1;
        }
        counts
    }

    /// The `n` references with the most assigned subjects, busiest first.
    /// Equal counts are ordered by reference id.
    pub fn top_references(&self, n: usize) -> Vec<(PointId, usize)> {
        let mut ranked: Vec<(PointId, usize)> = self.reference_counts().into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Number of references with at least `threshold` assigned subjects.
    pub fn references_at_least(&self, threshold: usize) -> usize {
        self.reference_counts()
            .values()
            .filter(|&&count| count >= threshold)
            .count()
    }

    pub fn summary(&self) -> AssignmentSummary {
        let assigned = self.records.len();
        let unique: FxHashSet<PointId> = self.records.iter().map(|r| r.reference_id).collect();

        let (sum_deg, max_deg, sum_m) =
            self.records
                .iter()
                .fold((0.0, 0.0_f64, 0.0), |(sum_deg, max_deg, sum_m), r| {
                    (
                        sum_deg + r.distance_deg,
                        max_deg.max(r.distance_deg),
                        sum_m + r.distance_m,
                    )
                });

        let mean = |sum: f64| if assigned == 0 { 0.0 } else { sum / assigned as f64 };

        AssignmentSummary {
            assigned,
            rejected: self.rejected.len(),
            unique_references: unique.len(),
            mean_distance_deg: mean(sum_deg),
            max_distance_deg: max_deg,
            mean_distance_m: mean(sum_m),
        }
    }
}

/// Nearest-reference matcher owning the reference points and their index.
///
/// The index is immutable, so one engine can serve any number of jobs, and
/// concurrent jobs from several threads, by shared reference.
///
/// # Examples
///
/// ```rust
/// use geonear::{AssignOptions, AssignmentEngine, Config, GeoPoint};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let junctions = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 10.0)];
/// let engine = AssignmentEngine::from_points(&junctions, &Config::default())?;
///
/// let incidents = [GeoPoint::new(0.0, 4.0), GeoPoint::new(0.0, 6.0)];
/// let result = engine.assign(&incidents, AssignOptions::new(1))?;
///
/// assert_eq!(result.records[0].reference_id, 0);
/// assert_eq!(result.records[1].reference_id, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AssignmentEngine {
    references: Vec<GeoPoint>,
    index: SpatialIndex,
    chunk_size: usize,
}

impl AssignmentEngine {
    pub fn new(references: PointStore) -> Result<Self> {
        Self::with_config(references, &Config::default())
    }

    pub fn with_config(references: PointStore, config: &Config) -> Result<Self> {
        Self::from_points(references.points(), config)
    }

    /// Index `references` directly; reference ids are slice positions.
    ///
    /// Non-finite entries are left out of the index. Fails with
    /// [`GeoNearError::EmptyReferenceSet`] when nothing indexable remains.
    pub fn from_points(references: &[GeoPoint], config: &Config) -> Result<Self> {
        let start = Instant::now();
        let index = SpatialIndex::build_with(references, &config.index);

        if index.is_empty() {
            return Err(GeoNearError::EmptyReferenceSet);
        }

        log::info!(
            "Built reference index over {} points in {:.2?}",
            index.len(),
            start.elapsed()
        );

        Ok(Self {
            references: references.to_vec(),
            index,
            chunk_size: config.chunk_size,
        })
    }

    /// Options carrying the configured chunk size.
    pub fn default_options(&self) -> AssignOptions<'static> {
        AssignOptions::new(self.chunk_size)
    }

    /// Match every subject point to its nearest reference point.
    ///
    /// Subject ids are positions in `subjects`. Non-finite subjects are
    /// skipped and listed in [`AssignmentResult::rejected`]. Results do not
    /// depend on the chunk size. With [`AssignOptions::resume_from`] only the
    /// subjects from that position on are processed.
    pub fn assign(
        &self,
        subjects: &[GeoPoint],
        mut options: AssignOptions<'_>,
    ) -> Result<AssignmentResult> {
        validate_chunk_size(options.chunk_size)?;

        let total = subjects.len();
        let first = options.start;
        if first > total {
            return Err(GeoNearError::InvalidArgument(format!(
                "Resume position {} is past the {} subjects",
                first, total
            )));
        }

        let start = Instant::now();
        let mut result = AssignmentResult {
            records: Vec::with_capacity(total - first),
            total_subjects: total,
            first_subject: first,
            ..Default::default()
        };

        for (chunk_index, chunk) in subjects[first..].chunks(options.chunk_size).enumerate() {
            if let Some(token) = &options.cancel
                && token.is_cancelled()
            {
                log::info!(
                    "Assignment cancelled after {} of {} subjects",
                    result.next_subject(),
                    total
                );
                result.cancelled = true;
                break;
            }

            let offset = first + chunk_index * options.chunk_size;
            self.assign_chunk(chunk, offset, &mut result)?;
            result.chunks_processed += 1;

            let progress = AssignProgress {
                chunk_index,
                processed: offset + chunk.len(),
                total,
            };
            log::debug!(
                "Chunk {} done: {} of {} subjects",
                chunk_index,
                progress.processed,
                total
            );
            if let Some(callback) = options.progress.as_mut() {
                callback(progress);
            }
        }

        log::info!(
            "Assigned {} subjects to {} references in {:.2?} ({} rejected)",
            result.records.len(),
            self.index.len(),
            start.elapsed(),
            result.rejected.len()
        );

        Ok(result)
    }

    /// Continue a cancelled job where it stopped and append the new records.
    ///
    /// `subjects` must be the same slice the previous job ran on. The merged
    /// result is what a single uninterrupted run would have produced.
    pub fn resume(
        &self,
        subjects: &[GeoPoint],
        mut previous: AssignmentResult,
        options: AssignOptions<'_>,
    ) -> Result<AssignmentResult> {
        if previous.total_subjects != subjects.len() {
            return Err(GeoNearError::InvalidArgument(format!(
                "Previous job covered {} subjects, got {}",
                previous.total_subjects,
                subjects.len()
            )));
        }

        let tail = self.assign(subjects, options.resume_from(previous.next_subject()))?;
        previous.records.extend(tail.records);
        previous.rejected.extend(tail.rejected);
        previous.chunks_processed += tail.chunks_processed;
        previous.cancelled = tail.cancelled;
        Ok(previous)
    }

    fn assign_chunk(
        &self,
        chunk: &[GeoPoint],
        offset: usize,
        result: &mut AssignmentResult,
    ) -> Result<()> {
        #[cfg(feature = "parallel")]
        let outcomes: Vec<Option<AssignmentRecord>> = chunk
            .par_iter()
            .enumerate()
            .map(|(i, point)| self.assign_one(offset + i, point))
            .collect::<Result<_>>()?;

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Option<AssignmentRecord>> = chunk
            .iter()
            .enumerate()
            .map(|(i, point)| self.assign_one(offset + i, point))
            .collect::<Result<_>>()?;

        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(record) => result.records.push(record),
                None => result.rejected.push(offset + i),
            }
        }
        Ok(())
    }

    fn assign_one(&self, subject_id: PointId, point: &GeoPoint) -> Result<Option<AssignmentRecord>> {
        if !point.is_finite() {
            log::debug!("Skipping non-finite subject {}", subject_id);
            return Ok(None);
        }

        let nearest = self
            .index
            .nearest(point)?
            .ok_or(GeoNearError::EmptyReferenceSet)?;
        let reference = &self.references[nearest.id];

        Ok(Some(AssignmentRecord {
            subject_id,
            reference_id: nearest.id,
            distance_deg: nearest.distance,
            distance_m: point.haversine_distance(reference),
        }))
    }

    /// Reference point with id `id`.
    ///
    /// Non-finite references were left out of the index and are reported as
    /// [`GeoNearError::MalformedCoordinate`].
    pub fn reference(&self, id: PointId) -> Result<GeoPoint> {
        let point = self
            .references
            .get(id)
            .copied()
            .ok_or(GeoNearError::OutOfRange {
                id,
                len: self.references.len(),
            })?;

        if !point.is_finite() {
            return Err(GeoNearError::MalformedCoordinate(format!(
                "Reference {} is not indexed: ({}, {})",
                id,
                point.lat(),
                point.lon()
            )));
        }
        Ok(point)
    }

    /// Number of indexed reference points. Can be lower than the number of
    /// ids handed to [`from_points`](Self::from_points) when some were
    /// non-finite.
    pub fn reference_count(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }
}

/// One-shot assignment of `subjects` to their nearest `references`.
///
/// ```rust
/// use geonear::{assign_nearest, GeoNearError, GeoPoint};
///
/// let result = assign_nearest(&[GeoPoint::new(0.0, 4.0)], &[GeoPoint::new(0.0, 0.0)], 10_000)?;
/// assert_eq!(result.records[0].distance_deg, 4.0);
///
/// let err = assign_nearest(&[GeoPoint::new(0.0, 4.0)], &[], 10_000).unwrap_err();
/// assert_eq!(err, GeoNearError::EmptyReferenceSet);
/// # Ok::<(), GeoNearError>(())
/// ```
pub fn assign_nearest(
    subjects: &[GeoPoint],
    references: &[GeoPoint],
    chunk_size: usize,
) -> Result<AssignmentResult> {
    validate_chunk_size(chunk_size)?;
    let engine = AssignmentEngine::from_points(references, &Config::default())?;
    engine.assign(subjects, AssignOptions::new(chunk_size))
}
