//! Derived feature columns.
//!
//! The formulas are plain functions over optional values so the table path
//! ([`FeatureEngineer::engineer_frame`]) and the single-row path
//! ([`FeatureEngineer::engineer_record`]) cannot drift apart. A derived value
//! is `None` whenever a denominator is zero or missing, and never infinite.

use crate::error::{ProcessingError, Result};
use crate::record::{EngineeredRecord, VideoRecord, columns};
use crate::utils::{column_f64, column_str, finite, parse_calendar_date};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reference date for `video_age_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgeReference {
    /// Latest date in the batch being engineered; a single row gets age 0.
    #[default]
    BatchMax,
    /// A fixed calendar date.
    Fixed(NaiveDate),
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// `(likes + comments) / views`, missing likes/comments counting as zero.
pub fn engagement(likes: Option<f64>, comments: Option<f64>, views: Option<f64>) -> Option<f64> {
    let views = nonzero(views)?;
    finite((likes.unwrap_or(0.0) + comments.unwrap_or(0.0)) / views)
}

/// `watch_time_minutes / views`.
pub fn watch_time_per_view(watch_time: Option<f64>, views: Option<f64>) -> Option<f64> {
    let views = nonzero(views)?;
    finite(watch_time? / views)
}

/// `video_length_minutes / watch_time_minutes`; zero on either side is missing.
pub fn length_to_watch_ratio(length: Option<f64>, watch_time: Option<f64>) -> Option<f64> {
    finite(nonzero(length)? / nonzero(watch_time)?)
}

/// Whole days from `date` to `reference`.
pub fn video_age_days(reference: Option<NaiveDate>, date: Option<NaiveDate>) -> Option<f64> {
    Some((reference? - date?).num_days() as f64)
}

/// Adds the derived feature columns to tables and single records.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    reference: AgeReference,
}

impl FeatureEngineer {
    pub fn new(reference: AgeReference) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> AgeReference {
        self.reference
    }

    fn resolve_reference(&self, dates: &[Option<NaiveDate>]) -> Option<NaiveDate> {
        match self.reference {
            AgeReference::BatchMax => dates.iter().flatten().max().copied(),
            AgeReference::Fixed(date) => Some(date),
        }
    }

    /// Engineer a single record. With [`AgeReference::BatchMax`] the batch is
    /// the record itself, so the age is 0 whenever the date is known.
    pub fn engineer_record(&self, record: &VideoRecord) -> EngineeredRecord {
        let reference = self.resolve_reference(&[record.date]);
        derive(record.clone(), reference)
    }

    /// Engineer a batch of records against one shared reference date.
    pub fn engineer_records(&self, records: &[VideoRecord]) -> Vec<EngineeredRecord> {
        let dates: Vec<Option<NaiveDate>> = records.iter().map(|r| r.date).collect();
        let reference = self.resolve_reference(&dates);
        records
            .iter()
            .map(|r| derive(r.clone(), reference))
            .collect()
    }

    /// Add the derived columns to a table. The row count is unchanged.
    ///
    /// `views`, `watch_time_minutes` and `video_length_minutes` are required;
    /// absent `likes`/`comments` count as zero and an absent date column
    /// skips `video_age_days`.
    pub fn engineer_frame(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;
        let height = df.height();

        let views = column_f64(&df, columns::VIEWS)?;
        let watch = column_f64(&df, columns::WATCH_TIME)?;
        let length = column_f64(&df, columns::VIDEO_LENGTH)?;
        let likes = optional_f64(&df, columns::LIKES, height)?;
        let comments = optional_f64(&df, columns::COMMENTS, height)?;

        let engagement_col: Vec<Option<f64>> = (0..height)
            .map(|i| engagement(likes[i], comments[i], views[i]))
            .collect();
        let per_view_col: Vec<Option<f64>> = (0..height)
            .map(|i| watch_time_per_view(watch[i], views[i]))
            .collect();
        let ratio_col: Vec<Option<f64>> = (0..height)
            .map(|i| length_to_watch_ratio(length[i], watch[i]))
            .collect();

        df.with_column(Series::new(columns::ENGAGEMENT.into(), engagement_col))?;
        df.with_column(Series::new(columns::WATCH_TIME_PER_VIEW.into(), per_view_col))?;

        if df.column(columns::DATE).is_ok() {
            let dates = parse_date_column(&df, columns::DATE)?;
            let reference = self.resolve_reference(&dates);
            let ages: Vec<Option<f64>> = dates
                .iter()
                .map(|d| video_age_days(reference, *d))
                .collect();
            df.with_column(Series::new(columns::VIDEO_AGE_DAYS.into(), ages))?;
        } else {
            debug!("No '{}' column, skipping video_age_days", columns::DATE);
        }

        df.with_column(Series::new(columns::LENGTH_TO_WATCH_RATIO.into(), ratio_col))?;

        Ok(df)
    }
}

fn derive(raw: VideoRecord, reference: Option<NaiveDate>) -> EngineeredRecord {
    EngineeredRecord {
        engagement: engagement(raw.likes, raw.comments, raw.views),
        watch_time_per_view: watch_time_per_view(raw.watch_time_minutes, raw.views),
        video_age_days: video_age_days(reference, raw.date),
        length_to_watch_ratio: length_to_watch_ratio(
            raw.video_length_minutes,
            raw.watch_time_minutes,
        ),
        raw,
    }
}

fn optional_f64(df: &DataFrame, name: &str, height: usize) -> Result<Vec<Option<f64>>> {
    if df.column(name).is_ok() {
        column_f64(df, name)
    } else {
        Ok(vec![None; height])
    }
}

/// Parse a date column; empty cells are missing, anything else unparseable
/// is an error naming the (1-based) row.
pub fn parse_date_column(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    column_str(df, name)?
        .into_iter()
        .enumerate()
        .map(|(idx, cell)| match cell {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_calendar_date(&raw)
                .map(Some)
                .ok_or(ProcessingError::InvalidDate {
                    row: idx + 1,
                    value: raw,
                }),
        })
        .collect()
}
