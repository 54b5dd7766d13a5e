use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::domain::{CollectionRecord, QualityGrade};
use crate::workflows::farmers::FarmerId;

#[derive(Debug)]
pub enum CollectionImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidDate { row: usize, value: String },
    NegativeQuantity { row: usize, field: &'static str },
}

impl std::fmt::Display for CollectionImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionImportError::Io(err) => write!(f, "failed to read collection export: {}", err),
            CollectionImportError::Csv(err) => write!(f, "invalid collection CSV data: {}", err),
            CollectionImportError::InvalidDate { row, value } => write!(
                f,
                "row {}: collection_date '{}' is not RFC 3339 or YYYY-MM-DD",
                row, value
            ),
            CollectionImportError::NegativeQuantity { row, field } => {
                write!(f, "row {}: {} must not be negative", row, field)
            }
        }
    }
}

impl std::error::Error for CollectionImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectionImportError::Io(err) => Some(err),
            CollectionImportError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CollectionImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CollectionImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads collection exports (`farmer_id,liters,quality_grade,total_amount,collection_date`).
pub struct CollectionImporter;

impl CollectionImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CollectionRecord>, CollectionImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CollectionRecord>, CollectionImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, row) in csv_reader.deserialize::<CollectionRow>().enumerate() {
            // Header is line 1.
            let line = index + 2;
            records.push(row?.into_record(line)?);
        }

        Ok(records)
    }

    /// Group records by farmer, preserving file order within each farmer.
    pub fn group_by_farmer(
        records: Vec<CollectionRecord>,
    ) -> HashMap<FarmerId, Vec<CollectionRecord>> {
        let mut grouped: HashMap<FarmerId, Vec<CollectionRecord>> = HashMap::new();
        for record in records {
            grouped
                .entry(record.farmer_id.clone())
                .or_default()
                .push(record);
        }
        grouped
    }
}

#[derive(Debug, Deserialize)]
struct CollectionRow {
    farmer_id: String,
    liters: f64,
    #[serde(default)]
    quality_grade: String,
    #[serde(default)]
    total_amount: f64,
    collection_date: String,
}

impl CollectionRow {
    fn into_record(self, row: usize) -> Result<CollectionRecord, CollectionImportError> {
        if self.liters < 0.0 {
            return Err(CollectionImportError::NegativeQuantity { row, field: "liters" });
        }
        if self.total_amount < 0.0 {
            return Err(CollectionImportError::NegativeQuantity {
                row,
                field: "total_amount",
            });
        }

        let collection_date =
            parse_timestamp(&self.collection_date).ok_or(CollectionImportError::InvalidDate {
                row,
                value: self.collection_date.clone(),
            })?;

        Ok(CollectionRecord {
            farmer_id: FarmerId(self.farmer_id),
            liters: self.liters,
            quality_grade: QualityGrade::parse(&self.quality_grade),
            total_amount: self.total_amount,
            collection_date,
        })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
