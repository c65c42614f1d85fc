//! Loading and shaping of paired A/B measurement data.
//!
//! The input is a CSV table of timestamped measurements of two quantities,
//! `A` and `B`, with their ratio, a percent deviation, a sex code and an
//! age-bucket label. Cells are coerced leniently: anything that does not
//! parse becomes a missing value instead of an error.
//!
//! # Modules
//!
//! - [`column`]: the known columns, their CSV headers and aliases
//! - [`observation`]: one table row and cell coercion
//! - [`dataset`]: the loaded table and its queries
//! - [`age`]: ordered age-bucket labels
//! - [`cohort`]: the children / adults split
//! - [`convert`]: pipe-delimited text logs to CSV
//!
//! # Examples
//!
//! ```
//! use pairstat_data::{cohort::Cohorts, column::Column, dataset::Dataset};
//!
//! let csv = "\
//! datetime,A,B,poměr,odchylka,pohlaví,věk
//! 2024-01-05 08:12:44,3.21,1.98,1.62,0.18,1,20-40
//! 2024-01-05 09:30:00,2.80,1.90,1.47,-2.1,2,0-10
//! ";
//! let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
//! assert_eq!(dataset.sexes(), vec![1, 2]);
//!
//! let split = Cohorts::default().split(&dataset, Column::Ratio);
//! assert_eq!(split.children, vec![1.47]);
//! assert_eq!(split.adults, vec![1.62]);
//! ```

pub mod age;
pub mod cohort;
pub mod column;
pub mod convert;
pub mod dataset;
pub mod error;
pub mod observation;

pub use self::error::DataError;
