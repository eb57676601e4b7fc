//! Export drivers
//!
//! A driver connects gradeexport to one external grading system. The
//! [`ExportDriver`] trait defines what a driver must provide; the
//! [`DriverRegistry`] picks the driver for a course from the configured list.
//!
//! Built-in drivers:
//!
//! - [`sample`] - fixture-backed driver that knows every course
//! - [`http`] - REST grading service

pub mod http;
pub mod registry;
pub mod sample;
mod r#trait;

pub use http::{HttpDriver, HttpDriverFactory, HTTP_DRIVER_ID};
pub use r#trait::{
    validate_driver, ActionFormat, ActionOutput, DriverAction, DriverActions, DriverDatum,
    DriverFactory, ExportDriver, FieldDataSource,
};
pub use registry::DriverRegistry;
pub use sample::{SampleDriver, SampleDriverFactory, SentGrade, SubmissionLog, SAMPLE_DRIVER_ID};
