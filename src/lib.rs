// Gradeexport - Course grade export to external grading systems
// Copyright (c) 2025 Gradeexport Contributors
// Licensed under the MIT License

//! # Gradeexport - course grades to external grading systems
//!
//! Gradeexport shows teachers the final grades of a course side by side with
//! the grades already recorded in an external (institutional) grading system,
//! flags the differences, and sends the selected grades through a pluggable
//! driver.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Request handling, reconciliation, submission and report layout
//! - [`adapters`] - Export drivers and the host platform
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`server`] - HTTP surface for the report form
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gradeexport::config::load_config;
//! use gradeexport::core::export::{ExportCoordinator, ExportRequest, ExportResponse};
//! use gradeexport::domain::{CourseId, UserId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("gradeexport.toml")?;
//!     let coordinator = ExportCoordinator::from_config(&config)?;
//!
//!     let request = ExportRequest::new(CourseId::new(2)?);
//!     if let ExportResponse::Page(page) = coordinator.handle(UserId::new(7)?, request).await? {
//!         for row in page.report.iter().flat_map(|r| r.rows.iter()) {
//!             println!("{}. {:?}", row.number, row.messages);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Drivers
//!
//! A driver declares its columns as a field mapping merged over the base
//! fields (`userident`, `fullname`, `grade`), loads the external records of a
//! course and sends one student at a time. Drivers are registered by
//! identifier in a [`adapters::drivers::DriverRegistry`]; the configured
//! `drivers.enabled` list is asked in order and the first driver that knows
//! the course is used.
//!
//! ```rust,no_run
//! use gradeexport::adapters::drivers::DriverRegistry;
//! use gradeexport::config::AppConfig;
//!
//! # fn example() -> gradeexport::domain::Result<()> {
//! let registry = DriverRegistry::with_defaults(&AppConfig::default())?;
//! assert!(registry.contains("sample"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Gradeexport uses the [`domain::GradeExportError`] type for all errors.
//! Permission problems are shown as notifications; driver configuration
//! mistakes and disallowed submissions are fatal for the request.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;
