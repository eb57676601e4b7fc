//! Core business logic for gradeexport.
//!
//! # Modules
//!
//! - [`export`] - Request handling, reconciliation and grade submission
//! - [`report`] - Report layout and rendering (text, JSON, HTML)
//!
//! # Request Workflow
//!
//! 1. **Resolve**: course, affiliated course and group
//! 2. **Select**: the first enabled driver that knows the course
//! 3. **Check**: view and send permissions, driver course checks
//! 4. **Send** (optional): selected students, one at a time
//! 5. **Populate**: students, local grades, external records, driver fields
//! 6. **Report**: reconcile and lay out the table
//!
//! # Example
//!
//! ```rust,no_run
//! use gradeexport::config::load_config;
//! use gradeexport::core::export::{ExportCoordinator, ExportRequest, ExportResponse};
//! use gradeexport::core::report::{render, OutputFormat};
//! use gradeexport::domain::{CourseId, UserId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("gradeexport.toml")?;
//! let coordinator = ExportCoordinator::from_config(&config)?;
//!
//! let request = ExportRequest::new(CourseId::new(2)?);
//! if let ExportResponse::Page(page) = coordinator.handle(UserId::new(7)?, request).await? {
//!     println!("{}", render(&page, OutputFormat::Text, "/")?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod report;
