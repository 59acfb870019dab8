//! # toxhub - Post-Hoc Analysis for Toxicology Studies
//!
//! `toxhub` turns a tabular study (one row per animal and time point) into
//! group trends, a per-group statistical summary, and multiple-comparison
//! results, then exports everything as an XLSX workbook.
//!
//! ## Pipeline
//!
//! ```text
//! Table ──► Dataset ──► ObservationFilter ──► SummaryTable (trend, summary)
//!                                         └─► GroupSamples ──► Dunnett | Tukey HSD | Scheffe
//!                                                                  │
//!                             Session (retained results, narrative) ◄┘
//!                                             │
//!                                             └─► report::export_workbook
//! ```
//!
//! Every step is a pure function of its inputs and is recomputed from scratch
//! for each interaction. Procedure failures never abort a session: they are
//! reported as [`posthoc::ProcedureFailure`]s and the other procedures still
//! run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toxhub::prelude::*;
//!
//! let table = Table::from_path("C01_study.csv")?;
//! let options = AnalysisOptions {
//!     measurement_column: Some("BodyWeight".to_string()),
//!     control_group: Some("G1".to_string()),
//!     ..Default::default()
//! };
//! let (dataset, config) = prepare(&table, &options)?;
//! let analysis = analyze(&dataset, &config);
//!
//! let mut session = Session::for_identity(Identity {
//!     id: "analyst".to_string(),
//!     name: "Analyst".to_string(),
//!     role: Role::User,
//!     prefix: "C01_".to_string(),
//! });
//! for procedure in Procedure::ALL {
//!     if let Err(failure) = session.run(procedure, &analysis) {
//!         eprintln!("{}", failure);
//!     }
//! }
//!
//! write_workbook("Report.xlsx", &analysis.summary, session.results(), &ExportOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`table`]: CSV/TSV loading into a header + string-row table
//! - [`dataset`]: typed observations (group, time point, measurement)
//! - [`config`]: column selection and analysis options
//! - [`filter`]: time window, group selection and statistic time point
//! - [`summary`]: count, mean and SEM per group (and per time point)
//! - [`posthoc`]: Dunnett, Tukey HSD and Bonferroni-corrected pairwise tests
//! - [`pipeline`]: the stateless filter → summary → samples step
//! - [`session`]: identities, retained results and the narrative summary
//! - [`store`]: per-user study files in a data directory
//! - [`report`]: XLSX export and terminal tables

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod posthoc;
pub mod report;
pub mod session;
pub mod store;
pub mod summary;
pub mod table;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{AnalysisConfig, AnalysisOptions, ColumnSelection};
    pub use crate::dataset::{Dataset, InvalidCell, Observation, TimePoint};
    pub use crate::error::AnalysisError;
    pub use crate::filter::{ObservationFilter, TimeSelection};
    pub use crate::pipeline::{analyze, prepare, Analysis};
    pub use crate::posthoc::{
        ComparisonResult, GroupSamples, Procedure, ProcedureFailure, ALPHA,
    };
    pub use crate::report::{export_workbook, write_workbook, ExportError, ExportOptions};
    pub use crate::session::{Identity, Results, Role, Session, UserAccount, UserDirectory};
    pub use crate::store::{StoreError, StudyStore};
    pub use crate::summary::{GroupSummary, SummaryTable};
    pub use crate::table::{Table, TableError};
}
