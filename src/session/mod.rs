//! # Session Module
//!
//! A [`Session`] is the explicit context one user's interactions share: the
//! authenticated [`Identity`], the retained [`ComparisonResult`]s (at most one
//! per [`Procedure`]; re-running overwrites) and a rolling human-readable
//! summary. It is created by [`Session::login`] and consumed by
//! [`Session::logout`]; nothing is persisted.
//!
//! The pipeline itself stays stateless: every call to [`Session::run`]
//! recomputes from the [`Analysis`] it is given, and a failing procedure is
//! reported as a [`ProcedureFailure`] without touching the other results.

mod auth;
pub mod narrative;

pub use auth::{AuthError, Identity, Role, UserAccount, UserDirectory};

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::pipeline::Analysis;
use crate::posthoc::{ComparisonResult, Procedure, ProcedureFailure};
use crate::summary::SummaryTable;

/// Results retained by a session, keyed by procedure
pub type Results = BTreeMap<Procedure, ComparisonResult>;

/// One user's analysis session
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    identity: Identity,
    started_at: DateTime<Utc>,
    results: Results,
    control_line: Option<String>,
    result_lines: BTreeMap<Procedure, String>,
}

impl Session {
    /// Authenticate and open a session
    pub fn login(directory: &UserDirectory, id: &str, password: &str) -> Result<Self, AuthError> {
        let identity = directory.authenticate(id, password).map_err(|e| {
            warn!("Login failed for '{}'", id);
            e
        })?;
        let session = Self::for_identity(identity);
        info!("Session {} opened for '{}'", session.id, session.identity.id);
        Ok(session)
    }

    /// Open a session for an already authenticated identity
    pub fn for_identity(identity: Identity) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            started_at: Utc::now(),
            results: Results::new(),
            control_line: None,
            result_lines: BTreeMap::new(),
        }
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The logged-in user
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// When the session was opened
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Run a procedure on the current analysis and retain its result.
    ///
    /// On failure the previously retained result for the procedure (if any)
    /// is left untouched.
    pub fn run(
        &mut self,
        procedure: Procedure,
        analysis: &Analysis,
    ) -> Result<&ComparisonResult, ProcedureFailure> {
        match analysis.run(procedure) {
            Ok(result) => {
                info!(
                    "Session {}: {} produced {} row(s)",
                    self.id,
                    procedure.label(),
                    result.len()
                );
                self.result_lines
                    .insert(procedure, narrative::describe_result(&result));
                self.results.insert(procedure, result);
                Ok(&self.results[&procedure])
            }
            Err(error) => {
                let failure = ProcedureFailure { procedure, error };
                warn!("Session {}: {}", self.id, failure);
                Err(failure)
            }
        }
    }

    /// Set the opening summary sentence for the control group
    pub fn describe_control(&mut self, summary: &SummaryTable, control: Option<&str>) {
        self.control_line = control.map(|c| narrative::describe_control(summary, c));
    }

    /// All retained results
    pub fn results(&self) -> &Results {
        &self.results
    }

    /// The retained result of one procedure
    pub fn result(&self, procedure: Procedure) -> Option<&ComparisonResult> {
        self.results.get(&procedure)
    }

    /// Rolling summary text: control sentence, then one sentence per result
    pub fn summary_text(&self) -> String {
        self.control_line
            .iter()
            .chain(self.result_lines.values())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Forget every retained result and the summary text
    pub fn clear_results(&mut self) {
        self.results.clear();
        self.result_lines.clear();
        self.control_line = None;
    }

    /// Close the session, returning the identity that was logged in
    pub fn logout(self) -> Identity {
        info!(
            "Session {} closed for '{}' ({} result(s) discarded)",
            self.id,
            self.identity.id,
            self.results.len()
        );
        self.identity
    }
}
