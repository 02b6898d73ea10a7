//! The executable unit shared by single requests and collections.
//!
//! A message runs in three phases: `pre`, `send`, `post`. Only `send` and
//! `success` carry behavior every message must define; the hooks default to
//! no-ops. The caller's context is threaded through every phase untouched.

use std::fmt;

use crate::collection::Collection;
use crate::error::Result;
use crate::transport::Response;

/// Verdict of a message's latest send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// No verdict yet: `send` never ran, or it returned an error.
    #[default]
    NotRun,
    Succeeded,
    Failed,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed)
    }
}

impl From<bool> for Outcome {
    fn from(success: bool) -> Self {
        if success {
            Outcome::Succeeded
        } else {
            Outcome::Failed
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NotRun => write!(f, "not run"),
            Outcome::Succeeded => write!(f, "succeeded"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

pub trait Message<C> {
    fn name(&self) -> &str;

    fn pre(&mut self, _context: &mut C) {}

    fn post(&mut self, _context: &mut C) {}

    /// Does the actual work and records whatever `success` needs.
    fn send(&mut self, context: &mut C) -> Result<()>;

    /// Pure query over the state left by the latest `send`.
    fn success(&self) -> Outcome;

    /// Last captured response, if this message talks HTTP itself.
    fn response(&self) -> Option<&Response> {
        None
    }

    /// Composites return themselves here so tree walks can descend into them.
    fn as_collection(&self) -> Option<&Collection<C>> {
        None
    }

    /// Runs `pre`, `send` and `post` in that order. `post` runs even when
    /// `send` fails; the send error is returned afterwards.
    fn execute(&mut self, context: &mut C) -> Result<()> {
        log::debug!("{}: pre", self.name());
        self.pre(context);

        log::debug!("{}: send", self.name());
        let sent = self.send(context);
        if let Err(err) = &sent {
            log::debug!("{}: send failed: {err}", self.name());
        }

        log::debug!("{}: post", self.name());
        self.post(context);

        sent
    }
}
