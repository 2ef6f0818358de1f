//! Visual selection through legacy per-visual enumeration.

use std::sync::Arc;

use tracing::{info, warn};

use crate::capabilities::FormatId;
use crate::config::GlConfig;
use crate::display::DisplayConnection;
use crate::error::{GlError, GlResult};
use crate::score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchState {
    Uninitialized,
    Matched(FormatId),
    /// Holds the number of visuals the failed match saw.
    Failed(usize),
}

/// Matches a desired [`GlConfig`] against the legacy visuals of a display.
///
/// Windows that render with GL are created on the matched visual.
#[derive(Debug)]
pub struct GlVisual {
    display: Arc<DisplayConnection>,
    desired: GlConfig,
    actual: GlConfig,
    state: MatchState,
}

impl GlVisual {
    /// Creates an unmatched visual.
    pub fn new(display: Arc<DisplayConnection>, desired: GlConfig) -> Self {
        Self {
            display,
            desired,
            actual: GlConfig::EMPTY,
            state: MatchState::Uninitialized,
        }
    }

    /// Returns the display this visual belongs to.
    pub fn display(&self) -> &Arc<DisplayConnection> {
        &self.display
    }

    /// Returns the requested configuration.
    pub fn desired(&self) -> &GlConfig {
        &self.desired
    }

    /// Changes the requested configuration before matching.
    pub fn set_desired(&mut self, desired: GlConfig) -> GlResult<()> {
        if self.is_realized() {
            return Err(GlError::AlreadyRealized);
        }
        self.desired = desired;
        Ok(())
    }

    /// Returns the matched configuration; all zero before matching.
    pub fn actual(&self) -> &GlConfig {
        &self.actual
    }

    /// Returns the matched visual.
    pub fn format(&self) -> Option<FormatId> {
        match self.state {
            MatchState::Matched(id) => Some(id),
            _ => None,
        }
    }

    /// Returns true once a visual has been matched.
    pub fn is_realized(&self) -> bool {
        matches!(self.state, MatchState::Matched(_))
    }

    /// Selects the best visual. Does nothing if one is already selected.
    ///
    /// Fails if the display offers no visual passing the hard filters; that
    /// outcome is remembered and returned again by later calls.
    pub fn create(&mut self) -> GlResult<()> {
        match self.state {
            MatchState::Matched(_) => return Ok(()),
            MatchState::Failed(candidates) => return Err(GlError::NoMatchingConfig { candidates }),
            MatchState::Uninitialized => {}
        }

        let candidates = self.display.legacy_candidates()?;
        let default_format = self.display.backend().default_format();
        let best = match score::select_required(&self.desired, &candidates, default_format) {
            Ok(best) => best,
            Err(e) => {
                warn!(
                    target: "horizon_lattice_gl::visual",
                    candidates = candidates.len(),
                    "no usable GL visual"
                );
                self.state = MatchState::Failed(candidates.len());
                return Err(e);
            }
        };

        self.actual = best.to_config(self.desired.direct());
        self.state = MatchState::Matched(best.id);
        info!(
            target: "horizon_lattice_gl::visual",
            id = %best.id,
            penalty = score::score(&self.desired, best),
            "selected GL visual"
        );
        Ok(())
    }

    /// Forgets the matched visual so it can be matched again.
    pub fn detach(&mut self) {
        self.state = MatchState::Uninitialized;
    }

    /// Releases the matched visual.
    pub fn destroy(&mut self) {
        self.detach();
        self.actual = GlConfig::EMPTY;
    }
}
