//! Weighted best-match selection of framebuffer configurations.
//!
//! Every candidate that passes the hard filters gets a penalty; the lowest
//! penalty wins. The weights encode these preferences, strongest first:
//!
//! 1. Having a depth buffer exactly when one was asked for.
//! 2. Matching single or double buffering.
//! 3. Having alpha when alpha was asked for.
//! 4. Never giving fewer color bits than asked; extra bits cost little.
//! 5. Stereo, hardware acceleration and stencil presence.
//! 6. Exact depth, stencil, accumulation and sample counts.
//!
//! Only color-index render types, overlay or underlay planes, and accelerated
//! formats when [`GlFlags::NO_ACCEL`] is set are rejected outright.

use tracing::debug;

use crate::capabilities::{CandidateCapabilities, DrawTargets, FormatId};
use crate::config::{GlConfig, GlFlags};
use crate::error::{GlError, GlResult};

/// Penalty for a depth buffer present when unwanted or absent when wanted.
pub const DEPTH_PRESENCE_PENALTY: u64 = 10_000_000;
/// Penalty for single versus double buffering mismatch.
pub const DOUBLE_BUFFER_PENALTY: u64 = 1_000_000;
/// Penalty for lacking alpha when alpha was asked for.
pub const ALPHA_PRESENCE_PENALTY: u64 = 100_000;
/// Penalty for lacking stencil when stencil was asked for.
pub const STENCIL_PRESENCE_PENALTY: u64 = 10_000;
/// Penalty for a stereo mismatch.
pub const STEREO_PENALTY: u64 = 10_000;
/// Penalty for software rendering when acceleration was not declined.
pub const SOFTWARE_PENALTY: u64 = 10_000;
/// Penalty for a float buffer mismatch.
pub const FLOAT_BUFFER_PENALTY: u64 = 1_000;

/// Returns the size difference, scaling deficits by `deficit_weight`.
fn delta(have: u8, want: u8, deficit_weight: u64) -> u64 {
    if have < want {
        u64::from(want - have) * deficit_weight
    } else {
        u64::from(have - want)
    }
}

/// Returns true if `candidate` may be selected at all.
pub fn is_acceptable(desired: &GlConfig, candidate: &CandidateCapabilities) -> bool {
    if !candidate.rgba || candidate.level != 0 {
        return false;
    }
    !(desired.flags.contains(GlFlags::NO_ACCEL) && candidate.accelerated)
}

/// Computes the mismatch penalty of `candidate` against `desired`.
///
/// Lower is better. The hard filters of [`is_acceptable`] are not applied.
pub fn score(desired: &GlConfig, candidate: &CandidateCapabilities) -> u64 {
    let mut penalty = delta(candidate.red_size, desired.red_size, 100)
        + delta(candidate.green_size, desired.green_size, 100)
        + delta(candidate.blue_size, desired.blue_size, 100)
        + delta(candidate.alpha_size, desired.alpha_size, 100)
        + delta(candidate.depth_size, desired.depth_size, 10)
        + delta(candidate.stencil_size, desired.stencil_size, 1)
        + delta(candidate.accum_red_size, desired.accum_red_size, 1)
        + delta(candidate.accum_green_size, desired.accum_green_size, 1)
        + delta(candidate.accum_blue_size, desired.accum_blue_size, 1)
        + delta(candidate.accum_alpha_size, desired.accum_alpha_size, 1);

    if desired.alpha_size > 0 && candidate.alpha_size == 0 {
        penalty += ALPHA_PRESENCE_PENALTY;
    }

    if (desired.depth_size > 0) != (candidate.depth_size > 0) {
        penalty += DEPTH_PRESENCE_PENALTY;
    }

    if desired.stencil_size > 0 && candidate.stencil_size == 0 {
        penalty += STENCIL_PRESENCE_PENALTY;
    } else if desired.stencil_size == 0 && candidate.stencil_size > 0 {
        penalty += 1;
    }

    if desired.multi_samples > 0 {
        penalty += delta(candidate.samples, desired.multi_samples, 10);
    }

    if desired.double_buffer() != candidate.double_buffer {
        penalty += DOUBLE_BUFFER_PENALTY;
    }
    if desired.stereo_buffer() != candidate.stereo {
        penalty += STEREO_PENALTY;
    }
    if desired.flags.contains(GlFlags::FLOAT_BUFFER) != candidate.float_buffer {
        penalty += FLOAT_BUFFER_PENALTY;
    }
    if !candidate.accelerated && !desired.flags.contains(GlFlags::NO_ACCEL) {
        penalty += SOFTWARE_PENALTY;
    }
    if !candidate.draw_targets.contains(DrawTargets::IMAGE) {
        penalty += 1;
    }

    penalty
}

/// Picks the acceptable candidate with the lowest penalty.
///
/// On equal penalties the earlier candidate is kept, unless the later one is
/// the platform's `default_format`.
pub fn select<'a, I>(
    desired: &GlConfig,
    candidates: I,
    default_format: Option<FormatId>,
) -> Option<&'a CandidateCapabilities>
where
    I: IntoIterator<Item = &'a CandidateCapabilities>,
{
    let mut best: Option<(&'a CandidateCapabilities, u64)> = None;
    for candidate in candidates {
        if !is_acceptable(desired, candidate) {
            debug!(
                target: "horizon_lattice_gl::score",
                id = %candidate.id,
                "candidate rejected"
            );
            continue;
        }
        let penalty = score(desired, candidate);
        debug!(
            target: "horizon_lattice_gl::score",
            id = %candidate.id,
            penalty,
            "candidate scored"
        );
        let better = match best {
            None => true,
            Some((_, best_penalty)) => {
                penalty < best_penalty
                    || (penalty == best_penalty && Some(candidate.id) == default_format)
            }
        };
        if better {
            best = Some((candidate, penalty));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Like [`select`], but fails when no candidate is acceptable.
pub fn select_required<'a>(
    desired: &GlConfig,
    candidates: &'a [CandidateCapabilities],
    default_format: Option<FormatId>,
) -> GlResult<&'a CandidateCapabilities> {
    select(desired, candidates, default_format).ok_or(GlError::NoMatchingConfig {
        candidates: candidates.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A candidate matching the default configuration exactly.
    fn exact(id: u64) -> CandidateCapabilities {
        let mut c = CandidateCapabilities::new(FormatId(id));
        c.red_size = 8;
        c.green_size = 8;
        c.blue_size = 8;
        c.depth_size = 24;
        c.double_buffer = true;
        c.draw_targets = DrawTargets::WINDOW | DrawTargets::IMAGE;
        c
    }

    #[test]
    fn test_exact_match_scores_zero() {
        assert_eq!(score(&GlConfig::default(), &exact(1)), 0);
    }

    #[test]
    fn test_color_deficit_worse_than_surplus() {
        let desired = GlConfig::default();
        let mut less = exact(1);
        less.red_size = 4;
        let mut more = exact(2);
        more.red_size = 12;

        assert_eq!(score(&desired, &less), 400);
        assert_eq!(score(&desired, &more), 4);
        assert_eq!(select(&desired, &[less, more], None).map(|c| c.id), Some(FormatId(2)));
    }

    #[test]
    fn test_flat_penalties() {
        let desired = GlConfig::default().with_alpha(8).with_stencil(8);
        let mut c = exact(1);
        c.alpha_size = 0;
        c.stencil_size = 0;
        assert_eq!(
            score(&desired, &c),
            800 + ALPHA_PRESENCE_PENALTY + 8 + STENCIL_PRESENCE_PENALTY
        );

        let mut c = exact(1);
        c.stencil_size = 8;
        assert_eq!(score(&GlConfig::default(), &c), 8 + 1);

        let mut c = exact(1);
        c.double_buffer = false;
        c.stereo = true;
        c.float_buffer = true;
        c.accelerated = false;
        c.draw_targets = DrawTargets::WINDOW;
        assert_eq!(
            score(&GlConfig::default(), &c),
            DOUBLE_BUFFER_PENALTY + STEREO_PENALTY + FLOAT_BUFFER_PENALTY + SOFTWARE_PENALTY + 1
        );
    }

    #[test]
    fn test_unwanted_depth_is_penalized() {
        let desired = GlConfig::default().with_depth(0);
        let c = exact(1);
        assert_eq!(score(&desired, &c), 24 + DEPTH_PRESENCE_PENALTY);
    }

    #[test]
    fn test_samples_only_when_requested() {
        let mut c = exact(1);
        c.samples = 4;
        assert_eq!(score(&GlConfig::default(), &c), 0);
        assert_eq!(score(&GlConfig::default().with_samples(4), &c), 0);
        assert_eq!(score(&GlConfig::default().with_samples(8), &c), 40);
        assert_eq!(score(&GlConfig::default().with_samples(2), &c), 2);
    }

    #[test]
    fn test_accum_deficit_and_surplus_weigh_the_same() {
        let desired = GlConfig::default().with_accum(8, 8, 8, 8);
        let mut c = exact(1);
        c.accum_red_size = 16;
        c.accum_green_size = 0;
        c.accum_blue_size = 8;
        c.accum_alpha_size = 8;
        assert_eq!(score(&desired, &c), 16);
    }

    #[test]
    fn test_hard_filters() {
        let desired = GlConfig::default();
        let mut index = exact(1);
        index.rgba = false;
        let mut overlay = exact(2);
        overlay.level = 1;
        let mut underlay = exact(3);
        underlay.level = -1;
        assert!(select(&desired, &[index, overlay, underlay], None).is_none());

        let err = select_required(&desired, &[index, overlay], None).unwrap_err();
        assert!(matches!(err, GlError::NoMatchingConfig { candidates: 2 }));
    }

    #[test]
    fn test_no_accel_excludes_hardware() {
        let desired = GlConfig::default().with_flag(GlFlags::NO_ACCEL, true);
        let hardware = exact(1);
        let mut software = exact(2);
        software.red_size = 5;
        software.accelerated = false;

        assert!(!is_acceptable(&desired, &hardware));
        assert_eq!(score(&desired, &software), 300);
        assert_eq!(
            select(&desired, &[hardware, software], None).map(|c| c.id),
            Some(FormatId(2))
        );
    }

    #[test]
    fn test_tie_prefers_default_format() {
        let desired = GlConfig::default();
        let candidates = [exact(1), exact(2), exact(3)];
        assert_eq!(select(&desired, &candidates, None).map(|c| c.id), Some(FormatId(1)));
        assert_eq!(
            select(&desired, &candidates, Some(FormatId(2))).map(|c| c.id),
            Some(FormatId(2))
        );

        // A later tie does not displace the default once selected.
        assert_eq!(
            select(&desired, &candidates, Some(FormatId(1))).map(|c| c.id),
            Some(FormatId(1))
        );
    }
}
