//! The platform-neutral description of one framebuffer configuration.

use std::fmt;

use bitflags::bitflags;

use crate::config::{GlConfig, GlFlags};

/// Platform identifier of a visual, FB-config or pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatId(pub u64);

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

bitflags! {
    /// Surfaces a configuration can render to.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawTargets: u8 {
        const WINDOW = 1 << 0;
        const IMAGE  = 1 << 1;
        const BUFFER = 1 << 2;
    }
}

/// Capabilities of one candidate configuration, as reported by any platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateCapabilities {
    pub id: FormatId,
    pub red_size: u8,
    pub green_size: u8,
    pub blue_size: u8,
    pub alpha_size: u8,
    pub depth_size: u8,
    pub stencil_size: u8,
    pub accum_red_size: u8,
    pub accum_green_size: u8,
    pub accum_blue_size: u8,
    pub accum_alpha_size: u8,
    pub samples: u8,
    pub double_buffer: bool,
    pub stereo: bool,
    pub float_buffer: bool,
    /// True for RGBA render types, false for color-index.
    pub rgba: bool,
    /// Zero for the main plane; positive for overlays, negative for underlays.
    pub level: i32,
    pub draw_targets: DrawTargets,
    pub accelerated: bool,
}

impl CandidateCapabilities {
    /// A main-plane RGBA candidate with no buffers and no draw targets.
    pub fn new(id: FormatId) -> Self {
        Self {
            id,
            red_size: 0,
            green_size: 0,
            blue_size: 0,
            alpha_size: 0,
            depth_size: 0,
            stencil_size: 0,
            accum_red_size: 0,
            accum_green_size: 0,
            accum_blue_size: 0,
            accum_alpha_size: 0,
            samples: 0,
            double_buffer: false,
            stereo: false,
            float_buffer: false,
            rgba: true,
            level: 0,
            draw_targets: DrawTargets::empty(),
            accelerated: true,
        }
    }

    /// Describes this candidate as a [`GlConfig`].
    ///
    /// `direct` is carried over from the desired configuration since it
    /// depends on the context rather than the format.
    pub fn to_config(&self, direct: bool) -> GlConfig {
        let mut flags = GlFlags::empty();
        flags.set(GlFlags::DOUBLE_BUFFER, self.double_buffer);
        flags.set(GlFlags::STEREO_BUFFER, self.stereo);
        flags.set(GlFlags::FLOAT_BUFFER, self.float_buffer);
        flags.set(GlFlags::DRAW_WINDOW, self.draw_targets.contains(DrawTargets::WINDOW));
        flags.set(GlFlags::DRAW_IMAGE, self.draw_targets.contains(DrawTargets::IMAGE));
        flags.set(GlFlags::DRAW_BUFFER, self.draw_targets.contains(DrawTargets::BUFFER));
        flags.set(GlFlags::INDIRECT, !direct);
        flags.set(GlFlags::NO_ACCEL, !self.accelerated);

        GlConfig {
            red_size: self.red_size,
            green_size: self.green_size,
            blue_size: self.blue_size,
            alpha_size: self.alpha_size,
            depth_size: self.depth_size,
            stencil_size: self.stencil_size,
            multi_samples: self.samples,
            accum_red_size: self.accum_red_size,
            accum_green_size: self.accum_green_size,
            accum_blue_size: self.accum_blue_size,
            accum_alpha_size: self.accum_alpha_size,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_config() {
        let mut candidate = CandidateCapabilities::new(FormatId(0x21));
        candidate.red_size = 8;
        candidate.depth_size = 16;
        candidate.samples = 4;
        candidate.double_buffer = true;
        candidate.accelerated = false;
        candidate.draw_targets = DrawTargets::WINDOW | DrawTargets::BUFFER;

        let config = candidate.to_config(true);
        assert_eq!(config.red_size, 8);
        assert_eq!(config.depth_size, 16);
        assert_eq!(config.multi_samples, 4);
        assert!(config.double_buffer());
        assert!(config.direct());
        assert_eq!(
            config.flags,
            GlFlags::DOUBLE_BUFFER | GlFlags::DRAW_WINDOW | GlFlags::DRAW_BUFFER | GlFlags::NO_ACCEL
        );
        assert_eq!(FormatId(0x21).to_string(), "0x21");
    }
}
