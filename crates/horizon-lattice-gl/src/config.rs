//! Framebuffer configuration descriptors.
//!
//! A [`GlConfig`] serves both as the *desired* configuration handed to the
//! matcher and as the *actual* configuration it reports back. Values are hints;
//! nothing is validated here.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_gl::{GlConfig, GlFlags};
//!
//! let config = GlConfig::default()
//!     .with_alpha(8)
//!     .with_stencil(8)
//!     .with_flags(GlFlags::DOUBLE_BUFFER | GlFlags::DRAW_WINDOW | GlFlags::DRAW_IMAGE);
//!
//! assert!(config.double_buffer());
//! assert!(config.direct());
//! ```

use std::io::{Read, Write};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::GlResult;

bitflags! {
    /// Buffering, render type and drawable options of a configuration.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GlFlags: u32 {
        /// Front and back buffers; single buffered when clear.
        const DOUBLE_BUFFER = 1 << 0;
        /// Left and right buffers.
        const STEREO_BUFFER = 1 << 1;
        /// Floating point color components.
        const FLOAT_BUFFER  = 1 << 2;
        /// Can render to windows.
        const DRAW_WINDOW   = 1 << 3;
        /// Can render to off-screen images.
        const DRAW_IMAGE    = 1 << 4;
        /// Can render to pixel buffers.
        const DRAW_BUFFER   = 1 << 5;
        /// Rendering goes through the display server.
        const INDIRECT      = 1 << 6;
        /// Only software rendered configurations are acceptable.
        const NO_ACCEL      = 1 << 7;
    }
}

/// Bit depths and options of a GL framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlConfig {
    pub red_size: u8,
    pub green_size: u8,
    pub blue_size: u8,
    pub alpha_size: u8,
    pub depth_size: u8,
    pub stencil_size: u8,
    pub multi_samples: u8,
    pub accum_red_size: u8,
    pub accum_green_size: u8,
    pub accum_blue_size: u8,
    pub accum_alpha_size: u8,
    pub flags: GlFlags,
}

impl Default for GlConfig {
    fn default() -> Self {
        Self {
            red_size: 8,
            green_size: 8,
            blue_size: 8,
            alpha_size: 0,
            depth_size: 24,
            stencil_size: 0,
            multi_samples: 0,
            accum_red_size: 0,
            accum_green_size: 0,
            accum_blue_size: 0,
            accum_alpha_size: 0,
            flags: GlFlags::DOUBLE_BUFFER | GlFlags::DRAW_WINDOW,
        }
    }
}

impl GlConfig {
    /// A configuration with every size zero and no flags.
    pub const EMPTY: Self = Self {
        red_size: 0,
        green_size: 0,
        blue_size: 0,
        alpha_size: 0,
        depth_size: 0,
        stencil_size: 0,
        multi_samples: 0,
        accum_red_size: 0,
        accum_green_size: 0,
        accum_blue_size: 0,
        accum_alpha_size: 0,
        flags: GlFlags::empty(),
    };

    // ========================================================================
    // Builders
    // ========================================================================

    /// Set the red, green and blue sizes.
    pub fn with_color(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.red_size = red;
        self.green_size = green;
        self.blue_size = blue;
        self
    }

    /// Set the alpha size.
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha_size = alpha;
        self
    }

    /// Set the depth buffer size.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth_size = depth;
        self
    }

    /// Set the stencil buffer size.
    pub fn with_stencil(mut self, stencil: u8) -> Self {
        self.stencil_size = stencil;
        self
    }

    /// Set the number of samples per pixel.
    pub fn with_samples(mut self, samples: u8) -> Self {
        self.multi_samples = samples;
        self
    }

    /// Set the accumulation buffer sizes.
    pub fn with_accum(mut self, red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        self.accum_red_size = red;
        self.accum_green_size = green;
        self.accum_blue_size = blue;
        self.accum_alpha_size = alpha;
        self
    }

    /// Replace all flags.
    pub fn with_flags(mut self, flags: GlFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set or clear individual flags.
    pub fn with_flag(mut self, flag: GlFlags, enabled: bool) -> Self {
        self.flags.set(flag, enabled);
        self
    }

    // ========================================================================
    // Derived attributes
    // ========================================================================

    /// Returns true if double buffered.
    pub fn double_buffer(&self) -> bool {
        self.flags.contains(GlFlags::DOUBLE_BUFFER)
    }

    /// Returns true if stereo buffered.
    pub fn stereo_buffer(&self) -> bool {
        self.flags.contains(GlFlags::STEREO_BUFFER)
    }

    /// Returns true if rendering bypasses the display server.
    pub fn direct(&self) -> bool {
        !self.flags.contains(GlFlags::INDIRECT)
    }

    // ========================================================================
    // Binary stream
    // ========================================================================

    /// Writes every field to a binary stream in declaration order.
    pub fn save_to<W: Write>(&self, writer: W) -> GlResult<()> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Reads a configuration written by [`save_to`](Self::save_to).
    pub fn load_from<R: Read>(reader: R) -> GlResult<Self> {
        Ok(bincode::deserialize_from(reader)?)
    }
}
