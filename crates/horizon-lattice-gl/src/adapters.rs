//! Normalization of platform format descriptions.
//!
//! Each platform describes its framebuffer configurations differently:
//!
//! - legacy GLX visuals through `glXGetConfig` attributes,
//! - GLX 1.3 FB-configs through `glXGetFBConfigAttrib` attributes,
//! - Windows pixel formats through `PIXELFORMATDESCRIPTOR` records,
//! - WGL_ARB_pixel_format through `wglGetPixelFormatAttribivARB` attributes.
//!
//! The adapters here turn any of them into a [`CandidateCapabilities`] so a
//! single scoring function can rank them. Attribute queries are passed as
//! `(attribute, value)` pairs; missing attributes read as zero.

use crate::capabilities::{CandidateCapabilities, DrawTargets, FormatId};

/// Attribute names shared by `glXGetConfig` and `glXGetFBConfigAttrib`.
pub mod glx {
    pub const USE_GL: i32 = 0x0001;
    pub const LEVEL: i32 = 0x0003;
    pub const RGBA: i32 = 0x0004;
    pub const DOUBLEBUFFER: i32 = 0x0005;
    pub const STEREO: i32 = 0x0006;
    pub const RED_SIZE: i32 = 0x0008;
    pub const GREEN_SIZE: i32 = 0x0009;
    pub const BLUE_SIZE: i32 = 0x000a;
    pub const ALPHA_SIZE: i32 = 0x000b;
    pub const DEPTH_SIZE: i32 = 0x000c;
    pub const STENCIL_SIZE: i32 = 0x000d;
    pub const ACCUM_RED_SIZE: i32 = 0x000e;
    pub const ACCUM_GREEN_SIZE: i32 = 0x000f;
    pub const ACCUM_BLUE_SIZE: i32 = 0x0010;
    pub const ACCUM_ALPHA_SIZE: i32 = 0x0011;
    pub const CONFIG_CAVEAT: i32 = 0x0020;
    pub const DRAWABLE_TYPE: i32 = 0x8010;
    pub const RENDER_TYPE: i32 = 0x8011;
    pub const SAMPLES: i32 = 100_001;

    pub const SLOW_CONFIG: i32 = 0x8001;

    pub const WINDOW_BIT: i32 = 0x0001;
    pub const PIXMAP_BIT: i32 = 0x0002;
    pub const PBUFFER_BIT: i32 = 0x0004;

    pub const RGBA_BIT: i32 = 0x0001;
    pub const COLOR_INDEX_BIT: i32 = 0x0002;
    pub const RGBA_FLOAT_BIT_ARB: i32 = 0x0004;
}

/// Attribute names and values of WGL_ARB_pixel_format.
pub mod wgl {
    pub const DRAW_TO_WINDOW_ARB: i32 = 0x2001;
    pub const DRAW_TO_BITMAP_ARB: i32 = 0x2002;
    pub const ACCELERATION_ARB: i32 = 0x2003;
    pub const SUPPORT_OPENGL_ARB: i32 = 0x2010;
    pub const DOUBLE_BUFFER_ARB: i32 = 0x2011;
    pub const STEREO_ARB: i32 = 0x2012;
    pub const PIXEL_TYPE_ARB: i32 = 0x2013;
    pub const RED_BITS_ARB: i32 = 0x2015;
    pub const GREEN_BITS_ARB: i32 = 0x2017;
    pub const BLUE_BITS_ARB: i32 = 0x2019;
    pub const ALPHA_BITS_ARB: i32 = 0x201b;
    pub const ACCUM_RED_BITS_ARB: i32 = 0x201e;
    pub const ACCUM_GREEN_BITS_ARB: i32 = 0x201f;
    pub const ACCUM_BLUE_BITS_ARB: i32 = 0x2020;
    pub const ACCUM_ALPHA_BITS_ARB: i32 = 0x2021;
    pub const DEPTH_BITS_ARB: i32 = 0x2022;
    pub const STENCIL_BITS_ARB: i32 = 0x2023;
    pub const DRAW_TO_PBUFFER_ARB: i32 = 0x202d;
    pub const SAMPLES_ARB: i32 = 0x2042;

    pub const NO_ACCELERATION_ARB: i32 = 0x2025;
    pub const TYPE_RGBA_ARB: i32 = 0x202b;
    pub const TYPE_COLORINDEX_ARB: i32 = 0x202c;
    pub const TYPE_RGBA_FLOAT_ARB: i32 = 0x21a0;
}

/// `PIXELFORMATDESCRIPTOR` flag bits and pixel types.
pub mod pfd {
    pub const DOUBLEBUFFER: u32 = 0x0000_0001;
    pub const STEREO: u32 = 0x0000_0002;
    pub const DRAW_TO_WINDOW: u32 = 0x0000_0004;
    pub const DRAW_TO_BITMAP: u32 = 0x0000_0008;
    pub const SUPPORT_OPENGL: u32 = 0x0000_0020;
    pub const GENERIC_FORMAT: u32 = 0x0000_0040;
    pub const GENERIC_ACCELERATED: u32 = 0x0000_1000;

    pub const TYPE_RGBA: u8 = 0;
    pub const TYPE_COLORINDEX: u8 = 1;
}

/// The fields of a `PIXELFORMATDESCRIPTOR` used for matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub flags: u32,
    pub pixel_type: u8,
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub accum_red_bits: u8,
    pub accum_green_bits: u8,
    pub accum_blue_bits: u8,
    pub accum_alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    /// Overlay planes in the low nibble, underlay planes in the high nibble.
    pub reserved: u8,
}

/// One platform format as enumerated by a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeFormat {
    /// A legacy GLX visual.
    GlxVisual { id: FormatId, attributes: Vec<(i32, i32)> },
    /// A GLX 1.3 frame-buffer configuration.
    GlxFbConfig { id: FormatId, attributes: Vec<(i32, i32)> },
    /// A legacy Windows pixel format.
    PixelFormat { id: FormatId, descriptor: PixelFormatDescriptor },
    /// A pixel format described through WGL_ARB_pixel_format.
    WglArb { id: FormatId, attributes: Vec<(i32, i32)> },
    /// A format already described in platform-neutral terms.
    Generic(CandidateCapabilities),
}

impl NativeFormat {
    /// Returns the platform identifier.
    pub fn id(&self) -> FormatId {
        match self {
            Self::GlxVisual { id, .. }
            | Self::GlxFbConfig { id, .. }
            | Self::PixelFormat { id, .. }
            | Self::WglArb { id, .. } => *id,
            Self::Generic(capabilities) => capabilities.id,
        }
    }

    /// Normalizes the format, or returns `None` if it cannot render GL at all.
    pub fn capabilities(&self) -> Option<CandidateCapabilities> {
        match self {
            Self::GlxVisual { id, attributes } => from_glx_visual(*id, attributes),
            Self::GlxFbConfig { id, attributes } => from_glx_fbconfig(*id, attributes),
            Self::PixelFormat { id, descriptor } => from_pixel_format(*id, descriptor),
            Self::WglArb { id, attributes } => from_wgl_arb(*id, attributes),
            Self::Generic(capabilities) => Some(*capabilities),
        }
    }
}

fn attribute(attributes: &[(i32, i32)], name: i32) -> i32 {
    attributes
        .iter()
        .find(|(n, _)| *n == name)
        .map_or(0, |(_, v)| *v)
}

fn size(attributes: &[(i32, i32)], name: i32) -> u8 {
    u8::try_from(attribute(attributes, name).max(0)).unwrap_or(u8::MAX)
}

fn flag(attributes: &[(i32, i32)], name: i32) -> bool {
    attribute(attributes, name) != 0
}

/// Normalizes a legacy GLX visual.
pub fn from_glx_visual(id: FormatId, attributes: &[(i32, i32)]) -> Option<CandidateCapabilities> {
    if !flag(attributes, glx::USE_GL) {
        return None;
    }
    Some(CandidateCapabilities {
        id,
        red_size: size(attributes, glx::RED_SIZE),
        green_size: size(attributes, glx::GREEN_SIZE),
        blue_size: size(attributes, glx::BLUE_SIZE),
        alpha_size: size(attributes, glx::ALPHA_SIZE),
        depth_size: size(attributes, glx::DEPTH_SIZE),
        stencil_size: size(attributes, glx::STENCIL_SIZE),
        accum_red_size: size(attributes, glx::ACCUM_RED_SIZE),
        accum_green_size: size(attributes, glx::ACCUM_GREEN_SIZE),
        accum_blue_size: size(attributes, glx::ACCUM_BLUE_SIZE),
        accum_alpha_size: size(attributes, glx::ACCUM_ALPHA_SIZE),
        samples: size(attributes, glx::SAMPLES),
        double_buffer: flag(attributes, glx::DOUBLEBUFFER),
        stereo: flag(attributes, glx::STEREO),
        float_buffer: false,
        rgba: flag(attributes, glx::RGBA),
        level: attribute(attributes, glx::LEVEL),
        draw_targets: DrawTargets::WINDOW | DrawTargets::IMAGE,
        accelerated: attribute(attributes, glx::CONFIG_CAVEAT) != glx::SLOW_CONFIG,
    })
}

/// Normalizes a GLX 1.3 FB-config.
pub fn from_glx_fbconfig(id: FormatId, attributes: &[(i32, i32)]) -> Option<CandidateCapabilities> {
    let render_type = attribute(attributes, glx::RENDER_TYPE);
    let drawable_type = attribute(attributes, glx::DRAWABLE_TYPE);
    if render_type == 0 || drawable_type == 0 {
        return None;
    }

    let mut draw_targets = DrawTargets::empty();
    draw_targets.set(DrawTargets::WINDOW, drawable_type & glx::WINDOW_BIT != 0);
    draw_targets.set(DrawTargets::IMAGE, drawable_type & glx::PIXMAP_BIT != 0);
    draw_targets.set(DrawTargets::BUFFER, drawable_type & glx::PBUFFER_BIT != 0);

    Some(CandidateCapabilities {
        id,
        red_size: size(attributes, glx::RED_SIZE),
        green_size: size(attributes, glx::GREEN_SIZE),
        blue_size: size(attributes, glx::BLUE_SIZE),
        alpha_size: size(attributes, glx::ALPHA_SIZE),
        depth_size: size(attributes, glx::DEPTH_SIZE),
        stencil_size: size(attributes, glx::STENCIL_SIZE),
        accum_red_size: size(attributes, glx::ACCUM_RED_SIZE),
        accum_green_size: size(attributes, glx::ACCUM_GREEN_SIZE),
        accum_blue_size: size(attributes, glx::ACCUM_BLUE_SIZE),
        accum_alpha_size: size(attributes, glx::ACCUM_ALPHA_SIZE),
        samples: size(attributes, glx::SAMPLES),
        double_buffer: flag(attributes, glx::DOUBLEBUFFER),
        stereo: flag(attributes, glx::STEREO),
        float_buffer: render_type & glx::RGBA_FLOAT_BIT_ARB != 0,
        rgba: render_type & (glx::RGBA_BIT | glx::RGBA_FLOAT_BIT_ARB) != 0,
        level: attribute(attributes, glx::LEVEL),
        draw_targets,
        accelerated: attribute(attributes, glx::CONFIG_CAVEAT) != glx::SLOW_CONFIG,
    })
}

/// Normalizes a legacy Windows pixel format.
pub fn from_pixel_format(
    id: FormatId,
    descriptor: &PixelFormatDescriptor,
) -> Option<CandidateCapabilities> {
    let flags = descriptor.flags;
    if flags & pfd::SUPPORT_OPENGL == 0 {
        return None;
    }

    let mut draw_targets = DrawTargets::empty();
    draw_targets.set(DrawTargets::WINDOW, flags & pfd::DRAW_TO_WINDOW != 0);
    draw_targets.set(DrawTargets::IMAGE, flags & pfd::DRAW_TO_BITMAP != 0);

    let overlays = i32::from(descriptor.reserved & 0x0F);
    let underlays = i32::from(descriptor.reserved >> 4);
    let generic = flags & pfd::GENERIC_FORMAT != 0;

    Some(CandidateCapabilities {
        id,
        red_size: descriptor.red_bits,
        green_size: descriptor.green_bits,
        blue_size: descriptor.blue_bits,
        alpha_size: descriptor.alpha_bits,
        depth_size: descriptor.depth_bits,
        stencil_size: descriptor.stencil_bits,
        accum_red_size: descriptor.accum_red_bits,
        accum_green_size: descriptor.accum_green_bits,
        accum_blue_size: descriptor.accum_blue_bits,
        accum_alpha_size: descriptor.accum_alpha_bits,
        samples: 0,
        double_buffer: flags & pfd::DOUBLEBUFFER != 0,
        stereo: flags & pfd::STEREO != 0,
        float_buffer: false,
        rgba: descriptor.pixel_type == pfd::TYPE_RGBA,
        level: if overlays > 0 { overlays } else { -underlays },
        draw_targets,
        accelerated: !generic || flags & pfd::GENERIC_ACCELERATED != 0,
    })
}

/// Normalizes a pixel format described by WGL_ARB_pixel_format.
pub fn from_wgl_arb(id: FormatId, attributes: &[(i32, i32)]) -> Option<CandidateCapabilities> {
    if !flag(attributes, wgl::SUPPORT_OPENGL_ARB) {
        return None;
    }

    let mut draw_targets = DrawTargets::empty();
    draw_targets.set(DrawTargets::WINDOW, flag(attributes, wgl::DRAW_TO_WINDOW_ARB));
    draw_targets.set(DrawTargets::IMAGE, flag(attributes, wgl::DRAW_TO_BITMAP_ARB));
    draw_targets.set(DrawTargets::BUFFER, flag(attributes, wgl::DRAW_TO_PBUFFER_ARB));

    let pixel_type = attribute(attributes, wgl::PIXEL_TYPE_ARB);

    Some(CandidateCapabilities {
        id,
        red_size: size(attributes, wgl::RED_BITS_ARB),
        green_size: size(attributes, wgl::GREEN_BITS_ARB),
        blue_size: size(attributes, wgl::BLUE_BITS_ARB),
        alpha_size: size(attributes, wgl::ALPHA_BITS_ARB),
        depth_size: size(attributes, wgl::DEPTH_BITS_ARB),
        stencil_size: size(attributes, wgl::STENCIL_BITS_ARB),
        accum_red_size: size(attributes, wgl::ACCUM_RED_BITS_ARB),
        accum_green_size: size(attributes, wgl::ACCUM_GREEN_BITS_ARB),
        accum_blue_size: size(attributes, wgl::ACCUM_BLUE_BITS_ARB),
        accum_alpha_size: size(attributes, wgl::ACCUM_ALPHA_BITS_ARB),
        samples: size(attributes, wgl::SAMPLES_ARB),
        double_buffer: flag(attributes, wgl::DOUBLE_BUFFER_ARB),
        stereo: flag(attributes, wgl::STEREO_ARB),
        float_buffer: pixel_type == wgl::TYPE_RGBA_FLOAT_ARB,
        rgba: pixel_type == wgl::TYPE_RGBA_ARB || pixel_type == wgl::TYPE_RGBA_FLOAT_ARB,
        level: 0,
        draw_targets,
        accelerated: attribute(attributes, wgl::ACCELERATION_ARB) != wgl::NO_ACCELERATION_ARB,
    })
}
