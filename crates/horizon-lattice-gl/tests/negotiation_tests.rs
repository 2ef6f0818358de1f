//! End-to-end negotiation tests against an in-memory display.

use std::sync::Arc;

use horizon_lattice_gl::adapters::{glx, pfd, wgl};
use horizon_lattice_gl::score::{score, select};
use horizon_lattice_gl::{
    CandidateCapabilities, ContextHandle, DisplayConnection, DrawTargets, FormatId, GlBackend,
    GlConfig, GlContext, GlError, GlFlags, GlResult, GlVisual, NativeFormat, PixelFormatDescriptor,
    ServerInfo, SurfaceId,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A display with a fixed list of formats.
struct FakeDisplay {
    version: (u32, u32),
    extensions: &'static str,
    formats: Vec<NativeFormat>,
    default: Option<FormatId>,
}

impl FakeDisplay {
    fn modern(formats: Vec<NativeFormat>) -> Self {
        Self {
            version: (1, 4),
            extensions: "GLX_ARB_multisample",
            formats,
            default: None,
        }
    }
}

impl GlBackend for FakeDisplay {
    fn server_info(&self) -> GlResult<ServerInfo> {
        Ok(ServerInfo {
            version: self.version,
            extensions: self.extensions.to_owned(),
        })
    }

    fn default_format(&self) -> Option<FormatId> {
        self.default
    }

    fn visuals(&self) -> GlResult<Vec<NativeFormat>> {
        Ok(self.formats.clone())
    }

    fn fb_configs(&self) -> GlResult<Vec<NativeFormat>> {
        Ok(self.formats.clone())
    }

    fn create_context(
        &self,
        format: FormatId,
        _share: Option<ContextHandle>,
        _direct: bool,
    ) -> GlResult<ContextHandle> {
        Ok(ContextHandle(format.0 + 1000))
    }

    fn destroy_context(&self, _context: ContextHandle) {}

    fn make_current(&self, _context: Option<ContextHandle>, _surface: Option<SurfaceId>) -> bool {
        true
    }

    fn swap_buffers(&self, _surface: SurfaceId) {}
}

fn candidate(id: u64) -> CandidateCapabilities {
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
fn test_fewer_bits_score_worse_than_more() {
    let desired = GlConfig::default();
    let mut fewer = candidate(1);
    fewer.red_size = 4;
    let mut more = candidate(2);
    more.red_size = 12;

    assert!(score(&desired, &fewer) > score(&desired, &more));
}

#[test]
fn test_missing_depth_dominates_everything_else() {
    let desired = GlConfig::default()
        .with_alpha(8)
        .with_stencil(8)
        .with_samples(8)
        .with_accum(16, 16, 16, 16)
        .with_flags(GlFlags::DOUBLE_BUFFER | GlFlags::DRAW_WINDOW);

    let mut no_depth = candidate(1);
    no_depth.red_size = 8;
    no_depth.alpha_size = 8;
    no_depth.stencil_size = 8;
    no_depth.samples = 8;
    no_depth.accum_red_size = 16;
    no_depth.accum_green_size = 16;
    no_depth.accum_blue_size = 16;
    no_depth.accum_alpha_size = 16;
    no_depth.depth_size = 0;

    let mut awful = CandidateCapabilities::new(FormatId(2));
    awful.depth_size = 1;
    awful.stereo = true;
    awful.float_buffer = true;
    awful.accelerated = false;

    assert!(score(&desired, &no_depth) > score(&desired, &awful));
    assert_eq!(
        select(&desired, &[no_depth, awful], None).map(|c| c.id),
        Some(FormatId(2))
    );
}

#[test]
fn test_equal_scores_prefer_default_format() {
    init_logging();
    let formats = vec![
        NativeFormat::Generic(candidate(0x20)),
        NativeFormat::Generic(candidate(0x21)),
    ];
    let display = DisplayConnection::new(FakeDisplay {
        default: Some(FormatId(0x21)),
        ..FakeDisplay::modern(formats)
    });

    let mut context = GlContext::new(display, GlConfig::default(), None);
    context.create().unwrap();
    assert_eq!(context.format(), Some(FormatId(0x21)));
}

#[test]
fn test_sole_software_candidate_is_still_chosen() {
    init_logging();
    let mut only = CandidateCapabilities::new(FormatId(9));
    only.red_size = 8;
    only.green_size = 8;
    only.blue_size = 8;
    only.depth_size = 0;
    only.double_buffer = false;
    only.accelerated = false;
    let display = DisplayConnection::new(FakeDisplay::modern(vec![NativeFormat::Generic(only)]));

    let desired = GlConfig::default().with_depth(24);
    assert!(desired.double_buffer());

    let mut context = GlContext::new(display, desired, None);
    context.create().unwrap();
    assert_eq!(context.format(), Some(FormatId(9)));
    assert_eq!(context.actual().depth_size, 0);
    assert!(!context.actual().double_buffer());
}

#[test]
fn test_no_rgba_main_plane_format_fails() {
    init_logging();
    let mut overlay = candidate(1);
    overlay.level = 1;
    let mut index = candidate(2);
    index.rgba = false;
    let display = DisplayConnection::new(FakeDisplay::modern(vec![
        NativeFormat::Generic(overlay),
        NativeFormat::Generic(index),
    ]));

    let mut context = GlContext::new(display, GlConfig::default(), None);
    let err = context.create().unwrap_err();
    assert!(matches!(err, GlError::NoMatchingConfig { candidates: 2 }));
    assert!(err.is_unavailable());
    assert!(!context.is_realized());
}

#[test]
fn test_legacy_glx_display() {
    init_logging();
    let visual = |id: u64, depth: i32, stencil: i32| NativeFormat::GlxVisual {
        id: FormatId(id),
        attributes: vec![
            (glx::USE_GL, 1),
            (glx::RGBA, 1),
            (glx::DOUBLEBUFFER, 1),
            (glx::RED_SIZE, 8),
            (glx::GREEN_SIZE, 8),
            (glx::BLUE_SIZE, 8),
            (glx::DEPTH_SIZE, depth),
            (glx::STENCIL_SIZE, stencil),
            (glx::SAMPLES, 4),
        ],
    };
    let display = DisplayConnection::new(FakeDisplay {
        version: (1, 2),
        extensions: "GLX_EXT_visual_info",
        formats: vec![visual(0x21, 16, 0), visual(0x22, 24, 8)],
        default: None,
    });

    let desired = GlConfig::default().with_stencil(8).with_samples(4);
    let mut gl_visual = GlVisual::new(Arc::clone(&display), desired);
    gl_visual.create().unwrap();
    assert_eq!(gl_visual.format(), Some(FormatId(0x22)));
    // Without the multisample extension sample counts are not trusted.
    assert_eq!(gl_visual.actual().multi_samples, 0);

    let mut context = GlContext::new(display, desired, None);
    context.create().unwrap();
    assert_eq!(context.format(), Some(FormatId(0x22)));
}

#[test]
fn test_windows_formats() {
    init_logging();
    let generic = NativeFormat::PixelFormat {
        id: FormatId(1),
        descriptor: PixelFormatDescriptor {
            flags: pfd::SUPPORT_OPENGL | pfd::DRAW_TO_WINDOW | pfd::DOUBLEBUFFER | pfd::GENERIC_FORMAT,
            pixel_type: pfd::TYPE_RGBA,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            depth_bits: 24,
            ..Default::default()
        },
    };
    let icd = NativeFormat::WglArb {
        id: FormatId(2),
        attributes: vec![
            (wgl::SUPPORT_OPENGL_ARB, 1),
            (wgl::DRAW_TO_WINDOW_ARB, 1),
            (wgl::DOUBLE_BUFFER_ARB, 1),
            (wgl::PIXEL_TYPE_ARB, wgl::TYPE_RGBA_ARB),
            (wgl::ACCELERATION_ARB, 0x2027),
            (wgl::RED_BITS_ARB, 8),
            (wgl::GREEN_BITS_ARB, 8),
            (wgl::BLUE_BITS_ARB, 8),
            (wgl::DEPTH_BITS_ARB, 24),
        ],
    };
    let display = DisplayConnection::new(FakeDisplay {
        version: (1, 0),
        extensions: "WGL_ARB_pixel_format WGL_ARB_multisample",
        formats: vec![generic, icd],
        default: None,
    });

    let mut context = GlContext::new(Arc::clone(&display), GlConfig::default(), None);
    context.create().unwrap();
    assert_eq!(context.format(), Some(FormatId(2)));

    let software_only = GlConfig::default().with_flag(GlFlags::NO_ACCEL, true);
    let mut context = GlContext::new(display, software_only, None);
    context.create().unwrap();
    assert_eq!(context.format(), Some(FormatId(1)));
}

#[test]
fn test_config_stream_round_trip() {
    let config = GlConfig::default()
        .with_alpha(8)
        .with_stencil(8)
        .with_flag(GlFlags::DRAW_IMAGE, true);
    let mut bytes = Vec::new();
    config.save_to(&mut bytes).unwrap();
    assert_eq!(GlConfig::load_from(bytes.as_slice()).unwrap(), config);
}
