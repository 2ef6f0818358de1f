//! OpenGL framebuffer negotiation for Horizon Lattice.
//!
//! This crate chooses the framebuffer configuration an OpenGL window or
//! context is created with. The caller describes what it would like in a
//! [`GlConfig`]; the display reports what it has through a [`GlBackend`]; a
//! weighted penalty score picks the closest match, which is then reported
//! back as the *actual* configuration.
//!
//! # Matching
//!
//! Platform formats come in four flavors (legacy GLX visuals, GLX 1.3
//! FB-configs, Windows pixel format descriptors and WGL_ARB attribute
//! queries). The [`adapters`] module normalizes each of them into a
//! [`CandidateCapabilities`] record, and [`score`] ranks those records.
//! Asking for more than a display can give never fails: the closest
//! configuration is used instead. Only a display without any RGBA main-plane
//! configuration makes negotiation fail.
//!
//! # Contexts
//!
//! [`GlVisual`] selects among legacy visuals for window creation.
//! [`GlContext`] selects among frame-buffer configurations, falling back to
//! legacy visuals on displays without them, then creates a context, binds
//! it to [`GlSurface`]s and presents their back buffers.
//!
//! ```no_run
//! use std::sync::Arc;
//! use horizon_lattice_gl::{DisplayConnection, GlConfig, GlContext};
//!
//! # fn example(display: Arc<DisplayConnection>) -> horizon_lattice_gl::GlResult<()> {
//! let desired = GlConfig::default().with_stencil(8).with_samples(4);
//! let mut context = GlContext::new(display, desired, None);
//! context.create()?;
//!
//! let actual = context.actual();
//! println!("got {} depth bits, {} samples", actual.depth_size, actual.multi_samples);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
mod capabilities;
mod config;
mod context;
mod display;
mod error;
pub mod score;
mod visual;

pub use adapters::{NativeFormat, PixelFormatDescriptor};
pub use capabilities::{CandidateCapabilities, DrawTargets, FormatId};
pub use config::{GlConfig, GlFlags};
pub use context::{GlContext, GlSurface};
pub use display::{ContextHandle, DisplayConnection, ExtensionInfo, GlBackend, ServerInfo, SurfaceId};
pub use error::{GlError, GlResult};
pub use visual::GlVisual;
