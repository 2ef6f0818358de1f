//! Display connections and the platform GL backend.
//!
//! The windowing layer implements [`GlBackend`] on top of GLX or WGL and wraps
//! it in a [`DisplayConnection`]. Everything that is per-display rather than
//! per-context lives in the connection: the parsed extension string and
//! version, which are queried once and then cached, and the open/closed state.
//!
//! Calling [`DisplayConnection::teardown`] drops the cache and closes the
//! connection. Contexts created on it then forget their handles instead of
//! releasing them, since the platform has already done so.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::adapters::NativeFormat;
use crate::capabilities::{CandidateCapabilities, FormatId};
use crate::error::{GlError, GlResult};

/// Platform handle of a created GL context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub u64);

/// Platform handle of a drawable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// GL implementation details reported by a display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// GLX or WGL version as `(major, minor)`.
    pub version: (u32, u32),
    /// Space-separated extension names.
    pub extensions: String,
}

/// The GL entry points of one windowing system.
pub trait GlBackend: Send + Sync {
    /// Queries version and extensions of the display.
    fn server_info(&self) -> GlResult<ServerInfo>;

    /// Returns the format the display uses by default, if any.
    fn default_format(&self) -> Option<FormatId>;

    /// Enumerates legacy visuals or pixel formats.
    fn visuals(&self) -> GlResult<Vec<NativeFormat>>;

    /// Enumerates frame-buffer configurations.
    ///
    /// Only called when [`ExtensionInfo::has_fb_configs`] holds.
    fn fb_configs(&self) -> GlResult<Vec<NativeFormat>>;

    /// Creates a context for `format`, sharing objects with `share`.
    fn create_context(
        &self,
        format: FormatId,
        share: Option<ContextHandle>,
        direct: bool,
    ) -> GlResult<ContextHandle>;

    /// Destroys a context.
    fn destroy_context(&self, context: ContextHandle);

    /// Makes `context` current on `surface`, or releases the current context
    /// when both are `None`. Returns false if the platform refused.
    fn make_current(&self, context: Option<ContextHandle>, surface: Option<SurfaceId>) -> bool;

    /// Presents the back buffer of `surface`.
    fn swap_buffers(&self, surface: SurfaceId);
}

/// Parsed extension information of a display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionInfo {
    version: (u32, u32),
    extensions: BTreeSet<String>,
}

impl ExtensionInfo {
    /// Parses a server report.
    pub fn parse(info: &ServerInfo) -> Self {
        Self {
            version: info.version,
            extensions: info.extensions.split_whitespace().map(str::to_owned).collect(),
        }
    }

    /// Returns the GLX or WGL version.
    pub fn version(&self) -> (u32, u32) {
        self.version
    }

    /// Returns true if the named extension is present.
    pub fn has(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Returns true if frame-buffer configurations can be enumerated.
    pub fn has_fb_configs(&self) -> bool {
        self.version >= (1, 3)
            || self.has("GLX_SGIX_fbconfig")
            || self.has("WGL_ARB_pixel_format")
    }

    /// Returns true if formats may report sample counts.
    pub fn has_multisample(&self) -> bool {
        self.has("GLX_ARB_multisample") || self.has("WGL_ARB_multisample")
    }
}

/// A connection to one display, shared by all visuals and contexts on it.
pub struct DisplayConnection {
    backend: Box<dyn GlBackend>,
    extensions: Mutex<Option<Arc<ExtensionInfo>>>,
    open: AtomicBool,
}

impl DisplayConnection {
    /// Wraps a backend.
    pub fn new(backend: impl GlBackend + 'static) -> Arc<Self> {
        Arc::new(Self {
            backend: Box::new(backend),
            extensions: Mutex::new(None),
            open: AtomicBool::new(true),
        })
    }

    /// Returns the backend.
    pub fn backend(&self) -> &dyn GlBackend {
        self.backend.as_ref()
    }

    /// Returns true until [`teardown`](Self::teardown) is called.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Returns the extension information, querying it on first use.
    pub fn extensions(&self) -> GlResult<Arc<ExtensionInfo>> {
        if !self.is_open() {
            return Err(GlError::DisplayClosed);
        }
        let mut cache = self.extensions.lock();
        if let Some(info) = cache.as_ref() {
            return Ok(Arc::clone(info));
        }
        let info = Arc::new(ExtensionInfo::parse(&self.backend.server_info()?));
        debug!(
            target: "horizon_lattice_gl::display",
            version = ?info.version(),
            fb_configs = info.has_fb_configs(),
            multisample = info.has_multisample(),
            "queried GL extensions"
        );
        *cache = Some(Arc::clone(&info));
        Ok(info)
    }

    /// Drops cached extension information and closes the connection.
    pub fn teardown(&self) {
        self.open.store(false, Ordering::Release);
        self.extensions.lock().take();
        debug!(target: "horizon_lattice_gl::display", "display connection torn down");
    }

    /// Enumerates legacy visuals in normalized form.
    pub fn legacy_candidates(&self) -> GlResult<Vec<CandidateCapabilities>> {
        let info = self.extensions()?;
        Ok(normalize(self.backend.visuals()?, &info))
    }

    /// Enumerates frame-buffer configurations in normalized form, falling
    /// back to legacy visuals when the display has none.
    pub fn candidates(&self) -> GlResult<Vec<CandidateCapabilities>> {
        let info = self.extensions()?;
        let formats = if info.has_fb_configs() {
            self.backend.fb_configs()?
        } else {
            debug!(
                target: "horizon_lattice_gl::display",
                "frame-buffer configurations unavailable, using visuals"
            );
            self.backend.visuals()?
        };
        Ok(normalize(formats, &info))
    }
}

fn normalize(formats: Vec<NativeFormat>, info: &ExtensionInfo) -> Vec<CandidateCapabilities> {
    let multisample = info.has_multisample();
    formats
        .iter()
        .filter_map(|format| {
            let capabilities = format.capabilities();
            if capabilities.is_none() {
                debug!(
                    target: "horizon_lattice_gl::display",
                    id = %format.id(),
                    "format without GL support skipped"
                );
            }
            capabilities
        })
        .map(|mut capabilities| {
            if !multisample {
                capabilities.samples = 0;
            }
            capabilities
        })
        .collect()
}

impl fmt::Debug for DisplayConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayConnection")
            .field("open", &self.is_open())
            .field("extensions", &*self.extensions.lock())
            .finish_non_exhaustive()
    }
}
