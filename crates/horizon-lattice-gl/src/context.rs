//! GL contexts negotiated from frame-buffer configurations.
//!
//! A [`GlContext`] goes through three steps:
//!
//! 1. Construction records the desired [`GlConfig`] and, optionally, another
//!    context whose textures and display lists it will share.
//! 2. [`GlContext::create`] ranks the display's frame-buffer configurations
//!    (or legacy visuals where those are unavailable) and creates the
//!    platform context on the winner.
//! 3. [`GlContext::begin`] and [`GlContext::end`] bind the context to a
//!    [`GlSurface`] for rendering.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use horizon_lattice_gl::{DisplayConnection, GlConfig, GlContext, GlSurface, SurfaceId};
//!
//! # fn example(display: Arc<DisplayConnection>) -> horizon_lattice_gl::GlResult<()> {
//! let mut main = GlContext::new(Arc::clone(&display), GlConfig::default(), None);
//! main.create()?;
//!
//! // Shares textures with `main`.
//! let mut tool = GlContext::new(Arc::clone(&display), GlConfig::default(), Some(&main));
//! tool.create()?;
//!
//! let surface = GlSurface::new(SurfaceId(0x3a00007));
//! if main.begin(&surface) {
//!     // ... draw ...
//!     main.swap_buffers();
//!     main.end();
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::capabilities::FormatId;
use crate::config::GlConfig;
use crate::display::{ContextHandle, DisplayConnection, SurfaceId};
use crate::error::{GlError, GlResult};
use crate::score;

/// A drawable surface owned by the windowing layer.
///
/// Contexts refer to surfaces weakly, so a surface may be dropped or
/// invalidated at any time; the next bind then fails.
#[derive(Debug)]
pub struct GlSurface {
    id: SurfaceId,
    valid: AtomicBool,
}

impl GlSurface {
    /// Wraps a platform drawable.
    pub fn new(id: SurfaceId) -> Arc<Self> {
        Arc::new(Self {
            id,
            valid: AtomicBool::new(true),
        })
    }

    /// Returns the platform drawable.
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Returns false once the platform drawable is gone.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Marks the platform drawable as destroyed.
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }
}

/// The platform handle of a context, readable by contexts sharing with it.
type HandleCell = Arc<RwLock<Option<ContextHandle>>>;

/// A negotiated GL context.
#[derive(Debug)]
pub struct GlContext {
    display: Arc<DisplayConnection>,
    desired: GlConfig,
    actual: GlConfig,
    format: Option<FormatId>,
    handle: HandleCell,
    shared: Option<HandleCell>,
    bound: Option<Weak<GlSurface>>,
}

impl GlContext {
    /// Creates an unrealized context.
    ///
    /// When `shared` is given, GL objects are shared with that context. It
    /// must be created before this one; destroying either leaves the other
    /// intact.
    pub fn new(display: Arc<DisplayConnection>, desired: GlConfig, shared: Option<&GlContext>) -> Self {
        Self {
            display,
            desired,
            actual: GlConfig::EMPTY,
            format: None,
            handle: Arc::new(RwLock::new(None)),
            shared: shared.map(|context| Arc::clone(&context.handle)),
            bound: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the display this context belongs to.
    pub fn display(&self) -> &Arc<DisplayConnection> {
        &self.display
    }

    /// Returns the requested configuration.
    pub fn desired(&self) -> &GlConfig {
        &self.desired
    }

    /// Changes the requested configuration before creation.
    pub fn set_desired(&mut self, desired: GlConfig) -> GlResult<()> {
        if self.is_realized() {
            return Err(GlError::AlreadyRealized);
        }
        self.desired = desired;
        Ok(())
    }

    /// Returns the configuration actually obtained; all zero before creation.
    pub fn actual(&self) -> &GlConfig {
        &self.actual
    }

    /// Returns the selected frame-buffer configuration.
    pub fn format(&self) -> Option<FormatId> {
        self.format
    }

    /// Returns the platform context.
    pub fn handle(&self) -> Option<ContextHandle> {
        *self.handle.read()
    }

    /// Returns true once the platform context exists.
    pub fn is_realized(&self) -> bool {
        self.handle.read().is_some()
    }

    /// Returns true if objects are shared with another context.
    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Returns true while bound to a surface.
    pub fn is_current(&self) -> bool {
        self.bound.is_some()
    }

    /// Returns the bound surface, if it still exists.
    pub fn surface(&self) -> Option<Arc<GlSurface>> {
        self.bound.as_ref().and_then(Weak::upgrade)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Negotiates a configuration and creates the platform context.
    ///
    /// Does nothing if already created.
    ///
    /// # Errors
    ///
    /// - [`GlError::SharedContextNotRealized`] if the shared context has not
    ///   been created.
    /// - [`GlError::NoMatchingConfig`] if no configuration passes the hard
    ///   filters.
    /// - Any error of the backend or a closed display.
    pub fn create(&mut self) -> GlResult<()> {
        if self.is_realized() {
            return Ok(());
        }

        let share = match &self.shared {
            Some(cell) => Some((*cell.read()).ok_or(GlError::SharedContextNotRealized)?),
            None => None,
        };

        let candidates = self.display.candidates()?;
        let default_format = self.display.backend().default_format();
        let best = score::select_required(&self.desired, &candidates, default_format)?;

        let direct = self.desired.direct();
        let handle = self.display.backend().create_context(best.id, share, direct)?;

        self.actual = best.to_config(direct);
        self.format = Some(best.id);
        *self.handle.write() = Some(handle);
        info!(
            target: "horizon_lattice_gl::context",
            id = %best.id,
            penalty = score::score(&self.desired, best),
            candidates = candidates.len(),
            shared = share.is_some(),
            "created GL context"
        );
        Ok(())
    }

    /// Forgets the platform context without releasing it.
    ///
    /// Used when the display connection has already released it.
    pub fn detach(&mut self) {
        if self.handle.write().take().is_some() {
            debug!(target: "horizon_lattice_gl::context", "GL context detached");
        }
        self.format = None;
        self.bound = None;
    }

    /// Releases the platform context. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if !self.display.is_open() {
            self.detach();
            return;
        }
        let Some(handle) = self.handle.write().take() else {
            return;
        };
        if self.bound.take().is_some() {
            self.display.backend().make_current(None, None);
        }
        self.display.backend().destroy_context(handle);
        self.format = None;
        debug!(target: "horizon_lattice_gl::context", "GL context destroyed");
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Makes this context current on `surface`.
    ///
    /// A context bound to another surface is released first. Returns false if
    /// the context is not created, the surface is gone, or the platform
    /// refuses the bind; the caller may try again later.
    pub fn begin(&mut self, surface: &Arc<GlSurface>) -> bool {
        let Some(handle) = self.handle() else {
            warn!(target: "horizon_lattice_gl::context", "begin on unrealized GL context");
            return false;
        };

        if let Some(current) = self.surface() {
            if Arc::ptr_eq(&current, surface) && surface.is_valid() {
                return true;
            }
        }
        if self.bound.is_some() {
            self.end();
        }

        if !self.display.is_open() || !surface.is_valid() {
            warn!(
                target: "horizon_lattice_gl::context",
                surface = surface.id().0,
                "GL surface no longer exists"
            );
            return false;
        }
        if !self.display.backend().make_current(Some(handle), Some(surface.id())) {
            warn!(
                target: "horizon_lattice_gl::context",
                surface = surface.id().0,
                "failed to make GL context current"
            );
            return false;
        }
        self.bound = Some(Arc::downgrade(surface));
        true
    }

    /// Releases this context from its surface.
    ///
    /// Returns false if nothing was bound or the platform refused.
    pub fn end(&mut self) -> bool {
        if self.bound.take().is_none() {
            return false;
        }
        if !self.display.is_open() {
            return false;
        }
        let released = self.display.backend().make_current(None, None);
        if !released {
            warn!(target: "horizon_lattice_gl::context", "failed to release GL context");
        }
        released
    }

    /// Presents the back buffer of the bound surface.
    ///
    /// Does nothing for single buffered contexts or without a live surface.
    pub fn swap_buffers(&self) {
        if !self.actual.double_buffer() || !self.display.is_open() {
            return;
        }
        if let Some(surface) = self.surface().filter(|s| s.is_valid()) {
            self.display.backend().swap_buffers(surface.id());
        }
    }
}

impl Drop for GlContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
