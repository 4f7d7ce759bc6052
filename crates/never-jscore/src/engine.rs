//! Engine surface selection and process-wide initialization

use never_jscore_sys::EngineSurface;
use std::fmt;
use std::sync::Once;
use tracing::debug;

use crate::context::Context;
use crate::error::JsCoreResult;
use crate::options::ContextOptions;

/// One engine surface paired with its one-time initialization guard.
///
/// Engines live for the whole process. Declare custom ones as statics:
///
/// ```ignore
/// use never_jscore::{ContextOptions, Engine};
///
/// // MY_SURFACE: a `static EngineSurface` filled with another engine's exports
/// static ENGINE: Engine = Engine::new(&MY_SURFACE);
///
/// let ctx = ENGINE.new_context(ContextOptions::default())?;
/// ```
///
/// # Thread Safety
///
/// `Engine` is `Sync`; initialization may race from many threads and still
/// reaches the engine exactly once. Contexts created from it are not `Send`.
pub struct Engine {
    surface: &'static EngineSurface,
    init: Once,
}

impl Engine {
    pub const fn new(surface: &'static EngineSurface) -> Self {
        Self {
            surface,
            init: Once::new(),
        }
    }

    /// The Boa-backed engine compiled into this binary
    #[cfg(feature = "bundled")]
    pub fn bundled() -> &'static Engine {
        use std::sync::OnceLock;

        static BUNDLED: OnceLock<Engine> = OnceLock::new();
        BUNDLED.get_or_init(|| Engine::new(never_jscore_engine::surface()))
    }

    /// The externally linked `libnever_jscore`
    #[cfg(feature = "linked")]
    pub fn linked() -> &'static Engine {
        static LINKED: Engine = Engine::new(&never_jscore_sys::LINKED_SURFACE);
        &LINKED
    }

    /// Engine used by [`Context::new`] and [`crate::init`]
    #[cfg(any(feature = "bundled", feature = "linked"))]
    pub fn global() -> &'static Engine {
        #[cfg(feature = "bundled")]
        {
            Self::bundled()
        }
        #[cfg(not(feature = "bundled"))]
        {
            Self::linked()
        }
    }

    /// Run the surface's global initialization. Later calls are no-ops.
    pub fn init(&self) {
        self.init.call_once(|| {
            debug!("initializing engine surface");
            // SAFETY: init takes no arguments and is called exactly once here
            unsafe { (self.surface.init)() };
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.init.is_completed()
    }

    pub fn surface(&self) -> &'static EngineSurface {
        self.surface
    }

    /// Create a context on this engine, initializing it first if needed
    pub fn new_context(&'static self, options: ContextOptions) -> JsCoreResult<Context> {
        Context::with_engine(self, options)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
