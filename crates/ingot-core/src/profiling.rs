//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled, the scope macros expand to nothing
//! so call sites never need their own `cfg` attributes.

#[cfg(feature = "profiling")]
pub use puffin::{profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
pub use crate::{noop_profile_function as profile_function, noop_profile_scope as profile_scope};

#[cfg(not(feature = "profiling"))]
#[doc(hidden)]
#[macro_export]
macro_rules! noop_profile_function {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
#[doc(hidden)]
#[macro_export]
macro_rules! noop_profile_scope {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "profiling")]
mod server {
    use std::sync::OnceLock;

    /// Global profiling server instance.
    static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

    /// Enable puffin scopes and serve them on `addr` for `puffin_viewer`.
    ///
    /// # Example
    /// ```no_run
    /// ingot_core::profiling::init_profiling("0.0.0.0:8585");
    /// ```
    pub fn init_profiling(addr: &str) {
        puffin::set_scopes_on(true);

        match puffin_http::Server::new(addr) {
            Ok(server) => {
                tracing::info!("Puffin profiler server started on http://{}", addr);
                let _ = PROFILING_SERVER.set(server);
            }
            Err(e) => {
                tracing::error!("Failed to start puffin server: {}", e);
            }
        }
    }

    /// Mark a frame boundary. Hosts polling hot reload call this once per tick.
    #[inline]
    pub fn new_frame() {
        puffin::GlobalProfiler::lock().new_frame();
    }
}

#[cfg(feature = "profiling")]
pub use server::{init_profiling, new_frame};

#[cfg(not(feature = "profiling"))]
pub fn init_profiling(_addr: &str) {
    tracing::debug!("Profiling requested but the `profiling` feature is disabled");
}

#[cfg(not(feature = "profiling"))]
#[inline]
pub fn new_frame() {}
