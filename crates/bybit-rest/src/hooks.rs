//! Observability hooks for request/response monitoring
//!
//! Hooks let callers inspect every request the client sends and every
//! response it receives, without the client writing dumps anywhere itself.
//! Useful for audit logs, metrics, and debugging signature rejections.
//!
//! # Example
//!
//! ```
//! use bybit_rest::hooks::Hooks;
//!
//! let hooks = Hooks::new()
//!     .on_request(|request| {
//!         println!("-> {} {}", request.method, request.url);
//!     })
//!     .on_response(|request, response, elapsed| {
//!         println!("<- {} {} in {:?}", response.status, request.url, elapsed);
//!     })
//!     .on_error(|msg| {
//!         eprintln!("request failed: {}", msg);
//!     });
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::transport::{HttpRequest, HttpResponse};

/// Callback for outgoing requests
pub type RequestHook = Arc<dyn Fn(&HttpRequest) + Send + Sync>;
/// Callback for received responses, with the round-trip time
pub type ResponseHook = Arc<dyn Fn(&HttpRequest, &HttpResponse, Duration) + Send + Sync>;
/// Callback for failed requests
pub type ErrorHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Observability hooks container
///
/// All hooks are optional and executed synchronously on the calling task.
/// Keep them fast.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Called with each request just before it is sent
    pub(crate) on_request: Option<RequestHook>,
    /// Called with each response, including non-2xx ones
    pub(crate) on_response: Option<ResponseHook>,
    /// Called when a request fails (with error message)
    pub(crate) on_error: Option<ErrorHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_request", &self.on_request.as_ref().map(|_| "..."))
            .field("on_response", &self.on_response.as_ref().map(|_| "..."))
            .field("on_error", &self.on_error.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Hooks {
    /// Create a new empty hooks container
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for outgoing requests
    ///
    /// The request carries the signed headers; treat it as sensitive.
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&HttpRequest) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(f));
        self
    }

    /// Register a callback for received responses
    ///
    /// Called with the originating request, the response and the round-trip time.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&HttpRequest, &HttpResponse, Duration) + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(f));
        self
    }

    /// Register a callback for failures
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn invoke_request(&self, request: &HttpRequest) {
        if let Some(ref hook) = self.on_request {
            hook(request);
        }
    }

    pub(crate) fn invoke_response(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
        elapsed: Duration,
    ) {
        if let Some(ref hook) = self.on_response {
            hook(request, response, elapsed);
        }
    }

    pub(crate) fn invoke_error(&self, msg: &str) {
        if let Some(ref hook) = self.on_error {
            hook(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Method;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_hooks_builder() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let hooks = Hooks::new().on_request(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        hooks.invoke_request(&HttpRequest::new(Method::Get, "https://mock.test"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hooks_clone() {
        let hooks = Hooks::new().on_request(|_| {}).on_error(|_| {});

        let cloned = hooks.clone();
        assert!(cloned.on_request.is_some());
        assert!(cloned.on_response.is_none());
        assert!(cloned.on_error.is_some());
    }

    #[test]
    fn test_hooks_default() {
        let hooks = Hooks::default();
        // Should not panic when invoking empty hooks
        let request = HttpRequest::new(Method::Get, "https://mock.test");
        hooks.invoke_request(&request);
        hooks.invoke_response(&request, &HttpResponse::new(200, Vec::new()), Duration::ZERO);
        hooks.invoke_error("boom");
    }

    #[test]
    fn test_debug_hides_closures() {
        let hooks = Hooks::new().on_error(|_| {});
        let debug = format!("{:?}", hooks);
        assert!(debug.contains("on_error: Some(\"...\")"));
        assert!(debug.contains("on_request: None"));
    }
}
