//! Dispatcher core - registration, the dispatch pipeline and the listener.

use http::Method;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::io;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::handler::{
    Handler, HandlerResponse, HandlerResult, Resource, ResourceMethod, StaticHandler,
    StaticServe, STATIC_CAPTURE,
};
use crate::config::AppConfig;
use crate::context::{Request, RequestContext};
use crate::error::{HandlerError, MatchError, RouteError};
use crate::hooks::{BeforeHook, ErrorHandler, HookRegistry};
use crate::router::{ParamVec, RoutePattern, Router};
use crate::server::{AppService, Listener};
use crate::static_files::StaticFiles;

/// What the route trie stores for every registered route.
#[derive(Clone)]
pub(crate) struct Endpoint {
    handler: Arc<dyn Handler>,
    /// Canonical pattern, for logging.
    pattern: Arc<str>,
}

/// Owns the route table, the hook registry and the listener.
///
/// Registration takes `&self`, so a dispatcher can be built behind an `Arc`
/// and shared with the server before or after routes are added. The first
/// dispatch seals it: later registrations still work but are logged.
pub struct Dispatcher {
    router: Router<Endpoint>,
    hooks: RwLock<HookRegistry>,
    static_prefix: String,
    static_server: Option<Arc<dyn StaticServe>>,
    static_init: Once,
    sealed: AtomicBool,
    listening: AtomicBool,
    server: Mutex<Option<Listener>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Empty dispatcher with the default `static` prefix and no static collaborator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            hooks: RwLock::new(HookRegistry::new()),
            static_prefix: AppConfig::default().static_url,
            static_server: None,
            static_init: Once::new(),
            sealed: AtomicBool::new(false),
            listening: AtomicBool::new(false),
            server: Mutex::new(None),
        }
    }

    /// Dispatcher serving `config.static_folder` under `config.static_url`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let files = StaticFiles::new(PathBuf::from(&config.static_folder));
        debug!(
            prefix = %config.static_url,
            dir = %files.base_dir().display(),
            "Static files configured"
        );
        Self::new()
            .with_static_prefix(&config.static_url)
            .with_static_server(files)
    }

    /// URL prefix of the static catch-all route. Surrounding `/` are ignored and
    /// an empty prefix makes the static route catch every unmatched GET.
    #[must_use]
    pub fn with_static_prefix(mut self, prefix: &str) -> Self {
        self.static_prefix = prefix.trim_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_static_server<S: StaticServe>(mut self, server: S) -> Self {
        self.static_server = Some(Arc::new(server));
        self
    }

    /// Register `handler` for every method in `methods` (GET when empty).
    ///
    /// The pattern is validated before anything is inserted. If a later method
    /// collides with an existing route the earlier methods stay registered.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidPattern`] or [`RouteError::DuplicateRoute`].
    pub fn register<M, H>(&self, methods: M, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        M: IntoIterator<Item = Method>,
        H: Handler,
    {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        let mut methods = unique_methods(methods);
        if methods.is_empty() {
            methods.push(Method::GET);
        }
        for method in methods {
            self.add_route(method, pattern, Arc::clone(&handler))?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn get<F>(&self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.register([Method::GET], pattern, handler)
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn post<F>(&self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.register([Method::POST], pattern, handler)
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn put<F>(&self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.register([Method::PUT], pattern, handler)
    }

    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn delete<F>(&self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.register([Method::DELETE], pattern, handler)
    }

    /// Register one route per method `resource` declares, all bound to the
    /// same object.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn register_resource<R: Resource>(
        &self,
        pattern: &str,
        resource: R,
    ) -> Result<(), RouteError> {
        let resource: Arc<dyn Resource> = Arc::new(resource);
        let methods = unique_methods(resource.methods());
        if methods.is_empty() {
            warn!(pattern = %pattern, "Resource declares no methods; nothing registered");
        }
        for method in methods {
            let handler = Arc::new(ResourceMethod {
                resource: Arc::clone(&resource),
                method: method.clone(),
            });
            self.add_route(method, pattern, handler)?;
        }
        Ok(())
    }

    fn add_route(
        &self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let parsed = RoutePattern::parse(pattern)?;
        let canonical: Arc<str> = parsed.to_string().into();
        if self.is_sealed() {
            warn!(
                method = %method,
                pattern = %canonical,
                "Route registered after the dispatcher started serving"
            );
        }
        self.router.add_pattern(
            &method,
            &parsed,
            Endpoint {
                handler,
                pattern: canonical,
            },
        )
    }

    /// Append a before-hook. Hooks run in registration order for every
    /// matched request.
    pub fn add_before_handle<F>(&self, hook: F)
    where
        F: Fn(&mut RequestContext) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.add_before_hook(hook);
    }

    /// [`Dispatcher::add_before_handle`] for any [`BeforeHook`] implementation.
    pub fn add_before_hook<H: BeforeHook>(&self, hook: H) {
        let mut hooks = self.hooks.write();
        hooks.add_before_handle(Arc::new(hook));
        debug!(before_count = hooks.before_count(), "Before-hook added");
    }

    /// Install the error handler for `status`, replacing any previous one.
    pub fn add_error_handle<F>(&self, status: u16, handler: F)
    where
        F: Fn(&RequestContext) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_error_handler(status, handler);
    }

    /// [`Dispatcher::add_error_handle`] for any [`ErrorHandler`] implementation.
    pub fn add_error_handler<E: ErrorHandler>(&self, status: u16, handler: E) {
        if self
            .hooks
            .write()
            .add_error_handle(status, Arc::new(handler))
            .is_some()
        {
            debug!(status, "Error handler replaced");
        }
    }

    /// Registered `(method, pattern)` pairs in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.router.routes()
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn static_prefix(&self) -> &str {
        &self.static_prefix
    }

    /// Install the GET catch-all route for static files. Runs once; callers
    /// racing on the first dispatch wait for the installing call to finish.
    pub fn init_static_route(&self) {
        self.static_init.call_once(|| {
            let pattern = if self.static_prefix.is_empty() {
                format!("/<*:{STATIC_CAPTURE}>")
            } else {
                format!("/{}/<*:{STATIC_CAPTURE}>", self.static_prefix)
            };
            let endpoint = Endpoint {
                handler: Arc::new(StaticHandler {
                    server: self.static_server.clone(),
                }),
                pattern: pattern.as_str().into(),
            };
            match self.router.add(&Method::GET, &pattern, endpoint) {
                Ok(()) => debug!(pattern = %pattern, "Static route installed"),
                Err(err) => warn!(error = %err, "Static route not installed"),
            }
        });
    }

    fn seal(&self) {
        if !self.sealed.swap(true, Ordering::AcqRel) {
            self.router.log_routes();
        }
    }

    /// Run one request through the pipeline: match, before-hooks, handler and
    /// error handling. Always produces a response.
    pub fn dispatch(&self, request: Request) -> HandlerResponse {
        self.init_static_route();
        self.seal();
        let start = Instant::now();

        let (ctx, result) = match self.router.route(&request.method, &request.path) {
            Ok(route_match) => {
                let mut ctx = RequestContext::new(request, route_match.params);
                debug!(
                    request_id = %ctx.request_id(),
                    pattern = %route_match.value.pattern,
                    "Route matched"
                );
                let result = self.run_pipeline(&route_match.value, &mut ctx);
                (ctx, result)
            }
            Err(MatchError::NotFound) => {
                let ctx = RequestContext::new(request, ParamVec::new());
                debug!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    "No route matched"
                );
                (ctx, Err(HandlerError::Abort(404)))
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => self.handle_error(&ctx, err),
        };

        info!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            status = response.status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }

    fn run_pipeline(&self, endpoint: &Endpoint, ctx: &mut RequestContext) -> HandlerResult {
        // Snapshot so hooks run without the registry lock held.
        let hooks = self.hooks.read().before_hooks();
        for hook in &hooks {
            guarded(|| hook.before(ctx))?;
        }
        guarded(|| endpoint.handler.call(ctx))
    }

    fn handle_error(&self, ctx: &RequestContext, err: HandlerError) -> HandlerResponse {
        let status = err.status();
        match &err {
            HandlerError::Abort(_) => {
                debug!(request_id = %ctx.request_id(), status, "Request aborted");
            }
            HandlerError::Fault(fault) => {
                error!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    error = %format!("{fault:#}"),
                    "Handler failed"
                );
            }
        }

        let Some(handler) = self.hooks.read().error_handler(status) else {
            return HandlerResponse::status_only(status);
        };
        match catch_unwind(AssertUnwindSafe(|| handler.handle(ctx))) {
            Ok(response) => response.with_status(status),
            Err(panic) => {
                error!(
                    request_id = %ctx.request_id(),
                    status,
                    panic_message = %panic_message(&*panic),
                    "Error handler panicked"
                );
                HandlerResponse::status_only(status)
            }
        }
    }

    /// Start the single listener on `address:port` and return its address.
    ///
    /// A second call returns the address of the listener already running.
    ///
    /// # Errors
    ///
    /// Port 0 and bind failures. A listener that never accepts connections
    /// is cancelled before the error is returned.
    pub fn listen(self: &Arc<Self>, address: &str, port: u16) -> io::Result<SocketAddr> {
        if self.listening.load(Ordering::Acquire) {
            if let Some(addr) = self.local_addr() {
                return Ok(addr);
            }
        }

        let mut server = self.server.lock();
        if let Some(listener) = server.as_ref() {
            return Ok(listener.addr());
        }

        self.init_static_route();
        let listener = Listener::bind(AppService::new(Arc::clone(self)), (address, port))?;
        let addr = listener.addr();
        *server = Some(listener);
        self.listening.store(true, Ordering::Release);
        info!(addr = %addr, "Listener started");
        Ok(addr)
    }

    /// Address of the running listener, if any.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().as_ref().map(Listener::addr)
    }

    /// Stop the listener. Returns `false` when none was running.
    pub fn shutdown(&self) -> bool {
        let listener = self.server.lock().take();
        match listener {
            Some(listener) => {
                self.listening.store(false, Ordering::Release);
                let addr = listener.addr();
                listener.stop();
                info!(addr = %addr, "Listener stopped");
                true
            }
            None => false,
        }
    }

    /// Listen on `address:port` and serve until SIGINT or SIGTERM, then shut
    /// the listener down.
    ///
    /// # Errors
    ///
    /// Bind failures or signal handler installation failures.
    pub fn run(self: &Arc<Self>, address: &str, port: u16) -> anyhow::Result<()> {
        use anyhow::Context;

        let addr = self
            .listen(address, port)
            .with_context(|| format!("failed to listen on {address}:{port}"))?;
        info!(addr = %addr, "Serving; press Ctrl-C to stop");
        wait_for_shutdown_signal()?;
        self.shutdown();
        Ok(())
    }
}

fn unique_methods(methods: impl IntoIterator<Item = Method>) -> Vec<Method> {
    let mut unique: Vec<Method> = Vec::new();
    for method in methods {
        if !unique.contains(&method) {
            unique.push(method);
        }
    }
    unique
}

/// Run a hook or handler, turning a panic into a fault.
fn guarded<T>(f: impl FnOnce() -> Result<T, HandlerError>) -> Result<T, HandlerError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => Err(HandlerError::Fault(anyhow::anyhow!(
            "panicked: {}",
            panic_message(&*panic)
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(unix)]
fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    use anyhow::Context;
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    loop {
        std::thread::park();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::abort;

    fn hello(_ctx: &mut RequestContext) -> HandlerResult {
        Ok("hello".into())
    }

    #[test]
    fn test_register_defaults_to_get() {
        let d = Dispatcher::new();
        d.register(Vec::<Method>::new(), "/", hello).unwrap();
        assert_eq!(d.routes(), vec![(Method::GET, "/".to_string())]);
    }

    #[test]
    fn test_register_dedupes_methods() {
        let d = Dispatcher::new();
        d.register([Method::GET, Method::POST, Method::GET], "/x", hello)
            .unwrap();
        assert_eq!(d.routes().len(), 2);
    }

    #[test]
    fn test_invalid_pattern_inserts_nothing() {
        let d = Dispatcher::new();
        assert!(d
            .register([Method::GET, Method::POST], "/a/<*:x>/b", hello)
            .is_err());
        assert!(d.routes().is_empty());
    }

    #[test]
    fn test_static_route_installed_once() {
        let d = Dispatcher::new().with_static_prefix("/assets/");
        d.init_static_route();
        d.init_static_route();
        assert_eq!(
            d.routes(),
            vec![(Method::GET, "/assets/<*:path>".to_string())]
        );
    }

    #[test]
    fn test_error_handler_status_is_forced() {
        let d = Dispatcher::new();
        d.get("/admin", |_ctx| abort(401)).unwrap();
        d.add_error_handle(401, |_ctx| HandlerResponse::from("login first"));
        let resp = d.dispatch(Request::new(Method::GET, "/admin"));
        assert_eq!(resp.status, 401);
        assert_eq!(resp.as_text(), Some("login first"));
    }

    #[test]
    fn test_panicking_error_handler_degrades_to_bare_status() {
        let d = Dispatcher::new();
        d.add_error_handle(404, |_ctx| panic!("broken error page"));
        let resp = d.dispatch(Request::new(Method::GET, "/missing"));
        assert_eq!(resp, HandlerResponse::status_only(404));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
