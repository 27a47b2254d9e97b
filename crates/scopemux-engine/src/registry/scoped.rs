use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scopemux_core::error::{Result, ScopeMuxError};
use scopemux_core::protocol::{Domain, RpcRequest, RpcResponse, Scope, ScopedRequest};

pub use crate::config::schema::ReleasePolicy;
use crate::middleware::{Downstream, MiddlewareHandle, ScopedMiddleware};
use crate::obs::EngineMetrics;

#[derive(Default)]
struct RegistryState {
    handlers: HashMap<Scope, MiddlewareHandle>,
    /// Per-domain counts are the source of truth; entries are removed at zero.
    counts: HashMap<Scope, HashMap<Domain, u32>>,
    /// Scopes installed without domain attribution.
    pinned: HashSet<Scope>,
}

/// Scope-keyed middleware registry with per-domain reference counting:
/// - `scope -> MiddlewareHandle` (first registrant wins the slot)
/// - `scope -> {domain -> count}`
///
/// Both maps sit behind one mutex. Release callbacks run after the lock is
/// dropped, so a middleware may call back into the registry while tearing down.
pub struct ScopedMiddlewareRegistry {
    state: Mutex<RegistryState>,
    policy: ReleasePolicy,
    metrics: Arc<EngineMetrics>,
}

impl Default for ScopedMiddlewareRegistry {
    fn default() -> Self {
        Self::new(ReleasePolicy::default())
    }
}

impl ScopedMiddlewareRegistry {
    pub fn new(policy: ReleasePolicy) -> Self {
        Self::with_metrics(policy, Arc::new(EngineMetrics::new()))
    }

    pub fn with_metrics(policy: ReleasePolicy, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            policy,
            metrics,
        }
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    // No critical section can leave the maps half-updated, so poison is ignored.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one reference on `scope` for `domain`.
    ///
    /// Installs `handle` if the scope has no handler yet and returns `true`.
    /// Otherwise the existing handler is kept, `handle` is dropped without
    /// being released, and `false` is returned.
    ///
    /// A handle bound to a different scope is refused outright: no reference
    /// is taken, nothing is installed, and `false` is returned.
    pub fn register(&self, scope: Scope, domain: Domain, handle: MiddlewareHandle) -> bool {
        if !self.bound_to(&scope, &handle) {
            return false;
        }

        let mut st = self.lock();
        *st.counts
            .entry(scope.clone())
            .or_default()
            .entry(domain.clone())
            .or_insert(0) += 1;
        let installed = Self::fill_slot(&mut st, &scope, handle);
        drop(st);

        self.record_registration(&scope, installed);
        tracing::debug!(%scope, %domain, installed, "middleware registered");
        installed
    }

    /// Install a handler with no domain attribution.
    ///
    /// Such a handler survives domain releases; only `retire` or
    /// `release_all` removes it.
    pub fn install(&self, scope: Scope, handle: MiddlewareHandle) -> bool {
        if !self.bound_to(&scope, &handle) {
            return false;
        }

        let mut st = self.lock();
        st.pinned.insert(scope.clone());
        let installed = Self::fill_slot(&mut st, &scope, handle);
        drop(st);

        self.record_registration(&scope, installed);
        tracing::debug!(%scope, installed, "middleware installed without domain");
        installed
    }

    // Metrics and retirement are keyed by the handle's own scope, so the two
    // must agree.
    fn bound_to(&self, scope: &Scope, handle: &MiddlewareHandle) -> bool {
        if handle.scope() == scope {
            return true;
        }
        self.metrics.contract_violations.inc(&[("scope", scope.as_str())]);
        tracing::warn!(
            %scope,
            handle_scope=%handle.scope(),
            "handle bound to a different scope refused"
        );
        false
    }

    fn fill_slot(st: &mut RegistryState, scope: &Scope, handle: MiddlewareHandle) -> bool {
        match st.handlers.entry(scope.clone()) {
            Entry::Vacant(v) => {
                v.insert(handle);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    fn record_registration(&self, scope: &Scope, installed: bool) {
        let outcome = if installed { "installed" } else { "shared" };
        self.metrics
            .registrations
            .inc(&[("scope", scope.as_str()), ("outcome", outcome)]);
        if installed {
            self.metrics.live_handlers.inc(&[("scope", scope.as_str())]);
        }
    }

    /// Drop one reference `domain` holds on `scope`.
    ///
    /// Retires the handler once no domain holds a reference (unless the scope
    /// was installed without a domain) and returns whether it did. Releasing a
    /// pair that was never registered is rejected under
    /// [`ReleasePolicy::Strict`] and ignored under [`ReleasePolicy::Lenient`];
    /// state is left untouched either way.
    pub fn release(&self, scope: &str, domain: &str) -> Result<bool> {
        let mut st = self.lock();

        let Some(domains) = st.counts.get_mut(scope) else {
            drop(st);
            return self.unregistered_release(scope, domain);
        };
        let Some(count) = domains.get_mut(domain) else {
            drop(st);
            return self.unregistered_release(scope, domain);
        };

        *count -= 1;
        if *count == 0 {
            domains.remove(domain);
        }
        let retired = if domains.is_empty() {
            st.counts.remove(scope);
            if st.pinned.contains(scope) {
                None
            } else {
                st.handlers.remove(scope)
            }
        } else {
            None
        };
        drop(st);

        self.metrics.releases.inc(&[("scope", scope)]);
        let retiring = retired.is_some();
        tracing::debug!(%scope, %domain, retiring, "middleware reference released");

        Ok(match retired {
            Some(h) => {
                self.finish_retire(h, "last_reference");
                true
            }
            None => false,
        })
    }

    fn unregistered_release(&self, scope: &str, domain: &str) -> Result<bool> {
        self.metrics.contract_violations.inc(&[("scope", scope)]);
        match self.policy {
            ReleasePolicy::Strict => Err(ScopeMuxError::UnregisteredRelease {
                scope: scope.to_string(),
                domain: domain.to_string(),
            }),
            ReleasePolicy::Lenient => {
                tracing::warn!(%scope, %domain, "release for unregistered domain ignored");
                Ok(false)
            }
        }
    }

    /// Unconditionally retire `scope`: drops every domain count and releases
    /// the handler if one is registered. Returns whether a handler was released.
    pub fn retire(&self, scope: &str) -> bool {
        let mut st = self.lock();
        st.counts.remove(scope);
        st.pinned.remove(scope);
        let retired = st.handlers.remove(scope);
        drop(st);

        match retired {
            Some(h) => {
                self.finish_retire(h, "forced");
                true
            }
            None => false,
        }
    }

    /// Drop every reference `domain` holds, across all scopes.
    /// Returns the number of scopes the domain was registered on.
    pub fn release_all_for_domain(&self, domain: &str) -> usize {
        let mut st = self.lock();

        let mut touched = 0;
        let mut emptied = Vec::new();
        for (scope, domains) in st.counts.iter_mut() {
            if domains.remove(domain).is_some() {
                touched += 1;
                if domains.is_empty() {
                    emptied.push(scope.clone());
                }
            }
        }

        let mut retired = Vec::with_capacity(emptied.len());
        for scope in emptied {
            st.counts.remove(&scope);
            if st.pinned.contains(&scope) {
                continue;
            }
            if let Some(h) = st.handlers.remove(&scope) {
                retired.push(h);
            }
        }
        drop(st);

        if touched > 0 {
            tracing::debug!(%domain, scopes = touched, retired = retired.len(), "domain released");
        }
        for h in retired {
            self.finish_retire(h, "last_reference");
        }
        touched
    }

    /// Tear down everything. Returns the number of handlers released.
    pub fn release_all(&self) -> usize {
        let mut st = self.lock();
        st.counts.clear();
        st.pinned.clear();
        let retired: Vec<MiddlewareHandle> = st.handlers.drain().map(|(_, h)| h).collect();
        drop(st);

        let n = retired.len();
        for h in retired {
            self.finish_retire(h, "forced");
        }
        tracing::debug!(released = n, "registry torn down");
        n
    }

    fn finish_retire(&self, handle: MiddlewareHandle, reason: &'static str) {
        let scope = handle.scope().as_str();
        self.metrics
            .retirements
            .inc(&[("scope", scope), ("reason", reason)]);
        self.metrics.live_handlers.dec(&[("scope", scope)]);
        tracing::debug!(%scope, reason, "retiring middleware");
        handle.release();
    }

    fn handler_for(&self, scope: &str) -> Option<Arc<dyn ScopedMiddleware>> {
        self.lock().handlers.get(scope).map(MiddlewareHandle::middleware)
    }

    /// Route `req` to the handler registered for its scope, or to `next` if
    /// there is none. The request is forwarded as-is.
    pub async fn dispatch(
        &self,
        req: &RpcRequest,
        res: &mut RpcResponse,
        next: &dyn Downstream,
    ) -> Result<()> {
        let handler = req.scope().and_then(|s| self.handler_for(s.as_str()));

        let (outcome, result) = match handler {
            Some(mw) => ("handled", mw.handle(req, res, next).await),
            None => {
                tracing::trace!(method=%req.method, scope=?req.scope, "no middleware for scope");
                ("passthrough", next.run(req, res).await)
            }
        };

        let outcome = if result.is_err() { "error" } else { outcome };
        self.metrics.dispatches.inc(&[("outcome", outcome)]);
        result
    }

    pub fn is_registered(&self, scope: &str) -> bool {
        self.lock().handlers.contains_key(scope)
    }

    /// Sum of all per-domain counts for `scope`.
    pub fn reference_count(&self, scope: &str) -> u32 {
        self.lock()
            .counts
            .get(scope)
            .map(|d| d.values().sum())
            .unwrap_or(0)
    }

    pub fn domain_count(&self, scope: &str, domain: &str) -> u32 {
        self.lock()
            .counts
            .get(scope)
            .and_then(|d| d.get(domain).copied())
            .unwrap_or(0)
    }

    /// Scopes with a live handler, sorted.
    pub fn scopes(&self) -> Vec<Scope> {
        let mut out: Vec<Scope> = self.lock().handlers.keys().cloned().collect();
        out.sort();
        out
    }

    pub fn is_empty(&self) -> bool {
        let st = self.lock();
        st.handlers.is_empty() && st.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Noop {
        released: AtomicUsize,
    }

    #[async_trait]
    impl ScopedMiddleware for Noop {
        async fn handle(
            &self,
            _: &RpcRequest,
            _: &mut RpcResponse,
            _: &dyn Downstream,
        ) -> Result<()> {
            Ok(())
        }

        fn release(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn handle(scope: &str) -> (MiddlewareHandle, Arc<Noop>) {
        let mw = Arc::new(Noop::default());
        (MiddlewareHandle::new(Scope::new(scope), mw.clone()), mw)
    }

    #[test]
    fn pinned_scope_survives_domain_release() {
        let reg = ScopedMiddlewareRegistry::default();
        let (h, mw) = handle("wallet");
        assert!(reg.install(Scope::new("wallet"), h));

        let (h2, _) = handle("wallet");
        assert!(!reg.register(Scope::new("wallet"), Domain::new("a"), h2));
        assert!(!reg.release("wallet", "a").unwrap());
        assert!(reg.is_registered("wallet"));
        assert_eq!(mw.released.load(Ordering::SeqCst), 0);

        assert!(reg.retire("wallet"));
        assert!(!reg.retire("wallet"));
        assert_eq!(mw.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn strict_release_leaves_state_untouched() {
        let reg = ScopedMiddlewareRegistry::new(ReleasePolicy::Strict);
        let (h, mw) = handle("eip155:1");
        reg.register(Scope::new("eip155:1"), Domain::new("a"), h);

        let err = reg.release("eip155:1", "b").unwrap_err();
        assert!(matches!(err, ScopeMuxError::UnregisteredRelease { .. }));
        assert_eq!(reg.domain_count("eip155:1", "a"), 1);
        assert_eq!(mw.released.load(Ordering::SeqCst), 0);
        assert_eq!(reg.metrics().contract_violations.get(&[("scope", "eip155:1")]), 1);
    }

    #[test]
    fn lenient_release_is_a_noop() {
        let reg = ScopedMiddlewareRegistry::new(ReleasePolicy::Lenient);
        assert!(!reg.release("eip155:1", "a").unwrap());

        let (h, _) = handle("eip155:1");
        reg.register(Scope::new("eip155:1"), Domain::new("a"), h);
        assert!(!reg.release("eip155:1", "b").unwrap());
        assert_eq!(reg.reference_count("eip155:1"), 1);
    }

    #[test]
    fn live_handler_gauge_tracks_slots() {
        let reg = ScopedMiddlewareRegistry::default();
        let (h1, _) = handle("eip155:1");
        let (h2, _) = handle("eip155:1");
        reg.register(Scope::new("eip155:1"), Domain::new("a"), h1);
        reg.register(Scope::new("eip155:1"), Domain::new("b"), h2);

        let m = reg.metrics();
        assert_eq!(m.live_handlers.get(&[("scope", "eip155:1")]), 1);
        assert_eq!(m.registrations.get(&[("scope", "eip155:1"), ("outcome", "shared")]), 1);

        reg.release_all();
        assert_eq!(m.live_handlers.get(&[("scope", "eip155:1")]), 0);
    }
}
