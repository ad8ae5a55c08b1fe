//! Per-request render state.

use folio_core::RequestContext;
use folio_query::QueryClient;
use folio_state::{GlobalState, StoreState};

use crate::HeadCollector;

/// Everything a render may read or contribute to, created fresh for each
/// request and never shared with another.
///
/// The query cache is also the handle loaders fill, so the middleware builds
/// the scope before running them. Global and store state are immutable
/// snapshots: views read them, nothing on the server changes them.
#[derive(Debug, Clone)]
pub struct RenderScope {
    request: RequestContext,
    query: QueryClient,
    global: GlobalState,
    store: StoreState,
    head: HeadCollector,
}

impl RenderScope {
    /// Fresh scope with state seeded from the request.
    pub fn new(request: RequestContext) -> Self {
        Self {
            global: GlobalState::seed(&request.cookies),
            store: StoreState::server_seed(),
            query: QueryClient::new(),
            head: HeadCollector::new(),
            request,
        }
    }

    pub fn with_query(mut self, query: QueryClient) -> Self {
        self.query = query;
        self
    }

    pub fn with_global(mut self, global: GlobalState) -> Self {
        self.global = global;
        self
    }

    pub fn with_store(mut self, store: StoreState) -> Self {
        self.store = store;
        self
    }

    /// Replace the request context, e.g. once route params are known.
    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = request;
        self
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn query(&self) -> &QueryClient {
        &self.query
    }

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn store(&self) -> &StoreState {
        &self.store
    }

    pub fn head(&self) -> &HeadCollector {
        &self.head
    }
}
