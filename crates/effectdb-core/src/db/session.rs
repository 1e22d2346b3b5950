use crate::{
    db::{
        context::ExecContext,
        effect::Effect,
        page::PageQuery,
        query::{EffectsQuery, QueryError},
        store::EffectStore,
    },
    obs::sink::{MetricsSink, with_metrics_sink},
};
use effectdb_config::PagingConfig;
use std::rc::Rc;

///
/// DbSession
///
/// Handle over one store snapshot with paging policy and an optional
/// metrics sink. Builders handed out by a session all read the same
/// snapshot, so lookups and the main query agree on foreign keys.
///

pub struct DbSession<S: EffectStore> {
    store: S,
    config: PagingConfig,
    metrics: Option<Rc<dyn MetricsSink>>,
}

impl<S: EffectStore> DbSession<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: PagingConfig::default(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PagingConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn metrics_sink(mut self, sink: Rc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &PagingConfig {
        &self.config
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.metrics {
            Some(sink) => with_metrics_sink(Rc::clone(sink), f),
            None => f(),
        }
    }

    // ---------------------------------------------------------------------
    // Query entry points
    // ---------------------------------------------------------------------

    /// Start a new effects query for one request.
    #[must_use]
    pub fn effects<'a>(&'a self, ctx: &'a ExecContext) -> EffectsQuery<'a, S> {
        EffectsQuery::new(&self.store, ctx)
    }

    /// Validate raw request paging parameters against the session's policy.
    pub fn page_query(
        &self,
        cursor: Option<&str>,
        order: Option<&str>,
        limit: Option<u64>,
    ) -> Result<PageQuery, QueryError> {
        PageQuery::from_params(cursor, order, limit, &self.config)
    }

    /// Resume token for `effect`, written with the session's separator so
    /// `page_query` accepts it back.
    #[must_use]
    pub fn paging_token(&self, effect: &Effect) -> String {
        effect.paging_token_with(self.config.separator)
    }

    /// Build, page, and run one effects query.
    ///
    /// `filters` chains any filters onto the fresh builder; the page is
    /// applied last.
    pub fn load_effects<'a>(
        &'a self,
        ctx: &'a ExecContext,
        page: &PageQuery,
        filters: impl FnOnce(EffectsQuery<'a, S>) -> EffectsQuery<'a, S>,
    ) -> Result<Vec<Effect>, QueryError> {
        self.with_metrics(|| {
            let mut rows = Vec::new();
            filters(self.effects(ctx)).page(page).execute(&mut rows)?;

            Ok(rows)
        })
    }
}
