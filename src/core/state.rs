use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::identity::IdentityClient;
use crate::services::quiz_catalog::CatalogClient;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    catalog: CatalogClient,
    identity: IdentityClient,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        catalog: CatalogClient,
        identity: IdentityClient,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, catalog, identity }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    pub(crate) fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }
}
