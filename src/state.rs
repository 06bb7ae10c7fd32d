use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    exam::{ExamEngine, PgExamStore},
    utils::credentials::{Argon2Credentials, CredentialCheck, PlainTextCredentials},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub engine: ExamEngine,
    pub credentials: Arc<dyn CredentialCheck>,
}

impl AppState {
    /// Production wiring: the exam engine runs on the same Postgres pool as
    /// the CRUD handlers.
    pub fn new(pool: PgPool, config: Config) -> Self {
        let engine = ExamEngine::new(Arc::new(PgExamStore::new(pool.clone())));
        let credentials: Arc<dyn CredentialCheck> = if config.plaintext_passwords {
            tracing::warn!("PLAINTEXT_PASSWORDS is enabled; student passwords are stored unhashed");
            Arc::new(PlainTextCredentials)
        } else {
            Arc::new(Argon2Credentials)
        };

        Self {
            pool,
            config,
            engine,
            credentials,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for ExamEngine {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CredentialCheck> {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}
