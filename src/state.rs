// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    auth::{AuthBridge, GateConfig, SessionCookies, TokenVerifier},
    backend::{BackendClient, BackendError},
    config::Config,
    fetchers::DataFetchers,
    store::FlowStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: BackendClient,
    pub verifier: Arc<TokenVerifier>,
    pub cookies: SessionCookies,
    pub gate: Arc<GateConfig>,
    pub fetchers: Arc<DataFetchers>,
    pub flows: Arc<FlowStore>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, BackendError> {
        let backend = BackendClient::new(config.api_url.clone())?;
        Ok(Self {
            verifier: Arc::new(TokenVerifier::new(&config.secret_key)),
            cookies: SessionCookies::from_config(&config),
            gate: Arc::new(GateConfig::from_config(&config)),
            fetchers: Arc::new(DataFetchers::new(backend.clone(), config.cache)),
            flows: Arc::new(FlowStore::new()),
            backend,
            config: Arc::new(config),
        })
    }

    pub fn bridge(&self) -> AuthBridge<'_> {
        AuthBridge::new(&self.backend, &self.verifier, &self.cookies)
    }
}
