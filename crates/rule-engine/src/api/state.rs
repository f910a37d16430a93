//! Axum 路由共享的应用状态

use crate::executor::RuleExecutor;
use crate::store::RuleStore;

#[derive(Clone, Default)]
pub struct AppState {
    pub store: RuleStore,
    pub executor: RuleExecutor,
}

impl AppState {
    pub fn new(store: RuleStore) -> Self {
        Self {
            store,
            executor: RuleExecutor::new(),
        }
    }
}
