//! Shared handler state

use std::sync::Arc;

use crud_controller::{Authorizer, CrudController, PlaceholderAuthorizer, SecurityCheck};
use data_access::{Procedures, RoutineExecutor};

pub type SharedAuthorizer = Arc<dyn Authorizer>;

/// Everything a handler needs: the routine invoker and one controller per audience
pub struct AppState<E: RoutineExecutor> {
    pub procedures: Arc<Procedures<E>>,
    /// Public endpoints; no security checks
    pub external: Arc<CrudController<SharedAuthorizer>>,
    /// Back-office endpoints; caller must be authenticated
    pub internal: Arc<CrudController<SharedAuthorizer>>,
}

impl<E: RoutineExecutor> AppState<E> {
    pub fn new(procedures: Procedures<E>, authorizer: SharedAuthorizer) -> Self {
        Self::from_shared(Arc::new(procedures), authorizer)
    }

    pub fn from_shared(procedures: Arc<Procedures<E>>, authorizer: SharedAuthorizer) -> Self {
        Self {
            procedures,
            external: Arc::new(CrudController::new(Vec::new(), Arc::clone(&authorizer))),
            internal: Arc::new(CrudController::new(vec![SecurityCheck::Authenticated], authorizer)),
        }
    }

    /// State whose authorizer resolves a fixed identity and enforces nothing
    pub fn unenforced(procedures: Procedures<E>) -> Self {
        Self::new(procedures, Arc::new(PlaceholderAuthorizer))
    }
}

impl<E: RoutineExecutor> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            procedures: Arc::clone(&self.procedures),
            external: Arc::clone(&self.external),
            internal: Arc::clone(&self.internal),
        }
    }
}
