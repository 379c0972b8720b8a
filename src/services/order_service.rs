use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::{
    default_catalog, CatalogResponse, OrderResponse, RepositoryError, ServiceError, ServiceResult,
    Session, WorkflowResponse,
};
use crate::observability::{BusinessTracingMiddleware, Metrics};
use crate::repositories::{SessionHandle, SessionRepository};

/// Drives the ordering workflow: one locked session per step
pub struct OrderService {
    repository: Arc<dyn SessionRepository>,
    metrics: Arc<Metrics>,
    tracing: BusinessTracingMiddleware,
}

impl OrderService {
    pub fn new(repository: Arc<dyn SessionRepository>, metrics: Arc<Metrics>) -> Self {
        Self {
            repository,
            tracing: BusinessTracingMiddleware::new(metrics.clone()),
            metrics,
        }
    }

    /// Open a new session showing the place-order screen
    #[instrument(skip(self))]
    pub async fn open_session(&self) -> ServiceResult<WorkflowResponse> {
        self.tracing
            .trace_order_operation("open_session", None, async {
                let handle = self.repository.create(Session::new()).await?;
                let response = handle.lock().await.place_order();

                crate::info_with_trace!(
                    session_id = %response.session_id(),
                    "Order session opened"
                );
                self.refresh_active_sessions().await;
                Ok::<_, ServiceError>(response)
            })
            .await
    }

    /// Current order without changing the stage
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn get_order(&self, session_id: Uuid) -> ServiceResult<OrderResponse> {
        let handle = self.session(&session_id).await?;
        let session = handle.lock().await;
        Ok(session.order_response())
    }

    /// Place-order entry on an existing session: starts a fresh order
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn place_order(&self, session_id: Uuid) -> ServiceResult<WorkflowResponse> {
        self.apply("place_order", session_id, |session| Ok(session.place_order()))
            .await
    }

    #[instrument(skip(self), fields(session_id = %session_id, drink_id = drink_id))]
    pub async fn increment(
        &self,
        session_id: Uuid,
        drink_id: u32,
    ) -> ServiceResult<WorkflowResponse> {
        self.apply("increment", session_id, move |session| {
            session.increment(drink_id)
        })
        .await
    }

    #[instrument(skip(self), fields(session_id = %session_id, drink_id = drink_id))]
    pub async fn decrement(
        &self,
        session_id: Uuid,
        drink_id: u32,
    ) -> ServiceResult<WorkflowResponse> {
        self.apply("decrement", session_id, move |session| {
            session.decrement(drink_id)
        })
        .await
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn review(&self, session_id: Uuid) -> ServiceResult<WorkflowResponse> {
        self.apply("review", session_id, |session| session.review())
            .await
    }

    /// Throw the selection away and return to the place-order screen
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn cancel(&self, session_id: Uuid) -> ServiceResult<WorkflowResponse> {
        self.apply("cancel", session_id, |session| Ok(session.cancel()))
            .await
    }

    /// Submit the order through the age gate
    #[instrument(skip(self, age), fields(session_id = %session_id, age_provided = age.is_some()))]
    pub async fn submit(
        &self,
        session_id: Uuid,
        age: Option<i32>,
    ) -> ServiceResult<WorkflowResponse> {
        let (response, outcome) = self
            .apply("submit", session_id, move |session| session.submit(age))
            .await?;

        if let Some(outcome) = outcome {
            self.metrics.record_age_gate(outcome.as_str());
        }

        match &response {
            WorkflowResponse::OrderSubmitted(completion) => {
                self.metrics.record_order_submitted();
                crate::info_with_trace!(
                    number_of_drinks = completion.number_of_drinks,
                    total_price = %completion.total_price,
                    "Order submitted"
                );
            }
            WorkflowResponse::ReviewOrder(_) => {
                crate::warn_with_trace!("Order rejected by age check");
            }
            WorkflowResponse::PlaceOrder(_) => {
                debug!("Nothing selected, back to place order");
            }
        }

        Ok(response)
    }

    /// Remove a session for good
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn end_session(&self, session_id: Uuid) -> ServiceResult<()> {
        let id = session_id.to_string();
        self.tracing
            .trace_order_operation("end_session", Some(&id), async {
                match self.repository.delete(&session_id).await {
                    Ok(()) => Ok(()),
                    Err(RepositoryError::NotFound) => {
                        Err(ServiceError::SessionNotFound { session_id })
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        crate::info_with_trace!("Order session ended");
        self.refresh_active_sessions().await;
        Ok(())
    }

    /// Drop sessions idle for longer than `max_idle`
    #[instrument(skip(self))]
    pub async fn purge_idle_sessions(&self, max_idle: Duration) -> ServiceResult<usize> {
        let purged = self.repository.purge_idle(max_idle).await?;

        if purged > 0 {
            self.metrics.record_sessions_purged(purged);
        }
        self.refresh_active_sessions().await;

        Ok(purged)
    }

    /// The fixed catalog with nothing selected
    pub fn catalog(&self) -> CatalogResponse {
        let drinks = default_catalog();
        CatalogResponse {
            total_count: drinks.len(),
            drinks,
        }
    }

    pub async fn active_sessions(&self) -> ServiceResult<usize> {
        Ok(self.repository.count().await?)
    }

    /// Lock one session, apply a workflow step, and record the operation
    async fn apply<T, F>(&self, operation: &str, session_id: Uuid, step: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Session) -> ServiceResult<T> + Send,
        T: Send,
    {
        let id = session_id.to_string();
        self.tracing
            .trace_order_operation(operation, Some(&id), async {
                let handle = self.session(&session_id).await?;
                let mut session = handle.lock().await;
                step(&mut *session)
            })
            .await
    }

    async fn session(&self, session_id: &Uuid) -> ServiceResult<SessionHandle> {
        match self.repository.find(session_id).await? {
            Some(handle) => Ok(handle),
            None => {
                crate::warn_with_trace!(session_id = %session_id, "Order session not found");
                Err(ServiceError::SessionNotFound {
                    session_id: *session_id,
                })
            }
        }
    }

    async fn refresh_active_sessions(&self) {
        if let Ok(count) = self.repository.count().await {
            self.metrics.set_active_sessions(count);
        }
    }
}
