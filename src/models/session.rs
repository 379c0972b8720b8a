use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{
    is_age_eligible, CompletionResponse, Order, OrderResponse, ReviewResponse, ServiceError,
    ServiceResult, WorkflowResponse, AGE_CHECK_FAILED_MESSAGE,
};

/// Where an order session is in the ordering workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    PlacingOrder,
    Reviewing,
    Completed,
}

impl fmt::Display for OrderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStage::PlacingOrder => write!(f, "placing_order"),
            OrderStage::Reviewing => write!(f, "reviewing"),
            OrderStage::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for OrderStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "placing_order" => Ok(OrderStage::PlacingOrder),
            "reviewing" => Ok(OrderStage::Reviewing),
            "completed" => Ok(OrderStage::Completed),
            _ => Err(format!("Invalid order stage: {}", s)),
        }
    }
}

/// Outcome of the age gate for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGateOutcome {
    NotRequired,
    Passed,
    Rejected,
}

impl AgeGateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGateOutcome::NotRequired => "not_required",
            AgeGateOutcome::Passed => "passed",
            AgeGateOutcome::Rejected => "rejected",
        }
    }
}

/// One customer's ordering conversation: exactly one order and its stage
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub order: Order,
    pub stage: OrderStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Open a session with a fresh order
    pub fn new() -> Self {
        Self::with_order(Order::new())
    }

    /// Open a session around an existing order
    pub fn with_order(order: Order) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order,
            stage: OrderStage::PlacingOrder,
            created_at: now,
            updated_at: now,
        }
    }

    /// Place-order entry point: fresh catalog, all quantities zero
    pub fn place_order(&mut self) -> WorkflowResponse {
        self.order.reset();
        self.transition(OrderStage::PlacingOrder);
        WorkflowResponse::PlaceOrder(self.order_response())
    }

    /// Cancelling a review throws the whole selection away
    pub fn cancel(&mut self) -> WorkflowResponse {
        self.place_order()
    }

    pub fn increment(&mut self, drink_id: u32) -> ServiceResult<WorkflowResponse> {
        self.ensure_open()?;
        self.order.increment(drink_id);
        self.transition(OrderStage::PlacingOrder);
        Ok(WorkflowResponse::PlaceOrder(self.order_response()))
    }

    pub fn decrement(&mut self, drink_id: u32) -> ServiceResult<WorkflowResponse> {
        self.ensure_open()?;
        self.order.decrement(drink_id);
        self.transition(OrderStage::PlacingOrder);
        Ok(WorkflowResponse::PlaceOrder(self.order_response()))
    }

    /// Move to review; an empty order stays on the place-order screen
    pub fn review(&mut self) -> ServiceResult<WorkflowResponse> {
        self.ensure_open()?;

        if self.order.is_empty() {
            self.transition(OrderStage::PlacingOrder);
            return Ok(WorkflowResponse::PlaceOrder(self.order_response()));
        }

        self.transition(OrderStage::Reviewing);
        Ok(WorkflowResponse::ReviewOrder(self.review_response(None, None)))
    }

    /// Submit the order through the age gate.
    ///
    /// Orders without alcohol pass regardless of age. A rejection keeps the
    /// selection and returns to review with the rejected age echoed back.
    pub fn submit(
        &mut self,
        age: Option<i32>,
    ) -> ServiceResult<(WorkflowResponse, Option<AgeGateOutcome>)> {
        self.ensure_open()?;

        if self.order.is_empty() {
            self.transition(OrderStage::PlacingOrder);
            return Ok((WorkflowResponse::PlaceOrder(self.order_response()), None));
        }

        let outcome = if !self.order.has_alcoholic_selection() {
            AgeGateOutcome::NotRequired
        } else if is_age_eligible(age) {
            AgeGateOutcome::Passed
        } else {
            AgeGateOutcome::Rejected
        };

        if outcome == AgeGateOutcome::Rejected {
            self.transition(OrderStage::Reviewing);
            let review = self.review_response(Some(AGE_CHECK_FAILED_MESSAGE.to_string()), age);
            return Ok((WorkflowResponse::ReviewOrder(review), Some(outcome)));
        }

        self.transition(OrderStage::Completed);
        let completion = CompletionResponse {
            session_id: self.id,
            stage: self.stage,
            number_of_drinks: self.order.total_count(),
            total_price: self.order.total_price(),
        };
        Ok((WorkflowResponse::OrderSubmitted(completion), Some(outcome)))
    }

    /// Snapshot of the current order
    pub fn order_response(&self) -> OrderResponse {
        OrderResponse {
            session_id: self.id,
            stage: self.stage,
            drinks: self.order.list().to_vec(),
            total_price: self.order.total_price(),
            total_count: self.order.total_count(),
        }
    }

    /// Whether the session has gone untouched for longer than `max_idle`
    pub fn is_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> bool {
        now.signed_duration_since(self.updated_at)
            .to_std()
            .map(|idle| idle > max_idle)
            .unwrap_or(false)
    }

    fn review_response(&self, error: Option<String>, age: Option<i32>) -> ReviewResponse {
        ReviewResponse {
            session_id: self.id,
            stage: self.stage,
            drinks: self.order.list().to_vec(),
            number_of_drinks: self.order.total_count(),
            total_price: self.order.total_price(),
            age_check: self.order.has_alcoholic_selection(),
            error,
            age,
        }
    }

    fn ensure_open(&self) -> ServiceResult<()> {
        if self.stage == OrderStage::Completed {
            return Err(ServiceError::OrderAlreadySubmitted {
                session_id: self.id,
            });
        }
        Ok(())
    }

    fn transition(&mut self, stage: OrderStage) {
        self.stage = stage;
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
