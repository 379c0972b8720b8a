use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{parse_age, DrinkItem, OrderStage};

/// Message shown when the age gate rejects a submission
pub const AGE_CHECK_FAILED_MESSAGE: &str = "Only adults can buy alcohol";

/// Current contents of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub session_id: Uuid,
    pub stage: OrderStage,
    pub drinks: Vec<DrinkItem>,
    pub total_price: Decimal,
    pub total_count: u32,
}

/// Order review, with the age check flag and any rejection details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub session_id: Uuid,
    pub stage: OrderStage,
    pub drinks: Vec<DrinkItem>,
    pub number_of_drinks: u32,
    pub total_price: Decimal,
    pub age_check: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
}

/// Confirmation of a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub session_id: Uuid,
    pub stage: OrderStage,
    pub number_of_drinks: u32,
    pub total_price: Decimal,
}

/// The screen a workflow step leads to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum WorkflowResponse {
    PlaceOrder(OrderResponse),
    ReviewOrder(ReviewResponse),
    OrderSubmitted(CompletionResponse),
}

impl WorkflowResponse {
    pub fn stage(&self) -> OrderStage {
        match self {
            WorkflowResponse::PlaceOrder(view) => view.stage,
            WorkflowResponse::ReviewOrder(view) => view.stage,
            WorkflowResponse::OrderSubmitted(view) => view.stage,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            WorkflowResponse::PlaceOrder(view) => view.session_id,
            WorkflowResponse::ReviewOrder(view) => view.session_id,
            WorkflowResponse::OrderSubmitted(view) => view.session_id,
        }
    }
}

/// Request body for submitting an order; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    #[serde(default)]
    pub age: Option<Value>,
}

impl SubmitOrderRequest {
    /// The submitted age, with malformed input treated as absent
    pub fn age(&self) -> Option<i32> {
        self.age.as_ref().and_then(parse_age)
    }
}

/// Response model for the drink catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub drinks: Vec<DrinkItem>,
    pub total_count: usize,
}
