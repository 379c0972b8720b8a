// Services module - ordering workflow

pub mod order_service;

pub use order_service::OrderService;
