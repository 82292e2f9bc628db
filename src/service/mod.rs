//! Service layer: business logic orchestration.
//!
//! [`AutopayService`] owns the user-facing wallet and monitor
//! operations; [`SettlementEngine`] reacts to catalog price changes.
//! Both emit events through the [`super::domain::EventBus`].

pub mod autopay_service;
pub mod settlement;

pub use autopay_service::AutopayService;
pub use settlement::{PriceChangeOutcome, SettlementEngine, SettlementOutcome};
