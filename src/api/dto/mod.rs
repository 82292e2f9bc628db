//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are integer minor units; the [`crate::domain::Money`]
//! newtype serializes transparently as a JSON number.

pub mod monitor_dto;
pub mod price_dto;
pub mod wallet_dto;

pub use monitor_dto::*;
pub use price_dto::*;
pub use wallet_dto::*;
