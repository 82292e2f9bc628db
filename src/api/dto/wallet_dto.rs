//! Wallet and order DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Money, Order, UserId, Wallet};

/// Request body for `POST /wallets/{user_id}/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Amount to credit in minor units (must be positive).
    pub amount: Money,
}

/// Balance view for `GET /wallets/{user_id}` and deposit responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResponse {
    /// Wallet owner.
    pub user_id: UserId,
    /// Spendable balance in minor units.
    pub wallet_balance: Money,
    /// Balance reserved by active monitors in minor units.
    pub frozen_balance: Money,
    /// Sum of spendable and reserved balances.
    pub total: Money,
}

impl WalletResponse {
    /// Builds the balance view from a wallet snapshot.
    #[must_use]
    pub fn new(user_id: UserId, wallet: Wallet) -> Self {
        Self {
            user_id,
            wallet_balance: wallet.available,
            frozen_balance: wallet.frozen,
            total: wallet.total(),
        }
    }
}

/// List response for `GET /orders`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    /// Orders, newest first.
    pub data: Vec<Order>,
    /// Number of orders returned.
    pub total: usize,
}
