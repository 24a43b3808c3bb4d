//! Concentrated-liquidity position and rebalance math over pool snapshots.

pub mod fee_math;
pub mod full_math;
pub mod impermanent_loss;
pub mod liquidity_math;
pub mod monitor;
pub mod position;
pub mod range;
pub mod rebalance;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;

pub use fee_math::*;
pub use full_math::*;
pub use impermanent_loss::*;
pub use liquidity_math::*;
pub use monitor::*;
pub use range::*;
pub use rebalance::*;
pub use sqrt_price_math::*;
pub use swap_math::*;
pub use tick_math::*;
