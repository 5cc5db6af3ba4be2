//! # Domain Models
//!
//! Validated value types shared by ingestion and the HTTP boundary.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Uppercase ticker |
//! | [`TradeDate`] | Strict `YYYY-MM-DD` calendar date |
//! | [`DateWindow`] | Inclusive date range |

mod symbol;
mod trade_date;

pub use symbol::Symbol;
pub use trade_date::{DateWindow, TradeDate};
