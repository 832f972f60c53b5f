//! Application Use Cases
//!
//! One struct per exposed operation, generic over the ports it consumes.

mod aggregate_positions;
mod execute_trade;
mod route_trade;

pub use aggregate_positions::AggregatePositionsUseCase;
pub use execute_trade::ExecuteTradeUseCase;
pub use route_trade::RouteTradeUseCase;
