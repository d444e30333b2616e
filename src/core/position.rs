// src/core/position.rs
use crate::core::state::SharedState;
use crate::types::Position;
use rust_decimal::Decimal;

/// |quantity| below this is dust and counts as flat.
pub const FLAT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// The only place that reads exchange quantity semantics (sign, dust threshold).
/// Reconciles from scratch every tick; the exchange is the source of truth.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    state: SharedState,
}

impl PositionTracker {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub fn reconcile(&self, reported: Position) -> Position {
        let position = if reported.quantity.abs() < FLAT_EPSILON {
            Position::flat()
        } else if reported.quantity.is_sign_negative() {
            self.state.log_warn(format!(
                "Short position of {} found on the exchange; long-only strategy treats it as flat",
                reported.quantity
            ));
            Position::flat()
        } else {
            reported
        };

        self.state.publish_position(position.clone());
        position
    }
}
