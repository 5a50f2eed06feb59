//! Status transitions applied to the order aggregate.

use super::{Order, OrderError, OrderStatus};

impl Order {
    /// Moves the order to `target` if the transition table allows it.
    ///
    /// On error the order is left untouched. Persisting the change is up to the caller.
    pub fn transition_to(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        let current = self.status();
        if !current.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        self.set_status(target);
        Ok(())
    }

    /// Cancels the order on behalf of the customer.
    ///
    /// Narrower than `transition_to(Cancelled)`: only `Pending` and `Confirmed`
    /// orders qualify, everything else is `NotCancellable`.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.can_be_cancelled() {
            return Err(OrderError::NotCancellable {
                status: self.status(),
            });
        }

        self.transition_to(OrderStatus::Cancelled)
    }
}
