use super::actions::{OrderAction, OrderActionResult};
use crate::actor_framework::Entity;
use crate::domain::{Order, OrderCreate, OrderStatus};
use crate::validation::{validate_quantity, validate_unit_price};

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type Patch = (); // Orders are never edited after creation
    type Action = OrderAction;
    type ActionResult = OrderActionResult;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order, snapshotting the total from the unit price.
    ///
    /// # Errors
    /// Rejects a zero quantity or a non-positive unit price.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, String> {
        validate_quantity(params.quantity)?;
        validate_unit_price(params.unit_price)?;
        Ok(Self {
            id,
            total_price: params.unit_price * rust_decimal::Decimal::from(params.quantity),
            product_id: params.product_id,
            product_name: params.product_name,
            quantity: params.quantity,
            unit_price: params.unit_price,
            requester_id: params.requester_id,
            requester_name: params.requester_name,
            status: params.status,
            created_at: params.created_at,
            approved_at: None,
            approved_by: None,
        })
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), String> {
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, String> {
        match action {
            OrderAction::Approve { approver_id, at } => {
                if self.status == OrderStatus::Approved {
                    return Ok(OrderActionResult::Approve(false));
                }
                self.status = OrderStatus::Approved;
                self.approved_at = Some(at);
                self.approved_by = Some(approver_id);
                Ok(OrderActionResult::Approve(true))
            }
        }
    }
}
