use crate::actor_framework::Entity;
use crate::domain::{StockIntake, StockIntakeCreate};
use crate::validation::{validate_name, validate_quantity, validate_unit_price};

impl Entity for StockIntake {
    type Id = String;
    type CreateParams = StockIntakeCreate;
    type Patch = ();
    type Action = ();
    type ActionResult = ();

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, params: StockIntakeCreate) -> Result<Self, String> {
        validate_name(&params.product_name)?;
        validate_quantity(params.quantity)?;
        validate_unit_price(params.unit_price)?;
        Ok(Self {
            id,
            product_name: params.product_name,
            category: params.category,
            quantity: params.quantity,
            unit_price: params.unit_price,
            uploaded_at: params.uploaded_at,
        })
    }

    /// Intake records are immutable.
    fn on_update(&mut self, _patch: ()) -> Result<(), String> {
        Err(format!("Stock intake {} cannot be edited", self.id))
    }

    fn on_delete(&self) -> Result<(), String> {
        Err(format!("Stock intake {} cannot be deleted", self.id))
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), String> {
        Ok(())
    }
}
