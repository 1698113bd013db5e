use super::actions::{ProductAction, ProductActionResult, StockOutcome};
use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, ProductPatch, DEFAULT_LOW_STOCK_THRESHOLD};
use crate::validation::{validate_name, validate_unit_price};

impl Entity for Product {
    type Id = String;
    type CreateParams = ProductCreate;
    type Patch = ProductPatch;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Product from creation parameters.
    ///
    /// # Errors
    /// Rejects an empty name or a non-positive unit price.
    fn from_create_params(id: String, params: ProductCreate) -> Result<Self, String> {
        validate_name(&params.name)?;
        validate_unit_price(params.unit_price)?;
        Ok(Self {
            id,
            name: params.name.trim().to_string(),
            category: params.category,
            unit_price: params.unit_price,
            current_stock: params.current_stock,
            low_stock_threshold: params.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
        })
    }

    /// Applies an admin edit. Every field is validated before any is written.
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), String> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(price) = patch.unit_price {
            validate_unit_price(price)?;
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.unit_price {
            self.unit_price = price;
        }
        if let Some(stock) = patch.current_stock {
            self.current_stock = stock;
        }
        if let Some(threshold) = patch.low_stock_threshold {
            self.low_stock_threshold = threshold;
        }
        Ok(())
    }

    /// Handles stock-affecting actions.
    ///
    /// # Errors
    /// Returns an error only when a replenishment would overflow the stock counter.
    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, String> {
        match action {
            ProductAction::CheckStock => Ok(ProductActionResult::CheckStock(self.current_stock)),
            ProductAction::Decrement(quantity) => {
                let outcome = match self.current_stock.checked_sub(quantity) {
                    Some(remaining) => {
                        self.current_stock = remaining;
                        StockOutcome::Applied { remaining }
                    }
                    None => StockOutcome::Insufficient {
                        requested: quantity,
                        available: self.current_stock,
                    },
                };
                Ok(ProductActionResult::Decrement(outcome))
            }
            ProductAction::Replenish { quantity, unit_price } => {
                validate_unit_price(unit_price)?;
                self.current_stock = self
                    .current_stock
                    .checked_add(quantity)
                    .ok_or_else(|| format!("Stock overflow for product {}", self.id))?;
                self.unit_price = unit_price;
                Ok(ProductActionResult::Replenish(self.current_stock))
            }
        }
    }
}
