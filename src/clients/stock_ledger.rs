use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{Principal, Product, ProductCreate, StockIntake, StockIntakeCreate};
use crate::error::ProductError;
use crate::product_actor::{ProductAction, ProductActionResult, StockOutcome};
use crate::validation::{validate_name, validate_quantity, validate_unit_price};

/// One stock upload: the product is matched by name, not by id.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplenishRequest {
    pub product_name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct Replenishment {
    pub intake: StockIntake,
    pub product: Product,
    /// `true` when no product carried the name and a new one was created.
    pub created: bool,
}

/// All stock movements go through here.
///
/// Both directions are single product-store actions, so a decrement and a
/// replenishment against the same product are applied one after the other and
/// neither can lose the other's write.
#[derive(Clone)]
pub struct StockLedger {
    products: ResourceClient<Product>,
    intakes: ResourceClient<StockIntake>,
    default_low_stock_threshold: u32,
}

impl StockLedger {
    pub fn new(
        products: ResourceClient<Product>,
        intakes: ResourceClient<StockIntake>,
        default_low_stock_threshold: u32,
    ) -> Self {
        Self {
            products,
            intakes,
            default_low_stock_threshold,
        }
    }

    /// Compare-and-decrement. Returns the remaining stock.
    ///
    /// # Errors
    /// [`ProductError::InsufficientStock`] when the stock at the moment of
    /// execution is below `quantity`; nothing is written in that case.
    /// [`ProductError::OutcomeUnknown`] when the request was sent but no reply
    /// came back, so the stock may or may not have moved.
    #[instrument(skip(self))]
    pub async fn decrement(&self, product_id: String, quantity: u32) -> Result<u32, ProductError> {
        validate_quantity(quantity).map_err(|e| ProductError::InvalidInput(e.to_string()))?;
        debug!("Sending request");
        let result = self
            .products
            .perform_action(product_id.clone(), ProductAction::Decrement(quantity))
            .await
            .map_err(|e| match e {
                FrameworkError::ActorDropped => {
                    ProductError::OutcomeUnknown(format!("no reply to decrement of {}", product_id))
                }
                other => ProductError::from(other),
            })?;
        match result {
            ProductActionResult::Decrement(StockOutcome::Applied { remaining }) => {
                info!(product_id = %product_id, quantity, remaining_stock = remaining, "Stock decremented");
                Ok(remaining)
            }
            ProductActionResult::Decrement(StockOutcome::Insufficient { requested, available }) => {
                warn!(product_id = %product_id, requested, available, "Decrement refused");
                Err(ProductError::InsufficientStock { requested, available })
            }
            other => Err(ProductError::ActorCommunicationError(format!("Unexpected result: {:?}", other))),
        }
    }

    /// Logs the upload, then merges it into the catalog by product name.
    ///
    /// An existing product gains `quantity` and takes the new price; an unknown
    /// name becomes a new product with the default low-stock threshold.
    #[instrument(skip(self, principal, request), fields(principal_id = %principal.id, product_name = %request.product_name))]
    pub async fn replenish(&self, principal: &Principal, request: ReplenishRequest) -> Result<Replenishment, ProductError> {
        if !principal.is_admin() {
            warn!("Replenishment refused for non-admin");
            return Err(ProductError::Forbidden("Only admins can upload stock".into()));
        }
        validate_name(&request.product_name).map_err(|e| ProductError::InvalidInput(e.to_string()))?;
        validate_quantity(request.quantity).map_err(|e| ProductError::InvalidInput(e.to_string()))?;
        validate_unit_price(request.unit_price).map_err(|e| ProductError::InvalidInput(e.to_string()))?;

        let name = request.product_name.trim().to_string();
        let intake = self
            .intakes
            .create(StockIntakeCreate {
                product_name: name.clone(),
                category: request.category.clone(),
                quantity: request.quantity,
                unit_price: request.unit_price,
                uploaded_at: Utc::now(),
            })
            .await?;
        debug!(intake_id = %intake.id, "Intake logged");

        let create = ProductCreate {
            name: name.clone(),
            category: request.category,
            unit_price: request.unit_price,
            current_stock: request.quantity,
            low_stock_threshold: Some(self.default_low_stock_threshold),
        };
        let merge = ProductAction::Replenish {
            quantity: request.quantity,
            unit_price: request.unit_price,
        };
        let key = name.clone();
        let upserted = self
            .products
            .upsert_by(move |p: &Product| p.name == key, create, merge)
            .await
            .map_err(|e| match ProductError::from(e) {
                ProductError::DuplicateName(_) => ProductError::DuplicateName(name.clone()),
                other => other,
            })?;

        info!(
            intake_id = %intake.id,
            product_id = %upserted.entity.id,
            current_stock = upserted.entity.current_stock,
            created = upserted.created,
            "Stock logged and catalog synced"
        );
        Ok(Replenishment {
            intake,
            product: upserted.entity,
            created: upserted.created,
        })
    }
}
