use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::domain::{Principal, Product, ProductCreate, ProductPatch};
use crate::error::ProductError;
use crate::product_actor::{ProductAction, ProductActionResult};
use crate::validation::{validate_name, validate_reference, validate_unit_price};

/// Handle to the catalog store.
///
/// Reads are open to everyone; creating, editing and deleting products is an
/// admin capability. Stock movements go through [`crate::clients::StockLedger`].
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

impl_basic_client!(ProductClient, Product, ProductError, product);

fn ensure_admin(principal: &Principal, action: &str) -> Result<(), ProductError> {
    if principal.is_admin() {
        Ok(())
    } else {
        warn!(principal_id = %principal.id, action, "Admin capability required");
        Err(ProductError::Forbidden(format!("Only admins can {}", action)))
    }
}

impl ProductClient {
    /// Looks up a product and turns a miss into [`ProductError::NotFound`].
    #[instrument(skip(self))]
    pub async fn require_product(&self, id: String) -> Result<Product, ProductError> {
        validate_reference(&id).map_err(|e| ProductError::InvalidInput(e.to_string()))?;
        self.get_product(id.clone())
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: String) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::CheckStock).await? {
            ProductActionResult::CheckStock(level) => Ok(level),
            other => Err(ProductError::ActorCommunicationError(format!("Unexpected result: {:?}", other))),
        }
    }

    /// Adds a product. Names must be unique because stock uploads merge on them.
    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn create_product(&self, principal: &Principal, params: ProductCreate) -> Result<Product, ProductError> {
        ensure_admin(principal, "add products")?;
        validate_name(&params.name).map_err(|e| ProductError::InvalidInput(e.to_string()))?;
        validate_unit_price(params.unit_price).map_err(|e| ProductError::InvalidInput(e.to_string()))?;

        let name = params.name.trim().to_string();
        let product = self
            .inner
            .create_unique(params, {
                let name = name.clone();
                move |existing: &Product| existing.name == name
            })
            .await
            .map_err(|e| match ProductError::from(e) {
                ProductError::DuplicateName(_) => ProductError::DuplicateName(name.clone()),
                other => other,
            })?;

        info!(product_id = %product.id, product_name = %product.name, "Product created");
        Ok(product)
    }

    /// Applies an admin edit. A rename is refused when another product already
    /// carries the new name; the check and the write are one store request.
    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn update_product(
        &self,
        principal: &Principal,
        id: String,
        patch: ProductPatch,
    ) -> Result<Product, ProductError> {
        ensure_admin(principal, "update products")?;

        let product = match patch.name.as_deref().map(|n| n.trim().to_string()) {
            Some(wanted) => self
                .inner
                .update_unique(id, patch, |patched: &Product, other: &Product| patched.name == other.name)
                .await
                .map_err(|e| match ProductError::from(e) {
                    ProductError::DuplicateName(_) => ProductError::DuplicateName(wanted.clone()),
                    other => other,
                })?,
            None => self.inner.update(id, patch).await?,
        };
        info!(product_id = %product.id, current_stock = product.current_stock, "Product updated");
        Ok(product)
    }

    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn delete_product(&self, principal: &Principal, id: String) -> Result<(), ProductError> {
        ensure_admin(principal, "delete products")?;
        self.inner.delete(id.clone()).await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Products at or below their low-stock threshold, in catalog order.
    #[instrument(skip(self))]
    pub async fn low_stock_products(&self) -> Result<Vec<Product>, ProductError> {
        debug!("Sending request");
        Ok(self.inner.query(|p: &Product| p.is_low_stock()).await?)
    }
}
