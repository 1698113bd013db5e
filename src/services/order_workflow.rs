use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, instrument, warn, Instrument, Span};

use crate::clients::{OrderClient, ProductClient, StockLedger};
use crate::domain::{Order, OrderCreate, OrderStatus, Principal};
use crate::error::{OrderError, ProductError};
use crate::services::notification::{NotificationClient, NotificationEvent};
use crate::validation::{validate_quantity, validate_reference};

#[derive(Debug, Clone, Copy)]
pub struct ApprovalSettings {
    /// Attempts at the status write after a committed decrement.
    pub max_status_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
}

impl Default for ApprovalSettings {
    fn default() -> Self {
        Self {
            max_status_attempts: 5,
            retry_backoff: Duration::from_millis(20),
        }
    }
}

/// Result of an approval request. Both variants are successes.
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalOutcome {
    Approved(Order),
    AlreadyApproved(Order),
}

impl ApprovalOutcome {
    pub fn order(&self) -> &Order {
        match self {
            ApprovalOutcome::Approved(order) | ApprovalOutcome::AlreadyApproved(order) => order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub completed: Vec<String>,
    pub still_pending: Vec<String>,
}

/// A decrement that committed before its status write did.
#[derive(Debug, Clone)]
struct JournalEntry {
    approver_id: String,
    decremented_at: DateTime<Utc>,
}

/// One async mutex per key, created on demand and pruned once unused.
#[derive(Clone, Default)]
struct KeyedLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.to_string()).or_default().clone()
        };
        entry.lock_owned().await
    }
}

/// Order Workflow Manager: request, approval, and the stock decrement behind it.
///
/// Creation checks stock but reserves nothing. Approval re-checks, then
/// decrements through the [`StockLedger`], which is where sufficiency is actually
/// enforced. Approvals of the same order run one at a time.
#[derive(Clone)]
pub struct OrderWorkflow {
    orders: OrderClient,
    products: ProductClient,
    ledger: StockLedger,
    notifications: NotificationClient,
    approvals: KeyedLocks,
    journal: Arc<Mutex<HashMap<String, JournalEntry>>>,
    settings: ApprovalSettings,
}

impl OrderWorkflow {
    pub fn new(
        orders: OrderClient,
        products: ProductClient,
        ledger: StockLedger,
        notifications: NotificationClient,
        settings: ApprovalSettings,
    ) -> Self {
        Self {
            orders,
            products,
            ledger,
            notifications,
            approvals: KeyedLocks::default(),
            journal: Arc::new(Mutex::new(HashMap::new())),
            settings,
        }
    }

    pub async fn create_order(&self, principal: &Principal, product_id: String, quantity: u32) -> Result<Order, OrderError> {
        self.create_order_at(principal, product_id, quantity, Utc::now()).await
    }

    /// Records a pending order stamped with `created_at`.
    ///
    /// # Errors
    /// `InvalidInput` for a zero quantity or malformed reference, `NotFound` when
    /// the product does not resolve, `InsufficientStock` when the catalog shows
    /// less stock than requested right now.
    #[instrument(skip(self, principal), fields(requester = %principal.id))]
    pub async fn create_order_at(
        &self,
        principal: &Principal,
        product_id: String,
        quantity: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        validate_quantity(quantity).map_err(|e| OrderError::InvalidInput(e.to_string()))?;
        validate_reference(&product_id).map_err(|e| OrderError::InvalidInput(e.to_string()))?;

        let product = self.products.require_product(product_id).await?;
        if product.current_stock < quantity {
            warn!(product_id = %product.id, requested = quantity, available = product.current_stock, "Order refused");
            return Err(OrderError::InsufficientStock {
                requested: quantity,
                available: product.current_stock,
            });
        }

        let order = self
            .orders
            .create(OrderCreate {
                product_id: product.id,
                product_name: product.name,
                quantity,
                unit_price: product.unit_price,
                requester_id: principal.id.clone(),
                requester_name: principal.display_name.clone(),
                status: OrderStatus::Pending,
                created_at,
            })
            .await?;

        info!(order_id = %order.id, product_id = %order.product_id, quantity, total_price = %order.total_price, "Order created");
        self.notifications.notify(NotificationEvent::OrderCreated { order: order.clone() });
        Ok(order)
    }

    /// Approves a pending order and decrements its product's stock exactly once.
    ///
    /// Approving an approved order returns [`ApprovalOutcome::AlreadyApproved`]
    /// without side effects. If the decrement commits but the status write keeps
    /// failing, the order is journaled and [`OrderError::Inconsistent`] is
    /// returned; a later approval or [`OrderWorkflow::reconcile_pending`] finishes
    /// the write without decrementing again.
    ///
    /// The decrement and status write run on their own task, so dropping the
    /// returned future does not stop an approval halfway.
    #[instrument(skip(self, principal), fields(approver = %principal.id))]
    pub async fn approve_order(&self, principal: &Principal, order_id: String) -> Result<ApprovalOutcome, OrderError> {
        if !principal.is_admin() {
            warn!("Approval refused for non-admin");
            return Err(OrderError::Forbidden("Only admins can approve orders".into()));
        }
        validate_reference(&order_id).map_err(|e| OrderError::InvalidInput(e.to_string()))?;

        let workflow = self.clone();
        let approver_id = principal.id.clone();
        tokio::spawn(async move { workflow.run_approval(approver_id, order_id).await }.instrument(Span::current()))
            .await
            .map_err(|e| OrderError::ActorCommunicationError(format!("Approval task failed: {}", e)))?
    }

    async fn run_approval(&self, approver_id: String, order_id: String) -> Result<ApprovalOutcome, OrderError> {
        let _guard = self.approvals.lock(&order_id).await;

        let order = self.orders.require_order(order_id.clone()).await?;
        if order.is_approved() {
            self.forget(&order.id);
            info!(order_id = %order.id, "Order already approved");
            return Ok(ApprovalOutcome::AlreadyApproved(order));
        }

        let entry = match self.journaled(&order.id) {
            Some(entry) => {
                info!(order_id = %order.id, "Resuming journaled approval");
                entry
            }
            None => {
                let product = self.products.require_product(order.product_id.clone()).await?;
                if product.current_stock < order.quantity {
                    warn!(order_id = %order.id, requested = order.quantity, available = product.current_stock, "Approval refused");
                    return Err(OrderError::InsufficientStock {
                        requested: order.quantity,
                        available: product.current_stock,
                    });
                }

                let entry = JournalEntry {
                    approver_id,
                    decremented_at: Utc::now(),
                };
                match self.ledger.decrement(order.product_id.clone(), order.quantity).await {
                    Ok(remaining) => {
                        info!(order_id = %order.id, remaining_stock = remaining, "Stock committed for order");
                        self.journal_lock().insert(order.id.clone(), entry.clone());
                    }
                    // The store may have applied the decrement before the reply was lost.
                    Err(ProductError::OutcomeUnknown(reason)) => {
                        error!(order_id = %order.id, reason = %reason, "Decrement outcome unknown, journaling as committed");
                        self.journal_lock().insert(order.id.clone(), entry);
                        return Err(OrderError::Inconsistent {
                            order_id: order.id,
                            reason: format!("decrement outcome unknown: {}", reason),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
                entry
            }
        };

        let approved = self.finish_status_write(order, entry).await?;
        Ok(ApprovalOutcome::Approved(approved))
    }

    /// Retries the status write of every journaled approval.
    #[instrument(skip(self))]
    pub async fn reconcile_pending(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for order_id in self.pending_reconciliation() {
            let _guard = self.approvals.lock(&order_id).await;
            let Some(entry) = self.journaled(&order_id) else {
                continue;
            };

            let result = match self.orders.require_order(order_id.clone()).await {
                Ok(order) if order.is_approved() => {
                    self.forget(&order_id);
                    Ok(())
                }
                Ok(order) => self.finish_status_write(order, entry).await.map(|_| ()),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.completed.push(order_id),
                Err(e) => {
                    warn!(order_id = %order_id, error = %e, "Reconciliation still pending");
                    report.still_pending.push(order_id);
                }
            }
        }
        info!(completed = report.completed.len(), still_pending = report.still_pending.len(), "Reconciliation pass finished");
        report
    }

    /// Order ids whose stock was (or may have been) decremented but whose status
    /// is not yet approved.
    pub fn pending_reconciliation(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.journal_lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every order, newest first. Admin only.
    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn list_all_orders(&self, principal: &Principal) -> Result<Vec<Order>, OrderError> {
        if !principal.is_admin() {
            return Err(OrderError::Forbidden("Only admins can manage orders".into()));
        }
        self.orders.orders_newest_first().await
    }

    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn my_orders(&self, principal: &Principal) -> Result<Vec<Order>, OrderError> {
        self.orders.orders_for_requester(principal.id.clone()).await
    }

    async fn finish_status_write(&self, mut order: Order, entry: JournalEntry) -> Result<Order, OrderError> {
        let attempts = self.settings.max_status_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self
                .orders
                .mark_approved(order.id.clone(), entry.approver_id.clone(), entry.decremented_at)
                .await
            {
                Ok(_) => {
                    self.forget(&order.id);
                    order.status = OrderStatus::Approved;
                    order.approved_at = Some(entry.decremented_at);
                    order.approved_by = Some(entry.approver_id);
                    info!(order_id = %order.id, attempt, "Order approved");
                    self.notifications.notify(NotificationEvent::OrderApproved { order: order.clone() });
                    return Ok(order);
                }
                Err(e) => {
                    warn!(order_id = %order.id, attempt, error = %e, "Status write failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                    }
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        error!(order_id = %order.id, reason = %reason, "Stock decremented but order still pending");
        Err(OrderError::Inconsistent {
            order_id: order.id,
            reason,
        })
    }

    fn journal_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, JournalEntry>> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn journaled(&self, order_id: &str) -> Option<JournalEntry> {
        self.journal_lock().get(order_id).cloned()
    }

    fn forget(&self, order_id: &str) {
        self.journal_lock().remove(order_id);
    }
}
