//! Checkout controller.
//!
//! [`CheckoutController`] owns the cart, the checkout form, the step machine
//! and the selected shipping method. Editing and navigation take `&mut self`
//! and run one at a time; placing an order takes `&self` and is guarded by a
//! busy flag so a second submission while one is pending is ignored.
//!
//! Orders are only placed from Review, and at most once per controller.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use sheetline_core::cart::Cart;
use sheetline_core::checkout::{
    Advance, CheckoutFlow, CheckoutForm, CheckoutStep, Country, Field, FieldErrors, PaymentMethod,
};
use sheetline_core::order::{Order, OrderError, OrderNumber};
use sheetline_core::pricing::{OrderTotals, PricingPolicy, ShippingMethod};
use tracing::instrument;

use crate::error::{SubmitError, add_breadcrumb};
use crate::processor::{OrderProcessor, OrderReceipt};
use crate::session::{OrderStore, StoreError};

/// Where the view layer should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The order confirmation page for a placed order.
    Confirmation { order_id: OrderNumber },
}

impl Navigation {
    /// Render as a path with query string.
    #[must_use]
    pub fn to_path(&self) -> String {
        match self {
            Self::Confirmation { order_id } => format!(
                "/checkout/confirmation?orderId={}",
                urlencoding::encode(order_id.as_str())
            ),
        }
    }
}

/// Toast styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Destructive,
}

/// A transient, dismissable notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: &'static str,
    pub description: &'static str,
    pub variant: ToastVariant,
}

impl Toast {
    /// Shown when an order could not be processed.
    pub const ORDER_FAILED: Self = Self {
        title: "Error",
        description: "There was a problem processing your order. Please try again.",
        variant: ToastVariant::Destructive,
    };

    /// Shown when the shopper submits with nothing in the cart.
    pub const EMPTY_CART: Self = Self {
        title: "Your cart is empty",
        description: "Add a product to your cart before placing an order.",
        variant: ToastVariant::Destructive,
    };
}

/// Result of [`CheckoutController::place_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The order was processed and stored.
    Confirmed {
        order: Box<Order>,
        receipt: OrderReceipt,
        navigation: Navigation,
    },
    /// Processing failed; checkout state is unchanged and the order can be retried.
    Failed(Toast),
    /// Checkout details no longer validate; nothing was submitted.
    Invalid(FieldErrors),
    /// Another submission is still pending.
    Ignored,
    /// The shopper has not reached Review; nothing was submitted.
    NotAtReview(CheckoutStep),
    /// This checkout already placed an order.
    AlreadyPlaced(OrderNumber),
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives a single checkout from shipping details to a placed order.
#[derive(Debug)]
pub struct CheckoutController<P, S> {
    cart: Cart,
    form: CheckoutForm,
    flow: CheckoutFlow,
    shipping_method: ShippingMethod,
    policy: PricingPolicy,
    processor: P,
    store: S,
    submitting: AtomicBool,
    placed: OnceLock<OrderNumber>,
}

impl<P, S> CheckoutController<P, S>
where
    P: OrderProcessor,
    S: OrderStore,
{
    /// Create a controller for `cart` with default pricing.
    pub fn new(cart: Cart, processor: P, store: S) -> Self {
        Self::with_policy(cart, PricingPolicy::default(), processor, store)
    }

    /// Create a controller with explicit pricing.
    pub fn with_policy(cart: Cart, policy: PricingPolicy, processor: P, store: S) -> Self {
        Self {
            cart,
            form: CheckoutForm::default(),
            flow: CheckoutFlow::new(),
            shipping_method: ShippingMethod::default(),
            policy,
            processor,
            store,
            submitting: AtomicBool::new(false),
            placed: OnceLock::new(),
        }
    }

    /// Begin a new checkout, forgetting any previously placed order.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be updated.
    pub async fn start(&self) -> Result<(), StoreError> {
        self.store.clear_last_order().await?;
        add_breadcrumb("checkout", "Started checkout", None);
        tracing::info!(items = self.cart.len(), "Checkout started");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Cart edits made during checkout are reflected in the totals.
    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    #[must_use]
    pub const fn form(&self) -> &CheckoutForm {
        &self.form
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.flow.step()
    }

    /// Errors from the last rejected step change.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        self.flow.errors()
    }

    #[must_use]
    pub const fn shipping_method(&self) -> ShippingMethod {
        self.shipping_method
    }

    #[must_use]
    pub const fn processor(&self) -> &P {
        &self.processor
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether an order is currently being placed.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// The order placed by this checkout, if any.
    #[must_use]
    pub fn placed_order(&self) -> Option<&OrderNumber> {
        self.placed.get()
    }

    /// Current order summary.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        self.cart.totals(&self.policy, self.shipping_method)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Set a form field and clear its pending error.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
        self.flow.clear_error(field);
    }

    pub const fn select_shipping(&mut self, method: ShippingMethod) {
        self.shipping_method = method;
    }

    pub const fn select_country(&mut self, country: Country) {
        self.form.country = country;
    }

    /// Choose how to pay. Switching to `PayPal` drops card errors.
    pub fn select_payment(&mut self, method: PaymentMethod) {
        self.form.payment_method = method;
        if !method.requires_card() {
            for field in [Field::CardNumber, Field::CardExpiry, Field::CardCvc, Field::NameOnCard] {
                self.flow.clear_error(field);
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Move to the next step if the current one validates.
    pub fn next_step(&mut self) -> Advance {
        let outcome = self.flow.advance(&self.form);
        match &outcome {
            Advance::Moved { from, to } => {
                tracing::info!(%from, %to, "Checkout step advanced");
                add_breadcrumb("checkout", "Advanced step", Some(&[("step", to.label())]));
            }
            Advance::Rejected(errors) => {
                tracing::warn!(step = %self.flow.step(), errors = %errors, "Checkout step rejected");
            }
            Advance::AtReview => {}
        }
        outcome
    }

    /// Go back one step. Always allowed until the order is placed.
    pub fn back(&mut self) -> CheckoutStep {
        if self.placed.get().is_some() {
            return self.flow.step();
        }
        self.flow.back()
    }

    /// Show errors returned by a failed submission.
    pub fn show_errors(&mut self, errors: FieldErrors) {
        self.flow.show_errors(errors);
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Place the order.
    ///
    /// Only allowed on Review. Re-validates every step, snapshots the order,
    /// hands it to the processor and stores it in the session for the
    /// confirmation page. Cart, form and step are never modified, so an
    /// attempt the processor did not accept can simply be retried. Once the
    /// processor accepts an order the checkout is finished.
    #[instrument(skip(self), fields(items = self.cart.len(), shipping = %self.shipping_method))]
    pub async fn place_order(&self) -> SubmitOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.submitting) else {
            tracing::debug!("Order submission already in progress");
            return SubmitOutcome::Ignored;
        };

        if let Some(order_id) = self.placed.get() {
            tracing::debug!(%order_id, "Order already placed");
            return SubmitOutcome::AlreadyPlaced(order_id.clone());
        }

        let step = self.flow.step();
        if step != CheckoutStep::Review {
            tracing::warn!(%step, "Order submitted before review");
            return SubmitOutcome::NotAtReview(step);
        }

        add_breadcrumb("checkout", "Placing order", None);

        match self.submit().await {
            Ok((order, receipt)) => {
                self.placed.get_or_init(|| order.id().clone());

                // The processor has the order; a lost session write only
                // leaves the confirmation page pending.
                if let Err(err) = self.store.save_last_order(&order).await {
                    SubmitError::from(err).report();
                }

                tracing::info!(
                    order_id = %order.id(),
                    transaction_id = %receipt.transaction_id,
                    total = %order.total(),
                    "Order placed"
                );
                let navigation = Navigation::Confirmation {
                    order_id: order.id().clone(),
                };
                SubmitOutcome::Confirmed {
                    order: Box::new(order),
                    receipt,
                    navigation,
                }
            }
            Err(SubmitError::Order(OrderError::Invalid(errors))) => {
                tracing::warn!(errors = %errors, "Order failed validation");
                SubmitOutcome::Invalid(errors)
            }
            Err(err @ SubmitError::Order(OrderError::EmptyCart)) => {
                err.report();
                SubmitOutcome::Failed(Toast::EMPTY_CART)
            }
            Err(err) => {
                err.report();
                SubmitOutcome::Failed(Toast::ORDER_FAILED)
            }
        }
    }

    async fn submit(&self) -> Result<(Order, OrderReceipt), SubmitError> {
        let id = OrderNumber::generate(&mut rand::rng());
        let order = Order::snapshot(
            id,
            &self.cart,
            &self.form,
            self.shipping_method,
            &self.policy,
            Utc::now(),
        )?;

        let receipt = self.processor.process(&order).await?;
        Ok((order, receipt))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use sheetline_core::cart::LineItem;
    use sheetline_core::checkout::validate::{INVALID_EMAIL, REQUIRED};
    use sheetline_core::{Money, ProductId};
    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::processor::{FailureMode, SimulatedProcessor};

    type Controller = CheckoutController<SimulatedProcessor, Session>;

    fn cart() -> Cart {
        [
            LineItem::new(
                ProductId::new(3),
                "Black Acrylic Sheet",
                "5mm thickness • 4'×8'",
                Money::from_cents(8999),
                2,
            )
            .unwrap(),
            LineItem::new(
                ProductId::new(2),
                "Frosted Acrylic Sheet",
                "3mm thickness • 4'×8'",
                Money::from_cents(6999),
                1,
            )
            .unwrap(),
        ]
        .into_iter()
        .collect()
    }

    fn controller(failure: FailureMode) -> Controller {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        CheckoutController::new(
            cart(),
            SimulatedProcessor::new(Duration::from_millis(1500), failure),
            session,
        )
    }

    fn fill_shipping<P: OrderProcessor, S: OrderStore>(c: &mut CheckoutController<P, S>) {
        c.set_field(Field::FirstName, "Jane");
        c.set_field(Field::LastName, "Doe");
        c.set_field(Field::Email, "jane@example.com");
        c.set_field(Field::Phone, "(555) 123-4567");
        c.set_field(Field::Address, "123 Main St");
        c.set_field(Field::City, "New York");
        c.set_field(Field::Zip, "10001");
    }

    fn fill_card<P: OrderProcessor, S: OrderStore>(c: &mut CheckoutController<P, S>) {
        c.set_field(Field::CardNumber, "1234 5678 9012 3456");
        c.set_field(Field::CardExpiry, "12/28");
        c.set_field(Field::CardCvc, "123");
        c.set_field(Field::NameOnCard, "Jane Doe");
    }

    fn at_review(failure: FailureMode) -> Controller {
        let mut c = controller(failure);
        fill_shipping(&mut c);
        fill_card(&mut c);
        for _ in 0..3 {
            assert!(matches!(c.next_step(), Advance::Moved { .. }));
        }
        assert_eq!(c.step(), CheckoutStep::Review);
        c
    }

    #[test]
    fn test_navigation_path() {
        let nav = Navigation::Confirmation {
            order_id: "ORD-123456".parse().unwrap(),
        };
        assert_eq!(nav.to_path(), "/checkout/confirmation?orderId=ORD-123456");
    }

    #[test]
    fn test_editing_clears_field_error() {
        let mut c = controller(FailureMode::Never);
        c.set_field(Field::Email, "not-an-email");
        assert!(matches!(c.next_step(), Advance::Rejected(_)));
        assert_eq!(c.errors().get(Field::Email), Some(INVALID_EMAIL));
        assert_eq!(c.errors().get(Field::City), Some(REQUIRED));

        c.set_field(Field::Email, "a@b.com");
        assert!(!c.errors().contains(Field::Email));
        assert!(c.errors().contains(Field::City));
    }

    #[test]
    fn test_switching_to_paypal_clears_card_errors() {
        let mut c = controller(FailureMode::Never);
        fill_shipping(&mut c);
        c.next_step();
        c.next_step();
        assert!(matches!(c.next_step(), Advance::Rejected(_)));
        assert!(c.errors().contains(Field::CardNumber));

        c.select_payment(PaymentMethod::PayPal);
        assert!(c.errors().is_empty());
        assert!(matches!(c.next_step(), Advance::Moved { to: CheckoutStep::Review, .. }));
    }

    #[test]
    fn test_totals_follow_shipping_selection() {
        let mut c = controller(FailureMode::Never);
        assert_eq!(c.totals().total, Money::from_cents(26747));
        c.select_shipping(ShippingMethod::Express);
        assert_eq!(c.totals().shipping, Money::from_dollars(35));
        assert_eq!(c.totals().total, Money::from_cents(30247));

        c.cart_mut().remove_item(ProductId::new(3));
        c.select_shipping(ShippingMethod::Standard);
        assert_eq!(c.totals().shipping, Money::from_dollars(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_place_order_stores_snapshot() {
        let c = at_review(FailureMode::Never);
        let outcome = c.place_order().await;

        let SubmitOutcome::Confirmed {
            order,
            receipt,
            navigation,
        } = outcome
        else {
            panic!("expected confirmation, got {outcome:?}");
        };
        assert_eq!(&receipt.order_id, order.id());
        assert_eq!(order.total(), Money::from_cents(26747));
        assert_eq!(order.payment().last_four.as_deref(), Some("3456"));
        assert_eq!(
            navigation.to_path(),
            format!("/checkout/confirmation?orderId={}", order.id())
        );

        let stored = c.store().take_last_order().await.unwrap();
        assert_eq!(stored.as_ref(), Some(order.as_ref()));
        assert!(!c.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submit_while_pending_is_ignored() {
        let c = at_review(FailureMode::Never);
        let (first, second) = tokio::join!(c.place_order(), c.place_order());

        assert!(matches!(first, SubmitOutcome::Confirmed { .. }));
        assert_eq!(second, SubmitOutcome::Ignored);
        assert_eq!(c.processor().calls(), 1);
        assert!(!c.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submit_leaves_state_for_retry() {
        let c = at_review(FailureMode::Always);
        let outcome = c.place_order().await;

        assert_eq!(outcome, SubmitOutcome::Failed(Toast::ORDER_FAILED));
        assert_eq!(c.step(), CheckoutStep::Review);
        assert_eq!(c.cart().len(), 2);
        assert_eq!(c.form().first_name, "Jane");
        assert!(c.store().take_last_order().await.unwrap().is_none());
        assert!(!c.is_submitting());

        // The busy flag was released, so a retry reaches the processor again.
        assert_eq!(c.place_order().await, SubmitOutcome::Failed(Toast::ORDER_FAILED));
        assert_eq!(c.processor().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_revalidates_earlier_steps() {
        let mut c = at_review(FailureMode::Never);
        c.set_field(Field::Zip, "ABCDE");

        let SubmitOutcome::Invalid(errors) = c.place_order().await else {
            panic!("expected validation failure");
        };
        assert!(errors.contains(Field::Zip));
        assert_eq!(c.processor().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cart_is_not_submitted() {
        let mut c = at_review(FailureMode::Never);
        c.cart_mut().clear();
        assert_eq!(c.place_order().await, SubmitOutcome::Failed(Toast::EMPTY_CART));
        assert_eq!(c.processor().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_before_review_is_refused() {
        let mut c = controller(FailureMode::Never);
        fill_shipping(&mut c);
        c.select_payment(PaymentMethod::PayPal);

        assert_eq!(
            c.place_order().await,
            SubmitOutcome::NotAtReview(CheckoutStep::Shipping)
        );
        c.next_step();
        assert_eq!(
            c.place_order().await,
            SubmitOutcome::NotAtReview(CheckoutStep::Delivery)
        );
        assert_eq!(c.processor().calls(), 0);
        assert!(c.store().take_last_order().await.unwrap().is_none());
        assert!(c.placed_order().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_placed_checkout_is_finished() {
        let mut c = at_review(FailureMode::Never);
        let SubmitOutcome::Confirmed { order, .. } = c.place_order().await else {
            panic!("expected confirmation");
        };
        assert_eq!(c.placed_order(), Some(order.id()));

        assert_eq!(
            c.place_order().await,
            SubmitOutcome::AlreadyPlaced(order.id().clone())
        );
        assert_eq!(c.back(), CheckoutStep::Review);
        assert_eq!(c.processor().calls(), 1);
    }

    /// Session store whose backend is down.
    #[derive(Debug)]
    struct OfflineStore;

    fn offline() -> StoreError {
        StoreError::Session(tower_sessions::session::Error::Store(
            tower_sessions::session_store::Error::Backend("store offline".to_string()),
        ))
    }

    impl OrderStore for OfflineStore {
        async fn save_last_order(&self, _order: &Order) -> Result<(), StoreError> {
            Err(offline())
        }

        async fn take_last_order(&self) -> Result<Option<Order>, StoreError> {
            Err(offline())
        }

        async fn clear_last_order(&self) -> Result<(), StoreError> {
            Err(offline())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_session_write_still_confirms_once() {
        let mut c = CheckoutController::new(
            cart(),
            SimulatedProcessor::new(Duration::from_millis(1500), FailureMode::Never),
            OfflineStore,
        );
        fill_shipping(&mut c);
        fill_card(&mut c);
        for _ in 0..3 {
            c.next_step();
        }

        let SubmitOutcome::Confirmed { order, .. } = c.place_order().await else {
            panic!("a processed order must be confirmed");
        };
        assert!(!c.is_submitting());

        // Retrying never reaches the processor a second time.
        assert_eq!(
            c.place_order().await,
            SubmitOutcome::AlreadyPlaced(order.id().clone())
        );
        assert_eq!(c.processor().calls(), 1);
    }

    #[tokio::test]
    async fn test_start_clears_previous_order() {
        let c = controller(FailureMode::Never);
        let order = crate::processor::tests::sample_order();
        c.store().save_last_order(&order).await.unwrap();

        c.start().await.unwrap();
        assert!(c.store().take_last_order().await.unwrap().is_none());
    }
}
