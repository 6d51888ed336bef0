//! COD order placement workflow.
//!
//! The one genuinely stateful interaction in this service: create a draft
//! order, attempt to complete it into a payment-pending order, and when the
//! completion call does not return a definitive result, reconcile against
//! the recent-orders listing so the caller always receives either a
//! concrete order reference or an explicit fallback reference.
//!
//! # Failure semantics
//!
//! Validation and the credential lookup fail before any upstream call.
//! Draft creation is the only hard-fail boundary after that; completion,
//! reconciliation, and the status-URL lookup are best-effort and downgrade
//! to the [`CodOrderOutcome::Unlocated`] outcome instead of propagating.
//! Nothing is retried; a partial failure can leave an orphaned draft
//! upstream, which is an accepted limitation of a single-attempt workflow.

mod matcher;

pub use matcher::{MatchContext, best_cod_match};

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{instrument, warn};

use codrelay_core::{Email, Phone, ShopDomain};

use crate::config::{CodConfig, OrderApiMode};
use crate::db::{CredentialStore, StoreError};
use crate::shopify::types::{
    AddressPayload, CustomerPayload, DraftOrderPayload, LineItemPayload, Order,
};
use crate::shopify::{ShopifyClient, ShopifyError, UpstreamConfig};

/// Tag applied to every order created by this workflow.
pub const COD_TAG: &str = "COD";

/// Note applied to every order created by this workflow.
pub const COD_NOTE: &str = "COD Draft Order";

/// Page size for the reconciliation listing.
const RECENT_ORDERS_LIMIT: u32 = 25;

/// Fields fetched when loading an order after completion.
const ORDER_LOOKUP_FIELDS: &[&str] = &["id", "order_number", "order_status_url"];

/// Inbound order-placement request.
///
/// Every field is optional at the serde layer so that missing input is
/// reported by [`OrderRequest::validate`] as a [`PlaceOrderError::Validation`]
/// naming the fields, rather than as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderRequest {
    pub shop_domain: Option<String>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub variant_id: Option<i64>,
    pub quantity: Option<i64>,
}

/// A request that passed validation.
struct ValidOrder {
    shop: ShopDomain,
    customer_name: String,
    phone: Phone,
    email: Option<Email>,
    address1: String,
    address2: String,
    city: String,
    province: String,
    postal_code: String,
    variant_id: i64,
    quantity: i64,
}

impl OrderRequest {
    /// Validate the request, naming every missing or blank field.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::Validation` listing the missing fields, or
    /// `PlaceOrderError::InvalidField` when a present field fails to parse.
    fn validate(self) -> Result<ValidOrder, PlaceOrderError> {
        let Self {
            shop_domain,
            customer_name,
            phone,
            email,
            address1,
            address2,
            city,
            province,
            postal_code,
            variant_id,
            quantity,
        } = self;

        let mut missing = Vec::new();

        let shop_domain = required_text(shop_domain, "shopDomain", &mut missing);
        let customer_name = required_text(customer_name, "customerName", &mut missing);
        let phone = required_text(phone, "phone", &mut missing);
        let address1 = required_text(address1, "address1", &mut missing);
        let city = required_text(city, "city", &mut missing);
        let province = required_text(province, "province", &mut missing);
        let postal_code = required_text(postal_code, "postalCode", &mut missing);

        let variant_id = variant_id.filter(|id| *id >= 1);
        if variant_id.is_none() {
            missing.push("variantId");
        }

        let quantity = quantity.filter(|q| *q >= 1);
        if quantity.is_none() {
            missing.push("quantity");
        }

        let (
            Some(shop_domain),
            Some(customer_name),
            Some(phone),
            Some(address1),
            Some(city),
            Some(province),
            Some(postal_code),
            Some(variant_id),
            Some(quantity),
        ) = (
            shop_domain,
            customer_name,
            phone,
            address1,
            city,
            province,
            postal_code,
            variant_id,
            quantity,
        )
        else {
            return Err(PlaceOrderError::Validation { missing });
        };

        let shop = ShopDomain::parse(&shop_domain).map_err(|e| PlaceOrderError::InvalidField {
            field: "shopDomain",
            reason: e.to_string(),
        })?;

        let phone = Phone::parse(&phone).map_err(|e| PlaceOrderError::InvalidField {
            field: "phone",
            reason: e.to_string(),
        })?;

        let email = match email.map(|e| e.trim().to_owned()).filter(|e| !e.is_empty()) {
            Some(raw) => Some(Email::parse(&raw).map_err(|e| PlaceOrderError::InvalidField {
                field: "email",
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(ValidOrder {
            shop,
            customer_name,
            phone,
            email,
            address1,
            address2: address2
                .map(|a| a.trim().to_owned())
                .unwrap_or_default(),
            city,
            province,
            postal_code,
            variant_id,
            quantity,
        })
    }
}

fn required_text(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
    if value.is_none() {
        missing.push(name);
    }
    value
}

/// Errors terminating the workflow before a usable reference exists.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// Required fields are missing or blank. No upstream call was made.
    #[error("missing required fields: {}", missing.join(", "))]
    Validation {
        /// Wire names of the missing fields.
        missing: Vec<&'static str>,
    },

    /// A supplied field failed to parse. No upstream call was made.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// The shop has no stored credential. No upstream call was made.
    #[error("no access token stored for {shop}")]
    Unauthorized {
        /// The shop that is not installed.
        shop: String,
    },

    /// Order creation failed before anything usable existed upstream.
    #[error("order creation failed: {0}")]
    OrderCreation(#[source] ShopifyError),

    /// Credential store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Terminal result of a successful workflow invocation.
///
/// The two variants are never collapsed into each other: `Unlocated` is a
/// success whose reference is explicitly unconfirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodOrderOutcome {
    /// A concrete order was located.
    Resolved {
        order_id: i64,
        order_number: Option<i64>,
        /// Customer-facing status URL, falling back to the draft's invoice
        /// URL when the status lookup fails.
        status_url: Option<String>,
    },
    /// The draft was created and (believed) completed, but no matching
    /// order could be found; the draft is the best available reference.
    Unlocated {
        draft_order_id: i64,
        invoice_url: Option<String>,
    },
}

/// Result of the completion call, modeled explicitly so the fallback path
/// is a deliberate state transition rather than an exception handler.
#[derive(Debug)]
enum CompletionOutcome {
    /// Completion returned the real order's ID.
    Completed { order_id: i64 },
    /// Completion was rejected or returned no order reference; the draft
    /// may or may not have become an order.
    AlreadyCompletedOrUnknown,
}

/// The COD order placement service.
pub struct CodOrderService {
    store: Arc<dyn CredentialStore>,
    http: reqwest::Client,
    upstream: UpstreamConfig,
    cod: CodConfig,
}

impl CodOrderService {
    /// Create a new service.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        http: reqwest::Client,
        upstream: UpstreamConfig,
        cod: CodConfig,
    ) -> Self {
        Self {
            store,
            http,
            upstream,
            cod,
        }
    }

    /// Place a COD order.
    ///
    /// # Errors
    ///
    /// See [`PlaceOrderError`]; validation and authorization failures are
    /// guaranteed to happen before any upstream call.
    #[instrument(skip(self, request), fields(shop = tracing::field::Empty))]
    pub async fn place(&self, request: OrderRequest) -> Result<CodOrderOutcome, PlaceOrderError> {
        let order = request.validate()?;
        tracing::Span::current().record("shop", order.shop.as_str());

        let Some(access_token) = self.store.get(&order.shop).await? else {
            return Err(PlaceOrderError::Unauthorized {
                shop: order.shop.to_string(),
            });
        };

        let client = ShopifyClient::for_shop(
            self.http.clone(),
            &self.upstream,
            &order.shop,
            access_token,
        );

        match self.cod.order_api {
            OrderApiMode::Rest => self.place_rest(&client, &order).await,
            OrderApiMode::Graphql => self.place_graphql(&client, &order).await,
        }
    }

    /// Draft-order flow: create, complete, reconcile, resolve status URL.
    async fn place_rest(
        &self,
        client: &ShopifyClient,
        order: &ValidOrder,
    ) -> Result<CodOrderOutcome, PlaceOrderError> {
        let email = self.effective_email(order);

        let payload = build_draft_payload(order, &email, &self.cod.country);
        let draft = client
            .create_draft_order(&payload)
            .await
            .map_err(PlaceOrderError::OrderCreation)?;

        let completion = match client.complete_draft_order(draft.id).await {
            Ok(completed) => match completed.order_id {
                Some(order_id) => CompletionOutcome::Completed { order_id },
                None => CompletionOutcome::AlreadyCompletedOrUnknown,
            },
            Err(e) => {
                warn!(draft_id = draft.id, error = %e, "draft completion inconclusive, reconciling");
                CompletionOutcome::AlreadyCompletedOrUnknown
            }
        };

        let located = match completion {
            CompletionOutcome::Completed { order_id } => {
                match client.get_order(order_id, ORDER_LOOKUP_FIELDS).await {
                    Ok(found) => Some(found),
                    Err(e) => {
                        warn!(order_id, error = %e, "order lookup after completion failed");
                        // The completion gave us a concrete ID even though
                        // the lookup failed; that still resolves the order.
                        return Ok(CodOrderOutcome::Resolved {
                            order_id,
                            order_number: None,
                            status_url: draft.invoice_url,
                        });
                    }
                }
            }
            CompletionOutcome::AlreadyCompletedOrUnknown => {
                self.reconcile(client, &email, order).await
            }
        };

        match located {
            Some(found) => {
                let status_url = Self::resolve_status_url(client, &found, draft.invoice_url).await;
                Ok(CodOrderOutcome::Resolved {
                    order_id: found.id,
                    order_number: found.order_number,
                    status_url,
                })
            }
            None => Ok(CodOrderOutcome::Unlocated {
                draft_order_id: draft.id,
                invoice_url: draft.invoice_url,
            }),
        }
    }

    /// GraphQL flow: customer lookup, then a direct `orderCreate` mutation.
    ///
    /// The mutation returns the order inline, so the reconciliation stages
    /// of the draft flow do not arise here.
    async fn place_graphql(
        &self,
        client: &ShopifyClient,
        order: &ValidOrder,
    ) -> Result<CodOrderOutcome, PlaceOrderError> {
        let email = self.effective_email(order);

        let customer = match client.find_customer_by_email(email.as_str()).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "customer lookup failed, creating order without association");
                None
            }
        };

        let input = build_order_create_input(
            order,
            &email,
            &self.cod.country,
            customer.as_ref().map(|c| c.id.as_str()),
        );

        let created = client
            .create_order(input)
            .await
            .map_err(PlaceOrderError::OrderCreation)?;

        let order_id = created.order_id().ok_or_else(|| {
            PlaceOrderError::OrderCreation(ShopifyError::UserError(
                "no order id in orderCreate response".to_string(),
            ))
        })?;

        Ok(CodOrderOutcome::Resolved {
            order_id,
            order_number: created.order_number(),
            status_url: created.status_page_url,
        })
    }

    /// The email used upstream: the caller's, or the deterministic
    /// placeholder synthesized from the normalized phone.
    fn effective_email(&self, order: &ValidOrder) -> Email {
        order.email.clone().unwrap_or_else(|| {
            Email::cod_placeholder(&order.phone.digits(), &self.cod.email_domain)
        })
    }

    /// Fallback search over the recent-orders listing.
    async fn reconcile(
        &self,
        client: &ShopifyClient,
        email: &Email,
        order: &ValidOrder,
    ) -> Option<Order> {
        let candidates = match client.list_recent_orders(RECENT_ORDERS_LIMIT).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "recent-orders listing failed during reconciliation");
                return None;
            }
        };

        let ctx = MatchContext {
            email: email.as_str(),
            variant_id: order.variant_id,
            quantity: order.quantity,
        };

        best_cod_match(&candidates, &ctx).cloned()
    }

    /// Best-effort status URL resolution: the order's own URL, one extra
    /// lookup by ID, then the draft's invoice URL.
    async fn resolve_status_url(
        client: &ShopifyClient,
        order: &Order,
        invoice_url: Option<String>,
    ) -> Option<String> {
        if order.order_status_url.is_some() {
            return order.order_status_url.clone();
        }

        match client.get_order(order.id, ORDER_LOOKUP_FIELDS).await {
            Ok(full) if full.order_status_url.is_some() => full.order_status_url,
            Ok(_) => invoice_url,
            Err(e) => {
                warn!(order_id = order.id, error = %e, "status URL lookup failed");
                invoice_url
            }
        }
    }
}

/// Build the draft-order payload.
///
/// The customer record carries the normalized phone digits (used for
/// matching upstream); the address records keep the caller's original
/// formatting.
fn build_draft_payload(order: &ValidOrder, email: &Email, country: &str) -> DraftOrderPayload {
    let digits = order.phone.digits();

    let address = AddressPayload {
        first_name: order.customer_name.clone(),
        address1: order.address1.clone(),
        address2: order.address2.clone(),
        city: order.city.clone(),
        province: order.province.clone(),
        zip: order.postal_code.clone(),
        country: country.to_owned(),
        phone: order.phone.as_str().to_owned(),
    };

    DraftOrderPayload {
        line_items: vec![LineItemPayload {
            variant_id: order.variant_id,
            quantity: order.quantity,
        }],
        email: email.as_str().to_owned(),
        phone: digits.clone(),
        customer: CustomerPayload {
            first_name: order.customer_name.clone(),
            email: email.as_str().to_owned(),
            phone: digits,
        },
        shipping_address: address.clone(),
        billing_address: address,
        tags: COD_TAG.to_owned(),
        note: COD_NOTE.to_owned(),
        use_customer_default_address: false,
    }
}

/// Build the `OrderCreateOrderInput` for the GraphQL flow.
fn build_order_create_input(
    order: &ValidOrder,
    email: &Email,
    country: &str,
    customer_gid: Option<&str>,
) -> serde_json::Value {
    let address = serde_json::json!({
        "firstName": order.customer_name,
        "address1": order.address1,
        "address2": order.address2,
        "city": order.city,
        "province": order.province,
        "zip": order.postal_code,
        "country": country,
        "phone": order.phone.as_str(),
    });

    let mut input = serde_json::json!({
        "email": email.as_str(),
        "lineItems": [{
            "variantId": format!("gid://shopify/ProductVariant/{}", order.variant_id),
            "quantity": order.quantity,
        }],
        "shippingAddress": address.clone(),
        "billingAddress": address,
        "financialStatus": "PENDING",
        "tags": [COD_TAG],
        "note": COD_NOTE,
    });

    if let Some(gid) = customer_gid {
        input["customer"] = serde_json::json!({ "toAssociate": { "id": gid } });
    }

    input
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_request() -> OrderRequest {
        OrderRequest {
            shop_domain: Some("my-store.myshopify.com".to_string()),
            customer_name: Some("Asha Rao".to_string()),
            phone: Some("+91 98765-43210".to_string()),
            email: None,
            address1: Some("12 MG Road".to_string()),
            address2: Some("Near the park".to_string()),
            city: Some("Bengaluru".to_string()),
            province: Some("Karnataka".to_string()),
            postal_code: Some("560001".to_string()),
            variant_id: Some(111),
            quantity: Some(2),
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        let order = full_request().validate().unwrap();
        assert_eq!(order.shop.as_str(), "my-store.myshopify.com");
        assert_eq!(order.variant_id, 111);
        assert_eq!(order.quantity, 2);
    }

    #[test]
    fn test_validate_names_every_missing_field() {
        let result = OrderRequest::default().validate();
        let Err(PlaceOrderError::Validation { missing }) = result else {
            panic!("expected Validation error");
        };
        assert_eq!(
            missing,
            vec![
                "shopDomain",
                "customerName",
                "phone",
                "address1",
                "city",
                "province",
                "postalCode",
                "variantId",
                "quantity",
            ]
        );
    }

    #[test]
    fn test_validate_blank_string_counts_as_missing() {
        let mut request = full_request();
        request.city = Some("   ".to_string());
        let Err(PlaceOrderError::Validation { missing }) = request.validate() else {
            panic!("expected Validation error");
        };
        assert_eq!(missing, vec!["city"]);
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let mut request = full_request();
        request.quantity = Some(0);
        let Err(PlaceOrderError::Validation { missing }) = request.validate() else {
            panic!("expected Validation error");
        };
        assert_eq!(missing, vec!["quantity"]);
    }

    #[test]
    fn test_validate_rejects_malformed_email() {
        let mut request = full_request();
        request.email = Some("not-an-email".to_string());
        assert!(matches!(
            request.validate(),
            Err(PlaceOrderError::InvalidField { field: "email", .. })
        ));
    }

    #[test]
    fn test_validate_treats_empty_email_as_absent() {
        let mut request = full_request();
        request.email = Some("  ".to_string());
        let order = request.validate().unwrap();
        assert!(order.email.is_none());
    }

    #[test]
    fn test_draft_payload_phone_policy() {
        let order = full_request().validate().unwrap();
        let email = Email::cod_placeholder(&order.phone.digits(), "codorder.local");
        let payload = build_draft_payload(&order, &email, "India");

        // Customer identity carries the normalized digits; the address
        // record preserves the original formatting.
        assert_eq!(payload.customer.phone, "919876543210");
        assert_eq!(payload.shipping_address.phone, "+91 98765-43210");
        assert_eq!(payload.billing_address.phone, "+91 98765-43210");
        assert_eq!(payload.shipping_address.country, "India");
        assert_eq!(payload.tags, COD_TAG);
        assert_eq!(payload.note, COD_NOTE);
    }

    #[test]
    fn test_draft_payload_uses_placeholder_email_when_absent() {
        let order = full_request().validate().unwrap();
        let email = Email::cod_placeholder(&order.phone.digits(), "codorder.local");
        let payload = build_draft_payload(&order, &email, "India");

        assert_eq!(payload.email, "cod-919876543210@codorder.local");
        assert_eq!(payload.customer.email, payload.email);
    }

    #[test]
    fn test_order_create_input_associates_known_customer() {
        let order = full_request().validate().unwrap();
        let email = Email::cod_placeholder(&order.phone.digits(), "codorder.local");

        let input = build_order_create_input(
            &order,
            &email,
            "India",
            Some("gid://shopify/Customer/55"),
        );
        assert_eq!(
            input["customer"]["toAssociate"]["id"],
            "gid://shopify/Customer/55"
        );
        assert_eq!(input["financialStatus"], "PENDING");
        assert_eq!(
            input["lineItems"][0]["variantId"],
            "gid://shopify/ProductVariant/111"
        );

        let without = build_order_create_input(&order, &email, "India", None);
        assert!(without.get("customer").is_none());
    }
}
