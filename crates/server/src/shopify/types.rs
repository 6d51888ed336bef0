//! Request payloads and response types for the Shopify Admin API.

use serde::{Deserialize, Serialize};

// =============================================================================
// Request payloads (REST)
// =============================================================================

/// One purchasable line of a draft order.
#[derive(Debug, Clone, Serialize)]
pub struct LineItemPayload {
    /// Product variant ID.
    pub variant_id: i64,
    /// Units ordered.
    pub quantity: i64,
}

/// Shipping or billing address on an order.
///
/// The `phone` here is the customer's original formatted phone, preserved
/// for display; the normalized digits live on the customer record.
#[derive(Debug, Clone, Serialize)]
pub struct AddressPayload {
    pub first_name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub province: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
}

/// Customer identity attached to a draft order.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerPayload {
    pub first_name: String,
    pub email: String,
    /// Normalized phone digits, used for matching upstream.
    pub phone: String,
}

/// Body of `POST /draft_orders.json` (without the `draft_order` wrapper).
#[derive(Debug, Clone, Serialize)]
pub struct DraftOrderPayload {
    pub line_items: Vec<LineItemPayload>,
    pub email: String,
    pub phone: String,
    pub customer: CustomerPayload,
    pub shipping_address: AddressPayload,
    pub billing_address: AddressPayload,
    pub tags: String,
    pub note: String,
    pub use_customer_default_address: bool,
}

// =============================================================================
// Response types (REST)
// =============================================================================

/// A provisional order, as returned by the draft-order endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftOrder {
    /// Upstream-assigned draft ID.
    pub id: i64,
    /// Draft status (e.g. `open`, `completed`).
    #[serde(default)]
    pub status: Option<String>,
    /// Customer-facing invoice URL, the fallback order reference.
    #[serde(default)]
    pub invoice_url: Option<String>,
    /// ID of the real order, present once the draft has been completed.
    #[serde(default)]
    pub order_id: Option<i64>,
}

/// A real order, as returned by the orders endpoints.
///
/// Listings return a subset of fields depending on the query, so
/// everything beyond the ID is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub order_number: Option<i64>,
    #[serde(default)]
    pub order_status_url: Option<String>,
    /// Comma-separated tag list (REST wire format).
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
}

impl Order {
    /// Membership test over the comma-separated `tags` field.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .split(',')
            .any(|t| t.trim().eq_ignore_ascii_case(tag))
    }
}

/// A line item on a returned order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineItem {
    #[serde(default)]
    pub variant_id: Option<i64>,
    pub quantity: i64,
}

// Envelopes the REST API wraps resources in.

#[derive(Debug, Deserialize)]
pub(crate) struct DraftOrderEnvelope {
    pub draft_order: DraftOrder,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    pub orders: Vec<Order>,
}

// =============================================================================
// Response types (GraphQL)
// =============================================================================

/// A customer node from the GraphQL `customers` query.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlCustomer {
    /// Global ID (`gid://shopify/Customer/...`).
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The order returned inline by the `orderCreate` mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlOrder {
    /// Numeric REST ID, serialized as a string.
    #[serde(default)]
    pub legacy_resource_id: Option<String>,
    /// Display name, e.g. `#1001`.
    #[serde(default)]
    pub name: Option<String>,
    /// Customer-facing status page URL.
    #[serde(default)]
    pub status_page_url: Option<String>,
}

impl GraphqlOrder {
    /// Numeric order ID, if the response carried one.
    #[must_use]
    pub fn order_id(&self) -> Option<i64> {
        self.legacy_resource_id.as_deref()?.parse().ok()
    }

    /// Order number parsed out of the `#1001`-style display name.
    #[must_use]
    pub fn order_number(&self) -> Option<i64> {
        self.name.as_deref()?.trim_start_matches('#').parse().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_with_tags(tags: &str) -> Order {
        Order {
            id: 1,
            order_number: None,
            order_status_url: None,
            tags: tags.to_string(),
            note: None,
            email: None,
            line_items: vec![],
        }
    }

    #[test]
    fn test_has_tag_exact() {
        assert!(order_with_tags("COD").has_tag("COD"));
    }

    #[test]
    fn test_has_tag_in_list_with_spaces() {
        assert!(order_with_tags("priority, COD, gift").has_tag("COD"));
    }

    #[test]
    fn test_has_tag_case_insensitive() {
        assert!(order_with_tags("cod").has_tag("COD"));
    }

    #[test]
    fn test_has_tag_no_substring_match() {
        assert!(!order_with_tags("CODFISH").has_tag("COD"));
        assert!(!order_with_tags("").has_tag("COD"));
    }

    #[test]
    fn test_order_deserializes_from_listing_subset() {
        // Listings omit most fields; only `id` is guaranteed.
        let order: Order = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(order.id, 42);
        assert!(order.line_items.is_empty());
        assert!(order.note.is_none());
    }

    #[test]
    fn test_draft_order_deserializes_completion_response() {
        let draft: DraftOrder = serde_json::from_str(
            r#"{"id": 7, "status": "completed", "order_id": 9001, "invoice_url": "https://shop/invoice/7"}"#,
        )
        .unwrap();
        assert_eq!(draft.order_id, Some(9001));
        assert_eq!(draft.invoice_url.as_deref(), Some("https://shop/invoice/7"));
    }

    #[test]
    fn test_graphql_order_id_parsing() {
        let order = GraphqlOrder {
            legacy_resource_id: Some("9001".to_string()),
            name: Some("#1001".to_string()),
            status_page_url: None,
        };
        assert_eq!(order.order_id(), Some(9001));
        assert_eq!(order.order_number(), Some(1001));
    }

    #[test]
    fn test_graphql_order_tolerates_missing_fields() {
        let order: GraphqlOrder = serde_json::from_str("{}").unwrap();
        assert_eq!(order.order_id(), None);
        assert_eq!(order.order_number(), None);
    }
}
