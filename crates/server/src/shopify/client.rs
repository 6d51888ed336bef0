//! Shop-scoped Admin API client (REST + GraphQL).

use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::instrument;

use codrelay_core::ShopDomain;

use super::types::{
    DraftOrder, DraftOrderEnvelope, DraftOrderPayload, GraphqlCustomer, GraphqlOrder, Order,
    OrderEnvelope, OrdersEnvelope,
};
use super::{ShopifyError, UpstreamConfig};

/// GraphQL query for looking up a customer by email.
const CUSTOMER_BY_EMAIL_QUERY: &str = r"
query CustomerByEmail($query: String!) {
  customers(first: 1, query: $query) {
    edges {
      node {
        id
        email
      }
    }
  }
}";

/// GraphQL mutation creating an order directly (no draft).
const ORDER_CREATE_MUTATION: &str = r"
mutation OrderCreate($order: OrderCreateOrderInput!, $options: OrderCreateOptionsInput) {
  orderCreate(order: $order, options: $options) {
    order {
      legacyResourceId
      name
      statusPageUrl
    }
    userErrors {
      field
      message
    }
  }
}";

/// Authenticated client for one shop's Admin API.
///
/// Performs no retries; a non-2xx response or transport failure surfaces
/// immediately as [`ShopifyError`]. Retry policy, if any, belongs to the
/// caller.
#[derive(Clone)]
pub struct ShopifyClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    access_token: String,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ShopifyClient {
    /// Create a client against an explicit base URL.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_version: String,
        access_token: String,
    ) -> Self {
        Self {
            client,
            base_url,
            api_version,
            access_token,
        }
    }

    /// Create a client for a shop using the injected upstream config.
    #[must_use]
    pub fn for_shop(
        client: reqwest::Client,
        upstream: &UpstreamConfig,
        shop: &ShopDomain,
        access_token: String,
    ) -> Self {
        Self::new(
            client,
            upstream.base_url(shop),
            upstream.api_version.clone(),
            access_token,
        )
    }

    fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/admin/api/{}/{resource}",
            self.base_url, self.api_version
        )
    }

    // =========================================================================
    // REST transport
    // =========================================================================

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShopifyError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn rest_get<T: DeserializeOwned>(&self, resource: &str) -> Result<T, ShopifyError> {
        let response = self
            .client
            .get(self.endpoint(resource))
            .header("X-Shopify-Access-Token", &self.access_token)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn rest_post<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: &str,
        body: &B,
    ) -> Result<T, ShopifyError> {
        let response = self
            .client
            .post(self.endpoint(resource))
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn rest_put<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: &str,
        body: &B,
    ) -> Result<T, ShopifyError> {
        let response = self
            .client
            .put(self.endpoint(resource))
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    // =========================================================================
    // Draft orders
    // =========================================================================

    /// Create a provisional (draft) order.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-2xx response, or when the response does
    /// not carry a draft identifier.
    #[instrument(skip(self, draft))]
    pub async fn create_draft_order(
        &self,
        draft: &DraftOrderPayload,
    ) -> Result<DraftOrder, ShopifyError> {
        let envelope: DraftOrderEnvelope = self
            .rest_post("draft_orders.json", &json!({ "draft_order": draft }))
            .await?;
        Ok(envelope.draft_order)
    }

    /// Complete a draft order into a real order with payment pending.
    ///
    /// Even on success the response may omit the completed order's ID (the
    /// draft may have been completed by a concurrent call), so callers must
    /// treat a missing `order_id` as "unknown state", not failure.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-2xx response, including the 422 Shopify
    /// sends when the draft was already completed.
    #[instrument(skip(self))]
    pub async fn complete_draft_order(&self, draft_id: i64) -> Result<DraftOrder, ShopifyError> {
        let resource = format!("draft_orders/{draft_id}/complete.json");
        let envelope: DraftOrderEnvelope = self
            .rest_put(&resource, &json!({ "payment_pending": true }))
            .await?;
        Ok(envelope.draft_order)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// List the most recent orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-2xx response.
    #[instrument(skip(self))]
    pub async fn list_recent_orders(&self, limit: u32) -> Result<Vec<Order>, ShopifyError> {
        let resource = format!(
            "orders.json?limit={limit}&status=any&order={}",
            urlencoding::encode("created_at desc")
        );
        let envelope: OrdersEnvelope = self.rest_get(&resource).await?;
        Ok(envelope.orders)
    }

    /// Fetch a single order, restricted to the given fields.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-2xx response.
    #[instrument(skip(self, fields))]
    pub async fn get_order(&self, order_id: i64, fields: &[&str]) -> Result<Order, ShopifyError> {
        let resource = format!("orders/{order_id}.json?fields={}", fields.join(","));
        let envelope: OrderEnvelope = self.rest_get(&resource).await?;
        Ok(envelope.order)
    }

    // =========================================================================
    // GraphQL transport
    // =========================================================================

    /// Execute a GraphQL query or mutation.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Status` on non-2xx, `ShopifyError::GraphQL`
    /// when the response carries an `errors` array, and
    /// `ShopifyError::Parse` when the data payload has an unexpected shape.
    #[instrument(skip(self, query, variables))]
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        #[derive(serde::Deserialize)]
        struct GraphQLResponse {
            data: Option<serde_json::Value>,
            errors: Option<Vec<GraphQLErrorResponse>>,
        }

        #[derive(serde::Deserialize)]
        struct GraphQLErrorResponse {
            message: String,
        }

        let body = json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(self.endpoint("graphql.json"))
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&body)
            .send()
            .await?;

        let envelope: GraphQLResponse = Self::decode(response).await?;

        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL {
                messages: errors.into_iter().map(|e| e.message).collect(),
            });
        }

        let data = envelope.data.ok_or_else(|| ShopifyError::GraphQL {
            messages: vec!["no data in response".to_string()],
        })?;

        Ok(serde_json::from_value(data)?)
    }

    /// Look up a customer by exact email.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails; an unknown email is `Ok(None)`.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<GraphqlCustomer>, ShopifyError> {
        #[derive(serde::Deserialize)]
        struct Data {
            customers: Connection,
        }

        #[derive(serde::Deserialize)]
        struct Connection {
            edges: Vec<Edge>,
        }

        #[derive(serde::Deserialize)]
        struct Edge {
            node: GraphqlCustomer,
        }

        let variables = json!({ "query": format!("email:{email}") });
        let data: Data = self.graphql(CUSTOMER_BY_EMAIL_QUERY, variables).await?;

        Ok(data.customers.edges.into_iter().next().map(|e| e.node))
    }

    /// Create an order directly through the `orderCreate` mutation.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` when the mutation reports user
    /// errors or omits the order payload.
    #[instrument(skip(self, order))]
    pub async fn create_order(
        &self,
        order: serde_json::Value,
    ) -> Result<GraphqlOrder, ShopifyError> {
        #[derive(serde::Deserialize)]
        struct Data {
            #[serde(rename = "orderCreate")]
            order_create: OrderCreatePayload,
        }

        #[derive(serde::Deserialize)]
        struct OrderCreatePayload {
            order: Option<GraphqlOrder>,
            #[serde(rename = "userErrors", default)]
            user_errors: Vec<UserError>,
        }

        #[derive(serde::Deserialize)]
        struct UserError {
            message: String,
        }

        let variables = json!({
            "order": order,
            "options": { "sendReceipt": false },
        });

        let data: Data = self.graphql(ORDER_CREATE_MUTATION, variables).await?;

        if !data.order_create.user_errors.is_empty() {
            let joined = data
                .order_create
                .user_errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ShopifyError::UserError(joined));
        }

        data.order_create
            .order
            .ok_or_else(|| ShopifyError::UserError("no order in orderCreate response".to_string()))
    }
}
