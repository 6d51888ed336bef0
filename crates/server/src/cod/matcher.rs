//! Reconciliation matcher for the recent-orders listing.

use crate::shopify::types::Order;

use super::{COD_NOTE, COD_TAG};

/// Request-side context candidates are scored against.
#[derive(Debug, Clone)]
pub struct MatchContext<'a> {
    /// Effective order email (supplied or synthesized placeholder).
    pub email: &'a str,
    /// Requested product variant.
    pub variant_id: i64,
    /// Requested quantity.
    pub quantity: i64,
}

/// Pick the most plausible COD order from a recent-orders listing.
///
/// Discriminators, strongest first: the COD tag (required), the COD note
/// (required only when the note field is present - listings may omit it),
/// a matching email, and a matching line item (variant + quantity). Email
/// and line-item matches raise a candidate's score; the highest score wins
/// and ties go to the earliest candidate, which is the most recent order
/// in a created_at-descending listing. A candidate is never disqualified
/// because a weaker discriminator is unavailable.
#[must_use]
pub fn best_cod_match<'a>(candidates: &'a [Order], ctx: &MatchContext<'_>) -> Option<&'a Order> {
    let mut best: Option<(&Order, u8)> = None;

    for candidate in candidates {
        if !candidate.has_tag(COD_TAG) {
            continue;
        }

        if candidate
            .note
            .as_deref()
            .is_some_and(|note| note != COD_NOTE)
        {
            continue;
        }

        let mut score = 0u8;

        if candidate.email.as_deref() == Some(ctx.email) {
            score += 2;
        }

        if candidate
            .line_items
            .iter()
            .any(|item| item.variant_id == Some(ctx.variant_id) && item.quantity == ctx.quantity)
        {
            score += 1;
        }

        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((candidate, score)),
        }
    }

    best.map(|(order, _)| order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::types::OrderLineItem;

    const EMAIL: &str = "cod-919876543210@codorder.local";

    fn ctx() -> MatchContext<'static> {
        MatchContext {
            email: EMAIL,
            variant_id: 111,
            quantity: 2,
        }
    }

    fn candidate(id: i64) -> Order {
        Order {
            id,
            order_number: Some(1000 + id),
            order_status_url: None,
            tags: COD_TAG.to_string(),
            note: Some(COD_NOTE.to_string()),
            email: None,
            line_items: vec![],
        }
    }

    fn with_email(mut order: Order, email: &str) -> Order {
        order.email = Some(email.to_string());
        order
    }

    fn with_line_item(mut order: Order, variant_id: i64, quantity: i64) -> Order {
        order.line_items.push(OrderLineItem {
            variant_id: Some(variant_id),
            quantity,
        });
        order
    }

    #[test]
    fn test_no_candidates_is_none() {
        assert!(best_cod_match(&[], &ctx()).is_none());
    }

    #[test]
    fn test_requires_cod_tag() {
        let mut order = candidate(1);
        order.tags = "gift".to_string();
        assert!(best_cod_match(&[order], &ctx()).is_none());
    }

    #[test]
    fn test_rejects_conflicting_note() {
        let mut order = candidate(1);
        order.note = Some("gift wrap please".to_string());
        assert!(best_cod_match(&[order], &ctx()).is_none());
    }

    #[test]
    fn test_tolerates_missing_note() {
        let mut order = candidate(1);
        order.note = None;
        let found = best_cod_match(std::slice::from_ref(&order), &ctx()).unwrap();
        assert_eq!(found.id, 1);
    }

    #[test]
    fn test_tag_alone_is_enough() {
        // Weaker discriminators being unavailable must not disqualify.
        let candidates = vec![candidate(1)];
        let found = best_cod_match(&candidates, &ctx()).unwrap();
        assert_eq!(found.id, 1);
    }

    #[test]
    fn test_line_item_match_beats_bare_tag() {
        let candidates = vec![candidate(1), with_line_item(candidate(2), 111, 2)];
        let found = best_cod_match(&candidates, &ctx()).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_email_match_beats_line_item_match() {
        let candidates = vec![
            with_line_item(candidate(1), 111, 2),
            with_email(candidate(2), EMAIL),
        ];
        let found = best_cod_match(&candidates, &ctx()).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_full_match_beats_email_only() {
        let candidates = vec![
            with_email(candidate(1), EMAIL),
            with_line_item(with_email(candidate(2), EMAIL), 111, 2),
        ];
        let found = best_cod_match(&candidates, &ctx()).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_tie_goes_to_most_recent() {
        // Listing is created_at-descending, so the earliest candidate wins
        // a tie.
        let candidates = vec![
            with_email(candidate(1), EMAIL),
            with_email(candidate(2), EMAIL),
        ];
        let found = best_cod_match(&candidates, &ctx()).unwrap();
        assert_eq!(found.id, 1);
    }

    #[test]
    fn test_wrong_quantity_does_not_count_as_line_item_match() {
        let candidates = vec![
            with_line_item(candidate(1), 111, 5),
            with_line_item(candidate(2), 111, 2),
        ];
        let found = best_cod_match(&candidates, &ctx()).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_different_customer_email_does_not_score() {
        let candidates = vec![
            with_email(candidate(1), "someone-else@example.com"),
            with_line_item(candidate(2), 111, 2),
        ];
        let found = best_cod_match(&candidates, &ctx()).unwrap();
        assert_eq!(found.id, 2);
    }
}
