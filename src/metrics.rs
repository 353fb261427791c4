use crate::models::{MetricsRecord, NormalizedEvent};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Computes the fixed metrics record for one hour bucket. Events are matched
/// on exact `event_hour` equality; an hour with no events produces an
/// all-zero record rather than an error.
pub fn aggregate(events: &[NormalizedEvent], hour: NaiveDateTime) -> MetricsRecord {
    let bucket: Vec<&NormalizedEvent> = events
        .iter()
        .filter(|event| event.event_hour == hour)
        .collect();

    let events_total = bucket.len() as u64;
    let unique_users = bucket
        .iter()
        .map(|event| event.user_id)
        .collect::<BTreeSet<_>>()
        .len() as u64;
    let unique_sessions = bucket
        .iter()
        .map(|event| event.session_id)
        .collect::<BTreeSet<_>>()
        .len() as u64;

    let purchases = bucket.iter().filter(|event| event.is_purchase).count() as u64;
    let revenue: f64 = bucket.iter().map(|event| event.revenue).sum();
    let add_to_cart = bucket
        .iter()
        .filter(|event| event.event_type == "add_to_cart")
        .count() as u64;
    let product_view = bucket
        .iter()
        .filter(|event| event.event_type == "product_view")
        .count() as u64;

    let aov = if purchases > 0 {
        revenue / purchases as f64
    } else {
        0.0
    };

    MetricsRecord {
        hour,
        events_total,
        unique_users,
        unique_sessions,
        purchases,
        revenue,
        aov,
        add_to_cart,
        product_view,
        conv_cart_to_purchase: ratio(purchases, add_to_cart),
        conv_view_to_purchase: ratio(purchases, product_view),
    }
}

#[cfg(test)]
mod tests {
    use super::aggregate;
    use crate::models::NormalizedEvent;
    use chrono::{NaiveDate, NaiveDateTime};

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn event(user: i64, session: i64, h: u32, event_type: &str, revenue: f64) -> NormalizedEvent {
        NormalizedEvent {
            user_id: user,
            session_id: session,
            timestamp: hour(h),
            event_hour: hour(h),
            event_type: event_type.to_string(),
            product_id: None,
            outcome: None,
            is_purchase: event_type == "purchase",
            revenue,
        }
    }

    #[test]
    fn empty_hour_yields_all_zeros() {
        let events = vec![event(1, 1, 9, "purchase", 10.0)];
        let record = aggregate(&events, hour(10));
        assert_eq!(record.events_total, 0);
        assert_eq!(record.unique_users, 0);
        assert_eq!(record.unique_sessions, 0);
        assert_eq!(record.purchases, 0);
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.aov, 0.0);
        assert_eq!(record.conv_cart_to_purchase, 0.0);
        assert_eq!(record.conv_view_to_purchase, 0.0);
    }

    #[test]
    fn funnel_formulas_match_worked_example() {
        // 3 purchases totaling 150, 10 add_to_cart, 5 product_view.
        let mut events = vec![
            event(1, 1, 9, "purchase", 50.0),
            event(2, 2, 9, "purchase", 60.0),
            event(3, 3, 9, "purchase", 40.0),
        ];
        for i in 0..10 {
            events.push(event(10 + i, 10 + i, 9, "add_to_cart", 0.0));
        }
        for i in 0..5 {
            events.push(event(30 + i, 30 + i, 9, "product_view", 0.0));
        }

        let record = aggregate(&events, hour(9));
        assert_eq!(record.events_total, 18);
        assert_eq!(record.purchases, 3);
        assert_eq!(record.revenue, 150.0);
        assert_eq!(record.aov, 50.0);
        assert_eq!(record.add_to_cart, 10);
        assert_eq!(record.product_view, 5);
        assert!((record.conv_cart_to_purchase - 0.3).abs() < 1e-12);
        assert!((record.conv_view_to_purchase - 0.6).abs() < 1e-12);
    }

    #[test]
    fn unique_counts_deduplicate_ids() {
        let events = vec![
            event(1, 1, 9, "product_view", 0.0),
            event(1, 2, 9, "product_view", 0.0),
            event(2, 2, 9, "product_view", 0.0),
        ];
        let record = aggregate(&events, hour(9));
        assert_eq!(record.events_total, 3);
        assert_eq!(record.unique_users, 2);
        assert_eq!(record.unique_sessions, 2);
    }

    #[test]
    fn only_exact_hour_matches_are_counted() {
        let mut other = event(1, 1, 9, "purchase", 10.0);
        other.event_hour = hour(9) + chrono::Duration::minutes(30);
        let events = vec![event(2, 2, 9, "purchase", 20.0), other];
        let record = aggregate(&events, hour(9));
        assert_eq!(record.events_total, 1);
        assert_eq!(record.revenue, 20.0);
    }
}
