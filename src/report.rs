use crate::models::MetricsRecord;
use chrono::Duration;

/// Renders the hourly metrics record into the mail subject and body.
pub fn build_email(metrics: &MetricsRecord) -> (String, String) {
    let hour_start = metrics.hour.format("%Y-%m-%d %H:%M");
    let hour_end = (metrics.hour + Duration::hours(1)).format("%Y-%m-%d %H:%M");

    let subject = format!("Hourly E-commerce Report — {hour_start}");

    let body = format!(
        "Hourly E-commerce Report\n\
         Period: {hour_start} — {hour_end}\n\n\
         Activity\n\
         - Total events: {events_total}\n\
         - Unique users: {unique_users}\n\
         - Unique sessions: {unique_sessions}\n\n\
         Sales\n\
         - Purchases: {purchases}\n\
         - Revenue: {revenue:.2}\n\
         - AOV: {aov:.2}\n\n\
         Funnel\n\
         - Add to cart: {add_to_cart}\n\
         - Product view: {product_view}\n\
         - Add_to_cart → Purchase: {conv_cart:.4}\n\
         - Product_view → Purchase: {conv_view:.4}\n",
        events_total = metrics.events_total,
        unique_users = metrics.unique_users,
        unique_sessions = metrics.unique_sessions,
        purchases = metrics.purchases,
        revenue = metrics.revenue,
        aov = metrics.aov,
        add_to_cart = metrics.add_to_cart,
        product_view = metrics.product_view,
        conv_cart = metrics.conv_cart_to_purchase,
        conv_view = metrics.conv_view_to_purchase,
    );

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::build_email;
    use crate::models::MetricsRecord;
    use chrono::NaiveDate;

    #[test]
    fn subject_and_body_carry_the_period() {
        let metrics = MetricsRecord {
            hour: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            events_total: 18,
            unique_users: 12,
            unique_sessions: 15,
            purchases: 3,
            revenue: 150.0,
            aov: 50.0,
            add_to_cart: 10,
            product_view: 5,
            conv_cart_to_purchase: 0.3,
            conv_view_to_purchase: 0.6,
        };
        let (subject, body) = build_email(&metrics);
        assert_eq!(subject, "Hourly E-commerce Report — 2024-05-01 09:00");
        assert!(body.contains("Period: 2024-05-01 09:00 — 2024-05-01 10:00"));
        assert!(body.contains("- Revenue: 150.00"));
        assert!(body.contains("- AOV: 50.00"));
        assert!(body.contains("- Add_to_cart → Purchase: 0.3000"));
        assert!(body.contains("- Product_view → Purchase: 0.6000"));
    }
}
