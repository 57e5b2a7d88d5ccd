//! Sales records and analytics aggregation.
//!
//! Pure arithmetic over owner-scoped sale rows: totals, averages, unique
//! customers, and daily/product revenue breakdowns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recorded sale, attached to a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub owner_id: String,
    pub dataset_id: String,
    pub customer_name: String,
    pub product_service: String,
    pub amount: f64,
    pub quantity: i64,
    /// amount × quantity, computed at insert time.
    pub total: f64,
    /// ISO date (or datetime) string as entered by the owner.
    pub sale_date: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub customer_contact: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregated view over a dataset's sales, most recent first.
#[derive(Debug, Clone, Serialize)]
pub struct SalesAnalytics {
    pub total_sales: usize,
    pub total_revenue: f64,
    pub average_sale: f64,
    pub total_customers: usize,
    pub daily_breakdown: Vec<DailyRevenue>,
    pub product_breakdown: Vec<ProductRevenue>,
    pub recent_sales: Vec<SaleRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyRevenue {
    pub date: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRevenue {
    pub product: String,
    pub revenue: f64,
}

impl SalesAnalytics {
    /// Compute analytics from rows already sorted most-recent-first.
    pub fn compute(sales: &[SaleRecord]) -> Self {
        if sales.is_empty() {
            return Self {
                total_sales: 0,
                total_revenue: 0.0,
                average_sale: 0.0,
                total_customers: 0,
                daily_breakdown: Vec::new(),
                product_breakdown: Vec::new(),
                recent_sales: Vec::new(),
            };
        }

        let total_revenue: f64 = sales.iter().map(|s| s.total).sum();
        let total_sales = sales.len();

        let mut customers: Vec<&str> = sales.iter().map(|s| s.customer_name.as_str()).collect();
        customers.sort_unstable();
        customers.dedup();

        let mut daily: BTreeMap<String, f64> = BTreeMap::new();
        let mut products: BTreeMap<String, f64> = BTreeMap::new();
        for sale in sales {
            // Keep the date part only when a full datetime was entered.
            let date = sale
                .sale_date
                .split('T')
                .next()
                .unwrap_or(&sale.sale_date)
                .to_string();
            *daily.entry(date).or_default() += sale.total;
            *products.entry(sale.product_service.clone()).or_default() += sale.total;
        }

        let mut product_breakdown: Vec<ProductRevenue> = products
            .into_iter()
            .map(|(product, revenue)| ProductRevenue { product, revenue })
            .collect();
        product_breakdown.sort_by(|a, b| {
            b.revenue
                .partial_cmp(&a.revenue)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            total_sales,
            total_revenue,
            average_sale: total_revenue / total_sales as f64,
            total_customers: customers.len(),
            daily_breakdown: daily
                .into_iter()
                .map(|(date, revenue)| DailyRevenue { date, revenue })
                .collect(),
            product_breakdown,
            recent_sales: sales.iter().take(10).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(customer: &str, product: &str, total: f64, date: &str) -> SaleRecord {
        SaleRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: "u1".into(),
            dataset_id: "d1".into(),
            customer_name: customer.into(),
            product_service: product.into(),
            amount: total,
            quantity: 1,
            total,
            sale_date: date.into(),
            payment_method: String::new(),
            customer_contact: String::new(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_sales_yield_zeroes() {
        let analytics = SalesAnalytics::compute(&[]);
        assert_eq!(analytics.total_sales, 0);
        assert_eq!(analytics.total_revenue, 0.0);
        assert_eq!(analytics.average_sale, 0.0);
        assert!(analytics.daily_breakdown.is_empty());
    }

    #[test]
    fn totals_and_average() {
        let sales = vec![
            sale("alice", "widget", 10.0, "2026-08-01"),
            sale("bob", "widget", 30.0, "2026-08-01"),
            sale("alice", "gadget", 20.0, "2026-08-02"),
        ];
        let analytics = SalesAnalytics::compute(&sales);
        assert_eq!(analytics.total_sales, 3);
        assert_eq!(analytics.total_revenue, 60.0);
        assert_eq!(analytics.average_sale, 20.0);
        assert_eq!(analytics.total_customers, 2);
    }

    #[test]
    fn daily_breakdown_strips_time_component() {
        let sales = vec![
            sale("a", "x", 5.0, "2026-08-01T09:00:00Z"),
            sale("b", "x", 7.0, "2026-08-01T17:30:00Z"),
        ];
        let analytics = SalesAnalytics::compute(&sales);
        assert_eq!(analytics.daily_breakdown.len(), 1);
        assert_eq!(analytics.daily_breakdown[0].date, "2026-08-01");
        assert_eq!(analytics.daily_breakdown[0].revenue, 12.0);
    }

    #[test]
    fn product_breakdown_sorted_by_revenue_desc() {
        let sales = vec![
            sale("a", "small", 1.0, "2026-08-01"),
            sale("b", "big", 100.0, "2026-08-01"),
            sale("c", "mid", 50.0, "2026-08-01"),
        ];
        let analytics = SalesAnalytics::compute(&sales);
        let products: Vec<_> = analytics
            .product_breakdown
            .iter()
            .map(|p| p.product.as_str())
            .collect();
        assert_eq!(products, vec!["big", "mid", "small"]);
    }

    #[test]
    fn recent_sales_capped_at_ten() {
        let sales: Vec<_> = (0..15)
            .map(|i| sale(&format!("c{i}"), "x", 1.0, "2026-08-01"))
            .collect();
        let analytics = SalesAnalytics::compute(&sales);
        assert_eq!(analytics.recent_sales.len(), 10);
    }
}
