//! Platform revenue projection for the admin area.

use rust_decimal::Decimal;

use crate::billing::round_money;

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformRevenue {
    pub active_professionals: i64,
    pub plan_price: Decimal,
    pub monthly_revenue: Decimal,
    pub annual_projection: Decimal,
}

/// Project subscription revenue from the count of active professionals
pub fn platform_revenue(active_professionals: i64, plan_price: Decimal) -> PlatformRevenue {
    let count = Decimal::from(active_professionals.max(0));
    let monthly_revenue = round_money(count * plan_price, 2);

    PlatformRevenue {
        active_professionals: active_professionals.max(0),
        plan_price,
        monthly_revenue,
        annual_projection: monthly_revenue * Decimal::from(12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_platform_revenue() {
        let revenue = platform_revenue(7, dec!(49.90));
        assert_eq!(revenue.monthly_revenue, dec!(349.30));
        assert_eq!(revenue.annual_projection, dec!(4191.60));
    }

    #[test]
    fn test_platform_revenue_without_professionals() {
        let revenue = platform_revenue(0, dec!(49.90));
        assert_eq!(revenue.monthly_revenue, dec!(0));
        assert_eq!(revenue.annual_projection, dec!(0));
    }
}
