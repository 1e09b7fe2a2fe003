//! Aggregate figures over persisted orders

use crate::core::error::CateringResult;
use crate::core::money::Money;
use crate::core::service::OrderStore;
use crate::entities::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// Figures for one menu
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuStatistics {
    pub menu_id: Uuid,
    /// Name as recorded on the most recent order
    pub menu_name: String,
    pub orders: usize,
    pub persons: u64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStatistics {
    pub total_orders: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    /// Sum of totals, cancelled orders excluded
    pub revenue: Money,
    /// Revenue divided by the number of non-cancelled orders, truncated
    pub average_basket: Option<Money>,
    /// Cancelled orders excluded, most ordered first
    pub per_menu: Vec<MenuStatistics>,
}

impl OrderStatistics {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut total_orders = 0;
        let mut by_status: BTreeMap<OrderStatus, usize> = BTreeMap::new();
        let mut revenue = Money::zero();
        let mut billed = 0i64;
        let mut per_menu: HashMap<Uuid, (MenuStatistics, DateTime<Utc>)> = HashMap::new();

        for order in orders {
            total_orders += 1;
            *by_status.entry(order.status()).or_default() += 1;

            if order.status() == OrderStatus::Cancelled {
                continue;
            }

            revenue = revenue + order.total_price();
            billed += 1;

            let created_at = crate::core::Entity::created_at(order);
            let (entry, latest) = per_menu.entry(order.menu_id()).or_insert_with(|| {
                (
                    MenuStatistics {
                        menu_id: order.menu_id(),
                        menu_name: order.menu_name().to_string(),
                        orders: 0,
                        persons: 0,
                        revenue: Money::zero(),
                    },
                    created_at,
                )
            });
            entry.orders += 1;
            entry.persons += u64::from(order.number_of_persons());
            entry.revenue = entry.revenue + order.total_price();
            if created_at > *latest {
                *latest = created_at;
                entry.menu_name = order.menu_name().to_string();
            }
        }

        let average_basket = (billed > 0).then(|| Money::from_cents(revenue.cents() / billed));

        let mut per_menu: Vec<MenuStatistics> = per_menu.into_values().map(|(m, _)| m).collect();
        per_menu.sort_by(|a, b| {
            b.orders
                .cmp(&a.orders)
                .then_with(|| a.menu_name.cmp(&b.menu_name))
        });

        Self {
            total_orders,
            by_status,
            revenue,
            average_basket,
            per_menu,
        }
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Statistics over the order store
#[derive(Clone)]
pub struct OrderStatisticsService {
    orders: Arc<dyn OrderStore>,
}

impl OrderStatisticsService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    pub async fn compute(&self) -> CateringResult<OrderStatistics> {
        let orders = self.orders.list().await?;
        Ok(OrderStatistics::from_orders(&orders))
    }

    /// Statistics over orders created in `[from, to)`
    pub async fn compute_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CateringResult<OrderStatistics> {
        let orders = self.orders.list().await?;
        Ok(OrderStatistics::from_orders(orders.iter().filter(|order| {
            let created_at = crate::core::Entity::created_at(*order);
            created_at >= from && created_at < to
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Address, Menu, OrderBuilder, User};
    use crate::pricing::PriceBreakdown;
    use chrono::TimeZone;

    fn order(menu: &Menu, persons: u32, status: OrderStatus) -> Order {
        let user = User::new("Inès", "Roux", "ines@example.fr", None);
        let address = Address::new(user.id, "4 rue du Palais Gallien", "33000", "Bordeaux", None);
        let delivery = Utc.with_ymd_and_hms(2026, 9, 10, 12, 0, 0).unwrap();
        let subtotal = menu.price_per_person.times(persons);
        OrderBuilder::new(&user, menu, &address, persons, delivery)
            .pricing(PriceBreakdown {
                subtotal,
                delivery_cost: Money::from_cents(500),
                discount: None,
                total: subtotal + Money::from_cents(500),
                distance_km: None,
            })
            .initialize(format!("CMD-{persons}-{status}"), Utc::now())
            .unwrap()
            .fixture_with_status(status)
    }

    #[test]
    fn test_statistics_exclude_cancelled_revenue() {
        let buffet = Menu::new("Buffet", Money::from_cents(2000), 5, None);
        let cocktail = Menu::new("Cocktail", Money::from_cents(1000), 5, None);

        let orders = vec![
            order(&buffet, 10, OrderStatus::Completed),   // 205.00
            order(&buffet, 5, OrderStatus::Pending),      // 105.00
            order(&cocktail, 8, OrderStatus::Cancelled),  // excluded
            order(&cocktail, 6, OrderStatus::Delivering), // 65.00
        ];

        let stats = OrderStatistics::from_orders(&orders);

        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.count(OrderStatus::Cancelled), 1);
        assert_eq!(stats.count(OrderStatus::Ready), 0);
        assert_eq!(stats.revenue, Money::from_cents(37_500));
        assert_eq!(stats.average_basket, Some(Money::from_cents(12_500)));

        assert_eq!(stats.per_menu.len(), 2);
        assert_eq!(stats.per_menu[0].menu_name, "Buffet");
        assert_eq!(stats.per_menu[0].orders, 2);
        assert_eq!(stats.per_menu[0].persons, 15);
        assert_eq!(stats.per_menu[1].orders, 1);
        assert_eq!(stats.per_menu[1].persons, 6);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = OrderStatistics::from_orders(&[]);
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.revenue, Money::zero());
        assert_eq!(stats.average_basket, None);
        assert!(stats.per_menu.is_empty());
    }
}
