//! Integration tests for order search, statistics and the analytics mirror

mod common;

use catering::prelude::*;
use common::*;
use std::sync::Arc;
use std::time::Duration as StdDuration;

/// Three buffet orders and two cocktail orders, one of them cancelled
async fn seeded() -> (Harness, Menu, Menu) {
    let h = Harness::new();
    let mut buffet_menu = h.add_menu(buffet(None)).await;
    let mut cocktail = h
        .add_menu(Menu::new("Cocktail dînatoire", Money::from_cents(1800), 10, None))
        .await;

    for persons in [5, 10, 15] {
        h.place_order(&mut buffet_menu, persons, false).await;
        h.clock.advance(Duration::minutes(1));
    }
    let kept = h.place_order(&mut cocktail, 10, true).await;
    h.clock.advance(Duration::minutes(1));
    let dropped = h.place_order(&mut cocktail, 12, false).await;
    h.manager.cancel_order(&dropped, "Budget revu").await.unwrap();
    h.advance_to(&kept, OrderStatus::Ready).await;

    (h, buffet_menu, cocktail)
}

mod search_tests {
    use super::*;

    #[tokio::test]
    async fn test_default_sort_is_most_recent_first() {
        let (h, _, _) = seeded().await;
        let search = OrderFilterService::new(Arc::new(h.orders.clone()));

        let page = search
            .search(&OrderFilter::default(), &QueryParams::default())
            .await
            .unwrap();

        assert_eq!(page.pagination.total, 5);
        let persons: Vec<u32> = page.data.iter().map(|o| o.number_of_persons()).collect();
        assert_eq!(persons, [12, 10, 15, 10, 5]);
    }

    #[tokio::test]
    async fn test_filter_by_status_and_menu() {
        let (h, _, _) = seeded().await;
        let search = OrderFilterService::new(Arc::new(h.orders.clone()));

        let cancelled = search
            .search(
                &OrderFilter::default().with_status(OrderStatus::Cancelled),
                &QueryParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(cancelled.data.len(), 1);
        assert_eq!(cancelled.data[0].cancellation_reason(), Some("Budget revu"));

        let cocktails = search
            .search(
                &OrderFilter::default().with_menu_name("cocktail"),
                &QueryParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(cocktails.pagination.total, 2);
        assert!(cocktails.data.iter().all(|o| o.menu_name() == "Cocktail dînatoire"));
    }

    #[tokio::test]
    async fn test_filter_by_customer_email_ignores_case() {
        let (h, _, _) = seeded().await;
        let search = OrderFilterService::new(Arc::new(h.orders.clone()));

        let filter = OrderFilter::default().with_customer_email("Camille.Dubois@Example.fr");
        let page = search.search(&filter, &QueryParams::default()).await.unwrap();
        assert_eq!(page.pagination.total, 5);

        let filter = OrderFilter::default().with_customer_email("someone@example.fr");
        let page = search.search(&filter, &QueryParams::default()).await.unwrap();
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_delivery_window_upper_bound_exclusive() {
        let (h, _, _) = seeded().await;
        let search = OrderFilterService::new(Arc::new(h.orders.clone()));

        let filter = OrderFilter::default()
            .with_delivery_window(valid_delivery() - Duration::hours(1), valid_delivery());
        let page = search.search(&filter, &QueryParams::default()).await.unwrap();
        assert!(page.data.is_empty());

        let filter = OrderFilter::default()
            .with_delivery_window(valid_delivery(), valid_delivery() + Duration::hours(1));
        let page = search.search(&filter, &QueryParams::default()).await.unwrap();
        assert_eq!(page.pagination.total, 5);
    }

    #[tokio::test]
    async fn test_sort_and_paginate() {
        let (h, _, _) = seeded().await;
        let search = OrderFilterService::new(Arc::new(h.orders.clone()));

        let params = QueryParams::new(1, 2).with_sort("total_price:desc");
        let first = search.search(&OrderFilter::default(), &params).await.unwrap();
        assert_eq!(first.pagination.total_pages, 3);
        assert!(first.pagination.has_next);
        assert!(first.data[0].total_price() >= first.data[1].total_price());

        let params = QueryParams::new(3, 2).with_sort("total_price:desc");
        let last = search.search(&OrderFilter::default(), &params).await.unwrap();
        assert_eq!(last.data.len(), 1);
        assert!(!last.pagination.has_next);
        assert!(last.data[0].total_price() <= first.data[1].total_price());
    }

    #[tokio::test]
    async fn test_unknown_sort_field_rejected() {
        let (h, _, _) = seeded().await;
        let search = OrderFilterService::new(Arc::new(h.orders.clone()));

        let params = QueryParams::default().with_sort("customer_phone");
        let err = search
            .search(&OrderFilter::default(), &params)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CateringError::Validation(ValidationError::FieldError { ref field, .. }) if field == "sort"
        ));
    }

    #[tokio::test]
    async fn test_overdue_material_returns() {
        let h = Harness::new();
        let mut menu = h.add_menu(buffet(None)).await;

        let loaned = h.place_order(&mut menu, 5, true).await;
        let delivered = h.advance_to(&loaned, OrderStatus::Delivered).await;
        let waiting = h
            .manager
            .change_order_status(&delivered, OrderStatus::WaitingMaterialReturn)
            .await
            .unwrap();

        let back = h.place_order(&mut menu, 5, true).await;
        h.manager.mark_material_returned(&back).await.unwrap();
        h.place_order(&mut menu, 5, false).await;

        let search = OrderFilterService::new(Arc::new(h.orders.clone()));

        let before = search
            .overdue_material_returns(valid_delivery() + Duration::days(1))
            .await
            .unwrap();
        assert!(before.is_empty());

        let after = search
            .overdue_material_returns(valid_delivery() + Duration::days(3))
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id(), waiting.id());
    }
}

mod statistics_tests {
    use super::*;

    #[tokio::test]
    async fn test_statistics_over_store() {
        let (h, buffet_menu, cocktail) = seeded().await;
        let stats = OrderStatisticsService::new(Arc::new(h.orders.clone()))
            .compute()
            .await
            .unwrap();

        assert_eq!(stats.total_orders, 5);
        assert_eq!(stats.count(OrderStatus::Pending), 3);
        assert_eq!(stats.count(OrderStatus::Ready), 1);
        assert_eq!(stats.count(OrderStatus::Cancelled), 1);

        // 5 persons: 125.00 + 5.00
        // 10 persons: 250.00 + 5.00 - 25.00
        // 15 persons: 375.00 + 5.00 - 37.50
        // cocktail 10 persons: 180.00 + 5.00
        let expected = 13_000 + 23_000 + 34_250 + 18_500;
        assert_eq!(stats.revenue, Money::from_cents(expected));
        assert_eq!(stats.average_basket, Some(Money::from_cents(expected / 4)));

        assert_eq!(stats.per_menu[0].menu_id, buffet_menu.id);
        assert_eq!(stats.per_menu[0].orders, 3);
        assert_eq!(stats.per_menu[0].persons, 30);
        assert_eq!(stats.per_menu[1].menu_id, cocktail.id);
        assert_eq!(stats.per_menu[1].orders, 1);
    }

    #[tokio::test]
    async fn test_statistics_between() {
        let (h, _, _) = seeded().await;
        let service = OrderStatisticsService::new(Arc::new(h.orders.clone()));

        // Only the first order was created during the first minute
        let stats = service
            .compute_between(now(), now() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.revenue, Money::from_cents(13_000));
    }
}

mod analytics_mirror_tests {
    use super::*;

    async fn wait_for_status(
        sink: &InMemoryStatsSink,
        order_number: &str,
        status: OrderStatus,
    ) -> OrderStatsDocument {
        tokio::time::timeout(StdDuration::from_secs(2), async {
            loop {
                match sink.get(order_number).await {
                    Some(doc) if doc.status == status => return doc,
                    _ => {}
                }
                tokio::time::sleep(StdDuration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_mirror_follows_order_events() {
        let h = Harness::new();
        let sink = InMemoryStatsSink::new();
        let _mirror = spawn_stats_mirror(&h.bus, Arc::new(sink.clone()));

        let mut menu = h.add_menu(buffet(None)).await;
        let order = h.place_order(&mut menu, 10, true).await;

        let created = wait_for_status(&sink, order.order_number(), OrderStatus::Pending).await;
        assert_eq!(created.last_action, "created");
        assert_eq!(created.total_price, 23_000);
        assert!(created.has_material_loan);

        h.manager
            .change_order_status(&order, OrderStatus::Validated)
            .await
            .unwrap();
        let validated = wait_for_status(&sink, order.order_number(), OrderStatus::Validated).await;
        assert_eq!(validated.last_action, "status_changed");

        h.manager.cancel_order(&order, "Annulation client").await.unwrap();
        let cancelled = wait_for_status(&sink, order.order_number(), OrderStatus::Cancelled).await;
        assert_eq!(cancelled.last_action, "cancelled");
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn test_mirror_stops_when_bus_dropped() {
        let bus = EventBus::new(8);
        let mirror = spawn_stats_mirror(&bus, Arc::new(InMemoryStatsSink::new()));
        drop(bus);

        tokio::time::timeout(StdDuration::from_secs(2), mirror)
            .await
            .unwrap()
            .unwrap();
    }
}
