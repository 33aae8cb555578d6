use super::*;

fn with_note(to: OrderStatus, note: &str) -> UpdateStatusRequest {
    UpdateStatusRequest {
        status: to,
        notes: Some(note.to_string()),
    }
}

// ========================================================================
// Status transitions
// ========================================================================

#[tokio::test]
async fn test_full_lifecycle_stamps_and_notes() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let id = order.id.clone();

    h.manager
        .update_status(&staff(), &id, status(OrderStatus::Confirmed))
        .await
        .unwrap();

    let preparing = h
        .manager
        .update_status(&staff(), &id, with_note(OrderStatus::Preparing, "less sugar"))
        .await
        .unwrap();
    assert!(preparing.preparation_started_at.is_some());
    assert_eq!(preparing.notes.kitchen.as_deref(), Some("less sugar"));

    h.manager
        .update_status(&staff(), &id, status(OrderStatus::Ready))
        .await
        .unwrap();

    let out = h
        .manager
        .update_status(&staff(), &id, with_note(OrderStatus::OutForDelivery, "gate 2"))
        .await
        .unwrap();
    assert_eq!(out.notes.delivery.as_deref(), Some("gate 2"));
    // 厨房备注保持不变
    assert_eq!(out.notes.kitchen.as_deref(), Some("less sugar"));
    assert!(out.actual_delivery_time.is_none());

    let delivered = deliver(&h.manager, &id).await;
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.actual_delivery_time.is_some());
    assert!(delivered.updated_at >= order.updated_at);

    let stored = h.storage.get_order(&id).unwrap().unwrap();
    assert_eq!(stored, delivered);

    let statuses: Vec<OrderStatus> = h.notifier.sent().into_iter().map(|(_, s)| s).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ]
    );
    assert_eq!(
        h.publisher.names(),
        vec![
            "new-order",
            "order-status-updated",
            "order-status-updated",
            "order-status-updated",
            "order-status-updated",
            "order-status-updated",
        ]
    );
}

#[tokio::test]
async fn test_note_ignored_for_other_statuses() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let updated = h
        .manager
        .update_status(&staff(), &order.id, with_note(OrderStatus::Confirmed, "call first"))
        .await
        .unwrap();
    assert_eq!(updated.notes.kitchen, None);
    assert_eq!(updated.notes.delivery, None);
}

#[tokio::test]
async fn test_permissive_policy_allows_skipping_states() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let delivered = deliver(&h.manager, &order.id).await;
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.preparation_started_at.is_none());
}

#[tokio::test]
async fn test_strict_policy_requires_adjacent_step() {
    let h = create_harness_with(OrderSettings {
        transition_policy: TransitionPolicy::Strict,
        ..Default::default()
    });
    let order = place_order(&h.manager, &customer()).await;

    let result = h
        .manager
        .update_status(&staff(), &order.id, status(OrderStatus::Ready))
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::InvalidStateTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Ready
        })
    ));

    h.manager
        .update_status(&staff(), &order.id, status(OrderStatus::Confirmed))
        .await
        .unwrap();
    // 取消始终允许
    let cancelled = h
        .manager
        .update_status(&staff(), &order.id, status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_terminal_orders_cannot_change() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    deliver(&h.manager, &order.id).await;

    for to in [OrderStatus::Pending, OrderStatus::Preparing, OrderStatus::Cancelled] {
        let result = h.manager.update_status(&staff(), &order.id, status(to)).await;
        assert!(
            matches!(
                result,
                Err(ManagerError::InvalidStateTransition {
                    from: OrderStatus::Delivered,
                    ..
                })
            ),
            "delivered -> {}",
            to
        );
    }

    let stored = h.storage.get_order(&order.id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Delivered);
    // 被拒绝的变更不产生副作用
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_status_update_requires_staff() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let result = h
        .manager
        .update_status(&customer(), &order.id, status(OrderStatus::Confirmed))
        .await;
    assert!(matches!(result, Err(ManagerError::Forbidden(_))));
    assert_eq!(
        h.storage.get_order(&order.id).unwrap().unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_status_update_unknown_order() {
    let h = create_harness();
    let result = h
        .manager
        .update_status(&staff(), "missing", status(OrderStatus::Confirmed))
        .await;
    assert!(matches!(result, Err(ManagerError::OrderNotFound(_))));
}

#[tokio::test]
async fn test_cancel_via_status_sets_reason_other() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let cancelled = h
        .manager
        .update_status(&staff(), &order.id, status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(cancelled.cancellation_reason, Some(CancellationReason::Other));
    // 走状态更新路径时广播的是 status-updated
    assert_eq!(h.publisher.names().last(), Some(&"order-status-updated"));
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_update() {
    let storage = OrderStorage::open_in_memory().unwrap();
    seed_menu(&storage);
    let publisher = Arc::new(RecordingPublisher::default());
    let manager = OrdersManager::new(
        storage.clone(),
        Arc::new(FailingNotifier),
        publisher.clone(),
        OrderSettings::default(),
    );

    let order = place_order(&manager, &customer()).await;
    let updated = manager
        .update_status(&staff(), &order.id, status(OrderStatus::Preparing))
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Preparing);
    // 通知失败后事件仍然发布
    assert_eq!(publisher.names(), vec!["new-order", "order-status-updated"]);
}

#[tokio::test]
async fn test_hanging_notifier_does_not_block_status_update() {
    let storage = OrderStorage::open_in_memory().unwrap();
    seed_menu(&storage);
    let publisher = Arc::new(RecordingPublisher::default());
    let manager = OrdersManager::new(
        storage,
        Arc::new(HangingNotifier),
        publisher.clone(),
        OrderSettings {
            notify_timeout_ms: 50,
            ..Default::default()
        },
    );
    let order = place_order(&manager, &customer()).await;

    let updated = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        manager.update_status(&staff(), &order.id, status(OrderStatus::Confirmed)),
    )
    .await
    .expect("status update should not wait on the notifier")
    .unwrap();
    assert_eq!(updated.status, OrderStatus::Confirmed);
    assert_eq!(publisher.names(), vec!["new-order", "order-status-updated"]);

    let cancelled = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        manager.cancel_order(&customer(), &order.id, CancelOrderRequest::default()),
    )
    .await
    .expect("cancel should not wait on the notifier")
    .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_back_to_pending_is_a_silent_notification() {
    let manager = create_test_manager();
    let order = place_order(&manager, &customer()).await;
    let ready = manager
        .update_status(&staff(), &order.id, status(OrderStatus::Ready))
        .await
        .unwrap();

    // pending 没有模板，默认通知器直接成功
    assert!(
        TracingNotifier
            .notify_status(&ready, OrderStatus::Pending)
            .await
            .is_ok()
    );

    let back = manager
        .update_status(&staff(), &order.id, status(OrderStatus::Pending))
        .await
        .unwrap();
    assert_eq!(back.status, OrderStatus::Pending);
}

// ========================================================================
// Cancel
// ========================================================================

#[tokio::test]
async fn test_customer_cancels_own_order() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;

    let cancelled = h
        .manager
        .cancel_order(
            &customer(),
            &order.id,
            CancelOrderRequest {
                reason: Some("ordered by mistake".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason,
        Some(CancellationReason::CustomerRequest)
    );
    assert_eq!(cancelled.cancellation_note.as_deref(), Some("ordered by mistake"));
    assert_eq!(
        h.notifier.sent(),
        vec![(order.order_number.clone(), OrderStatus::Cancelled)]
    );

    match h.publisher.events().last() {
        Some(OrderLifecycleEvent::Cancelled(payload)) => {
            assert_eq!(payload.order_id, order.id);
            assert_eq!(payload.reason, CancellationReason::CustomerRequest);
            assert_eq!(payload.customer.id, "user-1");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_staff_cancel_uses_reason_other() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let cancelled = h
        .manager
        .cancel_order(&admin(), &order.id, CancelOrderRequest::default())
        .await
        .unwrap();
    assert_eq!(cancelled.cancellation_reason, Some(CancellationReason::Other));
    assert_eq!(cancelled.cancellation_note, None);
}

#[tokio::test]
async fn test_stranger_cannot_cancel() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let result = h
        .manager
        .cancel_order(&other_customer(), &order.id, CancelOrderRequest::default())
        .await;
    assert!(matches!(result, Err(ManagerError::Forbidden(_))));
    assert_eq!(
        h.storage.get_order(&order.id).unwrap().unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_cannot_cancel_terminal_order() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    deliver(&h.manager, &order.id).await;

    let result = h
        .manager
        .cancel_order(&customer(), &order.id, CancelOrderRequest::default())
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::InvalidStateTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled
        })
    ));

    let other = place_order(&h.manager, &customer()).await;
    h.manager
        .cancel_order(&customer(), &other.id, CancelOrderRequest::default())
        .await
        .unwrap();
    let again = h
        .manager
        .cancel_order(&customer(), &other.id, CancelOrderRequest::default())
        .await;
    assert!(matches!(
        again,
        Err(ManagerError::InvalidStateTransition {
            from: OrderStatus::Cancelled,
            ..
        })
    ));
}

#[tokio::test]
async fn test_cancel_unknown_order() {
    let h = create_harness();
    let result = h
        .manager
        .cancel_order(&customer(), "missing", CancelOrderRequest::default())
        .await;
    assert!(matches!(result, Err(ManagerError::OrderNotFound(_))));
}

// ========================================================================
// Rating
// ========================================================================

fn rating(value: i64, review: Option<&str>) -> RateOrderRequest {
    RateOrderRequest {
        rating: value,
        review: review.map(str::to_string),
    }
}

#[tokio::test]
async fn test_rate_delivered_order_once() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    deliver(&h.manager, &order.id).await;

    let rated = h
        .manager
        .rate_order(&customer(), &order.id, rating(5, Some("  Perfect chai ")))
        .await
        .unwrap();
    let stored_rating = rated.rating.clone().unwrap();
    assert_eq!(stored_rating.rating, 5);
    assert_eq!(stored_rating.review.as_deref(), Some("Perfect chai"));

    let again = h
        .manager
        .rate_order(&customer(), &order.id, rating(1, None))
        .await;
    assert!(matches!(again, Err(ManagerError::AlreadyRated)));
    let stored = h.storage.get_order(&order.id).unwrap().unwrap();
    assert_eq!(stored.rating.unwrap().rating, 5);
}

#[tokio::test]
async fn test_rate_requires_delivery() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    let result = h
        .manager
        .rate_order(&customer(), &order.id, rating(4, None))
        .await;
    assert!(matches!(result, Err(ManagerError::NotDelivered)));
}

#[tokio::test]
async fn test_only_owner_can_rate() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    deliver(&h.manager, &order.id).await;

    for actor in [other_customer(), staff()] {
        let result = h.manager.rate_order(&actor, &order.id, rating(4, None)).await;
        assert!(matches!(result, Err(ManagerError::Forbidden(_))));
    }
}

#[tokio::test]
async fn test_rating_input_validation() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    deliver(&h.manager, &order.id).await;

    for value in [0, 6, -3] {
        let result = h
            .manager
            .rate_order(&customer(), &order.id, rating(value, None))
            .await;
        assert!(matches!(result, Err(ManagerError::Validation(_))), "rating {}", value);
    }

    let long_review = "a".repeat(501);
    let result = h
        .manager
        .rate_order(&customer(), &order.id, rating(4, Some(&long_review)))
        .await;
    assert!(matches!(result, Err(ManagerError::Validation(_))));

}

#[tokio::test]
async fn test_rating_checks_ownership_before_input() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;
    deliver(&h.manager, &order.id).await;

    // 非本人拿到的是 Forbidden，而不是评分范围错误
    let result = h
        .manager
        .rate_order(&other_customer(), &order.id, rating(9, None))
        .await;
    assert!(matches!(result, Err(ManagerError::Forbidden(_))));

    let result = h
        .manager
        .rate_order(&customer(), "missing", rating(9, None))
        .await;
    assert!(matches!(result, Err(ManagerError::OrderNotFound(_))));
}

// ========================================================================
// Queries
// ========================================================================

#[tokio::test]
async fn test_get_order_visibility() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;

    assert_eq!(h.manager.get_order_for(&customer(), &order.id).unwrap().id, order.id);
    assert_eq!(h.manager.get_order_for(&staff(), &order.id).unwrap().id, order.id);
    assert!(matches!(
        h.manager.get_order_for(&other_customer(), &order.id),
        Err(ManagerError::Forbidden(_))
    ));
    assert!(matches!(
        h.manager.get_order_for(&customer(), "missing"),
        Err(ManagerError::OrderNotFound(_))
    ));
}

#[tokio::test]
async fn test_list_my_orders_pages_newest_first() {
    let h = create_harness();
    let mut placed = Vec::new();
    for _ in 0..3 {
        placed.push(place_order(&h.manager, &customer()).await);
    }
    place_order(&h.manager, &other_customer()).await;

    let page = h.manager.list_my_orders(&customer(), Some(1), Some(2), None).unwrap();
    assert_eq!(page.orders.len(), 2);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.pages, 2);
    assert_eq!(page.orders[0].id, placed[2].id);
    assert!(page.orders.iter().all(|o| o.customer.id == "user-1"));

    let second = h.manager.list_my_orders(&customer(), Some(2), Some(2), None).unwrap();
    assert_eq!(second.orders.len(), 1);
    assert_eq!(second.orders[0].id, placed[0].id);

    let defaults = h.manager.list_my_orders(&customer(), None, None, None).unwrap();
    assert_eq!(defaults.pagination.page, 1);
    assert_eq!(defaults.pagination.limit, CUSTOMER_DEFAULT_LIMIT);
}

#[tokio::test]
async fn test_list_my_orders_status_filter() {
    let h = create_harness();
    let first = place_order(&h.manager, &customer()).await;
    place_order(&h.manager, &customer()).await;
    deliver(&h.manager, &first.id).await;

    let delivered = h
        .manager
        .list_my_orders(&customer(), None, None, Some(OrderStatus::Delivered))
        .unwrap();
    assert_eq!(delivered.pagination.total, 1);
    assert_eq!(delivered.orders[0].id, first.id);
}

#[tokio::test]
async fn test_list_limits_enforced() {
    let h = create_harness();
    assert!(matches!(
        h.manager.list_my_orders(&customer(), Some(0), None, None),
        Err(ManagerError::Validation(_))
    ));
    assert!(matches!(
        h.manager
            .list_my_orders(&customer(), None, Some(CUSTOMER_MAX_LIMIT + 1), None),
        Err(ManagerError::Validation(_))
    ));
    assert!(matches!(
        h.manager.list_all(None, Some(ADMIN_MAX_LIMIT + 1), None, None),
        Err(ManagerError::Validation(_))
    ));
    assert!(h.manager.list_all(None, Some(ADMIN_MAX_LIMIT), None, None).is_ok());
}

#[tokio::test]
async fn test_list_all_by_business_day() {
    let h = create_harness();
    place_order(&h.manager, &customer()).await;
    place_order(&h.manager, &other_customer()).await;

    let tz = h.manager.settings().timezone;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let all_today = h.manager.list_all(None, None, None, Some(today)).unwrap();
    assert_eq!(all_today.pagination.total, 2);
    assert_eq!(all_today.pagination.limit, ADMIN_DEFAULT_LIMIT);

    let yesterday = today.pred_opt().unwrap();
    let none = h.manager.list_all(None, None, None, Some(yesterday)).unwrap();
    assert_eq!(none.pagination.total, 0);
    assert!(none.orders.is_empty());
}

#[tokio::test]
async fn test_track_by_order_number() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;

    let tracking = h.manager.track(&order.order_number, Utc::now()).unwrap();
    assert_eq!(tracking.order_number, order.order_number);
    assert_eq!(tracking.status, OrderStatus::Pending);
    assert_eq!(tracking.customer_name, "Asha");
    assert!(!tracking.is_delayed);

    let later = order.estimated_delivery_time + chrono::Duration::minutes(5);
    assert!(h.manager.track(&order.order_number, later).unwrap().is_delayed);

    assert!(matches!(
        h.manager.track("CP000000999", Utc::now()),
        Err(ManagerError::OrderNotFound(_))
    ));
    assert!(matches!(
        h.manager.track("not-a-number", Utc::now()),
        Err(ManagerError::OrderNotFound(_))
    ));
}

// ========================================================================
// Admin
// ========================================================================

#[tokio::test]
async fn test_assign_requires_admin() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;

    assert!(matches!(
        h.manager.assign(&staff(), &order.id, "rider-7"),
        Err(ManagerError::Forbidden(_))
    ));
    assert!(matches!(
        h.manager.assign(&admin(), &order.id, "   "),
        Err(ManagerError::Validation(_))
    ));

    let assigned = h.manager.assign(&admin(), &order.id, " rider-7 ").unwrap();
    assert_eq!(assigned.assigned_to.as_deref(), Some("rider-7"));
    assert_eq!(
        h.storage.get_order(&order.id).unwrap().unwrap().assigned_to.as_deref(),
        Some("rider-7")
    );
}

#[tokio::test]
async fn test_payment_status_updates() {
    let h = create_harness();
    let order = place_order(&h.manager, &customer()).await;

    assert!(matches!(
        h.manager.update_payment(&customer(), &order.id, PaymentStatus::Paid),
        Err(ManagerError::Forbidden(_))
    ));

    let paid = h
        .manager
        .update_payment(&staff(), &order.id, PaymentStatus::Paid)
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);

    let cancelled = place_order(&h.manager, &customer()).await;
    h.manager
        .cancel_order(&customer(), &cancelled.id, CancelOrderRequest::default())
        .await
        .unwrap();
    assert!(matches!(
        h.manager
            .update_payment(&staff(), &cancelled.id, PaymentStatus::Paid),
        Err(ManagerError::PaymentLocked(_))
    ));
    let refunded = h
        .manager
        .update_payment(&staff(), &cancelled.id, PaymentStatus::Refunded)
        .unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
}
