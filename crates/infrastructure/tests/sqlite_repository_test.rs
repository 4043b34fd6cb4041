use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use turnover_domain::entities::{CleaningStatus, Platform};
use turnover_domain::repositories::{TaskRepository, WorkerRepository};
use turnover_infrastructure::database::sqlite::run_migrations;
use turnover_infrastructure::{SqliteTaskRepository, SqliteWorkerRepository};
use turnover_testing_utils::{at, ReservationBuilder, WorkerBuilder};

async fn setup_pool() -> SqlitePool {
    // 内存库必须保持单连接，多个连接会各自拿到独立的库
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("连接内存SQLite失败");
    run_migrations(&pool).await.expect("初始化表结构失败");
    pool
}

#[tokio::test]
async fn test_create_and_derive_next_checkin() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let first = repo
        .create(
            &ReservationBuilder::new()
                .with_property(1)
                .with_stay(at(2024, 3, 8, 15, 0), at(2024, 3, 10, 11, 0))
                .build(),
        )
        .await
        .unwrap();
    let second = repo
        .create(
            &ReservationBuilder::new()
                .with_property(1)
                .with_stay(at(2024, 3, 12, 15, 0), at(2024, 3, 14, 11, 0))
                .build(),
        )
        .await
        .unwrap();
    // 其他房源与取消订单不影响窗口推导
    repo.create(
        &ReservationBuilder::new()
            .with_property(2)
            .with_stay(at(2024, 3, 11, 15, 0), at(2024, 3, 13, 11, 0))
            .build(),
    )
    .await
    .unwrap();
    repo.create(
        &ReservationBuilder::new()
            .with_property(1)
            .with_stay(at(2024, 3, 11, 9, 0), at(2024, 3, 12, 10, 0))
            .cancelled()
            .build(),
    )
    .await
    .unwrap();

    let task = repo.get_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(task.checkout_at, at(2024, 3, 10, 11, 0));
    assert_eq!(task.next_checkin_at, Some(at(2024, 3, 12, 15, 0)));

    // 没有后续订单时由调用侧回退到保守期限
    let tail = repo.get_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(tail.next_checkin_at, None);

    let window = tail.work_window();
    assert_eq!(window.end, at(2024, 3, 16, 11, 0));
}

#[tokio::test]
async fn test_cancelled_reservation_is_invisible() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let cancelled = repo
        .create(&ReservationBuilder::new().cancelled().build())
        .await
        .unwrap();

    assert!(repo.get_by_id(cancelled.id).await.unwrap().is_none());
    assert!(repo.list_unassigned_pending().await.unwrap().is_empty());
    // 取消订单上的认领条件永不成立
    assert!(!repo.try_claim(cancelled.id, "w-1").await.unwrap());
}

#[tokio::test]
async fn test_claim_is_atomic_conditional_update() {
    let pool = setup_pool().await;
    let repo = std::sync::Arc::new(SqliteTaskRepository::new(pool));

    let reservation = repo
        .create(&ReservationBuilder::new().build())
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        repo.try_claim(reservation.id, "w-a"),
        repo.try_claim(reservation.id, "w-b"),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert!(a ^ b, "并发认领必须恰有一个成功");

    let task = repo.get_by_id(reservation.id).await.unwrap().unwrap();
    let winner = if a { "w-a" } else { "w-b" };
    assert_eq!(task.assigned_worker_id.as_deref(), Some(winner));

    // 失败方重试也不会偷走任务
    assert!(!repo.try_claim(reservation.id, "w-c").await.unwrap());
}

#[tokio::test]
async fn test_complete_requires_current_holder() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let reservation = repo
        .create(&ReservationBuilder::new().build())
        .await
        .unwrap();
    assert!(repo.try_claim(reservation.id, "w-1").await.unwrap());

    assert!(!repo.try_complete(reservation.id, "w-2").await.unwrap());
    assert!(repo.try_complete(reservation.id, "w-1").await.unwrap());

    let task = repo.get_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(task.cleaning_status, CleaningStatus::Done);

    // 终态之后条件不再成立
    assert!(!repo.try_complete(reservation.id, "w-1").await.unwrap());
    assert!(!repo.try_assign(reservation.id, Some("w-2")).await.unwrap());
}

#[tokio::test]
async fn test_assign_and_unassign_while_pending() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let reservation = repo
        .create(&ReservationBuilder::new().build())
        .await
        .unwrap();
    assert!(repo.try_claim(reservation.id, "w-1").await.unwrap());

    assert!(repo.try_assign(reservation.id, Some("w-2")).await.unwrap());
    let task = repo.get_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(task.assigned_worker_id.as_deref(), Some("w-2"));

    assert!(repo.try_assign(reservation.id, None).await.unwrap());
    let task = repo.get_by_id(reservation.id).await.unwrap().unwrap();
    assert!(task.assigned_worker_id.is_none());
    assert!(task.is_available());
}

#[tokio::test]
async fn test_list_available_scoped_by_property() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let in_scope = repo
        .create(&ReservationBuilder::new().with_property(1).build())
        .await
        .unwrap();
    repo.create(&ReservationBuilder::new().with_property(9).build())
        .await
        .unwrap();
    repo.create(
        &ReservationBuilder::new()
            .with_property(1)
            .assigned_to("w-1")
            .build(),
    )
    .await
    .unwrap();

    let tasks = repo.list_available_for_properties(&[1, 2]).await.unwrap();
    let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![in_scope.id]);

    assert!(repo.list_available_for_properties(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_completed_listing_respects_period_bounds() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let inside = repo
        .create(
            &ReservationBuilder::new()
                .with_platform(Platform::Booking)
                .with_stay(at(2024, 3, 3, 14, 0), at(2024, 3, 5, 11, 0))
                .with_fee(150.0)
                .completed_by("w-1")
                .build(),
        )
        .await
        .unwrap();
    // 边界：3月1日零点含，4月1日零点不含
    repo.create(
        &ReservationBuilder::new()
            .with_stay(at(2024, 2, 27, 14, 0), at(2024, 2, 29, 11, 0))
            .completed_by("w-1")
            .build(),
    )
    .await
    .unwrap();
    repo.create(
        &ReservationBuilder::new()
            .with_stay(at(2024, 3, 30, 14, 0), at(2024, 4, 1, 0, 0))
            .completed_by("w-1")
            .build(),
    )
    .await
    .unwrap();

    let tasks = repo
        .list_completed_for_worker("w-1", at(2024, 3, 1, 0, 0), at(2024, 4, 1, 0, 0))
        .await
        .unwrap();
    let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![inside.id]);
}

#[tokio::test]
async fn test_feedback_updates_merge() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let reservation = repo
        .create(&ReservationBuilder::new().completed_by("w-1").build())
        .await
        .unwrap();

    assert!(repo.update_feedback(reservation.id, Some(4), None).await.unwrap());
    assert!(repo
        .update_feedback(reservation.id, None, Some("厨房需要复查"))
        .await
        .unwrap());

    let task = repo.get_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(task.rating, Some(4));
    assert_eq!(task.notes.as_deref(), Some("厨房需要复查"));

    assert!(!repo.update_feedback(404, Some(5), None).await.unwrap());
}

#[tokio::test]
async fn test_worker_repository_roundtrip() {
    let pool = setup_pool().await;
    let repo = SqliteWorkerRepository::new(pool);

    let worker = WorkerBuilder::new("w-1")
        .with_name("张阿姨")
        .with_properties(vec![1, 2, 3])
        .build();
    repo.register(&worker).await.unwrap();

    let loaded = repo.get_by_id("w-1").await.unwrap().unwrap();
    assert_eq!(loaded.display_name, "张阿姨");
    assert_eq!(loaded.serviceable_property_ids, vec![1, 2, 3]);
    assert!(loaded.active);

    let mut updated = loaded.clone();
    updated.serviceable_property_ids = vec![5];
    updated.active = false;
    repo.update(&updated).await.unwrap();

    let reloaded = repo.get_by_id("w-1").await.unwrap().unwrap();
    assert_eq!(reloaded.serviceable_property_ids, vec![5]);
    assert!(!reloaded.active);

    repo.register(&WorkerBuilder::new("w-2").build()).await.unwrap();
    let all = repo.get_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "w-1");

    assert!(repo.unregister("w-2").await.unwrap());
    assert!(!repo.unregister("w-2").await.unwrap());
    assert!(repo.get_by_id("w-2").await.unwrap().is_none());
}
