use std::sync::Arc;

use turnover_coordinator::task_pool::TaskPoolService;
use turnover_core::TurnoverError;
use turnover_domain::repositories::TaskRepository;
use turnover_domain::value_objects::{Actor, UrgencyLevel};
use turnover_testing_utils::{MockTaskRepository, MockWorkerRepository, ReservationBuilder, WorkerBuilder};

fn service(
    task_repo: Arc<MockTaskRepository>,
    worker_repo: Arc<MockWorkerRepository>,
) -> TaskPoolService {
    TaskPoolService::new(task_repo, worker_repo)
}

#[tokio::test]
async fn test_concurrent_claims_yield_exactly_one_winner() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-a").build(),
        WorkerBuilder::new("w-b").build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    let pool = Arc::new(service(task_repo.clone(), worker_repo));
    let actor_a = Actor::worker("w-a");
    let actor_b = Actor::worker("w-b");
    let (left, right) = tokio::join!(
        pool.claim(reservation.id, &actor_a),
        pool.claim(reservation.id, &actor_b),
    );

    let outcomes = [left, right];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "并发认领必须恰有一个成功");

    let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        TurnoverError::TaskAlreadyClaimed { .. }
    ));

    let winner_view = outcomes.iter().find(|r| r.is_ok()).unwrap().as_ref().unwrap();
    let stored = task_repo.get_raw(reservation.id).unwrap();
    assert_eq!(stored.assigned_worker_id, winner_view.assigned_worker_id);
}

#[tokio::test]
async fn test_single_active_task_policy_with_override() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
    ]));

    // 普通任务：距截止 53 小时
    let first = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(5).build())
        .await
        .unwrap();
    let second = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(6).build())
        .await
        .unwrap();
    // 已过期任务：窗口截止在 1 小时前
    let overdue = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-49).build())
        .await
        .unwrap();

    let pool = service(task_repo, worker_repo);
    let actor = Actor::worker("w-1");

    let claimed = pool.claim(first.id, &actor).await.unwrap();
    assert_eq!(claimed.urgency, UrgencyLevel::Normal);

    // 已持有任务时，再认领普通任务被拒绝
    let conflict = pool.claim(second.id, &actor).await.unwrap_err();
    match conflict {
        TurnoverError::ActiveTaskConflict {
            worker_id,
            active_task_id,
        } => {
            assert_eq!(worker_id, "w-1");
            assert_eq!(active_task_id, first.id);
        }
        other => panic!("期望 ActiveTaskConflict，得到 {other:?}"),
    }

    // 已过期任务允许突破限制
    let rescued = pool.claim(overdue.id, &actor).await.unwrap();
    assert_eq!(rescued.urgency, UrgencyLevel::Overdue);
}

#[tokio::test]
async fn test_claim_outside_service_scope_is_denied() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").with_properties(vec![2]).build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().with_property(1).build())
        .await
        .unwrap();

    let pool = service(task_repo, worker_repo);
    let err = pool
        .claim(reservation.id, &Actor::worker("w-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, TurnoverError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_claim_unknown_task_and_worker() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
    ]));
    let pool = service(task_repo, worker_repo);

    let err = pool.claim(404, &Actor::worker("w-1")).await.unwrap_err();
    assert!(matches!(err, TurnoverError::TaskNotFound { id: 404 }));

    let err = pool.claim(404, &Actor::worker("ghost")).await.unwrap_err();
    assert!(matches!(err, TurnoverError::WorkerNotFound { .. }));
}

#[tokio::test]
async fn test_complete_before_checkout_is_premature() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(5).build())
        .await
        .unwrap();

    let pool = service(task_repo, worker_repo);
    let actor = Actor::worker("w-1");
    pool.claim(reservation.id, &actor).await.unwrap();

    let err = pool.complete(reservation.id, &actor).await.unwrap_err();
    assert!(matches!(
        err,
        TurnoverError::PrematureCompletion { id } if id == reservation.id
    ));
}

#[tokio::test]
async fn test_complete_happy_path_and_terminal_state() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
        WorkerBuilder::new("w-2").build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    let pool = service(task_repo.clone(), worker_repo);
    let actor = Actor::worker("w-1");
    pool.claim(reservation.id, &actor).await.unwrap();

    // 他人不能替为完成
    let err = pool
        .complete(reservation.id, &Actor::worker("w-2"))
        .await
        .unwrap_err();
    assert!(matches!(err, TurnoverError::PermissionDenied(_)));

    pool.complete(reservation.id, &actor).await.unwrap();
    let stored = task_repo.get_raw(reservation.id).unwrap();
    assert_eq!(
        stored.cleaning_status,
        turnover_domain::entities::CleaningStatus::Done
    );

    // 终态不可重复完成
    let err = pool.complete(reservation.id, &actor).await.unwrap_err();
    assert!(matches!(err, TurnoverError::TaskImmutable { .. }));
}

#[tokio::test]
async fn test_reassign_requires_manager_and_bypasses_policy() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
        WorkerBuilder::new("w-2").build(),
    ]));

    let held = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(5).build())
        .await
        .unwrap();
    let extra = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(6).build())
        .await
        .unwrap();

    let pool = service(task_repo.clone(), worker_repo);
    pool.claim(held.id, &Actor::worker("w-2")).await.unwrap();

    // 普通保洁员无权改派
    let err = pool
        .reassign(extra.id, "w-2", &Actor::worker("w-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, TurnoverError::PermissionDenied(_)));

    // 管理员改派绕过单任务限制：w-2 已持有任务仍可被指派第二个
    let manager = Actor::manager("admin");
    pool.reassign(extra.id, "w-2", &manager).await.unwrap();
    assert_eq!(
        task_repo.get_raw(extra.id).unwrap().assigned_worker_id,
        Some("w-2".to_string())
    );

    // 改派给不存在的保洁员被拒绝
    let err = pool
        .reassign(extra.id, "ghost", &manager)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnoverError::WorkerNotFound { .. }));
}

#[tokio::test]
async fn test_unassign_returns_task_to_pool() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    let pool = service(task_repo.clone(), worker_repo);
    let actor = Actor::worker("w-1");
    pool.claim(reservation.id, &actor).await.unwrap();

    pool.unassign(reservation.id, &Actor::manager("admin"))
        .await
        .unwrap();
    assert!(task_repo.get_raw(reservation.id).unwrap().assigned_worker_id.is_none());

    // 放回池中后可被再次认领
    pool.claim(reservation.id, &actor).await.unwrap();
}

#[tokio::test]
async fn test_reassign_completed_task_is_refused() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
        WorkerBuilder::new("w-2").build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    let pool = service(task_repo, worker_repo);
    let actor = Actor::worker("w-1");
    pool.claim(reservation.id, &actor).await.unwrap();
    pool.complete(reservation.id, &actor).await.unwrap();

    let manager = Actor::manager("admin");
    let err = pool
        .reassign(reservation.id, "w-2", &manager)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnoverError::TaskImmutable { .. }));

    let err = pool.unassign(reservation.id, &manager).await.unwrap_err();
    assert!(matches!(err, TurnoverError::TaskImmutable { .. }));
}

#[tokio::test]
async fn test_annotate_only_completed_tasks() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    let pool = service(task_repo.clone(), worker_repo);
    let actor = Actor::worker("w-1");
    pool.claim(reservation.id, &actor).await.unwrap();

    // 未完成任务不能写评价
    let err = pool
        .annotate(reservation.id, Some(5), None, &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnoverError::InvalidParams(_)));

    pool.complete(reservation.id, &actor).await.unwrap();

    // 评分越界被拒绝
    let err = pool
        .annotate(reservation.id, Some(6), None, &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, TurnoverError::InvalidParams(_)));

    pool.annotate(reservation.id, Some(5), Some("干净整洁"), &actor)
        .await
        .unwrap();
    let stored = task_repo.get_raw(reservation.id).unwrap();
    assert_eq!(stored.cleaning_rating, Some(5));
    assert_eq!(stored.cleaning_notes.as_deref(), Some("干净整洁"));
}

#[tokio::test]
async fn test_list_available_scoped_and_sorted() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").with_properties(vec![1, 2]).build(),
    ]));

    let overdue = task_repo
        .create(&ReservationBuilder::new().with_property(1).checkout_in_hours(-49).build())
        .await
        .unwrap();
    let normal = task_repo
        .create(&ReservationBuilder::new().with_property(2).checkout_in_hours(5).build())
        .await
        .unwrap();
    // 服务范围之外的房源不出现
    task_repo
        .create(&ReservationBuilder::new().with_property(9).checkout_in_hours(-49).build())
        .await
        .unwrap();
    // 已指派的任务不出现
    task_repo
        .create(
            &ReservationBuilder::new()
                .with_property(1)
                .checkout_in_hours(-3)
                .assigned_to("w-9")
                .build(),
        )
        .await
        .unwrap();

    let pool = service(task_repo, worker_repo);
    let views = pool.list_available("w-1").await.unwrap();
    let ids: Vec<i64> = views.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![overdue.id, normal.id]);
    assert_eq!(views[0].urgency, UrgencyLevel::Overdue);
    assert_eq!(views[1].urgency, UrgencyLevel::Normal);
}

#[tokio::test]
async fn test_list_assigned_renders_windows() {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
    ]));

    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    let pool = service(task_repo, worker_repo);
    let actor = Actor::worker("w-1");
    pool.claim(reservation.id, &actor).await.unwrap();

    let views = pool.list_assigned("w-1").await.unwrap();
    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.window.start, view.checkout_at);
    // 没有下一单入住时按保守期限兜底
    assert_eq!(
        view.window.end,
        view.checkout_at + chrono::Duration::hours(48)
    );
}
