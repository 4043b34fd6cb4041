use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::shutdown::ShutdownSignal;

use turnover_api::{create_routes, AppState};
use turnover_coordinator::{Aggregator, SettlementCalculator, TaskPoolService};
use turnover_core::AppConfig;
use turnover_infrastructure::DatabaseManager;

/// 应用组装根：建库、装配服务、起HTTP服务
pub struct Application {
    config: AppConfig,
    database: Arc<DatabaseManager>,
    router: axum::Router,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("连接数据库: {}", config.database.url);
        let database = Arc::new(
            DatabaseManager::new(&config.database.url, config.database.max_connections)
                .await
                .context("初始化数据库失败")?,
        );
        database.health_check().await.context("数据库健康检查失败")?;
        info!("数据库就绪（{:?}）", database.database_type());

        let task_repo = database.task_repository();
        let worker_repo = database.worker_repository();

        let task_pool = Arc::new(TaskPoolService::new(task_repo.clone(), worker_repo.clone()));
        let settlement = Arc::new(SettlementCalculator::new(task_repo.clone()));
        let aggregator = Arc::new(Aggregator::new(
            task_repo,
            worker_repo,
            settlement.clone(),
        ));

        let state = AppState {
            task_pool,
            settlement,
            aggregator,
            default_alert_days: config.alerts.default_days_ahead,
        };

        let mut router = create_routes(state).layer(TraceLayer::new_for_http());
        if config.api.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        Ok(Self {
            config,
            database,
            router,
        })
    }

    /// 运行HTTP服务直到收到关闭信号
    pub async fn run(&self, mut signal: ShutdownSignal) -> Result<()> {
        if !self.config.api.enabled {
            info!("API服务被禁用，等待关闭信号");
            signal.wait().await;
            return Ok(());
        }

        let listener = tokio::net::TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        info!("API服务监听 {}", self.config.api.bind_address);

        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                signal.wait().await;
                info!("HTTP服务收到关闭信号");
            })
            .await
            .context("HTTP服务异常退出")?;

        self.database.close().await;
        info!("数据库连接已关闭");
        Ok(())
    }
}
