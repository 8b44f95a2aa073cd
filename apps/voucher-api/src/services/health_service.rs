//! Health check gRPC service implementation.
//!
//! Used by load balancers and the admin portal's status page.
//!
//! | `service`           | Checks                                  |
//! |---------------------|-----------------------------------------|
//! | `""` / `"overall"`  | database reachable, migrations applied  |
//! | `"database"`        | database reachable                      |
//! | anything else       | reported as `UNKNOWN`                   |

use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tokio_stream::{wrappers::ReceiverStream, Stream};
use tonic::{Request, Response, Status};
use tracing::info;

use greenpay_db::migrations::migration_status;

use crate::proto::{
    health_check_response::ServingStatus, health_service_server::HealthService,
    HealthCheckRequest, HealthCheckResponse, Timestamp as ProtoTimestamp,
};
use crate::AppState;

/// Health check interval for watch stream.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Health service implementation.
#[derive(Clone)]
pub struct HealthServiceImpl {
    state: Arc<AppState>,
}

impl HealthServiceImpl {
    /// Create a new health service.
    pub fn new(state: Arc<AppState>) -> Self {
        HealthServiceImpl { state }
    }

    async fn check_health(&self, service: &str) -> HealthCheckResponse {
        let (status, message) = match service {
            "" | "overall" => self.check_overall_health().await,
            "database" => self.check_database_health().await,
            _ => (ServingStatus::Unknown, format!("Unknown service: {}", service)),
        };

        HealthCheckResponse {
            status: status as i32,
            message,
            server_time: Some(ProtoTimestamp {
                value: Utc::now().to_rfc3339(),
            }),
        }
    }

    async fn check_overall_health(&self) -> (ServingStatus, String) {
        let (status, message) = self.check_database_health().await;
        if status != ServingStatus::Serving {
            return (ServingStatus::NotServing, format!("Database unhealthy: {}", message));
        }

        match migration_status(self.state.db.pool()).await {
            Ok((total, applied)) => migration_health(total, applied),
            Err(e) => (ServingStatus::NotServing, format!("Migration check failed: {}", e)),
        }
    }

    async fn check_database_health(&self) -> (ServingStatus, String) {
        if self.state.db.health_check().await {
            (ServingStatus::Serving, "Database connected".to_string())
        } else {
            (ServingStatus::NotServing, "Database unreachable".to_string())
        }
    }
}

fn migration_health(total: usize, applied: usize) -> (ServingStatus, String) {
    if applied == total {
        (ServingStatus::Serving, "All systems operational".to_string())
    } else {
        (
            ServingStatus::NotServing,
            format!("Migrations pending: {} of {} applied", applied, total),
        )
    }
}

#[tonic::async_trait]
impl HealthService for HealthServiceImpl {
    /// Simple health check.
    async fn check(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        let req = request.into_inner();
        let response = self.check_health(&req.service).await;
        Ok(Response::new(response))
    }

    type WatchStream = Pin<Box<dyn Stream<Item = Result<HealthCheckResponse, Status>> + Send>>;

    /// Streaming health check (keepalive).
    async fn watch(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> Result<Response<Self::WatchStream>, Status> {
        let service = request.into_inner().service;
        let health_service = self.clone();

        info!(service = %service, "Starting health watch stream");

        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut check_interval = interval(HEALTH_CHECK_INTERVAL);

            loop {
                check_interval.tick().await;

                let response = health_service.check_health(&service).await;

                if tx.send(Ok(response)).await.is_err() {
                    // Client disconnected
                    break;
                }
            }

            info!(service = %service, "Health watch stream ended");
        });

        let output_stream = ReceiverStream::new(rx);
        Ok(Response::new(Box::pin(output_stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use greenpay_db::{Database, DbConfig};
    use tokio_stream::StreamExt;

    async fn service() -> HealthServiceImpl {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        HealthServiceImpl::new(Arc::new(AppState {
            db,
            config: ApiConfig::default(),
        }))
    }

    fn check_request(service: &str) -> Request<HealthCheckRequest> {
        Request::new(HealthCheckRequest {
            service: service.to_string(),
        })
    }

    #[tokio::test]
    async fn test_overall_serving_after_migrations() {
        let svc = service().await;

        let resp = svc.check(check_request("")).await.unwrap().into_inner();
        assert_eq!(resp.status, ServingStatus::Serving as i32);
        assert_eq!(resp.message, "All systems operational");
        assert!(resp.server_time.is_some());
    }

    #[test]
    fn test_pending_migrations_message() {
        let (status, message) = migration_health(3, 1);
        assert_eq!(status, ServingStatus::NotServing);
        assert_eq!(message, "Migrations pending: 1 of 3 applied");

        assert_eq!(migration_health(1, 1).0, ServingStatus::Serving);
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let svc = service().await;

        let resp = svc.check(check_request("payments")).await.unwrap().into_inner();
        assert_eq!(resp.status, ServingStatus::Unknown as i32);
    }

    #[tokio::test]
    async fn test_closed_pool_is_not_serving() {
        let svc = service().await;
        svc.state.db.close().await;

        let resp = svc.check(check_request("database")).await.unwrap().into_inner();
        assert_eq!(resp.status, ServingStatus::NotServing as i32);

        let resp = svc.check(check_request("overall")).await.unwrap().into_inner();
        assert_eq!(resp.status, ServingStatus::NotServing as i32);
    }

    #[tokio::test]
    async fn test_watch_emits_immediately() {
        let svc = service().await;

        let mut stream = svc
            .watch(check_request("database"))
            .await
            .unwrap()
            .into_inner();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.status, ServingStatus::Serving as i32);
    }
}
