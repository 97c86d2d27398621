use crate::gui_bridge::model::{ErrorBody, NoticeLog, SelectRequest};
use crate::workflow::runner::{FleetRuntime, SharedController};
use fleetcore::engine::LiveTelemetry;
use fleetcore::fleet::{FleetStore, VehicleIdentity};
use fleetcore::telemetry::MetricsRecorder;
use fleetcore::SimulationError;
use log::{info, warn};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{broadcast, watch};
use warp::{http::StatusCode, Filter, Rejection, Reply};

/// HTTP surface for the dashboard: selection, teardown and the live feed.
pub struct GuiBridge {
    controller: SharedController,
    store: FleetStore,
    metrics: Arc<MetricsRecorder>,
    live: watch::Receiver<Option<LiveTelemetry>>,
    notices: Arc<RwLock<NoticeLog>>,
}

impl GuiBridge {
    pub async fn new(runtime: &FleetRuntime) -> Self {
        let (live, mut notice_rx) = {
            let controller = runtime.controller.lock().await;
            (controller.subscribe(), controller.notices())
        };

        let notices = Arc::new(RwLock::new(NoticeLog::default()));
        let log = notices.clone();
        tokio::spawn(async move {
            loop {
                match notice_rx.recv().await {
                    Ok(notice) => {
                        info!("[GUI] {}", notice.message());
                        log.write()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(notice);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("[GUI] dropped {} notices", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self {
            controller: runtime.controller.clone(),
            store: runtime.store.clone(),
            metrics: runtime.metrics.clone(),
            live,
            notices,
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let live = self.live.clone();
        let telemetry_route = warp::path("telemetry")
            .and(warp::path::end())
            .and(warp::get())
            .map(move || warp::reply::json(&*live.borrow()));

        let store = self.store.clone();
        let vehicles_route = warp::path("vehicles")
            .and(warp::path::end())
            .and(warp::get())
            .map(move || warp::reply::json(&store.list()));

        let notices = self.notices.clone();
        let notices_route = warp::path("notices")
            .and(warp::path::end())
            .and(warp::get())
            .map(move || {
                let log = notices.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&log.snapshot())
            });

        let metrics = self.metrics.clone();
        let metrics_route = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .map(move || warp::reply::json(&metrics.snapshot()));

        let controller = self.controller.clone();
        let controller_filter = warp::any().map(move || controller.clone());

        let select_route = warp::path("select")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(controller_filter.clone())
            .and_then(select);

        let close_route = warp::path("close")
            .and(warp::path::end())
            .and(warp::post())
            .and(controller_filter)
            .and_then(|controller: SharedController| async move {
                controller.lock().await.close();
                Ok::<_, Infallible>(warp::reply::json(&json!({"status": "closed"})))
            });

        telemetry_route
            .or(vehicles_route)
            .or(notices_route)
            .or(metrics_route)
            .or(select_route)
            .or(close_route)
    }

    pub async fn serve(self, addr: SocketAddr) {
        info!("[GUI] bridge listening on http://{}", addr);
        warp::serve(self.routes()).run(addr).await;
    }
}

async fn select(
    request: SelectRequest,
    controller: SharedController,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    let vehicle = VehicleIdentity::new(request.reg_no);
    let result = controller.lock().await.select(&vehicle);
    let reply = match result {
        Ok(snapshot) => warp::reply::with_status(warp::reply::json(&snapshot), StatusCode::OK),
        Err(err) => {
            let status = match err {
                SimulationError::VehicleUnavailable(_) => StatusCode::CONFLICT,
                SimulationError::VehicleNotFound(_) => StatusCode::NOT_FOUND,
            };
            warp::reply::with_status(
                warp::reply::json(&ErrorBody {
                    error: err.to_string(),
                }),
                status,
            )
        }
    };
    Ok(reply)
}
