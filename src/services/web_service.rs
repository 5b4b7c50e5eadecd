use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer, Result as ActixResult};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Deserialize;

use crate::devices::drive::{DriveCommand, RegisterSnapshot};
use crate::modbus::SerialTransport;
use crate::output::{HtmlFormFormatter, SnapshotFormatter};
use crate::services::reconciler::{reconcile_shared, SharedReconciler};
use crate::utils::error::ModbusError;

/// Raw fields of the operator form.
#[derive(Debug, Default, Deserialize)]
pub struct ControlForm {
    pub mode_selection: Option<String>,
    pub frequency: Option<String>,
}

pub struct WebState<T: SerialTransport> {
    pub reconciler: SharedReconciler<T>,
    pub started_at: DateTime<Utc>,
}

impl<T: SerialTransport> WebState<T> {
    pub fn new(reconciler: SharedReconciler<T>) -> Self {
        Self {
            reconciler,
            started_at: Utc::now(),
        }
    }
}

pub fn routes<T: SerialTransport + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(show_form::<T>))
        .route("/", web::post().to(submit_form::<T>))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check::<T>))
                .route("/snapshot", web::get().to(get_snapshot::<T>)),
        );
}

pub async fn serve<T: SerialTransport + 'static>(
    state: WebState<T>,
    address: String,
) -> Result<(), ModbusError> {
    info!("🌐 Starting operator form on http://{}", address);
    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::<T>)
    })
    // One session at a time reaches the link anyway.
    .workers(2)
    .bind(&address)?
    .run()
    .await?;

    info!("🛑 Operator form stopped");
    Ok(())
}

/// Run one session off the async executor while holding the link.
async fn run_session<T: SerialTransport + 'static>(
    state: &web::Data<WebState<T>>,
    command: Option<DriveCommand>,
) -> Result<RegisterSnapshot, ModbusError> {
    let reconciler = state.reconciler.clone();
    web::block(move || reconcile_shared(&reconciler, command.as_ref()))
        .await
        .map_err(|e| ModbusError::CommunicationError(format!("session worker failed: {}", e)))?
}

fn render_form(snapshot: &RegisterSnapshot) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(HtmlFormFormatter.format(snapshot))
}

fn session_error(err: ModbusError) -> HttpResponse {
    if err.is_caller_violation() {
        warn!("❌ Rejected operator input: {}", err);
        HttpResponse::BadRequest()
            .content_type("text/plain; charset=utf-8")
            .body(err.to_string())
    } else {
        error!("❌ Session failed: {}", err);
        HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(err.to_string())
    }
}

// GET / - current state
async fn show_form<T: SerialTransport + 'static>(
    state: web::Data<WebState<T>>,
) -> ActixResult<HttpResponse> {
    Ok(match run_session(&state, None).await {
        Ok(snapshot) => render_form(&snapshot),
        Err(e) => session_error(e),
    })
}

// POST / - apply form, then show state
async fn submit_form<T: SerialTransport + 'static>(
    form: web::Form<ControlForm>,
    state: web::Data<WebState<T>>,
) -> ActixResult<HttpResponse> {
    info!("📝 Form submitted: {:?}", form);

    let command = match DriveCommand::from_form(
        form.mode_selection.as_deref(),
        form.frequency.as_deref(),
    ) {
        Ok(command) => command,
        Err(e) => return Ok(session_error(e)),
    };

    Ok(match run_session(&state, Some(command)).await {
        Ok(snapshot) => render_form(&snapshot),
        Err(e) => session_error(e),
    })
}

// GET /api/snapshot
async fn get_snapshot<T: SerialTransport + 'static>(
    state: web::Data<WebState<T>>,
) -> ActixResult<HttpResponse> {
    Ok(match run_session(&state, None).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.view()),
        Err(e) => session_error(e),
    })
}

// GET /api/health
async fn health_check<T: SerialTransport + 'static>(
    state: web::Data<WebState<T>>,
) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Modbus Gateway",
        "started_at": state.started_at,
        "timestamp": Utc::now(),
        "version": crate::VERSION
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::drive::{FREQUENCY_REGISTER, MODE_REGISTER};
    use crate::modbus::sim::SimulatedSlave;
    use crate::modbus::{ModbusMaster, Timing};
    use crate::services::reconciler::Reconciler;
    use actix_web::{http::StatusCode, test};
    use std::time::Duration;

    fn state(slave: SimulatedSlave) -> web::Data<WebState<SimulatedSlave>> {
        let timing = Timing {
            turnaround_delay: Duration::ZERO,
            response_timeout: Duration::from_millis(10),
        };
        let reconciler = Reconciler::new(ModbusMaster::new(slave, 1, timing)).into_shared();
        web::Data::new(WebState::new(reconciler))
    }

    #[actix_web::test]
    async fn test_get_renders_device_state() {
        let slave = SimulatedSlave::new(1)
            .with_register(MODE_REGISTER, 2)
            .with_register(FREQUENCY_REGISTER, 90);
        let app = test::init_service(
            App::new().app_data(state(slave)).configure(routes::<SimulatedSlave>),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(r#"<option value="run" selected>"#));
        assert!(html.contains(r#"value="90""#));
    }

    #[actix_web::test]
    async fn test_post_writes_and_renders_read_back() {
        let data = state(SimulatedSlave::new(1));
        let app = test::init_service(
            App::new().app_data(data.clone()).configure(routes::<SimulatedSlave>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("mode_selection=forward&frequency=250")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains(r#"<option value="forward" selected>"#));
        assert!(html.contains(r#"value="250""#));

        let reconciler = data.reconciler.lock().unwrap();
        assert_eq!(
            reconciler.master().transport().writes(),
            vec![(MODE_REGISTER, 8), (FREQUENCY_REGISTER, 250)]
        );
    }

    #[actix_web::test]
    async fn test_non_numeric_frequency_is_bad_request() {
        let data = state(SimulatedSlave::new(1));
        let app = test::init_service(
            App::new().app_data(data.clone()).configure(routes::<SimulatedSlave>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("mode_selection=run&frequency=abc")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Nothing reached the bus, and the next session works.
        assert!(data.reconciler.lock().unwrap().master().transport().received.is_empty());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_snapshot_endpoint_falls_back_when_silent() {
        let mut slave = SimulatedSlave::new(1);
        slave.silent_reads = true;
        let app = test::init_service(
            App::new().app_data(state(slave)).configure(routes::<SimulatedSlave>),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/snapshot").to_request();
        let value: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(value["mode"], "stop");
        assert_eq!(value["frequency"], 0);
    }
}
