#![allow(clippy::unwrap_used)]
// Behavioural tests for `Console` against a mock auditorium server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aula_core::{
    AdminTab, ConfirmOutcome, Console, ConsoleConfig, ControlId, CoreError, DispatchOutcome,
    Indicator, LogFilter, Mode, NoticeLevel, PendingAction, User,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Console) {
    let server = MockServer::start().await;
    let mut config = ConsoleConfig::new(Url::parse(&server.uri()).unwrap());
    config.log_poll_interval = Duration::ZERO;
    let console = Console::new(config);
    console.connect().await.unwrap();
    (server, console)
}

fn state_body(mode: &str, cpu: serde_json::Value, latency: serde_json::Value) -> serde_json::Value {
    json!({"modo_actual": mode, "carga_cpu": cpu, "latencia": latency})
}

async fn mount_state(server: &MockServer, mode: &str) {
    Mock::given(method("GET"))
        .and(path("/api/estado"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "estado": state_body(mode, json!("45%"), json!("12ms"))
        })))
        .mount(server)
        .await;
}

// ── State poller ────────────────────────────────────────────────────

#[tokio::test]
async fn test_cinema_state_renders_on_indicator() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/estado"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "estado": state_body("CINE", json!(88), json!(24))
        })))
        .mount(&server)
        .await;

    console.refresh_state().await.unwrap();

    let state = console.state_snapshot().unwrap();
    assert_eq!(state.mode, Some(Mode::Cine));
    assert_eq!(state.mode_label, "CINE");
    assert_eq!(state.cpu_load.display, "88");
    assert_eq!(state.latency.display, "24");
    assert_eq!(state.indicator(), Indicator::On);
}

#[tokio::test]
async fn test_state_failure_keeps_previous_display() {
    let (server, console) = setup().await;
    mount_state(&server, "STANDBY").await;
    console.refresh_state().await.unwrap();
    let before = console.state_snapshot();
    server.reset().await;

    Mock::given(method("GET"))
        .and(path("/api/estado"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error", "msg": "Error al obtener estado"
        })))
        .mount(&server)
        .await;

    let mut notices = console.notices();
    assert!(console.refresh_state().await.is_err());
    assert_eq!(console.state_snapshot(), before);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Error al obtener estado");
}

#[tokio::test]
async fn test_network_failure_uses_generic_notice() {
    let mut config = ConsoleConfig::new(Url::parse("http://127.0.0.1:1").unwrap());
    config.log_poll_interval = Duration::ZERO;
    config.timeout = Duration::from_secs(2);
    let console = Console::new(config);
    console.connect().await.unwrap();

    let mut notices = console.notices();
    let err = console.refresh_state().await.unwrap_err();
    assert!(matches!(err, CoreError::ConnectionFailed { .. }));
    assert_eq!(
        notices.try_recv().unwrap().message,
        "Connection error: could not reach the server"
    );
    assert_eq!(console.state_snapshot(), None);
}

// ── Command dispatcher ──────────────────────────────────────────────

#[tokio::test]
async fn test_success_replaces_state_with_server_state() {
    let (server, console) = setup().await;
    mount_state(&server, "STANDBY").await;
    console.refresh_state().await.unwrap();

    Mock::given(method("POST"))
        .and(path("/api/cambiar_modo"))
        .and(body_json(json!({"modo": "CONFERENCIA"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "msg": "Modo cambiado a CONFERENCIA",
            "estado": state_body("CONFERENCIA", json!("45%"), json!("12ms")),
            "timestamp": "2026-10-18 10:00:00"
        })))
        .mount(&server)
        .await;

    let mut notices = console.notices();
    let outcome = console.activate_mode(Mode::Conferencia).await.unwrap();

    let DispatchOutcome::Applied { state, message } = outcome else {
        panic!("expected Applied, got {outcome:?}");
    };
    assert_eq!(message, "Modo cambiado a CONFERENCIA");
    assert_eq!(console.state_snapshot(), state);
    assert_eq!(console.state_snapshot().unwrap().cpu_load.display, "45%");
    assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Success);
}

#[tokio::test]
async fn test_control_restored_after_every_outcome() {
    let (server, console) = setup().await;
    let id = ControlId::Mode(Mode::Cine);
    console.control_board().register(id.clone(), "Cinema");

    let replies = [
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "estado": state_body("CINE 3D", json!("88%"), json!("24ms"))
        })),
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "info", "msg": "El sistema ya está en modo CINE"
        })),
        ResponseTemplate::new(400).set_body_json(json!({
            "status": "error", "msg": "Modo inválido"
        })),
        ResponseTemplate::new(429).set_body_json(json!({
            "error": "Demasiadas solicitudes", "retry_after": "30 per 1 minute"
        })),
    ];

    for reply in replies {
        server.reset().await;
        Mock::given(method("POST"))
            .and(path("/api/cambiar_modo"))
            .respond_with(reply)
            .mount(&server)
            .await;

        let _ = console.activate_mode(Mode::Cine).await;
        let state = console.control_board().get(&id).unwrap();
        assert!(!state.busy);
        assert_eq!(state.label, "Cinema");
    }

    // Network failure: nothing is listening any more.
    drop(server);
    let _ = console.activate_mode(Mode::Cine).await;
    let state = console.control_board().get(&id).unwrap();
    assert!(!state.busy);
    assert_eq!(state.label, "Cinema");
}

#[tokio::test]
async fn test_duplicate_activation_is_ignored_while_busy() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cambiar_modo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "info", "msg": "sin cambios"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(
        console.activate_mode(Mode::Standby),
        console.activate_mode(Mode::Standby)
    );
    assert!(matches!(first.unwrap(), DispatchOutcome::Unchanged { .. }));
    assert_eq!(second.unwrap(), DispatchOutcome::Ignored);
}

#[tokio::test]
async fn test_rate_limit_leaves_state_and_shows_distinct_notice() {
    let (server, console) = setup().await;
    mount_state(&server, "STANDBY").await;
    console.refresh_state().await.unwrap();
    let before = console.state_snapshot();

    Mock::given(method("POST"))
        .and(path("/api/cambiar_modo"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": "Demasiadas solicitudes", "retry_after": "30 per 1 minute"
        })))
        .mount(&server)
        .await;

    let mut notices = console.notices();
    let outcome = console.activate_mode(Mode::Cine).await.unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::RateLimited {
            retry_after: Some("30 per 1 minute".into())
        }
    );
    assert_eq!(console.state_snapshot(), before);
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(
        notice.message,
        "Too many requests. Wait a moment before trying again."
    );
}

#[tokio::test]
async fn test_off_info_reply_keeps_state() {
    let (server, console) = setup().await;
    mount_state(&server, "CONFERENCIA").await;
    console.refresh_state().await.unwrap();
    let before = console.state_snapshot();

    Mock::given(method("POST"))
        .and(path("/api/cambiar_modo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "info", "msg": "confirmación requerida"
        })))
        .mount(&server)
        .await;

    console.request_confirmation(PendingAction::power_off());
    let mut notices = console.notices();
    let outcome = console.confirm().await.unwrap();

    assert_eq!(
        outcome,
        Some(ConfirmOutcome::ModeChange(DispatchOutcome::Unchanged {
            message: "confirmación requerida".into()
        }))
    );
    assert_eq!(console.state_snapshot(), before);
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
}

// ── Confirmation guard ──────────────────────────────────────────────

#[tokio::test]
async fn test_off_waits_for_confirmation_then_sends_flag() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cambiar_modo"))
        .and(body_json(json!({"modo": "OFF", "confirmado": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "msg": "Modo cambiado a OFF",
            "estado": state_body("OFF", json!("2%"), json!("0ms"))
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = console.activate_mode(Mode::Off).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::AwaitingConfirmation);
    assert_eq!(
        console.pending_confirmation(),
        Some(PendingAction::power_off())
    );

    console.confirm().await.unwrap();
    assert_eq!(console.pending_confirmation(), None);
    assert_eq!(console.state_snapshot().unwrap().indicator(), Indicator::Off);
    assert!(!console.control_board().is_busy(&ControlId::Mode(Mode::Off)));
}

#[tokio::test]
async fn test_confirm_with_nothing_pending_sends_nothing() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(console.confirm().await.unwrap(), None);
}

#[tokio::test]
async fn test_cancelled_off_sends_nothing() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cambiar_modo"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    console.activate_mode(Mode::Off).await.unwrap();
    assert!(console.cancel_confirmation());
    assert_eq!(console.confirm().await.unwrap(), None);
    assert!(console.control_board().get(&ControlId::Mode(Mode::Off)).is_none());
}

// ── Log viewer ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_logs_keep_server_order_and_reset_to_top() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/historial"))
        .and(query_param("limite", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "logs": [{"fecha": "t1"}, {"fecha": "t2"}]
        })))
        .mount(&server)
        .await;

    console.refresh_logs().await.unwrap();
    console.scroll_logs(1);
    assert_eq!(console.logs_snapshot().offset, 1);

    console.refresh_logs().await.unwrap();
    let window = console.logs_snapshot();
    let stamps: Vec<_> = window.entries.iter().map(|e| e.timestamp.as_str()).collect();
    assert_eq!(stamps, vec!["t1", "t2"]);
    assert_eq!(window.offset, 0);
    assert_eq!(window.entries[0].level.as_str(), "INFO");
}

#[tokio::test]
async fn test_log_refresh_failure_is_silent() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/historial"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut notices = console.notices();
    assert!(console.refresh_logs().await.is_err());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_background_refresh_loads_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/historial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [{"fecha": "t9", "nivel": "WARNING"}]
        })))
        .mount(&server)
        .await;

    let mut config = ConsoleConfig::new(Url::parse(&server.uri()).unwrap());
    config.log_poll_interval = Duration::from_secs(3600);
    let console = Console::new(config);
    let mut logs = console.logs();
    console.connect().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), logs.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(console.logs_snapshot().entries[0].timestamp, "t9");
    console.disconnect().await;
}

// ── Admin panels ────────────────────────────────────────────────────

fn sample_user() -> User {
    User {
        id: 4,
        username: "tecnico".into(),
        full_name: None,
        email: None,
        role: aula_core::Role::Operator,
        active: true,
        created_at: None,
        last_access: None,
    }
}

#[tokio::test]
async fn test_unconfirmed_deactivation_sends_no_delete() {
    let (server, console) = setup().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    console.request_deactivate(&sample_user());
    assert!(console.cancel_confirmation());
}

#[tokio::test]
async fn test_confirmed_deactivation_reloads_users() {
    let (server, console) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/admin/usuarios/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "msg": "Usuario desactivado"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/usuarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "usuarios": [{"id": 4, "username": "tecnico", "rol": "operador", "activo": 0}]
        })))
        .mount(&server)
        .await;

    console.request_deactivate(&sample_user());
    let outcome = console.confirm().await.unwrap();
    assert_eq!(outcome, Some(ConfirmOutcome::UserDeactivated { id: 4 }));
    assert!(!console.users_snapshot()[0].active);
}

#[tokio::test]
async fn test_tabs_load_once_until_reloaded() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/estadisticas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "estadisticas": {
                "total_logs": 120, "usuarios_activos": 3, "cambios_hoy": 7,
                "eventos_nivel": {"INFO": 100, "ERROR": 20}
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    assert!(console.activate_tab(AdminTab::Statistics).await.unwrap());
    assert!(!console.activate_tab(AdminTab::Statistics).await.unwrap());
    console.reload_tab(AdminTab::Statistics).await.unwrap();

    let stats = console.statistics().borrow().loaded().cloned().unwrap();
    assert_eq!(stats.errors(), 20);
}

#[tokio::test]
async fn test_failed_tab_load_is_retried() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/usuarios"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "Acceso denegado"
        })))
        .expect(2)
        .mount(&server)
        .await;

    assert!(console.activate_tab(AdminTab::Users).await.is_err());
    assert!(!console.is_tab_loaded(AdminTab::Users));
    assert!(console.activate_tab(AdminTab::Users).await.is_err());
}

#[tokio::test]
async fn test_empty_search_results() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/logs/buscar"))
        .and(body_json(json!({"usuario": "nadie", "limite": 50})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "logs": [], "total": 0
        })))
        .mount(&server)
        .await;

    let results = console
        .search_logs(LogFilter {
            user: Some("nadie".into()),
            ..LogFilter::default()
        })
        .await
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(results.total, 0);
}

#[tokio::test]
async fn test_cleanup_requires_confirmation_and_reports_count() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/logs/limpiar"))
        .and(body_json(json!({"dias": 30})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "msg": "Logs eliminados", "eliminados": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    console.request_cleanup(30).unwrap();
    let mut notices = console.notices();
    let outcome = console.confirm().await.unwrap();

    assert_eq!(outcome, Some(ConfirmOutcome::LogsRemoved(42)));
    assert_eq!(notices.try_recv().unwrap().message, "Removed 42 log records");
    assert_eq!(console.audit().borrow().last_cleanup, Some(42));
}

#[tokio::test]
async fn test_cleanup_refetches_shown_results() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/logs/buscar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "logs": [{
                "id": 3, "fecha": "2025-01-01 08:00:00", "nivel": "INFO",
                "usuario": "admin", "evento": "Login exitoso"
            }],
            "total": 1
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/logs/buscar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "logs": [], "total": 0
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/logs/limpiar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "eliminados": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let first = console.search_logs(LogFilter::default()).await.unwrap();
    assert_eq!(first.entries.len(), 1);

    console.request_cleanup(30).unwrap();
    console.confirm().await.unwrap();

    let view = console.audit().borrow().clone();
    assert_eq!(view.results.loaded().map(|r| r.entries.len()), Some(0));
    assert_eq!(view.last_cleanup, Some(1));
}

#[tokio::test]
async fn test_cleanup_skips_panels_never_loaded() {
    let (server, console) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/logs/limpiar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "eliminados": 5
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/logs/buscar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/estadisticas"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    console.request_cleanup(7).unwrap();
    assert_eq!(
        console.confirm().await.unwrap(),
        Some(ConfirmOutcome::LogsRemoved(5))
    );
}

#[tokio::test]
async fn test_analytics_failures_are_isolated() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/analiticas/usuarios"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/analiticas/uso-por-modo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "modos": [{"modo": "CINE 3D", "total_usos": 5, "usuarios_distintos": 2}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/analiticas/timeline-modos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "timeline": [{"fecha": "2026-10-18 09:00:00", "usuario": "admin",
                          "estado_previo": "STANDBY", "estado_nuevo": "CINE 3D"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/analiticas/eventos-diarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "eventos": [{"dia": "2026-10-18", "total_eventos": 9, "errores": null, "warnings": 1}]
        })))
        .mount(&server)
        .await;

    let view = console.load_analytics().await;
    assert!(view.top_users.error().is_some());
    assert_eq!(view.mode_usage.loaded().unwrap()[0].total_uses, 5);
    assert_eq!(view.timeline.loaded().unwrap()[0].to.as_deref(), Some("CINE 3D"));
    assert_eq!(view.daily.loaded().unwrap()[0].errors, 0);
}

#[tokio::test]
async fn test_setting_value_is_validated_by_type() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/configuraciones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "configuraciones": [
                {"id": 1, "clave": "max_volumen", "valor": "85", "tipo": "integer"},
                {"id": 3, "clave": "modo_debug", "valor": "false", "tipo": "boolean"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/configuraciones/max_volumen"))
        .and(body_json(json!({"valor": 90})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success", "msg": "Configuración actualizada"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = console.save_setting("max_volumen", "loud").await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));

    let message = console.save_setting("max_volumen", "90").await.unwrap();
    assert_eq!(message.as_deref(), Some("Configuración actualizada"));

    let err = console.save_setting("no_existe", "1").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}
