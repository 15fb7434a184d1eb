// Wire types for the auditorium server's JSON API.
//
// Field names follow the server verbatim (`modo_actual`, `carga_cpu`, ...).
// Every reply carries a `status` discriminator next to its payload key;
// `aula-core` converts these into its own domain model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ── Shared reply shapes ─────────────────────────────────────────────

/// The application-level `status` field present on every JSON reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Success,
    Info,
    Error,
    /// Destructive command sent without `confirmado: true`.
    ConfirmationRequired,
    #[serde(other)]
    Unknown,
}

/// Error body shape shared by the server's failure replies.
///
/// Handlers answer with either `{status: "error", msg}` or `{error}`;
/// rate-limited replies add `retry_after`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub status: Option<ReplyStatus>,
    pub msg: Option<String>,
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_opt")]
    pub retry_after: Option<String>,
}

impl ErrorBody {
    pub(crate) fn message(self) -> Option<String> {
        self.msg.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

/// `{status, msg}` acknowledgement for mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageReply {
    pub status: Option<ReplyStatus>,
    pub msg: Option<String>,
}

// ── Session ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    pub status: Option<ReplyStatus>,
    pub msg: Option<String>,
    pub redirect: Option<String>,
}

// ── System state ────────────────────────────────────────────────────

/// A metric the server reports either as a unit string (`"88%"`) or a
/// bare number (`88`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The `estado` object: current mode label plus simulated load metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    #[serde(default)]
    pub modo_actual: String,
    #[serde(default)]
    pub carga_cpu: Option<MetricValue>,
    #[serde(default)]
    pub latencia: Option<MetricValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateReply {
    pub status: Option<ReplyStatus>,
    pub estado: RawState,
    pub timestamp: Option<String>,
}

/// `POST /api/cambiar_modo` body.
#[derive(Debug, Clone, Serialize)]
pub struct ModeChangeRequest {
    pub modo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmado: Option<bool>,
}

/// `POST /api/cambiar_modo` reply, for every outcome the server reports
/// in-band (`success`, `info`, `confirmation_required`, `error`).
#[derive(Debug, Clone, Deserialize)]
pub struct ModeChangeReply {
    pub status: ReplyStatus,
    pub msg: Option<String>,
    pub estado: Option<RawState>,
    pub timestamp: Option<String>,
    /// Machine-readable code, e.g. `CONFIRM_SHUTDOWN`.
    pub codigo: Option<String>,
}

// ── Audit log ───────────────────────────────────────────────────────

/// One audit log row.
///
/// `/api/historial` names the detail and origin columns `detalle`/`ip`;
/// the admin search returns raw rows named `detalles`/`origen_ip`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLogEntry {
    pub id: Option<i64>,
    pub fecha: Option<String>,
    pub nivel: Option<String>,
    pub usuario: Option<String>,
    pub evento: Option<String>,
    #[serde(alias = "detalles")]
    pub detalle: Option<String>,
    #[serde(alias = "origen_ip")]
    pub ip: Option<String>,
    #[serde(default)]
    pub estado_previo: Option<String>,
    #[serde(default)]
    pub estado_nuevo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsReply {
    #[serde(default)]
    pub logs: Vec<RawLogEntry>,
    pub total: Option<u64>,
}

/// `POST /api/admin/logs/buscar` body. Empty filters are omitted so the
/// server treats them as "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nivel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_desde: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_hasta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evento: Option<String>,
    pub limite: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupRequest {
    pub dias: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupReply {
    pub msg: Option<String>,
    #[serde(default)]
    pub eliminados: u64,
}

// ── Users ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    pub id: i64,
    pub username: String,
    pub rol: Option<String>,
    pub nombre_completo: Option<String>,
    pub email: Option<String>,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub activo: bool,
    pub fecha_creacion: Option<String>,
    pub ultimo_acceso: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersReply {
    #[serde(default)]
    pub usuarios: Vec<RawUser>,
}

/// `POST /api/admin/usuarios` upsert body. No `id` means create.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpsert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub rol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre_completo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

// ── Statistics & analytics ──────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatistics {
    #[serde(default)]
    pub total_logs: u64,
    #[serde(default)]
    pub usuarios_activos: u64,
    #[serde(default)]
    pub cambios_hoy: u64,
    #[serde(default)]
    pub eventos_nivel: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsReply {
    pub estadisticas: RawStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUserActivity {
    pub usuario: String,
    #[serde(default)]
    pub total_acciones: u64,
    pub ultima_accion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserActivityReply {
    #[serde(default)]
    pub actividad: Vec<RawUserActivity>,
}

/// Per-day counters. `errores`/`warnings` are SQL sums and come back
/// `null` for days without matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDailyEvents {
    pub dia: String,
    #[serde(default)]
    pub total_eventos: u64,
    pub errores: Option<u64>,
    pub warnings: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyEventsReply {
    #[serde(default)]
    pub eventos: Vec<RawDailyEvents>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawModeChange {
    pub fecha: Option<String>,
    pub usuario: Option<String>,
    pub estado_previo: Option<String>,
    pub estado_nuevo: Option<String>,
    pub detalles: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineReply {
    #[serde(default)]
    pub timeline: Vec<RawModeChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawModeUsage {
    pub modo: String,
    #[serde(default)]
    pub total_usos: u64,
    #[serde(default)]
    pub usuarios_distintos: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeUsageReply {
    #[serde(default)]
    pub modos: Vec<RawModeUsage>,
}

// ── Configuration entries ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConfigEntry {
    pub id: i64,
    pub clave: String,
    #[serde(deserialize_with = "lenient_string")]
    pub valor: String,
    pub tipo: Option<String>,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub actualizado: Option<String>,
    pub actualizado_por: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigEntriesReply {
    #[serde(default)]
    pub configuraciones: Vec<RawConfigEntry>,
}

/// `PUT /api/admin/configuraciones/:clave` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigUpdate {
    pub valor: serde_json::Value,
}

// ── Lenient scalar helpers ──────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Accept a string, number, or bool and keep its textual form.
fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Scalar::deserialize(de).map(Scalar::into_string)
}

fn lenient_string_opt<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Option::<Scalar>::deserialize(de).map(|s| s.map(Scalar::into_string))
}

/// SQLite booleans arrive as `0`/`1`; accept real booleans too.
fn flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(match Option::<Scalar>::deserialize(de)? {
        None => true,
        Some(Scalar::Bool(b)) => b,
        Some(Scalar::Int(i)) => i != 0,
        Some(Scalar::Float(f)) => f.abs() > f64::EPSILON,
        Some(Scalar::Text(s)) => matches!(s.as_str(), "1" | "true" | "True"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn state_accepts_unit_strings_and_numbers() {
        let served: RawState = serde_json::from_value(json!({
            "modo_actual": "CINE 3D", "carga_cpu": "88%", "latencia": "24ms"
        }))
        .unwrap();
        assert_eq!(served.carga_cpu, Some(MetricValue::Text("88%".into())));

        let numeric: RawState = serde_json::from_value(json!({
            "modo_actual": "CINE", "carga_cpu": 88, "latencia": 24
        }))
        .unwrap();
        assert_eq!(numeric.carga_cpu, Some(MetricValue::Number(88.0)));
        assert_eq!(numeric.latencia.unwrap().to_string(), "24");
    }

    #[test]
    fn unknown_reply_status_does_not_fail() {
        let reply: MessageReply =
            serde_json::from_value(json!({"status": "partial", "msg": "x"})).unwrap();
        assert_eq!(reply.status, Some(ReplyStatus::Unknown));
    }

    #[test]
    fn search_rows_use_raw_column_names() {
        let row: RawLogEntry = serde_json::from_value(json!({
            "id": 7,
            "fecha": "2026-01-10 10:00:00",
            "nivel": "WARNING",
            "usuario": "admin",
            "evento": "LOGIN_FALLIDO",
            "detalles": "Intento fallido",
            "origen_ip": "10.0.0.5",
            "user_agent": "curl",
            "duracion_ms": null
        }))
        .unwrap();
        assert_eq!(row.detalle.as_deref(), Some("Intento fallido"));
        assert_eq!(row.ip.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn user_active_flag_from_sqlite_integer() {
        let user: RawUser = serde_json::from_value(json!({
            "id": 2, "username": "operador", "rol": "operador", "activo": 0
        }))
        .unwrap();
        assert!(!user.activo);
    }

    #[test]
    fn search_request_omits_empty_filters() {
        let body = serde_json::to_value(LogSearchRequest {
            nivel: Some("ERROR".into()),
            limite: 50,
            ..LogSearchRequest::default()
        })
        .unwrap();
        assert_eq!(body, json!({"nivel": "ERROR", "limite": 50}));
    }

    #[test]
    fn config_value_is_kept_as_text() {
        let entry: RawConfigEntry = serde_json::from_value(json!({
            "id": 1, "clave": "max_volumen", "valor": 100, "tipo": "integer"
        }))
        .unwrap();
        assert_eq!(entry.valor, "100");
    }
}
