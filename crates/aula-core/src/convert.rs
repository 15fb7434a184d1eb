// ── API-to-domain type conversions ──
//
// Bridges raw `aula_api::models` reply types into canonical
// `aula_core::model` types. Each `From` impl renames fields, parses
// strings into strong types, and fills defaults for missing data.

use aula_api::models::{
    MetricValue, RawConfigEntry, RawDailyEvents, RawLogEntry, RawModeChange, RawModeUsage,
    RawState, RawStatistics, RawUser, RawUserActivity,
};

use crate::model::{
    ConfigEntry, ConfigKind, DailyEvents, LogEntry, LogLevel, Metric, Mode, ModeChange,
    ModeUsage, Role, Statistics, SystemState, User, UserActivity,
};

/// Actor name the server records for unattributed entries.
const SYSTEM_USER: &str = "Sistema";

fn metric(raw: Option<MetricValue>) -> Metric {
    match raw {
        Some(MetricValue::Number(n)) => Metric::from_number(n),
        Some(MetricValue::Text(s)) => Metric::from_text(&s),
        None => Metric::default(),
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

impl From<RawState> for SystemState {
    fn from(raw: RawState) -> Self {
        Self {
            mode: Mode::from_label(&raw.modo_actual),
            mode_label: raw.modo_actual,
            cpu_load: metric(raw.carga_cpu),
            latency: metric(raw.latencia),
        }
    }
}

impl From<RawLogEntry> for LogEntry {
    fn from(raw: RawLogEntry) -> Self {
        Self {
            id: raw.id,
            timestamp: raw.fecha.unwrap_or_default(),
            level: LogLevel::from_wire(raw.nivel.as_deref()),
            user: non_empty(raw.usuario).unwrap_or_else(|| SYSTEM_USER.into()),
            event: raw.evento.unwrap_or_default(),
            detail: raw.detalle.unwrap_or_default(),
            source_ip: non_empty(raw.ip),
            previous_mode: non_empty(raw.estado_previo),
            new_mode: non_empty(raw.estado_nuevo),
        }
    }
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        Self {
            id: raw.id,
            username: raw.username,
            full_name: non_empty(raw.nombre_completo),
            email: non_empty(raw.email),
            role: Role::from_wire(raw.rol.as_deref()),
            active: raw.activo,
            created_at: raw.fecha_creacion,
            last_access: raw.ultimo_acceso,
        }
    }
}

impl From<RawConfigEntry> for ConfigEntry {
    fn from(raw: RawConfigEntry) -> Self {
        Self {
            id: raw.id,
            kind: ConfigKind::from_wire(raw.tipo.as_deref()),
            key: raw.clave,
            value: raw.valor,
            description: non_empty(raw.descripcion),
            category: non_empty(raw.categoria),
            updated_at: raw.actualizado,
            updated_by: non_empty(raw.actualizado_por),
        }
    }
}

impl From<RawStatistics> for Statistics {
    fn from(raw: RawStatistics) -> Self {
        Self {
            total_logs: raw.total_logs,
            active_users: raw.usuarios_activos,
            changes_today: raw.cambios_hoy,
            events_by_level: raw.eventos_nivel,
        }
    }
}

impl From<RawUserActivity> for UserActivity {
    fn from(raw: RawUserActivity) -> Self {
        Self {
            user: raw.usuario,
            total_actions: raw.total_acciones,
            last_action: raw.ultima_accion,
        }
    }
}

impl From<RawModeUsage> for ModeUsage {
    fn from(raw: RawModeUsage) -> Self {
        Self {
            mode: raw.modo,
            total_uses: raw.total_usos,
            distinct_users: raw.usuarios_distintos,
        }
    }
}

impl From<RawModeChange> for ModeChange {
    fn from(raw: RawModeChange) -> Self {
        Self {
            timestamp: raw.fecha.unwrap_or_default(),
            user: non_empty(raw.usuario).unwrap_or_else(|| SYSTEM_USER.into()),
            from: non_empty(raw.estado_previo),
            to: non_empty(raw.estado_nuevo),
            detail: non_empty(raw.detalles),
        }
    }
}

impl From<RawDailyEvents> for DailyEvents {
    fn from(raw: RawDailyEvents) -> Self {
        Self {
            day: raw.dia,
            total: raw.total_eventos,
            errors: raw.errores.unwrap_or(0),
            warnings: raw.warnings.unwrap_or(0),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numeric_state_converts() {
        let raw = RawState {
            modo_actual: "CINE".into(),
            carga_cpu: Some(MetricValue::Number(88.0)),
            latencia: Some(MetricValue::Number(24.0)),
        };
        let state = SystemState::from(raw);
        assert_eq!(state.mode, Some(Mode::Cine));
        assert_eq!(state.cpu_load.display, "88");
        assert_eq!(state.latency.display, "24");
    }

    #[test]
    fn log_entry_defaults() {
        let entry = LogEntry::from(RawLogEntry {
            fecha: Some("t1".into()),
            usuario: Some(String::new()),
            ..RawLogEntry::default()
        });
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.user, "Sistema");
        assert_eq!(entry.detail, "");
        assert_eq!(entry.source_ip, None);
    }

    #[test]
    fn user_role_mapping() {
        let user = User::from(RawUser {
            id: 5,
            username: "tecnico".into(),
            rol: Some("invitado".into()),
            nombre_completo: None,
            email: Some(String::new()),
            activo: true,
            fecha_creacion: None,
            ultimo_acceso: None,
        });
        assert_eq!(user.role, Role::Other("invitado".into()));
        assert_eq!(user.email, None);
    }
}
