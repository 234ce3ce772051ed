//! Rendering of users, token pairs, verification results and sessions.

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use authcenter_auth::service::{TokenData, VerifyResult};
use authcenter_database::SchemaState;
use authcenter_entity::session::Session;
use authcenter_entity::user::User;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One `field | value` line of a detail table.
#[derive(Tabled)]
struct Field {
    field: &'static str,
    value: String,
}

/// Session display row
#[derive(Serialize, Tabled)]
struct SessionRow {
    id: String,
    device: String,
    ip: String,
    created: String,
    last_used: String,
    expires: String,
}

impl From<&Session> for SessionRow {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id.to_string(),
            device: s.device_type.clone().unwrap_or_else(|| "-".to_string()),
            ip: s.ip_address.clone().unwrap_or_else(|| "-".to_string()),
            created: s.created_at.format("%Y-%m-%d %H:%M").to_string(),
            last_used: s.last_accessed_at.format("%Y-%m-%d %H:%M").to_string(),
            expires: s.expires_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// A freshly registered user.
pub fn user(user: &User, format: OutputFormat) {
    if format == OutputFormat::Json {
        return json(user);
    }
    let roles: Vec<&str> = user.roles.iter().map(|g| g.role_name.as_str()).collect();
    details(vec![
        field("id", user.id),
        field("username", &user.username),
        field("email", user.email.as_deref().unwrap_or("-")),
        field("phone", user.phone.as_deref().unwrap_or("-")),
        field("status", user.status),
        field("roles", roles.join(", ")),
    ]);
}

/// An issued token pair.
pub fn tokens(tokens: &TokenData, format: OutputFormat) {
    if format == OutputFormat::Json {
        return json(tokens);
    }
    details(vec![
        field("user_id", tokens.user_id),
        field("access_token", &tokens.access_token),
        field("refresh_token", &tokens.refresh_token),
        field("expires_in", format!("{}s", tokens.expires_in)),
        field("expires_at", tokens.expires_at.to_rfc3339()),
    ]);
}

/// A successful verification and its optional access decision.
pub fn verification(result: &VerifyResult, format: OutputFormat) {
    if format == OutputFormat::Json {
        return json(result);
    }
    let mut rows = vec![
        field("user_id", result.user_id.map(|id| id.to_string()).unwrap_or_default()),
        field("username", result.username.as_deref().unwrap_or("-")),
        field("roles", result.roles.join(", ")),
        field("permissions", result.permissions.join(", ")),
    ];
    if let Some(granted) = result.has_access {
        rows.push(field("access", if granted { "granted" } else { "denied" }));
    }
    details(rows);
}

/// Live sessions, newest first.
pub fn sessions(sessions: &[Session], format: OutputFormat) {
    let rows: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
    match format {
        OutputFormat::Json => json(&rows),
        OutputFormat::Table if rows.is_empty() => println!("No live sessions."),
        OutputFormat::Table => println!("{}", Table::new(rows).with(Style::rounded())),
    }
}

/// Applied migration state.
pub fn schema(state: &SchemaState) {
    let latest = state
        .latest_version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string());
    success(&format!(
        "Schema at version {latest} ({} migrations applied)",
        state.applied
    ));
}

/// Print a success message
pub fn success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("✗ {msg}");
}

fn field(name: &'static str, value: impl ToString) -> Field {
    Field {
        field: name,
        value: value.to_string(),
    }
}

fn details(rows: Vec<Field>) {
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => error(&format!("Failed to encode JSON: {e}")),
    }
}
