//! Application configuration
//!
//! Settings come from three layers, each overriding the one before:
//! an optional YAML file, environment variables, then CLI flags (applied
//! by the `cli` module).

use crate::api::{HttpTransport, ServiceUrls};
use crate::auth::{AuthConfig, GOOGLE_TOKEN_URL};
use crate::engine::PullConfig;
use crate::entity::{EntityContext, EntityKind, PAGE_SIZE, TABLE_PREFIX};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::sync::SyncConfig;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable stem for each entity's batch size
const BATCH_SIZE_VARS: [(EntityKind, &str); 14] = [
    (EntityKind::OrgUnits, "ORG_UNIT"),
    (EntityKind::StudentUsage, "USAGE"),
    (EntityKind::Courses, "COURSES"),
    (EntityKind::Topics, "TOPICS"),
    (EntityKind::CourseWork, "COURSEWORK"),
    (EntityKind::Students, "STUDENTS"),
    (EntityKind::Teachers, "TEACHERS"),
    (EntityKind::Guardians, "GUARDIANS"),
    (EntityKind::StudentSubmissions, "SUBMISSIONS"),
    (EntityKind::GuardianInvites, "GUARDIAN_INVITES"),
    (EntityKind::CourseAliases, "ALIASES"),
    (EntityKind::Invitations, "INVITATIONS"),
    (EntityKind::Announcements, "ANNOUNCEMENTS"),
    (EntityKind::Meet, "MEET"),
];

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// DuckDB database file
    pub db: PathBuf,

    /// Debug logging, no whole-batch retries
    pub debug: bool,

    /// Dump raw response batches as JSONL under `data_dir`
    pub debug_file: bool,

    /// Directory for dumps and other run artifacts
    pub data_dir: PathBuf,

    /// Directory holding desired-state CSV files
    pub sync_dir: PathBuf,

    /// Page size for list calls
    pub page_size: u32,

    /// Start of the school year; bounds usage windows and course filtering
    pub school_year_start: Option<NaiveDate>,

    /// Org unit whose students' usage is pulled
    pub student_org_unit: Option<String>,

    /// Days of already-loaded usage re-pulled on each run
    pub usage_trailing_days: i64,

    /// Requests per sync batch
    pub sync_batch_size: usize,

    /// Pause after a batch that hit the quota, in seconds
    pub cooldown_seconds: u64,

    /// Warehouse table name prefix
    pub table_prefix: String,

    /// Batch size overrides keyed by entity name
    pub batch_sizes: BTreeMap<String, usize>,

    /// Which entities to pull
    pub pull: PullFlags,

    /// Which entities to sync
    pub sync: SyncFlags,

    /// Credentials
    pub auth: AuthSettings,

    /// HTTP client settings
    pub http: HttpSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db: PathBuf::from("classroom.duckdb"),
            debug: false,
            debug_file: false,
            data_dir: PathBuf::from("data"),
            sync_dir: PathBuf::from("sync_files"),
            page_size: PAGE_SIZE,
            school_year_start: None,
            student_org_unit: None,
            usage_trailing_days: 2,
            sync_batch_size: 1000,
            cooldown_seconds: 20,
            table_prefix: TABLE_PREFIX.to_string(),
            batch_sizes: BTreeMap::new(),
            pull: PullFlags::default(),
            sync: SyncFlags::default(),
            auth: AuthSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

// ============================================================================
// Feature Flags
// ============================================================================

/// Entities enabled for pulling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullFlags {
    pub all: bool,
    pub usage: bool,
    pub courses: bool,
    pub topics: bool,
    pub coursework: bool,
    pub aliases: bool,
    pub students: bool,
    pub teachers: bool,
    pub guardians: bool,
    pub submissions: bool,
    pub invitations: bool,
    pub guardian_invites: bool,
    pub announcements: bool,
    pub meet: bool,
}

impl PullFlags {
    /// Every flag set
    pub fn everything() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    /// Whether an entity should be pulled.
    ///
    /// Org units are only pulled to resolve the usage org unit.
    pub fn enabled(&self, kind: EntityKind) -> bool {
        let flag = match kind {
            EntityKind::OrgUnits | EntityKind::StudentUsage => self.usage,
            EntityKind::Guardians => self.guardians,
            EntityKind::GuardianInvites => self.guardian_invites,
            EntityKind::Courses => self.courses,
            EntityKind::CourseAliases => self.aliases,
            EntityKind::Topics => self.topics,
            EntityKind::CourseWork => self.coursework,
            EntityKind::Students => self.students,
            EntityKind::Teachers => self.teachers,
            EntityKind::StudentSubmissions => self.submissions,
            EntityKind::Invitations => self.invitations,
            EntityKind::Announcements => self.announcements,
            EntityKind::Meet => self.meet,
        };
        self.all || flag
    }

    /// Whether any entity is enabled
    pub fn any(&self) -> bool {
        EntityKind::ALL.iter().any(|kind| self.enabled(*kind))
    }

    fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        Some(match name {
            "ALL" => &mut self.all,
            "USAGE" => &mut self.usage,
            "COURSES" => &mut self.courses,
            "TOPICS" => &mut self.topics,
            "COURSEWORK" => &mut self.coursework,
            "ALIASES" => &mut self.aliases,
            "STUDENTS" => &mut self.students,
            "TEACHERS" => &mut self.teachers,
            "GUARDIANS" => &mut self.guardians,
            "SUBMISSIONS" => &mut self.submissions,
            "INVITATIONS" => &mut self.invitations,
            "GUARDIAN_INVITES" => &mut self.guardian_invites,
            "ANNOUNCEMENTS" => &mut self.announcements,
            "MEET" => &mut self.meet,
            _ => return None,
        })
    }
}

/// Entities enabled for roster sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncFlags {
    pub courses: bool,
    pub students: bool,
    pub teachers: bool,
}

impl SyncFlags {
    /// Whether an entity should be synced
    pub fn enabled(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Courses => self.courses,
            EntityKind::Students => self.students,
            EntityKind::Teachers => self.teachers,
            _ => false,
        }
    }

    /// Enabled entities in sync order
    pub fn entities(&self) -> Vec<EntityKind> {
        EntityKind::SYNCABLE
            .into_iter()
            .filter(|kind| self.enabled(*kind))
            .collect()
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Credentials as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthSettings {
    /// No authentication (local endpoints only)
    #[default]
    None,

    /// Static access token
    Bearer {
        /// The access token
        token: String,
    },

    /// Installed-app credentials with a stored refresh token
    Oauth2Refresh {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default = "default_token_url")]
        token_url: String,
    },

    /// Service account key file with domain-wide delegation
    ServiceAccount {
        /// Path to the downloaded JSON key
        key_file: PathBuf,
        /// Requested scopes; empty means every scope the crate needs
        #[serde(default)]
        scopes: Vec<String>,
        /// Admin account to impersonate
        #[serde(default)]
        subject: Option<String>,
    },
}

fn default_token_url() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl AuthSettings {
    /// Resolve into the auth module's configuration, reading key files
    pub fn to_auth_config(&self) -> Result<AuthConfig> {
        Ok(match self {
            AuthSettings::None => AuthConfig::None,
            AuthSettings::Bearer { token } => AuthConfig::Bearer {
                token: token.clone(),
            },
            AuthSettings::Oauth2Refresh {
                client_id,
                client_secret,
                refresh_token,
                token_url,
            } => AuthConfig::Oauth2Refresh {
                token_url: token_url.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: refresh_token.clone(),
            },
            AuthSettings::ServiceAccount {
                key_file,
                scopes,
                subject,
            } => AuthConfig::from_service_account_file(key_file, scopes.clone(), subject.clone())?,
        })
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Retries of connection failures per request
    pub max_retries: u32,

    /// Requests per second across all services
    pub requests_per_second: u32,

    /// Requests in flight per batch
    pub concurrency: usize,

    /// Serve every API from this host instead of Google's
    pub base_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            max_retries: 2,
            requests_per_second: 50,
            concurrency: HttpTransport::DEFAULT_CONCURRENCY,
            base_url: None,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl AppConfig {
    /// Load the YAML file when given, then apply the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML config text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))
    }

    /// Override settings from environment variables.
    ///
    /// Flags are on when the variable is exactly `YES`. Empty variables
    /// are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(db) = var("DB") {
            self.db = PathBuf::from(db);
        }
        if let Some(v) = var("DEBUG") {
            self.debug = v == "YES";
        }
        if let Some(v) = var("DEBUGFILE") {
            self.debug_file = v == "YES";
        }
        if let Some(v) = var("PAGE_SIZE") {
            self.page_size = parse_number("PAGE_SIZE", &v)?;
        }
        if let Some(v) = var("SCHOOL_YEAR_START") {
            self.school_year_start = Some(parse_date("SCHOOL_YEAR_START", &v)?);
        }
        if let Some(v) = var("STUDENT_ORG_UNIT") {
            self.student_org_unit = Some(v);
        }
        if let Some(v) = var("SYNC_BATCH_SIZE") {
            self.sync_batch_size = parse_number("SYNC_BATCH_SIZE", &v)?;
        }
        if let Some(v) = var("SYNC_DIR") {
            self.sync_dir = PathBuf::from(v);
        }

        for name in [
            "ALL",
            "USAGE",
            "COURSES",
            "TOPICS",
            "COURSEWORK",
            "ALIASES",
            "STUDENTS",
            "TEACHERS",
            "GUARDIANS",
            "SUBMISSIONS",
            "INVITATIONS",
            "GUARDIAN_INVITES",
            "ANNOUNCEMENTS",
            "MEET",
        ] {
            if let Some(v) = var(&format!("PULL_{name}")) {
                if let Some(flag) = self.pull.flag_mut(name) {
                    *flag = v == "YES";
                }
            }
        }
        for (name, flag) in [
            ("SYNC_COURSES", &mut self.sync.courses),
            ("SYNC_STUDENTS", &mut self.sync.students),
            ("SYNC_TEACHERS", &mut self.sync.teachers),
        ] {
            if let Some(v) = var(name) {
                *flag = v == "YES";
            }
        }

        for (kind, stem) in BATCH_SIZE_VARS {
            let name = format!("{stem}_BATCH_SIZE");
            if let Some(v) = var(&name) {
                let size = parse_number(&name, &v)?;
                self.batch_sizes.insert(kind.name().to_string(), size);
            }
        }

        if let Some(subject) = var("ACCOUNT_EMAIL") {
            if let AuthSettings::ServiceAccount { subject: s, .. } = &mut self.auth {
                *s = Some(subject);
            }
        }
        if let Some(key_file) = var("GOOGLE_APPLICATION_CREDENTIALS") {
            if self.auth == AuthSettings::None {
                self.auth = AuthSettings::ServiceAccount {
                    key_file: PathBuf::from(key_file),
                    scopes: Vec::new(),
                    subject: var("ACCOUNT_EMAIL"),
                };
            }
        }

        Ok(())
    }

    /// Reject settings no run could use
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be positive"));
        }
        if self.sync_batch_size == 0 {
            return Err(Error::invalid_value("sync_batch_size", "must be positive"));
        }
        if self.usage_trailing_days < 0 {
            return Err(Error::invalid_value(
                "usage_trailing_days",
                "cannot be negative",
            ));
        }
        for (name, size) in &self.batch_sizes {
            EntityKind::from_str(name)?;
            if *size == 0 {
                return Err(Error::invalid_value(
                    format!("batch_sizes.{name}"),
                    "must be positive",
                ));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Derived settings
    // ========================================================================

    /// School year start as a timestamp at midnight
    pub fn school_year_start_datetime(&self) -> NaiveDateTime {
        self.school_year_start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    /// Quota cooldown
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    /// Pull engine configuration
    pub fn pull_config(&self) -> Result<PullConfig> {
        let mut config = PullConfig::new()
            .with_cooldown(self.cooldown())
            .with_debug(self.debug)
            .with_table_prefix(self.table_prefix.clone());
        for (name, size) in &self.batch_sizes {
            config = config.with_batch_size(EntityKind::from_str(name)?, *size);
        }
        if self.debug_file {
            config = config.with_dump_dir(self.data_dir.clone());
        }
        Ok(config)
    }

    /// Sync engine configuration
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new()
            .with_sync_dir(self.sync_dir.clone())
            .with_batch_size(self.sync_batch_size)
            .with_cooldown(self.cooldown())
            .with_debug(self.debug)
            .with_table_prefix(self.table_prefix.clone())
    }

    /// Runtime values for entity requests and preprocessing
    pub fn entity_context(&self) -> EntityContext {
        EntityContext {
            page_size: self.page_size,
            school_year_start: self.school_year_start_datetime(),
            student_org_unit: self.student_org_unit.clone(),
            ..EntityContext::default()
        }
    }

    /// HTTP client configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let rps = self.http.requests_per_second.max(1);
        HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .rate_limit(RateLimiterConfig::new(rps, rps))
            .build()
    }

    /// Authenticated batch transport
    pub fn transport(&self) -> Result<HttpTransport> {
        let client = HttpClient::with_auth(self.http_client_config(), self.auth.to_auth_config()?)?;
        let mut transport = HttpTransport::new(client).with_concurrency(self.http.concurrency);
        if let Some(base) = &self.http.base_url {
            transport = transport.with_urls(ServiceUrls::single_host(base.clone()));
        }
        Ok(transport)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_value(name, format!("'{value}' is not a number")))
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date())
        })
        .map_err(|_| Error::invalid_value(name, format!("'{value}' is not a YYYY-MM-DD date")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.usage_trailing_days, 2);
        assert_eq!(config.sync_batch_size, 1000);
        assert_eq!(config.table_prefix, "GoogleClassroom_");
        assert!(!config.pull.any());
        assert!(config.sync.entities().is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
db: /tmp/classroom.duckdb
school_year_start: 2024-08-01
student_org_unit: Students
batch_sizes:
  CourseWork: 60
pull:
  courses: true
  students: true
sync:
  teachers: true
auth:
  type: service_account
  key_file: key.json
  subject: admin@example.org
http:
  base_url: http://localhost:8080
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.db, PathBuf::from("/tmp/classroom.duckdb"));
        assert_eq!(
            config.school_year_start,
            NaiveDate::from_ymd_opt(2024, 8, 1)
        );
        assert!(config.pull.enabled(EntityKind::Courses));
        assert!(config.pull.enabled(EntityKind::Students));
        assert!(!config.pull.enabled(EntityKind::Topics));
        assert_eq!(config.sync.entities(), vec![EntityKind::Teachers]);
        assert_eq!(
            config.auth,
            AuthSettings::ServiceAccount {
                key_file: PathBuf::from("key.json"),
                scopes: vec![],
                subject: Some("admin@example.org".to_string()),
            }
        );
        assert_eq!(config.http.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.http.concurrency, 16);

        let pull = config.pull_config().unwrap();
        assert_eq!(pull.batch_size(EntityKind::CourseWork), 60);
    }

    #[test]
    fn test_parse_yaml_rejects_unknown_auth() {
        let yaml = "auth:\n  type: api_key\n";
        assert!(matches!(
            AppConfig::from_yaml_str(yaml),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("DB", "warehouse.duckdb"),
                ("DEBUG", "YES"),
                ("DEBUGFILE", "NO"),
                ("PULL_COURSES", "YES"),
                ("PULL_MEET", "yes"),
                ("COURSEWORK_BATCH_SIZE", "50"),
                ("ALIASES_BATCH_SIZE", ""),
                ("PAGE_SIZE", "500"),
                ("SYNC_BATCH_SIZE", "10"),
                ("SYNC_STUDENTS", "YES"),
                ("SCHOOL_YEAR_START", "2024-08-01"),
                ("STUDENT_ORG_UNIT", "Students"),
            ]))
            .unwrap();

        assert_eq!(config.db, PathBuf::from("warehouse.duckdb"));
        assert!(config.debug);
        assert!(!config.debug_file);
        assert!(config.pull.enabled(EntityKind::Courses));
        assert!(!config.pull.enabled(EntityKind::Meet));
        assert_eq!(config.batch_sizes.get("CourseWork"), Some(&50));
        assert!(!config.batch_sizes.contains_key("CourseAliases"));
        assert_eq!(config.page_size, 500);
        assert_eq!(config.sync_batch_size, 10);
        assert_eq!(config.sync.entities(), vec![EntityKind::Students]);
        assert_eq!(config.student_org_unit.as_deref(), Some("Students"));

        let context = config.entity_context();
        assert_eq!(context.page_size, 500);
        assert_eq!(
            context.school_year_start,
            NaiveDate::from_ymd_opt(2024, 8, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_env_pull_all() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("PULL_ALL", "YES")])).unwrap();
        assert!(EntityKind::ALL.iter().all(|k| config.pull.enabled(*k)));
    }

    #[test]
    fn test_env_rejects_bad_numbers_and_dates() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("TOPICS_BATCH_SIZE", "many")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { field, .. } if field == "TOPICS_BATCH_SIZE"));

        let err = config
            .apply_env(env(&[("SCHOOL_YEAR_START", "August")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_env_service_account_from_credentials_path() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("GOOGLE_APPLICATION_CREDENTIALS", "/secrets/key.json"),
                ("ACCOUNT_EMAIL", "admin@example.org"),
            ]))
            .unwrap();
        assert_eq!(
            config.auth,
            AuthSettings::ServiceAccount {
                key_file: PathBuf::from("/secrets/key.json"),
                scopes: vec![],
                subject: Some("admin@example.org".to_string()),
            }
        );
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        config.batch_sizes.insert("Nope".to_string(), 5);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.batch_sizes.insert("Topics".to_string(), 0);
        assert!(config.validate().is_err());

        let config = AppConfig {
            page_size: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_file_enables_dump_dir() {
        let config = AppConfig {
            debug_file: true,
            data_dir: PathBuf::from("out"),
            ..AppConfig::default()
        };
        let pull = config.pull_config().unwrap();
        assert_eq!(
            pull.dump_path(EntityKind::Topics),
            Some(PathBuf::from("out/topics.jsonl"))
        );
    }

    #[test]
    fn test_auth_settings_resolve() {
        let bearer = AuthSettings::Bearer {
            token: "abc".to_string(),
        };
        assert!(matches!(
            bearer.to_auth_config().unwrap(),
            AuthConfig::Bearer { token } if token == "abc"
        ));

        let missing = AuthSettings::ServiceAccount {
            key_file: PathBuf::from("/nonexistent/key.json"),
            scopes: vec![],
            subject: None,
        };
        assert!(matches!(
            missing.to_auth_config(),
            Err(Error::FileNotFound { .. })
        ));

        let key = AuthSettings::ServiceAccount {
            key_file: PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/tests/fixtures/service_account.json"
            )),
            scopes: vec![],
            subject: Some("admin@example.org".to_string()),
        };
        match key.to_auth_config().unwrap() {
            AuthConfig::ServiceAccount {
                scopes, subject, ..
            } => {
                assert!(!scopes.is_empty());
                assert_eq!(subject.as_deref(), Some("admin@example.org"));
            }
            other => panic!("expected service account auth, got {other:?}"),
        }
    }
}
