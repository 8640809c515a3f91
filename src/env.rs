use std::path::Path;

use tracing::{info, warn};

use crate::report::Letterhead;

const DEFAULT_DATABASE_URL: &str = "sqlite://campus.db?mode=rwc";
const DEFAULT_SESSION_HOURS: i64 = 8;
const DEFAULT_SCHOOL_NAME: &str = "CampusConnect Academy";
const DEFAULT_SCHOOL_ADDRESS: &str = "123 Education Lane, Knowledge City";

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

/// Application settings read from the process environment once at launch.
/// Rocket's own settings (address, port, secret key) stay with figment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub session_hours: i64,
    pub letterhead: Letterhead,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Clone, PartialEq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn non_empty(key: &str) -> Option<String> {
    dotenvy::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let session_hours = match non_empty("SESSION_HOURS").map(|v| v.parse::<i64>()) {
            Some(Ok(hours)) if hours > 0 => hours,
            Some(_) => {
                warn!(
                    default = DEFAULT_SESSION_HOURS,
                    "SESSION_HOURS is not a positive number, using default"
                );
                DEFAULT_SESSION_HOURS
            }
            None => DEFAULT_SESSION_HOURS,
        };

        let bootstrap_admin = match (
            non_empty("BOOTSTRAP_ADMIN_EMAIL"),
            non_empty("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one of BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD is set, ignoring both");
                None
            }
            (None, None) => None,
        };

        Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            session_hours,
            letterhead: Letterhead {
                school_name: non_empty("SCHOOL_NAME")
                    .unwrap_or_else(|| DEFAULT_SCHOOL_NAME.to_string()),
                address: non_empty("SCHOOL_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_SCHOOL_ADDRESS.to_string()),
                motto: non_empty("SCHOOL_MOTTO"),
            },
            bootstrap_admin,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            session_hours: DEFAULT_SESSION_HOURS,
            letterhead: Letterhead {
                school_name: DEFAULT_SCHOOL_NAME.to_string(),
                address: DEFAULT_SCHOOL_ADDRESS.to_string(),
                motto: None,
            },
            bootstrap_admin: None,
        }
    }
}
