use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub schedule: ScheduleConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Shut down once stdin reaches EOF, for servers owned by a parent process
    pub exit_on_stdin_close: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "postgres" | "postgresql" | "pg" => Some(StoreBackend::Postgres),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub routes_table: String,
    pub users_table: String,
    pub locations_table: String,
    /// YAML document seeded into the store at startup
    pub fixtures_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone used to render and interpret route times
    pub timezone: String,
    /// Available routes window, in hours from now
    pub hours_offset: i64,
    /// Open shifts window, in days from now
    pub days_offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub enable_cors: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_EXIT_ON_STDIN_CLOSE") {
            self.server.exit_on_stdin_close = v.parse().unwrap_or(self.server.exit_on_stdin_close);
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.store.backend = StoreBackend::parse(&v).unwrap_or(self.store.backend);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.store.database_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.store.connection_timeout = v.parse().unwrap_or(self.store.connection_timeout);
        }
        if let Ok(v) = env::var("TABLE_PICKING_ROUTES") {
            self.store.routes_table = v;
        }
        if let Ok(v) = env::var("TABLE_USERS") {
            self.store.users_table = v;
        }
        if let Ok(v) = env::var("TABLE_LOCATIONS") {
            self.store.locations_table = v;
        }
        if let Ok(v) = env::var("STORE_FIXTURES") {
            self.store.fixtures_path = Some(v).filter(|p| !p.trim().is_empty());
        }

        // Schedule overrides
        if let Ok(v) = env::var("TIMEZONE") {
            self.schedule.timezone = v;
        }
        if let Ok(v) = env::var("HOURS_OFFSET") {
            self.schedule.hours_offset = v.parse().unwrap_or(self.schedule.hours_offset);
        }
        if let Ok(v) = env::var("DAYS_OFFSET") {
            self.schedule.days_offset = v.parse().unwrap_or(self.schedule.days_offset);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_ENABLE_CORS") {
            self.api.enable_cors = v.parse().unwrap_or(self.api.enable_cors);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                exit_on_stdin_close: false,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 5,
                connection_timeout: 30,
                routes_table: "picking_routes".to_string(),
                users_table: "users".to_string(),
                locations_table: "locations".to_string(),
                fixtures_path: None,
            },
            schedule: ScheduleConfig {
                timezone: "America/Argentina/Buenos_Aires".to_string(),
                hours_offset: 24,
                days_offset: 7,
            },
            api: ApiConfig {
                enable_request_logging: true,
                enable_cors: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                exit_on_stdin_close: false,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 10,
                connection_timeout: 10,
                routes_table: "picking_routes".to_string(),
                users_table: "users".to_string(),
                locations_table: "locations".to_string(),
                fixtures_path: None,
            },
            schedule: ScheduleConfig {
                timezone: "America/Argentina/Buenos_Aires".to_string(),
                hours_offset: 24,
                days_offset: 7,
            },
            api: ApiConfig {
                enable_request_logging: true,
                enable_cors: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                exit_on_stdin_close: false,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 30,
                connection_timeout: 5,
                routes_table: "picking_routes".to_string(),
                users_table: "users".to_string(),
                locations_table: "locations".to_string(),
                fixtures_path: None,
            },
            schedule: ScheduleConfig {
                timezone: "America/Argentina/Buenos_Aires".to_string(),
                hours_offset: 12,
                days_offset: 7,
            },
            api: ApiConfig {
                enable_request_logging: false,
                enable_cors: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
