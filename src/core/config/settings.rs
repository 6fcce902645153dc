use super::parsing::{
    env_optional, env_or_default, is_supported_image_extension, parse_bool, parse_cors_origins,
    parse_environment, parse_principal_list, parse_string_list, parse_u16, parse_u32, parse_u64,
    parse_unit_f32,
};
use super::secret::load_or_create_identity_secret;
use super::types::{
    AccessSettings, ApiSettings, BackendSettings, CacheSettings, CompressionSettings,
    ConfigError, CorsSettings, RedisSettings, RuntimeSettings, SecuritySettings, ServerHost,
    ServerPort, ServerSettings, Settings, TelemetrySettings, UploadSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("DELTA_HOST", "0.0.0.0");
        let port = env_or_default("DELTA_PORT", "8080");

        let environment =
            parse_environment(env_optional("DELTA_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("DELTA_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Delta Practice Portal");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let identity_secret_configured = env_optional("IDENTITY_TOKEN_SECRET");
        let identity_secret_missing = identity_secret_configured.is_none();
        let identity_secret =
            identity_secret_configured.unwrap_or_else(load_or_create_identity_secret);
        let algorithm = env_or_default("IDENTITY_TOKEN_ALGORITHM", "HS256");
        let dev_token_expire_minutes = parse_u64(
            "DEV_TOKEN_EXPIRE_MINUTES",
            env_or_default("DEV_TOKEN_EXPIRE_MINUTES", "720"),
        )?;

        let cors_origins = parse_cors_origins(env_optional("PORTAL_CORS_ORIGINS"))?;

        let backend_url = env_optional("EXAM_BACKEND_URL");
        let backend_connect_timeout = parse_u64(
            "EXAM_BACKEND_CONNECT_TIMEOUT_SECONDS",
            env_or_default("EXAM_BACKEND_CONNECT_TIMEOUT_SECONDS", "10"),
        )?;
        let backend_request_timeout = parse_u64(
            "EXAM_BACKEND_TIMEOUT_SECONDS",
            env_or_default("EXAM_BACKEND_TIMEOUT_SECONDS", "60"),
        )?;

        let admin_principals = parse_principal_list(env_optional("ADMIN_PRINCIPALS"))?;

        let max_size_kb = parse_u64(
            "IMAGE_COMPRESSION_THRESHOLD_KB",
            env_or_default("IMAGE_COMPRESSION_THRESHOLD_KB", "1024"),
        )?;
        let quality =
            parse_unit_f32("IMAGE_QUALITY", env_or_default("IMAGE_QUALITY", "0.8"))?;
        let max_dimension =
            parse_u32("IMAGE_MAX_DIMENSION", env_or_default("IMAGE_MAX_DIMENSION", "1920"))?;

        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "20"))?;
        let allowed_image_extensions = parse_string_list(
            env_optional("ALLOWED_IMAGE_EXTENSIONS"),
            &["jpg", "jpeg", "png", "webp", "gif"],
        );

        let cache_ttl_seconds =
            parse_u64("QUERY_CACHE_TTL_SECONDS", env_or_default("QUERY_CACHE_TTL_SECONDS", "60"))?;
        let cache_redis_enabled =
            env_optional("QUERY_CACHE_REDIS").map(|value| parse_bool(&value)).unwrap_or(false);
        let cache_key_prefix = env_or_default("QUERY_CACHE_PREFIX", "delta:query");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let log_level = env_or_default("DELTA_LOG_LEVEL", "info");
        let json = env_optional("DELTA_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings { identity_secret, algorithm, dev_token_expire_minutes },
            cors: CorsSettings { origins: cors_origins },
            backend: BackendSettings {
                base_url: backend_url.map(|url| url.trim_end_matches('/').to_string()),
                connect_timeout_seconds: backend_connect_timeout,
                request_timeout_seconds: backend_request_timeout,
            },
            access: AccessSettings { admin_principals },
            compression: CompressionSettings { max_size_kb, quality, max_dimension },
            uploads: UploadSettings { max_upload_size_mb, allowed_image_extensions },
            cache: CacheSettings {
                ttl_seconds: cache_ttl_seconds,
                redis_enabled: cache_redis_enabled,
                key_prefix: cache_key_prefix,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate(identity_secret_missing)?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn backend(&self) -> &BackendSettings {
        &self.backend
    }

    pub(crate) fn access(&self) -> &AccessSettings {
        &self.access
    }

    pub(crate) fn compression(&self) -> &CompressionSettings {
        &self.compression
    }

    pub(crate) fn uploads(&self) -> &UploadSettings {
        &self.uploads
    }

    pub(crate) fn cache(&self) -> &CacheSettings {
        &self.cache
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self, identity_secret_missing: bool) -> Result<(), ConfigError> {
        if self.uploads.allowed_image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_IMAGE_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        for extension in &self.uploads.allowed_image_extensions {
            if !is_supported_image_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_IMAGE_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.compression.max_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                field: "IMAGE_MAX_DIMENSION",
                value: "0".to_string(),
            });
        }

        if self.security.algorithm != "HS256" {
            return Err(ConfigError::InvalidValue {
                field: "IDENTITY_TOKEN_ALGORITHM",
                value: self.security.algorithm.clone(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if identity_secret_missing {
            return Err(ConfigError::MissingSecret("IDENTITY_TOKEN_SECRET"));
        }
        if self.backend.base_url.is_none() {
            return Err(ConfigError::MissingSecret("EXAM_BACKEND_URL"));
        }
        if self.access.admin_principals.is_empty() {
            return Err(ConfigError::MissingSecret("ADMIN_PRINCIPALS"));
        }

        Ok(())
    }
}
