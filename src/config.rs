use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Endpoint of the image CDN. When unset, upload-backed endpoints reject
    /// file parts with an upstream error instead of failing at startup.
    pub cdn_upload_url: Option<String>,
    pub cdn_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")?;
        let cdn_upload_url = env::var("CDN_UPLOAD_URL").ok().filter(|v| !v.is_empty());
        let cdn_api_key = env::var("CDN_API_KEY").ok().filter(|v| !v.is_empty());
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            cdn_upload_url,
            cdn_api_key,
        })
    }
}
