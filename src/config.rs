use dotenvy::dotenv;
use std::env;

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub flag_service_url: String,
    pub targeting_service_url: String,
    pub service_api_key: String,
    // Redis list the analytics consumer drains; unset means log-only audit
    pub audit_queue: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenv().is_ok();

        let port = env::var("PORT")
            .expect("PORT missing, it is required")
            .parse()
            .expect("PORT must be a valid u16 number");

        let redis_url = env::var("REDIS_URL").expect("REDIS_URL missing, it is required");

        let flag_service_url =
            env::var("FLAG_SERVICE_URL").expect("FLAG_SERVICE_URL missing, it is required");

        let targeting_service_url = env::var("TARGETING_SERVICE_URL")
            .expect("TARGETING_SERVICE_URL missing, it is required");

        // Static service credential for the flag/targeting admin APIs,
        // provisioned out of band (distinct from any end-user key)
        let service_api_key =
            env::var("SERVICE_API_KEY").expect("SERVICE_API_KEY missing, it is required");

        let audit_queue = env::var("AUDIT_QUEUE").ok().filter(|q| !q.is_empty());

        Self {
            port,
            redis_url,
            flag_service_url,
            targeting_service_url,
            service_api_key,
            audit_queue,
        }
    }

    pub fn addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
