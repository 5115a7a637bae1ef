use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub bind_address: String,
    pub data_path: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if present (silently ignored if missing)
        let _ = dotenvy::dotenv();

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| "Missing ANTHROPIC_API_KEY — set it in .env or as an environment variable".to_string())?;
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let data_path = env::var("DATA_PATH").unwrap_or_else(|_| "data/sales_data.csv".to_string());
        let model = env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string());

        Ok(Self {
            anthropic_api_key,
            bind_address,
            data_path,
            model,
        })
    }
}
