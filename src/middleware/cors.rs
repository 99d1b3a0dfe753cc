use axum::http::{
    header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::cors::CorsLayer;

use crate::error::{Error, Result};

/// Only the questionnaire frontend may call the API from a browser.
pub fn frontend_cors(frontend_url: &str) -> Result<CorsLayer> {
    let origin = url::Url::parse(frontend_url)
        .map_err(|e| Error::Config(format!("Invalid value for FRONTEND_URL: {}", e)))?
        .origin()
        .ascii_serialization();
    let origin = HeaderValue::from_str(&origin)
        .map_err(|e| Error::Config(format!("FRONTEND_URL is not a valid origin: {}", e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([CONTENT_DISPOSITION]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_drops_path() {
        assert!(frontend_cors("https://hr.example.com/app/").is_ok());
        assert!(frontend_cors("not a url").is_err());
    }
}
