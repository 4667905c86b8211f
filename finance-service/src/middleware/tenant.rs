//! Company context extraction for multi-tenancy.
//!
//! Every document, sequence and recurring operation is scoped to the
//! company named in the `X-Company-ID` header. The header is set by the
//! API gateway after authentication; this service only enforces that it
//! is present and well-formed.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use finance_core::error::AppError;
use uuid::Uuid;

/// Company scope for the current request.
#[derive(Debug, Clone, Copy)]
pub struct CompanyContext {
    pub company_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-Company-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Missing X-Company-ID header"))
            })?;

        let company_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!("X-Company-ID header must be a UUID"))
        })?;

        let span = tracing::Span::current();
        span.record("company_id", raw);

        Ok(CompanyContext { company_id })
    }
}
