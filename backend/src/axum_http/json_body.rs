use axum::{
    Json, async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::Response,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::error_responses::error_response;

/// JSON request body whose rejections use the shared `{code, message}` shape
/// with status 400, whatever axum's own rejection status would have been.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                let detail = rejection.body_text();
                warn!(%detail, "http: rejected request body");
                Err(error_response(StatusCode::BAD_REQUEST, detail))
            }
        }
    }
}
