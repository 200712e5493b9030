use axum::{
    extract::{rejection::FormRejection, FromRequest, Request},
    Form,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Form` extractor whose rejections render as HTML error pages
///
/// Wraps [`axum::Form`]; a wrong content type or undecodable body keeps the
/// status axum picked (415, 422, ...) but goes through [`AppError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlForm<T>(pub T);

impl<T, S> FromRequest<S> for HtmlForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await?;
        Ok(HtmlForm(value))
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::MalformedForm {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
