use std::{
    fmt::Display,
    pin::Pin,
    task::{Context, Poll},
};

use actix_web::{
    body::{BodySize, MessageBody},
    http::StatusCode,
    web::Bytes,
};

#[derive(Debug, Clone, PartialEq)]
pub enum CureError {
    /// Input rejected before any I/O happened.
    Validation(String),
    NotFound(String),
    Fetch(String),
    Persistence(String),
    Conflict { expected: i32, actual: i32 },
    CuratedLocked(i32),
    Upload(String),
    FitService(String),
}

impl CureError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CureError::Validation(_) => StatusCode::BAD_REQUEST,
            CureError::NotFound(_) => StatusCode::NOT_FOUND,
            CureError::Fetch(_) | CureError::Upload(_) | CureError::FitService(_) => {
                StatusCode::BAD_GATEWAY
            }
            CureError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CureError::Conflict { .. } => StatusCode::CONFLICT,
            CureError::CuratedLocked(_) => StatusCode::LOCKED,
        }
    }
}

impl Display for CureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CureError::Validation(e) => write!(f, "ValidationError: {}", e),
            CureError::NotFound(e) => write!(f, "NotFoundError: {}", e),
            CureError::Fetch(e) => write!(f, "FetchError: {}", e),
            CureError::Persistence(e) => write!(f, "PersistenceError: {}", e),
            CureError::Conflict { expected, actual } => write!(
                f,
                "ConflictError: entry changed since it was loaded (expected version {}, found {})",
                expected, actual
            ),
            CureError::CuratedLocked(id) => {
                write!(f, "CuratedLockedError: entry {} is curated and can no longer be edited", id)
            }
            CureError::Upload(e) => write!(f, "UploadError: {}", e),
            CureError::FitService(e) => write!(f, "FitServiceError: {}", e),
        }
    }
}

impl std::error::Error for CureError {}

impl From<sea_orm::DbErr> for CureError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e {
            sea_orm::DbErr::RecordNotFound(msg) => CureError::NotFound(msg),
            other => CureError::Persistence(other.to_string()),
        }
    }
}

impl MessageBody for CureError {
    type Error = std::convert::Infallible;

    fn size(&self) -> BodySize {
        BodySize::Sized(self.to_string().len() as u64)
    }

    fn poll_next(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let this = Pin::<&mut CureError>::into_inner(self);
        Poll::Ready(Some(Ok(Bytes::from(this.to_string()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(CureError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CureError::Conflict { expected: 1, actual: 2 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(CureError::CuratedLocked(4).status_code(), StatusCode::LOCKED);
        assert_eq!(CureError::FitService("down".into()).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn record_not_found_becomes_not_found() {
        let e: CureError = sea_orm::DbErr::RecordNotFound("Entry 3".into()).into();
        assert_eq!(e, CureError::NotFound("Entry 3".into()));
        let e: CureError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(matches!(e, CureError::Persistence(_)));
    }

    #[test]
    fn display_keeps_the_message() {
        let e = CureError::Validation("Tm is required".into());
        assert_eq!(e.to_string(), "ValidationError: Tm is required");
    }
}
