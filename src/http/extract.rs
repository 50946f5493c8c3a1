//! Extractors whose rejections render as `{"error": ...}` like every other failure

use axum::extract::{FromRequest, FromRequestParts};

use crate::http::routes::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
