use axum::{
    async_trait,
    extract::{Form, FromRequest, Query, Request},
    http::{header::CONTENT_TYPE, Method},
    response::{IntoResponse, Response},
};

use crate::error::{NodeError, Result};

/// Query-string and urlencoded-form parameters, merged in that order.
#[derive(Debug, Default)]
pub struct RequestParams(pub Vec<(String, String)>);

impl RequestParams {
    /// The one value of `name`; absent or repeated parameters are format errors.
    pub fn single(&self, name: &'static str) -> Result<&str> {
        let mut values = self.0.iter().filter(|(key, _)| key == name).map(|(_, v)| v.as_str());
        match (values.next(), values.count()) {
            (None, _) => Err(NodeError::MissingParameter(name)),
            (Some(value), 0) => Ok(value),
            (Some(_), rest) => Err(NodeError::DuplicateParameter(name, rest + 1)),
        }
    }

    /// A strictly positive integer amount.
    pub fn amount(&self, name: &'static str) -> Result<i64> {
        let raw = self.single(name)?;
        match raw.trim().parse::<i64>() {
            Ok(amount) if amount > 0 => Ok(amount),
            _ => Err(NodeError::InvalidAmount(raw.to_string())),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Query(mut params) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(IntoResponse::into_response)?;

        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form && req.method() != Method::GET {
            let Form(body) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            params.extend(body);
        }

        Ok(Self(params))
    }
}
