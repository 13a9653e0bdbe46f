//! Request field extraction
//!
//! `RequestFields` is an Axum extractor that parses the query string and the
//! form body once per request. Descriptors then read from it through an
//! [`Extractor`], which never fails: a missing or unreadable field is `""`.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Query, Request},
    http::{header::CONTENT_TYPE, Method},
    Form,
};

/// Anything that can answer field lookups by name
pub trait FieldSource {
    fn query_value(&self, name: &str) -> Option<&str>;
    fn form_value(&self, name: &str) -> Option<&str>;
}

/// Where a field's raw value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    QueryString,
    FormBody,
}

impl Extractor {
    pub fn extract<'s, S>(&self, name: &str, source: &'s S) -> &'s str
    where
        S: FieldSource + ?Sized,
    {
        let value = match self {
            Extractor::QueryString => source.query_value(name),
            Extractor::FormBody => source.form_value(name),
        };
        value.unwrap_or_default()
    }

    /// Query string for GET, form body for everything else.
    pub fn for_method(method: &Method) -> Self {
        if method == Method::GET {
            Extractor::QueryString
        } else {
            Extractor::FormBody
        }
    }
}

/// Query and form pairs of one request, in arrival order
#[derive(Debug, Clone, Default)]
pub struct RequestFields {
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
}

impl RequestFields {
    pub fn new(query: Vec<(String, String)>, form: Vec<(String, String)>) -> Self {
        Self { query, form }
    }
}

fn first_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

impl FieldSource for RequestFields {
    fn query_value(&self, name: &str) -> Option<&str> {
        first_value(&self.query, name)
    }

    fn form_value(&self, name: &str) -> Option<&str> {
        first_value(&self.form, name)
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestFields
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();

        // Axum's `Form` falls back to the query string for GET/HEAD; a body
        // on those methods is not a form here.
        let form = if matches!(*req.method(), Method::GET | Method::HEAD) {
            Vec::new()
        } else {
            read_form(req, state).await
        };

        Ok(Self { query, form })
    }
}

async fn read_form<S>(req: Request, state: &S) -> Vec<(String, String)>
where
    S: Send + Sync,
{
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        return Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map(|Form(pairs)| pairs)
            .unwrap_or_default();
    }

    let Ok(mut multipart) = Multipart::from_request(req, state).await else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        // file parts are not form values
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match field.text().await {
            Ok(value) => pairs.push((name, value)),
            Err(err) => {
                tracing::debug!(error = %err, "stopped reading malformed multipart body");
                break;
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn fields(request: Request) -> RequestFields {
        RequestFields::from_request(request, &()).await.unwrap()
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extractor_reads_the_selected_source() {
        let source = RequestFields::new(pairs(&[("uuid", "from-query")]), pairs(&[("uuid", "from-form")]));
        assert_eq!(Extractor::QueryString.extract("uuid", &source), "from-query");
        assert_eq!(Extractor::FormBody.extract("uuid", &source), "from-form");
        assert_eq!(Extractor::FormBody.extract("name", &source), "");
    }

    #[test]
    fn first_repeated_value_wins() {
        let source = RequestFields::new(pairs(&[("ip", "1.2.3.4"), ("ip", "5.6.7.8")]), vec![]);
        assert_eq!(Extractor::QueryString.extract("ip", &source), "1.2.3.4");
    }

    #[test]
    fn for_method_picks_query_only_for_get() {
        assert_eq!(Extractor::for_method(&Method::GET), Extractor::QueryString);
        assert_eq!(Extractor::for_method(&Method::POST), Extractor::FormBody);
        assert_eq!(Extractor::for_method(&Method::PATCH), Extractor::FormBody);
    }

    #[tokio::test]
    async fn parses_urlencoded_body_and_query() {
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/player?uuid=abc%2Ddef")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Anime_Ban&version=47"))
            .unwrap();

        let fields = fields(request).await;
        assert_eq!(fields.query_value("uuid"), Some("abc-def"));
        assert_eq!(fields.form_value("name"), Some("Anime_Ban"));
        assert_eq!(fields.form_value("version"), Some("47"));
        assert_eq!(fields.form_value("uuid"), None);
    }

    #[tokio::test]
    async fn parses_multipart_body() {
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"ip\"\r\n\r\n\
            10.0.0.1\r\n\
            --XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            ignored\r\n\
            --XBOUNDARY--\r\n";
        let request = Request::builder()
            .method(Method::POST)
            .uri("/ip")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();

        let fields = fields(request).await;
        assert_eq!(fields.form_value("ip"), Some("10.0.0.1"));
        assert_eq!(fields.form_value("upload"), None);
    }

    #[tokio::test]
    async fn non_form_body_yields_no_fields() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/ip")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"ip":"10.0.0.1"}"#))
            .unwrap();

        assert_eq!(fields(request).await.form_value("ip"), None);
    }

    #[tokio::test]
    async fn get_body_is_not_read_as_form() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/ip?ip=10.0.0.1")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("ip=192.168.0.1"))
            .unwrap();

        let fields = fields(request).await;
        assert_eq!(fields.query_value("ip"), Some("10.0.0.1"));
        assert_eq!(fields.form_value("ip"), None);
    }
}
