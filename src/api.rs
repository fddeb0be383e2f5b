//! Rapidgator API wire types.
//!
//! Every endpoint wraps its payload in the same envelope:
//! `{"response": {...}, "response_status": 200, "response_details": null}`.
//! Nothing in a response is trusted until it has been checked here.

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use url::Url;

use crate::Cause;

/// Login endpoint, relative to the API root.
pub const LOGIN_PATH: &str = "api/user/login";
/// Dedup probe endpoint.
pub const DUPLOAD_PATH: &str = "api/file/dupload";
/// Upload lookup endpoint.
pub const DUPLOAD_INFO_PATH: &str = "api/file/dupload_info";

/// Query parameter on the upload URL that names the pending upload.
const UPLOAD_ID_PARAM: &str = "uuid";

/// The common response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub response: Option<T>,
    #[serde(default)]
    pub response_status: Option<u16>,
    #[serde(default)]
    pub response_details: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, failing on an error status or a missing body.
    pub fn into_response(self) -> Result<T, Cause> {
        if let Some(status) = self.response_status {
            if status != 200 {
                return Err(Cause::Api {
                    status,
                    details: self
                        .response_details
                        .unwrap_or_else(|| "no details".into()),
                });
            }
        }
        self.response.ok_or(Cause::MissingField("response"))
    }
}

/// Parse an envelope out of a raw response body.
pub fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, Cause> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    envelope.into_response()
}

/// Payload of `api/user/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub session_id: Option<String>,
}

impl LoginResponse {
    pub fn session_id(self) -> Result<String, Cause> {
        non_empty(self.session_id, "session_id")
    }
}

/// Payload of `api/file/dupload`.
#[derive(Debug, Clone, Deserialize)]
pub struct DuploadResponse {
    /// Public link, present when the content already exists.
    #[serde(default)]
    pub link: Option<String>,
    /// Where to send the bytes otherwise.
    #[serde(default)]
    pub url: Option<String>,
}

/// Payload of `api/file/dupload_info`.
#[derive(Debug, Clone, Deserialize)]
pub struct DuploadInfoResponse {
    #[serde(default)]
    pub link: Option<String>,
}

impl DuploadInfoResponse {
    pub fn link(self) -> Result<String, Cause> {
        decode(&non_empty(self.link, "link")?)
    }
}

/// Outcome of the dedup probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedUpload {
    /// The service already has this content; here is its public link.
    AlreadyExists { url: String },
    /// The bytes must be transferred first.
    Pending(PendingUpload),
}

/// An upload the service is waiting to receive bytes for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    upload_url: Url,
    upload_id: String,
}

impl PendingUpload {
    /// Build from a decoded upload URL, extracting its upload id.
    pub fn from_url(upload_url: &str) -> Result<Self, Cause> {
        let upload_url = Url::parse(upload_url)
            .map_err(|e| Cause::Malformed(format!("upload url {:?}: {}", upload_url, e)))?;

        let upload_id = upload_url
            .query_pairs()
            .find(|(key, _)| key == UPLOAD_ID_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .ok_or(Cause::MissingField(UPLOAD_ID_PARAM))?;

        Ok(PendingUpload {
            upload_url,
            upload_id,
        })
    }

    /// URL the multipart body is posted to.
    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    /// Identifier used to look the upload up once the bytes are in.
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }
}

impl DuploadResponse {
    /// Interpret the probe result. A link wins over an upload url.
    pub fn into_prepared(self) -> Result<PreparedUpload, Cause> {
        if let Some(link) = self.link.filter(|l| !l.is_empty()) {
            return Ok(PreparedUpload::AlreadyExists { url: decode(&link)? });
        }

        let url = non_empty(self.url, "url")?;
        Ok(PreparedUpload::Pending(PendingUpload::from_url(&decode(&url)?)?))
    }
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, Cause> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(Cause::MissingField(field))
}

/// Percent-decode a URL the service hands back escaped.
pub fn decode(value: &str) -> Result<String, Cause> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|e| Cause::Malformed(format!("{:?} is not valid UTF-8 once decoded: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response() {
        let body = r#"{"response":{"session_id":"abc"},"response_status":200,"response_details":null}"#;
        let login: LoginResponse = parse(body).unwrap();
        assert_eq!(login.session_id().unwrap(), "abc");
    }

    #[test]
    fn test_login_missing_session_id() {
        for body in [
            r#"{"response":{},"response_status":200}"#,
            r#"{"response":{"session_id":""},"response_status":200}"#,
            r#"{"response":{"session_id":null}}"#,
        ] {
            let login: LoginResponse = parse(body).unwrap();
            assert!(matches!(
                login.session_id(),
                Err(Cause::MissingField("session_id"))
            ));
        }
    }

    #[test]
    fn test_envelope_error_status() {
        let body = r#"{"response":null,"response_status":401,"response_details":"Error: Invalid login or password"}"#;
        match parse::<LoginResponse>(body) {
            Err(Cause::Api { status, details }) => {
                assert_eq!(status, 401);
                assert!(details.contains("Invalid login"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_missing_response() {
        assert!(matches!(
            parse::<LoginResponse>("{}"),
            Err(Cause::MissingField("response"))
        ));
        assert!(matches!(parse::<LoginResponse>("<html>"), Err(Cause::Json(_))));
    }

    #[test]
    fn test_dupload_existing() {
        let body = r#"{"response":{"link":"http%3A%2F%2Frapidgator.net%2Ffile%2Fabc%2Fa.bin.html"}}"#;
        let prepared = parse::<DuploadResponse>(body).unwrap().into_prepared().unwrap();
        assert_eq!(
            prepared,
            PreparedUpload::AlreadyExists {
                url: "http://rapidgator.net/file/abc/a.bin.html".into()
            }
        );
    }

    #[test]
    fn test_dupload_pending() {
        let body = r#"{"response":{"url":"http%3A%2F%2Fpr1.rapidgator.net%2F%3Fr%3Dupload%26uuid%3DABC123"}}"#;
        let prepared = parse::<DuploadResponse>(body).unwrap().into_prepared().unwrap();
        match prepared {
            PreparedUpload::Pending(pending) => {
                assert_eq!(pending.upload_id(), "ABC123");
                assert_eq!(
                    pending.upload_url().as_str(),
                    "http://pr1.rapidgator.net/?r=upload&uuid=ABC123"
                );
            }
            other => panic!("expected pending upload, got {:?}", other),
        }
    }

    #[test]
    fn test_dupload_missing_uuid() {
        let body = r#"{"response":{"url":"http://pr1.rapidgator.net/?r=upload"}}"#;
        let result = parse::<DuploadResponse>(body).unwrap().into_prepared();
        assert!(matches!(result, Err(Cause::MissingField("uuid"))));

        let body = r#"{"response":{"url":"http://pr1.rapidgator.net/?uuid="}}"#;
        let result = parse::<DuploadResponse>(body).unwrap().into_prepared();
        assert!(matches!(result, Err(Cause::MissingField("uuid"))));
    }

    #[test]
    fn test_dupload_neither_field() {
        let body = r#"{"response":{}}"#;
        let result = parse::<DuploadResponse>(body).unwrap().into_prepared();
        assert!(matches!(result, Err(Cause::MissingField("url"))));
    }

    #[test]
    fn test_dupload_unparseable_url() {
        let body = r#"{"response":{"url":"not a url"}}"#;
        let result = parse::<DuploadResponse>(body).unwrap().into_prepared();
        assert!(matches!(result, Err(Cause::Malformed(_))));
    }

    #[test]
    fn test_dupload_info() {
        let info: DuploadInfoResponse =
            parse(r#"{"response":{"link":"http%3A%2F%2Frapidgator.net%2Ffile%2Fx"}}"#).unwrap();
        assert_eq!(info.link().unwrap(), "http://rapidgator.net/file/x");

        let info: DuploadInfoResponse = parse(r#"{"response":{"state":1}}"#).unwrap();
        assert!(matches!(info.link(), Err(Cause::MissingField("link"))));
    }

    #[test]
    fn test_decode_plain_passthrough() {
        assert_eq!(decode("http://a/b?c=d").unwrap(), "http://a/b?c=d");
        assert!(decode("%FF%FE").is_err());
    }
}
