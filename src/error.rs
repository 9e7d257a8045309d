use snafu::{IntoError, Snafu};
use surf::StatusCode;

/// Errors produced while talking to a REST API.
///
/// Nothing here is retried or recovered internally. Transport failures, non-success statuses and
/// response bodies which do not match the declared schema all propagate unchanged to the caller.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The transport failed before a response was produced.
    #[snafu(display("request to {} failed: {}", url, error))]
    Transport { url: String, error: surf::Error },

    #[snafu(display("response body could not be read: {}", error))]
    ReadBody { error: surf::Error },

    /// The server answered with a status outside of the 2xx range.
    #[snafu(display("{} {}", status, body))]
    HttpStatus { status: StatusCode, body: String },

    #[snafu(display("response body is not a valid {}: {}", schema, source))]
    Validation {
        schema: &'static str,
        source: serde_json::Error,
    },

    #[snafu(display("binary response body is not a valid {}: {}", schema, source))]
    BinaryValidation {
        schema: &'static str,
        source: bincode::Error,
    },

    #[snafu(display("element {} of response body is not a valid {}: {}", index, schema, source))]
    ElementValidation {
        index: usize,
        schema: &'static str,
        source: serde_json::Error,
    },

    #[snafu(display("invalid request URL {}: {}", url, source))]
    InvalidUrl {
        url: String,
        source: surf::http::url::ParseError,
    },

    #[snafu(display("request body fails to serialize: {}", source))]
    Payload { source: serde_json::Error },

    #[snafu(display("query parameters fail to serialize: {}", source))]
    QueryEncode { source: serde_json::Error },

    #[snafu(display("query parameter {} is not a flat value", key))]
    NestedQuery { key: String },

    #[snafu(display("query parameters must serialize to a map, not {}", found))]
    QueryShape { found: &'static str },

    #[snafu(display("unknown HTTP verb {}", verb))]
    UnknownVerb { verb: String },

    #[snafu(display("invalid connector configuration: {}", reason))]
    Config { reason: String },
}

impl Error {
    /// The HTTP status of a failed response, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw body text of a failed response, if this error carries one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Context for embedding transport errors into [Error].
///
/// [surf::Error] does not implement [std::error::Error], so it cannot be the `source` of a SNAFU
/// variant. This type implements [IntoError] by hand, so that
/// `some_result.context(TransportContext { url })` works just like a generated SNAFU context.
pub struct TransportContext {
    pub url: String,
}

impl IntoError<Error> for TransportContext {
    type Source = surf::Error;

    fn into_error(self, source: Self::Source) -> Error {
        Error::Transport {
            url: self.url,
            error: source,
        }
    }
}
