use crate::error::{BinaryValidationSnafu, ElementValidationSnafu, Error, ValidationSnafu};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use snafu::ResultExt;
use std::any::type_name;
use surf::{middleware::Next, Client, Request, Response};
use tracing::{event, Level};

/// Serialization format of a response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Binary,
}

impl ResponseFormat {
    /// Pick the format from the response's Content-Type.
    ///
    /// `application/octet-stream` bodies are decoded with bincode. Every other body, with any
    /// Content-Type or none, is read as JSON and left to schema validation.
    pub fn of(res: &Response) -> Self {
        match res.content_type() {
            Some(mime) if mime.essence() == "application/octet-stream" => Self::Binary,
            _ => Self::Json,
        }
    }
}

/// A fully read response body, ready to be validated against a schema.
#[derive(Clone, Debug)]
pub struct ResponseBody {
    pub format: ResponseFormat,
    pub bytes: Vec<u8>,
}

impl ResponseBody {
    /// Validate the whole body as a `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let schema = type_name::<T>();
        match self.format {
            ResponseFormat::Json => {
                serde_json::from_slice(&self.bytes).context(ValidationSnafu { schema })
            }
            ResponseFormat::Binary => {
                bincode::deserialize(&self.bytes).context(BinaryValidationSnafu { schema })
            }
        }
    }

    /// Validate the body as a sequence, checking each element against `T` independently.
    ///
    /// An empty sequence is not an error.
    pub fn decode_each<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        match self.format {
            ResponseFormat::Json => {
                let schema = type_name::<T>();
                self.decode::<Vec<Value>>()?
                    .into_iter()
                    .enumerate()
                    .map(|(index, element)| {
                        serde_json::from_value(element)
                            .context(ElementValidationSnafu { index, schema })
                    })
                    .collect()
            }
            // Binary sequences carry no element boundaries we could validate separately.
            ResponseFormat::Binary => self.decode::<Vec<T>>(),
        }
    }
}

/// Read the body of a response.
///
/// The Content-Type header is used to determine the serialization format.
pub async fn read_body(res: &mut Response) -> Result<ResponseBody, Error> {
    let format = ResponseFormat::of(res);
    let bytes = res
        .body_bytes()
        .await
        .map_err(|error| Error::ReadBody { error })?;
    Ok(ResponseBody { format, bytes })
}

/// Read and validate the body of a response as a `T`.
pub async fn response_body<T: DeserializeOwned>(res: &mut Response) -> Result<T, Error> {
    read_body(res).await?.decode()
}

/// Turn a response with a non-success status into an [Error::HttpStatus].
///
/// Responses in the 2xx range are passed through unchanged. Otherwise the body is read as text
/// (invalid UTF-8 is replaced, not rejected) and returned along with the status.
pub async fn response_to_result(mut res: Response) -> Result<Response, Error> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res
        .body_bytes()
        .await
        .map_err(|error| Error::ReadBody { error })?;
    let body = String::from_utf8_lossy(&body).into_owned();
    event!(
        Level::WARN,
        "request failed with status {}: {}",
        status,
        body
    );
    Err(Error::HttpStatus { status, body })
}

/// Client middleware which logs requests and responses.
///
/// [Connector](crate::Connector) installs this on every transport it is given.
pub fn trace(req: Request, client: Client, next: Next<'_>) -> BoxFuture<surf::Result<Response>> {
    Box::pin(async move {
        let method = req.method();
        let url = req.url().to_string();
        event!(Level::DEBUG, "--> sending request {{method: {}, url: {}}}", method, url);
        let res = next.run(req, client).await;
        match &res {
            Ok(res) => event!(
                Level::DEBUG,
                "<-- received response {{method: {}, url: {}, status: {}, content-type: {:?}}}",
                method,
                url,
                res.status(),
                res.content_type(),
            ),
            Err(err) => event!(
                Level::WARN,
                "<-- request failed {{method: {}, url: {}, error: {}}}",
                method,
                url,
                err,
            ),
        }
        res
    })
}
