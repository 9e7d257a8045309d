// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Connector library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Request dispatch and the endpoint/method proxies built on top of it.

use crate::client::{response_to_result, trace};
use crate::error::{Error, InvalidUrlSnafu, PayloadSnafu, TransportContext};
use crate::types::QueryParams;
use crate::url::{build_url, Identity};
use crate::verb::Verb;
use serde::Serialize;
use serde_json::Value;
use snafu::ResultExt;
use std::ptr;
use surf::{Client, Request, Response, Url};
use tracing::{event, Level};

/// Arguments of a single endpoint call.
///
/// Every field is optional; an empty [Call] requests `base + endpoint` with no body and no query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Call {
    pub payload: Option<Value>,
    pub identity: Option<Identity>,
    pub query: Option<QueryParams>,
    pub secondary: Option<String>,
    pub secondary_identity: Option<Identity>,
}

impl Call {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Serialize `body` as the JSON payload of the call.
    pub fn json(self, body: &impl Serialize) -> Result<Self, Error> {
        Ok(self.payload(serde_json::to_value(body).context(PayloadSnafu)?))
    }

    pub fn identity(mut self, identity: impl Into<Identity>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn query(mut self, query: impl Into<Option<QueryParams>>) -> Self {
        self.query = query.into();
        self
    }

    pub fn secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn secondary_identity(mut self, identity: impl Into<Identity>) -> Self {
        self.secondary_identity = Some(identity.into());
        self
    }

    fn url(&self, base: &str, endpoint: &str) -> String {
        build_url(
            base,
            endpoint,
            self.identity.as_ref(),
            self.secondary.as_deref(),
            self.secondary_identity.as_ref(),
        )
    }
}

/// The request dispatcher shared by every endpoint of an API.
///
/// A connector owns one HTTP transport and one base URL, neither of which changes after
/// construction. The transport is cloned by handle, so a connector can be shared freely and used
/// for any number of concurrent requests. Timeouts and cancellation are whatever the transport
/// provides; the connector never retries.
#[derive(Clone, Debug)]
pub struct Connector {
    client: Client,
    base_url: String,
}

impl Connector {
    /// Wrap `client`, prefixing every endpoint path with `base_url`.
    ///
    /// Endpoint paths are appended to `base_url` verbatim, so it should normally end with `/`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client: client.with(trace),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The proxy for the endpoint at `path`.
    pub fn endpoint<'c>(&'c self, path: &'c str) -> Endpoint<'c> {
        Endpoint {
            connector: self,
            path,
        }
    }

    /// Send one request and return the raw response.
    ///
    /// The request URL is built with [build_url]. A JSON body is attached only when the call has a
    /// payload and a query string only when it has query parameters. Responses outside of the 2xx
    /// range fail with [Error::HttpStatus], carrying the status and the body text.
    pub async fn send(&self, endpoint: &str, verb: Verb, call: Call) -> Result<Response, Error> {
        let url = call.url(&self.base_url, endpoint);
        event!(Level::DEBUG, "dispatching {} {}", verb, url);

        let mut req = Request::new(
            verb.into(),
            Url::parse(&url).context(InvalidUrlSnafu { url: url.as_str() })?,
        );
        if let Some(query) = call.query.as_ref().filter(|query| !query.is_empty()) {
            req.set_query(query).context(TransportContext { url: url.clone() })?;
        }
        if let Some(payload) = &call.payload {
            req.body_json(payload).context(TransportContext { url: url.clone() })?;
        }

        let res = self
            .client
            .send(req)
            .await
            .context(TransportContext { url })?;
        response_to_result(res).await
    }
}

/// A proxy for one endpoint path, exposing one [Method] per verb.
///
/// Endpoints are plain borrowed values and cost nothing to create, so accessors hand out a fresh
/// one on every call. Two endpoints compare equal when they address the same path on the same
/// connector.
#[derive(Clone, Copy, Debug)]
pub struct Endpoint<'c> {
    connector: &'c Connector,
    path: &'c str,
}

impl<'c> Endpoint<'c> {
    pub fn connector(&self) -> &'c Connector {
        self.connector
    }

    pub fn path(&self) -> &'c str {
        self.path
    }

    pub fn method(&self, verb: Verb) -> Method<'c> {
        Method {
            connector: self.connector,
            endpoint: self.path,
            verb,
            secondary: None,
        }
    }

    pub fn get(&self) -> Method<'c> {
        self.method(Verb::Get)
    }

    pub fn post(&self) -> Method<'c> {
        self.method(Verb::Post)
    }

    pub fn put(&self) -> Method<'c> {
        self.method(Verb::Put)
    }

    pub fn delete(&self) -> Method<'c> {
        self.method(Verb::Delete)
    }

    /// Call this endpoint with an arbitrary verb.
    pub async fn send(&self, verb: Verb, call: Call) -> Result<Response, Error> {
        self.connector.send(self.path, verb, call).await
    }

    /// Bind a nested resource reached through this endpoint.
    ///
    /// The secondary path is fixed here, once, for the lifetime of the returned value.
    pub fn secondary(&self, path: &'c str) -> SecondaryEndpoint<'c> {
        SecondaryEndpoint { parent: *self, path }
    }
}

impl PartialEq for Endpoint<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.connector, other.connector) && self.path == other.path
    }
}

impl Eq for Endpoint<'_> {}

/// A nested resource bound to a specific parent endpoint, e.g. `items/{id}/comments`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecondaryEndpoint<'c> {
    parent: Endpoint<'c>,
    path: &'c str,
}

impl<'c> SecondaryEndpoint<'c> {
    pub fn parent(&self) -> Endpoint<'c> {
        self.parent
    }

    pub fn path(&self) -> &'c str {
        self.path
    }

    pub fn method(&self, verb: Verb) -> Method<'c> {
        Method {
            secondary: Some(self.path),
            ..self.parent.method(verb)
        }
    }

    pub fn get(&self) -> Method<'c> {
        self.method(Verb::Get)
    }

    pub fn post(&self) -> Method<'c> {
        self.method(Verb::Post)
    }

    pub fn put(&self) -> Method<'c> {
        self.method(Verb::Put)
    }

    pub fn delete(&self) -> Method<'c> {
        self.method(Verb::Delete)
    }
}

/// One verb bound to one endpoint.
#[derive(Clone, Copy, Debug)]
pub struct Method<'c> {
    connector: &'c Connector,
    endpoint: &'c str,
    verb: Verb,
    secondary: Option<&'c str>,
}

impl<'c> Method<'c> {
    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn endpoint(&self) -> &'c str {
        self.endpoint
    }

    /// Forward `call` to the connector.
    ///
    /// A method obtained from a [SecondaryEndpoint] always uses that endpoint's secondary path,
    /// overriding any secondary path in `call`.
    pub async fn call(&self, mut call: Call) -> Result<Response, Error> {
        if let Some(secondary) = self.secondary {
            call.secondary = Some(secondary.to_owned());
        }
        self.connector.send(self.endpoint, self.verb, call).await
    }
}
