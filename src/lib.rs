// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Connector library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Declarative typed connectors for REST APIs.
//!
//! A [Connector] owns a `surf` transport and a base URL and dispatches one request per call. On
//! top of it, the [connector!] macro turns a table of endpoint paths and HTTP verbs into a
//! connector type with one accessor per endpoint and one method per verb, so that
//! `api.users().get()` names a request the same way the API documentation does.
//!
//! Typed operations live in the [handlers] module. A resource type picks the operations it
//! supports (list, detail, put, post, delete, and their nested-resource variants) by implementing
//! the corresponding handler traits and declaring its schema types; request bodies and query
//! parameters are serialized with serde and response bodies are validated into those types.
//!
//! Errors never get retried or swallowed. Transport failures, non-success statuses (with their
//! body text) and response bodies which do not match the declared schema all surface as [Error].

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod handlers;
mod macros;
pub mod types;
pub mod url;
pub mod verb;

pub use config::ConnectorConfig;
pub use connector::*;
pub use error::Error;
pub use handlers::*;
pub use types::*;
pub use url::{build_url, Identity};
pub use verb::Verb;

pub use surf;
