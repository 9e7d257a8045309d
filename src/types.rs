// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Connector library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{Error, NestedQuerySnafu, QueryEncodeSnafu, QueryShapeSnafu};
use fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

/// A single query string value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Str(String),
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Flat query parameters, sent as `?key=value&...`.
pub type QueryParams = BTreeMap<String, ParamValue>;

/// Flatten a typed parameter model into [QueryParams].
///
/// Fields serialized as `null` are dropped, so models should mark optional parameters with
/// `#[serde(skip_serializing_if = "Option::is_none")]` or simply leave them `None`. Booleans and
/// non-integral numbers are sent as strings. Nested arrays and objects cannot be expressed as a
/// flat query and are rejected.
///
/// Returns `None` when there is nothing to send, e.g. for `()` or a model with no fields set.
pub fn to_query_params<P: Serialize + ?Sized>(params: &P) -> Result<Option<QueryParams>, Error> {
    let fields = match serde_json::to_value(params).context(QueryEncodeSnafu)? {
        Value::Null => return Ok(None),
        Value::Object(fields) => fields,
        Value::Array(_) => return QueryShapeSnafu { found: "an array" }.fail(),
        _ => return QueryShapeSnafu { found: "a scalar" }.fail(),
    };
    let mut query = QueryParams::new();
    for (key, value) in fields {
        let value = match value {
            Value::Null => continue,
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Str(n.to_string()),
            },
            Value::String(s) => ParamValue::Str(s),
            Value::Bool(b) => ParamValue::Str(b.to_string()),
            Value::Array(_) | Value::Object(_) => return NestedQuerySnafu { key }.fail(),
        };
        query.insert(key, value);
    }
    Ok(if query.is_empty() { None } else { Some(query) })
}

/// Pagination request parameters.
///
/// Unset fields are not sent, leaving the server to apply its own defaults; [PageParams::page] and
/// [PageParams::size] report the conventional defaults of 1 and 10.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<NonZeroU32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<NonZeroU32>,
}

impl PageParams {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: NonZeroU32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_size(mut self, size: NonZeroU32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn page(&self) -> u32 {
        self.page.map_or(Self::DEFAULT_PAGE, NonZeroU32::get)
    }

    pub fn size(&self) -> u32 {
        self.size.map_or(Self::DEFAULT_SIZE, NonZeroU32::get)
    }
}

/// A page of results, as returned by paginated list endpoints.
///
/// `page` and `size` are at least 1; a body with either set to 0 fails to deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<D> {
    pub page: NonZeroU32,
    pub size: NonZeroU32,
    pub total_pages: u32,
    pub page_data: D,
}

impl<D: Serialize> Display for Page<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_as_json(self, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

/// Ordering parameters for list endpoints, generic over the endpoint's sortable fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams<O> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<O>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<OrderDirection>,
}

impl<O> Default for OrderParams<O> {
    fn default() -> Self {
        Self {
            order_by: None,
            order_direction: None,
        }
    }
}

// Display implementation for types which serialize to JSON. Displays as a valid JSON object.
pub fn fmt_as_json<T: Serialize>(v: &T, f: &mut Formatter<'_>) -> fmt::Result {
    let string = serde_json::to_string(v).map_err(|_| fmt::Error)?;
    write!(f, "{}", string)
}
