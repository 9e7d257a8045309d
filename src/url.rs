// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Connector library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Endpoint URL composition.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::iter;

/// A path parameter identifying a single resource instance.
///
/// Zero and the empty string count as "no identity" and are never written into a URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    Int(i64),
    Uint(u64),
    Str(String),
}

impl Identity {
    pub fn is_present(&self) -> bool {
        match self {
            Self::Int(i) => *i != 0,
            Self::Uint(u) => *u != 0,
            Self::Str(s) => !s.is_empty(),
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Uint(u) => write!(f, "{}", u),
            Self::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! identity_from {
    ($variant:ident($inner:ty): $($t:ty),*) => {
        $(
            impl From<$t> for Identity {
                fn from(v: $t) -> Self {
                    Self::$variant(<$inner>::from(v))
                }
            }
        )*
    };
}

identity_from!(Int(i64): i8, i16, i32, i64);
identity_from!(Uint(u64): u8, u16, u32, u64);

impl From<usize> for Identity {
    fn from(v: usize) -> Self {
        Self::Uint(v as u64)
    }
}

impl From<&str> for Identity {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Identity {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&String> for Identity {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

/// Compose the URL of an endpoint call.
///
/// The result is `base + endpoint`, followed by `/identity` when an identity is present, followed
/// by `/secondary` when a secondary path is present and, only in that case, `/secondary_identity`.
/// A secondary identity without a secondary path is dropped.
///
/// No percent-encoding or slash normalization is performed: `base` and `endpoint` are joined
/// verbatim, so `base` normally ends with `/`.
pub fn build_url(
    base: &str,
    endpoint: &str,
    identity: Option<&Identity>,
    secondary: Option<&str>,
    secondary_identity: Option<&Identity>,
) -> String {
    let secondary = secondary.filter(|path| !path.is_empty());
    let segments = [
        identity
            .filter(|id| id.is_present())
            .map(ToString::to_string),
        secondary.map(str::to_owned),
        secondary
            .and(secondary_identity)
            .filter(|id| id.is_present())
            .map(ToString::to_string),
    ];
    iter::once(format!("{}{}", base, endpoint))
        .chain(segments.into_iter().flatten())
        .join("/")
}
