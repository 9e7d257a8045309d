// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Connector library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Generic typed operations on REST resources.
//!
//! Each handler trait contributes exactly one operation with a default implementation. A resource
//! type implements [Resource] (or [SecondaryResource] for nested resources), declares its schema
//! types through the handlers' associated types, and gets the operations for free:
//!
//! ```ignore
//! struct Pets<'a>(&'a PetStore);
//!
//! impl Resource for Pets<'_> {
//!     type Id = u64;
//!     fn endpoint(&self) -> Endpoint<'_> {
//!         self.0.pets().into()
//!     }
//! }
//!
//! impl ListHandler for Pets<'_> {
//!     type ListParams = PageParams;
//!     type Listing = Envelope<Vec<Pet>>;
//! }
//!
//! impl DetailHandler for Pets<'_> {
//!     type Detail = Pet;
//! }
//!
//! let page = Pets(&store).list(None).await?;
//! let rex = Pets(&store).detail(7).await?;
//! ```

use crate::client::{read_body, ResponseBody};
use crate::connector::{Call, Endpoint, Method, SecondaryEndpoint};
use crate::error::Error;
use crate::types::{to_query_params, Page};
use crate::url::Identity;
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use tracing::{event, Level};

/// A top-level resource, addressed through one endpoint.
pub trait Resource {
    /// The type identifying a single instance of the resource.
    type Id: Into<Identity>;

    fn endpoint(&self) -> Endpoint<'_>;
}

/// A nested resource, addressed as `endpoint[/{parent}]/secondary[/{id}]`.
pub trait SecondaryResource {
    /// The identity of the parent resource instance.
    type ParentId: Into<Identity>;
    /// The identity of a nested resource instance.
    type Id: Into<Identity>;

    fn secondary_endpoint(&self) -> SecondaryEndpoint<'_>;
}

/// How a list response is shaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// The whole body is one [Page] envelope.
    Envelope,
    /// The body is a sequence whose elements are validated one by one.
    Collection,
}

/// The declared result of a list operation.
pub trait ListShape: 'static {
    const KIND: ListKind;
    type Output: Send + 'static;

    fn decode(body: &ResponseBody) -> Result<Self::Output, Error>;
}

/// A paginated list whose page data is a `D`.
pub struct Envelope<D>(PhantomData<fn() -> D>);

impl<D: DeserializeOwned + Send + 'static> ListShape for Envelope<D> {
    const KIND: ListKind = ListKind::Envelope;
    type Output = Page<D>;

    fn decode(body: &ResponseBody) -> Result<Self::Output, Error> {
        body.decode()
    }
}

/// A plain list of `T`.
pub struct Collection<T>(PhantomData<fn() -> T>);

impl<T: DeserializeOwned + Send + 'static> ListShape for Collection<T> {
    const KIND: ListKind = ListKind::Collection;
    type Output = Vec<T>;

    fn decode(body: &ResponseBody) -> Result<Self::Output, Error> {
        body.decode_each()
    }
}

fn list_call<P: Serialize + Default>(params: Option<P>) -> Result<Call, Error> {
    let params = params.unwrap_or_default();
    Ok(Call::new().query(to_query_params(&params)?))
}

async fn fetch_list<S: ListShape>(
    method: Method<'_>,
    call: Result<Call, Error>,
) -> Result<S::Output, Error> {
    let mut res = method.call(call?).await?;
    let body = read_body(&mut res).await?;
    event!(
        Level::TRACE,
        "validating {:?} list response from {}",
        S::KIND,
        method.endpoint()
    );
    S::decode(&body)
}

async fn fetch<T: DeserializeOwned>(
    method: Method<'_>,
    call: Result<Call, Error>,
) -> Result<T, Error> {
    let mut res = method.call(call?).await?;
    read_body(&mut res).await?.decode()
}

async fn dispatch(method: Method<'_>, call: Result<Call, Error>) -> Result<(), Error> {
    method.call(call?).await?;
    Ok(())
}

type ListOutput<S> = <S as ListShape>::Output;

pub trait ListHandler: Resource {
    /// Query parameters; `()` for endpoints without any.
    type ListParams: Serialize + Default;
    type Listing: ListShape;

    /// GET the endpoint, with `params` or the default parameters as the query string.
    fn list(
        &self,
        params: Option<Self::ListParams>,
    ) -> BoxFuture<'_, Result<ListOutput<Self::Listing>, Error>> {
        Box::pin(fetch_list::<Self::Listing>(
            self.endpoint().get(),
            list_call(params),
        ))
    }
}

pub trait DetailHandler: Resource {
    type Detail: DeserializeOwned + Send + 'static;

    fn detail(&self, identity: Self::Id) -> BoxFuture<'_, Result<Self::Detail, Error>> {
        Box::pin(fetch(
            self.endpoint().get(),
            Ok(Call::new().identity(identity)),
        ))
    }
}

pub trait PutHandler: Resource {
    /// Only the fields this type serializes are sent; leave unset fields out with
    /// `#[serde(skip_serializing_if = "Option::is_none")]`.
    type PutBody: Serialize;

    fn put(&self, body: &Self::PutBody, identity: Self::Id) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(dispatch(
            self.endpoint().put(),
            Call::new().identity(identity).json(body),
        ))
    }
}

pub trait PostHandler: Resource {
    type PostBody: Serialize;
    type PostResponse: DeserializeOwned + Send + 'static;

    fn post(&self, body: &Self::PostBody) -> BoxFuture<'_, Result<Self::PostResponse, Error>> {
        Box::pin(fetch(self.endpoint().post(), Call::new().json(body)))
    }
}

pub trait DeleteHandler: Resource {
    fn delete(&self, identity: Self::Id) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(dispatch(
            self.endpoint().delete(),
            Ok(Call::new().identity(identity)),
        ))
    }
}

fn with_parent<I: Into<Identity>>(call: Call, parent: Option<I>) -> Call {
    match parent {
        Some(parent) => call.identity(parent),
        None => call,
    }
}

pub trait SecondaryListHandler: SecondaryResource {
    type ListParams: Serialize + Default;
    type Listing: ListShape;

    /// GET `endpoint/secondary`, or `endpoint/{parent}/secondary` when `parent` is given.
    fn list(
        &self,
        parent: Option<Self::ParentId>,
        params: Option<Self::ListParams>,
    ) -> BoxFuture<'_, Result<ListOutput<Self::Listing>, Error>> {
        let call = list_call(params).map(|call| with_parent(call, parent));
        Box::pin(fetch_list::<Self::Listing>(
            self.secondary_endpoint().get(),
            call,
        ))
    }
}

pub trait SecondaryDetailHandler: SecondaryResource {
    type Detail: DeserializeOwned + Send + 'static;

    fn detail(
        &self,
        parent: Self::ParentId,
        identity: Self::Id,
    ) -> BoxFuture<'_, Result<Self::Detail, Error>> {
        Box::pin(fetch(
            self.secondary_endpoint().get(),
            Ok(Call::new().identity(parent).secondary_identity(identity)),
        ))
    }
}

pub trait SecondaryPutHandler: SecondaryResource {
    type PutBody: Serialize;

    fn put(
        &self,
        body: &Self::PutBody,
        parent: Self::ParentId,
        identity: Self::Id,
    ) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(dispatch(
            self.secondary_endpoint().put(),
            Call::new()
                .identity(parent)
                .secondary_identity(identity)
                .json(body),
        ))
    }
}

pub trait SecondaryPostHandler: SecondaryResource {
    type PostBody: Serialize;

    /// POST to `endpoint/secondary`, or `endpoint/{parent}/secondary` when `parent` is given.
    fn post(
        &self,
        body: &Self::PostBody,
        parent: Option<Self::ParentId>,
    ) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(dispatch(
            self.secondary_endpoint().post(),
            Call::new().json(body).map(|call| with_parent(call, parent)),
        ))
    }
}

pub trait SecondaryDeleteHandler: SecondaryResource {
    fn delete(
        &self,
        parent: Self::ParentId,
        identity: Self::Id,
    ) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(dispatch(
            self.secondary_endpoint().delete(),
            Ok(Call::new().identity(parent).secondary_identity(identity)),
        ))
    }
}
