// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Connector library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

/// Declare a connector for a REST API from a table of endpoints and verbs.
///
/// Each entry `field: Proxy => "path" [verbs]` generates an accessor `field()` on the connector
/// returning a `Proxy`, whose methods are exactly the listed verbs (`get`, `post`, `put`,
/// `delete`). An entry may be followed by a block of secondary resources with the same syntax;
/// each generates an accessor on the parent proxy, bound to that parent and that secondary path.
///
/// # Example
/// ```
/// connector::connector! {
///     /// The pet store API.
///     pub struct PetStore {
///         pets: Pets => "pets" [get, post, put, delete] {
///             orders: PetOrders => "orders" [get, post],
///         },
///         owners: Owners => "owners" [get],
///     }
/// }
///
/// let store = PetStore::new(connector::surf::Client::new(), "https://api.example.com/v1/");
/// let get_pet = store.pets().get();
/// let pet_orders = store.pets().orders();
/// assert_eq!(PetStore::ENDPOINTS.len(), 2);
/// assert_eq!(pet_orders.endpoint().path(), "orders");
/// # let _ = get_pet;
/// ```
#[macro_export]
macro_rules! connector {
    (@verb get) => { $crate::Verb::Get };
    (@verb post) => { $crate::Verb::Post };
    (@verb put) => { $crate::Verb::Put };
    (@verb delete) => { $crate::Verb::Delete };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $proxy:ident => $path:literal [$($verb:ident),* $(,)?]
                $({
                    $(
                        $(#[$sub_meta:meta])*
                        $sub_field:ident : $sub_proxy:ident => $sub_path:literal
                            [$($sub_verb:ident),* $(,)?]
                    ),* $(,)?
                })?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name {
            connector: $crate::Connector,
        }

        impl $name {
            /// Every endpoint of this API, with the verbs it accepts.
            pub const ENDPOINTS: &'static [(&'static str, &'static [$crate::Verb])] = &[
                $(($path, &[$($crate::connector!(@verb $verb)),*]),)*
            ];

            pub fn new(client: $crate::surf::Client, base_url: impl Into<String>) -> Self {
                Self::from_connector($crate::Connector::new(client, base_url))
            }

            pub fn from_connector(connector: $crate::Connector) -> Self {
                Self { connector }
            }

            pub fn connector(&self) -> &$crate::Connector {
                &self.connector
            }

            $(
                $(#[$field_meta])*
                pub fn $field(&self) -> $proxy<'_> {
                    $proxy {
                        endpoint: self.connector.endpoint($path),
                    }
                }
            )*
        }

        $(
            #[doc = concat!("Proxy for the `", $path, "` endpoint.")]
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            $vis struct $proxy<'c> {
                endpoint: $crate::Endpoint<'c>,
            }

            impl<'c> $proxy<'c> {
                pub const PATH: &'static str = $path;
                pub const VERBS: &'static [$crate::Verb] =
                    &[$($crate::connector!(@verb $verb)),*];

                pub fn endpoint(&self) -> $crate::Endpoint<'c> {
                    self.endpoint
                }

                $(
                    pub fn $verb(&self) -> $crate::Method<'c> {
                        self.endpoint.method($crate::connector!(@verb $verb))
                    }
                )*

                $($(
                    $(#[$sub_meta])*
                    pub fn $sub_field(&self) -> $sub_proxy<'c> {
                        $sub_proxy {
                            endpoint: self.endpoint.secondary($sub_path),
                        }
                    }
                )*)?
            }

            impl<'c> From<$proxy<'c>> for $crate::Endpoint<'c> {
                fn from(proxy: $proxy<'c>) -> Self {
                    proxy.endpoint
                }
            }

            $($(
                #[doc = concat!("Proxy for the `", $sub_path, "` resource nested under `", $path, "`.")]
                #[derive(Clone, Copy, Debug, PartialEq, Eq)]
                $vis struct $sub_proxy<'c> {
                    endpoint: $crate::SecondaryEndpoint<'c>,
                }

                impl<'c> $sub_proxy<'c> {
                    pub const PATH: &'static str = $sub_path;
                    pub const VERBS: &'static [$crate::Verb] =
                        &[$($crate::connector!(@verb $sub_verb)),*];

                    pub fn endpoint(&self) -> $crate::SecondaryEndpoint<'c> {
                        self.endpoint
                    }

                    $(
                        pub fn $sub_verb(&self) -> $crate::Method<'c> {
                            self.endpoint.method($crate::connector!(@verb $sub_verb))
                        }
                    )*
                }

                impl<'c> From<$sub_proxy<'c>> for $crate::SecondaryEndpoint<'c> {
                    fn from(proxy: $sub_proxy<'c>) -> Self {
                        proxy.endpoint
                    }
                }
            )*)?
        )*
    };
}
