/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

#![forbid(unsafe_code)]

//! Acton Machine Macros
//!
//! Procedural macros that remove the boilerplate around execution-unit types.
//!
//! ```ignore
//! #[machine_event]
//! pub enum LightEvent {
//!     Timer,
//!     PowerOutage,
//! }
//!
//! #[machine_context]
//! pub struct LightContext {
//!     cycles: u32,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput, ItemFn};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

fn has_option(attr: &TokenStream, option: &str) -> bool {
    attr.to_string()
        .split(',')
        .any(|part| part.trim() == option)
}

/// Declares a type as an event accepted by an execution unit.
///
/// Expands to `#[derive(Clone, Debug)]` (only the traits not already present)
/// and a compile-time assertion that the type is `Send + 'static`, the bound
/// every mailbox item must satisfy.
///
/// ```ignore
/// #[machine_event]
/// pub enum CounterEvent {
///     Increment,
///     Add(u32),
/// }
/// ```
#[proc_macro_attribute]
pub fn machine_event(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut traits = Vec::new();
    if !has_derive(&input, "Clone") {
        traits.push(quote!(Clone));
    }
    if !has_derive(&input, "Debug") {
        traits.push(quote!(Debug));
    }
    let derives = if traits.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#traits),*)])
    };

    let assert_ident = quote::format_ident!("_AssertMachineEvent_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}

/// Declares the extended-state payload carried by a unit's snapshots.
///
/// Expands to `#[derive(Default, Clone, Debug)]` (only the traits not already
/// present) and asserts `Send + Sync + 'static`, since contexts are shared
/// with observers on other threads.
///
/// # Options
///
/// `no_default` skips the `Default` derive when the context needs a hand-written
/// initial value:
///
/// ```ignore
/// #[machine_context(no_default)]
/// pub struct Budget {
///     remaining: u32,
/// }
///
/// impl Default for Budget {
///     fn default() -> Self {
///         Self { remaining: 10 }
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn machine_context(attr: TokenStream, item: TokenStream) -> TokenStream {
    let no_default = has_option(&attr, "no_default");
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut traits = Vec::new();
    if !no_default && !has_derive(&input, "Default") {
        traits.push(quote!(Default));
    }
    if !has_derive(&input, "Clone") {
        traits.push(quote!(Clone));
    }
    if !has_derive(&input, "Debug") {
        traits.push(quote!(Debug));
    }
    let derives = if traits.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#traits),*)])
    };

    let assert_ident = quote::format_ident!("_AssertMachineContext_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}

/// Entry point for binaries built on Acton Machine.
///
/// Builds a Tokio runtime and blocks on the async `main` body. Accepts
/// `current_thread` or `worker_threads = N`; the default is a multi-threaded
/// runtime.
///
/// ```ignore
/// #[machine_main]
/// async fn main() -> anyhow::Result<()> {
///     let runtime = MachineRuntime::launch();
///     runtime.shutdown_all().await
/// }
/// ```
#[proc_macro_attribute]
pub fn machine_main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;

    if sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            sig.fn_token,
            "the async keyword is missing from the function declaration",
        )
        .to_compile_error()
        .into();
    }

    if sig.ident != "main" {
        return syn::Error::new_spanned(
            &sig.ident,
            "machine_main can only be applied to the main function",
        )
        .to_compile_error()
        .into();
    }

    let attr_string = attr.to_string();
    let worker_threads: Option<usize> = attr_string
        .split(',')
        .find(|s| s.contains("worker_threads"))
        .and_then(|s| s.split('=').nth(1).and_then(|v| v.trim().parse().ok()));

    let runtime_builder = if attr_string.contains("current_thread") {
        quote! {
            ::acton_machine::prelude::tokio::runtime::Builder::new_current_thread()
        }
    } else if let Some(threads) = worker_threads {
        quote! {
            ::acton_machine::prelude::tokio::runtime::Builder::new_multi_thread()
                .worker_threads(#threads)
        }
    } else {
        quote! {
            ::acton_machine::prelude::tokio::runtime::Builder::new_multi_thread()
        }
    };

    let fn_name = &sig.ident;
    let fn_inputs = &sig.inputs;
    let fn_output = &sig.output;

    let expanded = quote! {
        #(#attrs)*
        #vis fn #fn_name(#fn_inputs) #fn_output {
            #runtime_builder
                .enable_all()
                .build()
                .expect("Failed to build Acton Machine runtime")
                .block_on(async #body)
        }
    };

    TokenStream::from(expanded)
}
