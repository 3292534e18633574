//! Defines Lumen runtime macros.

#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

extern crate proc_macro;

use proc_macro::TokenStream;

mod helpers;
mod runtime_macro;

/// Macro definition for the Lumen runtime.
///
/// This macro should be used once only in a project.
///
/// _Runs the function body on a tokio runtime and waits, before returning, for every task
/// dynamically spawned through `lumen::utils::task::run` (blink loops, confirmation callbacks)._
///
/// # Example
/// ```
/// #[lumen_macros::runtime]
/// async fn main() {
///     // whatever
/// }
/// ```
#[proc_macro_attribute]
pub fn runtime(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro::runtime_macro(item, false)
}

/// Same as `#[lumen_macros::runtime]` but for tests: tests are run serially since they share the
/// runtime task channel.
#[proc_macro_attribute]
pub fn test(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro::runtime_macro(item, true)
}
