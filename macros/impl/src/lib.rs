//! Procedural macros re-exported by `bytecraft-macros`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, AttributeArgs, Ident, ItemFn, Lit, Meta, NestedMeta};

const LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// Runs an `async fn` test to completion with `futures::executor::block_on`.
///
/// # Example
/// ```rust,ignore
/// use bytecraft_macros::test_async;
///
/// #[test_async]
/// async fn test_works() {
///     assert_eq!(async { 2 + 2 }.await, 4);
/// }
/// ```
#[proc_macro_attribute]
pub fn test_async(_: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(&input.sig.fn_token, "test_async requires an async fn")
            .to_compile_error()
            .into();
    }

    let attrs = &input.attrs;
    let vis = &input.vis;
    let name = &input.sig.ident;
    let output = &input.sig.output;
    let block = &input.block;
    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() #output {
            ::bytecraft_macros::futures::executor::block_on(async move #block)
        }
    };
    TokenStream::from(expanded)
}

/// Captures `tracing` events emitted by a test and prints them with the test output.
///
/// Accepts an optional `level` (one of `TRACE`, `DEBUG`, `INFO`, `WARN` or `ERROR`, default
/// `DEBUG`). An `async fn` test is run with `futures::executor::block_on`.
///
/// # Example
/// ```rust,ignore
/// use bytecraft_macros::test_traced;
///
/// #[test_traced(level = "INFO")]
/// fn test_works() {
///     tracing::info!("visible");
///     tracing::debug!("filtered out");
/// }
/// ```
#[proc_macro_attribute]
pub fn test_traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let input = parse_macro_input!(item as ItemFn);
    let level = match parse_level(&args) {
        Ok(level) => level,
        Err(err) => return err.to_compile_error().into(),
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let name = &input.sig.ident;
    let output = &input.sig.output;
    let block = &input.block;
    let body: TokenStream2 = if input.sig.asyncness.is_some() {
        quote! { ::bytecraft_macros::futures::executor::block_on(async move #block) }
    } else {
        quote! { #block }
    };

    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() #output {
            let subscriber = ::bytecraft_macros::tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(::bytecraft_macros::tracing::Level::#level)
                .with_line_number(true)
                .with_span_events(
                    ::bytecraft_macros::tracing_subscriber::fmt::format::FmtSpan::CLOSE,
                )
                .finish();
            let dispatcher = ::bytecraft_macros::tracing::Dispatch::new(subscriber);
            ::bytecraft_macros::tracing::dispatcher::with_default(&dispatcher, || #body)
        }
    };
    TokenStream::from(expanded)
}

fn parse_level(args: &[NestedMeta]) -> Result<Ident, syn::Error> {
    let mut level = Ident::new("DEBUG", Span::call_site());
    for arg in args {
        let NestedMeta::Meta(Meta::NameValue(nv)) = arg else {
            return Err(syn::Error::new_spanned(arg, "expected `level = \"...\"`"));
        };
        if !nv.path.is_ident("level") {
            return Err(syn::Error::new_spanned(&nv.path, "unknown argument"));
        }
        let Lit::Str(value) = &nv.lit else {
            return Err(syn::Error::new_spanned(&nv.lit, "level must be a string"));
        };
        let name = value.value().to_uppercase();
        if !LEVELS.contains(&name.as_str()) {
            return Err(syn::Error::new_spanned(
                value,
                format!("level must be one of {}", LEVELS.join(", ")),
            ));
        }
        level = Ident::new(&name, value.span());
    }
    Ok(level)
}
