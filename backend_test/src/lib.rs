use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject its
/// dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`], a
/// server over fresh in-memory stores, `crate::MemoryStores`, handles on
/// those stores, and [`rocket::http::Header`], the `Authorization` header of
/// a logged-in principal.
///
/// `#[backend_test(admin)]`, `#[backend_test(voter)]` and
/// `#[backend_test(candidate)]` register that kind's example principal and
/// log in as it before the test runs; a `Header` argument requires one.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);
    let login = parse_macro_input!(args as Option<Ident>);

    // Work out which principal, if any, to log in as.
    let role = match login.as_ref().map(|ident| ident.to_string()).as_deref() {
        None => None,
        Some("admin") => Some(quote! { crate::model::principal::Role::Admin }),
        Some("voter") => Some(quote! { crate::model::principal::Role::Voter }),
        Some("candidate") => Some(quote! { crate::model::principal::Role::Candidate }),
        Some(_) => {
            return syn::Error::new(
                login.map(|ident| ident.span()).unwrap_or_else(Span::call_site),
                "Expected one of `admin`, `voter` or `candidate`",
            )
            .into_compile_error()
            .into();
        }
    };

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone(), role.is_some()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the generated test keeps the declared name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let maybe_login = role
        .map(|role| {
            quote! {
                #[allow(unused_variables)]
                let auth = crate::login_as(&rocket_client, #role).await;
            }
        })
        .unwrap_or_default();

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::MemoryStores) {
                let (rocket, stores) = crate::rocket_for_tests();
                let rocket_client = rocket::local::asynchronous::Client::tracked(rocket)
                    .await
                    .unwrap();
                (rocket_client, stores)
            }

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let (rocket_client, stores) = setup().await;
                #maybe_login
                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature, logged_in: bool) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_stores = false;
    let mut has_auth = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                // Valid as the last path segment for any type is itself.
                let type_ident = &type_path.path.segments.last().unwrap().ident;
                if type_ident == "Client" {
                    if has_client {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `Client`",
                        ));
                    }
                    has_client = true;
                    args.push(quote! { rocket_client });
                    continue;
                } else if type_ident == "MemoryStores" {
                    if has_stores {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `MemoryStores`",
                        ));
                    }
                    has_stores = true;
                    args.push(quote! { stores });
                    continue;
                } else if type_ident == "Header" {
                    if !logged_in {
                        return Err(syn::Error::new(
                            input.span(),
                            "A `Header` needs `#[backend_test(admin|voter|candidate)]`",
                        ));
                    }
                    if has_auth {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `Header`",
                        ));
                    }
                    has_auth = true;
                    args.push(quote! { auth.clone() });
                    continue;
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected parameters of type `Client`, `MemoryStores` or `Header`",
        ));
    }

    Ok(args)
}
