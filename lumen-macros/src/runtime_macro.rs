use proc_macro::TokenStream;

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ItemFn, ReturnType, Stmt};

use crate::helpers::lumen_crate_path;

/// See `#[lumen_macros::runtime]` for details.
pub fn runtime_macro(item: TokenStream, test: bool) -> TokenStream {
    expand_runtime(item.into(), test).into()
}

/// proc_macro2 version of the expansion: usable outside a compiler context, hence testable at runtime
/// through the runtime-macros crate.
/// @see runtime-macros https://docs.rs/runtime-macros/latest/runtime_macros
pub fn expand_runtime(item: TokenStream2, test: bool) -> TokenStream2 {
    let lumen = lumen_crate_path();

    let input = match syn::parse2::<ItemFn>(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    let mut stmts = block.stmts;

    // Check if the function has an explicit return type
    let has_return_type = match &sig.output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => match &**ty {
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => false,
            _ => true,
        },
    };

    // Extract the last statement if it's an expression (potential return value)
    let return_expr = if has_return_type {
        match stmts.pop() {
            Some(Stmt::Expr(expr, None)) => Some(expr),
            Some(stmt) => {
                stmts.push(stmt);
                None
            }
            None => None,
        }
    } else {
        None
    };

    // Define the #[tokio::main] / #[tokio::test] tokio macro attribute: tokio is reached through the
    // lumen re-export so that the caller does not need a direct dependency on it.
    let tokio_path = format!("{}::utils::tokio", lumen);
    let tokio_main_attr = match test {
        true => quote! {
            #[#lumen::utils::tokio::test(crate = #tokio_path)]
            #[#lumen::utils::serial_test::serial]
        },
        false => quote! {#[#lumen::utils::tokio::main(crate = #tokio_path)]},
    };

    let mut body = vec![quote! {
        #lumen::utils::task::init_task_channel().await;
    }];

    body.extend(stmts.into_iter().map(|stmt| match stmt {
        // A trailing "()" is dropped: the return expression is re-added last.
        Stmt::Expr(syn::Expr::Tuple(ref tuple), _) if tuple.elems.is_empty() => quote!(),
        _ => quote! { #stmt },
    }));

    body.push(quote! {
        #lumen::utils::task::wait_all_tasks().await;
    });

    if let Some(return_stmt) = return_expr {
        body.push(quote! { #return_stmt });
    }

    quote! {
        #tokio_main_attr
        #(#attrs)*
        #vis #sig {
            #(#body)*
        }
    }
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use runtime_macros::emulate_attributelike_macro_expansion;

    use super::*;

    fn runtime_macro_internal(_: TokenStream2, item: TokenStream2) -> TokenStream2 {
        expand_runtime(item, false)
    }

    fn test_macro_internal(_: TokenStream2, item: TokenStream2) -> TokenStream2 {
        expand_runtime(item, true)
    }

    #[test]
    fn code_coverage() {
        // Runtime expansion only lets tarpaulin measure the macro coverage.
        let file = std::fs::File::open("tests/runtime_macro.rs").unwrap();
        emulate_attributelike_macro_expansion(file, &[("runtime", runtime_macro_internal)])
            .unwrap();

        let file = std::fs::File::open("tests/runtime_macro.rs").unwrap();
        emulate_attributelike_macro_expansion(file, &[("test", test_macro_internal)]).unwrap()
    }

    #[test]
    fn test_expand_runtime_waits_for_tasks() {
        let expanded = expand_runtime(quote! { async fn main() { println!("hello"); } }, false)
            .to_string();
        assert!(expanded.contains("tokio :: main"));
        assert!(expanded.contains("init_task_channel"));
        assert!(expanded.contains("wait_all_tasks"));
        assert!(!expanded.contains("serial"));
    }

    #[test]
    fn test_expand_test_is_serial() {
        let expanded = expand_runtime(quote! { async fn my_test() {} }, true).to_string();
        assert!(expanded.contains("tokio :: test"));
        assert!(expanded.contains("serial_test :: serial"));
    }

    #[test]
    fn test_expand_keeps_return_expression_last() {
        let expanded = expand_runtime(
            quote! { async fn main() -> Result<(), ()> { let a = 1; Ok(()) } },
            false,
        )
        .to_string();
        let wait = expanded.find("wait_all_tasks").unwrap();
        let ret = expanded.rfind("Ok (())").unwrap();
        assert!(wait < ret);
    }

    #[test]
    fn test_expand_invalid_input() {
        let expanded = expand_runtime(quote! { struct NotAFunction; }, false).to_string();
        assert!(expanded.contains("compile_error"));
    }
}
