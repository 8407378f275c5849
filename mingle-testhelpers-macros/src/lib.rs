use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    struct UntilFn {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    struct UntilBody {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct Body {
        items: BraceGroup,
    }

    struct FunctionDecl {
        until_fn: UntilFn, _fn: KFn, name: Ident,
        until_body: UntilBody, body: Body
    }
}

impl quote::ToTokens for UntilFn {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for UntilBody {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Body {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        tokens.extend(self.items.0.stream())
    }
}

/// Marks a test that runs after `mingle_testhelpers::setup()`.
///
/// The body may use `?`: the function is rewritten to return
/// `eyre::Result<()>`. Tests that also carry `#[should_panic]` keep their
/// `()` return type, since the harness rejects anything else for them.
#[proc_macro_attribute]
pub fn test(
    _attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut i = item.to_token_iter();
    let fdecl = i.parse::<FunctionDecl>().unwrap();

    let FunctionDecl {
        until_fn,
        _fn,
        name,
        until_body,
        body,
    } = fdecl;

    let expects_panic = quote::ToTokens::to_token_stream(&until_fn)
        .to_string()
        .contains("should_panic");

    if expects_panic {
        return quote::quote! {
            #[::core::prelude::rust_2024::test]
            #until_fn fn #name #until_body {
                ::mingle_testhelpers::setup();

                #body
            }
        }
        .into();
    }

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #until_fn fn #name #until_body -> ::mingle_testhelpers::eyre::Result<()> {
            ::mingle_testhelpers::setup();

            #body

            Ok(())
        }
    }
    .into()
}
