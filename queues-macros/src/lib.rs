use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Item, LitStr};

/// 声明接收者类型：队列描述中的 `type` 需与此处登记的名称一致。
///
/// ```ignore
/// #[mmg_queues::receiver]
/// struct OrderCreatedHandler;
///
/// #[mmg_queues::receiver("jobs.Runner")]
/// struct JobRunner;
/// ```
#[proc_macro_attribute]
pub fn receiver(args: TokenStream, input: TokenStream) -> TokenStream {
    let alias = if args.is_empty() {
        None
    } else {
        Some(parse_macro_input!(args as LitStr))
    };
    let item = parse_macro_input!(input as Item);
    let (ident, generics) = match &item {
        Item::Struct(s) => (s.ident.clone(), &s.generics),
        Item::Enum(e) => (e.ident.clone(), &e.generics),
        other => {
            return syn::Error::new_spanned(other, "#[receiver] only supports struct or enum items")
                .to_compile_error()
                .into()
        }
    };
    if !generics.params.is_empty() {
        return syn::Error::new_spanned(generics, "#[receiver] types must not be generic")
            .to_compile_error()
            .into();
    }
    let name = alias.unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    let expanded = quote! {
        #item
        #[doc(hidden)]
        const _: () = {
            fn __receiver_type_name() -> &'static str { ::std::any::type_name::<#ident>() }
            mmg_queues::__inventory::submit! {
                mmg_queues::receivers::ReceiverRegistration { name: #name, type_name: __receiver_type_name }
            }
        };
    };
    expanded.into()
}
