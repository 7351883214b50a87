use itertools::Itertools;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Ident, LitInt};

/// Largest arity the block family is generated for.
const MAX_ARITY: usize = 15;

pub fn data_block(input: LitInt) -> syn::Result<TokenStream> {
    let n = input.base10_parse::<usize>()?;
    if !(1..=MAX_ARITY).contains(&n) {
        let msg = format!("data block arity must be within 1..={MAX_ARITY}, found {n}");
        return Err(syn::Error::new(input.span(), msg));
    }

    let name = Ident::new(&format!("DataBlock{n}"), Span::call_site());
    let types = (1..=n)
        .map(|i| Ident::new(&format!("T{i}"), Span::call_site()))
        .collect_vec();
    let items = (1..=n)
        .map(|i| Ident::new(&format!("item{i}"), Span::call_site()))
        .collect_vec();

    let hash_codes = items.iter().map(|item| quote! { self.#item.hash_code() });
    let offsets = items
        .iter()
        .map(|item| quote! { ::core::ptr::addr_of!(block.#item) as usize - base });
    let format = format!("({})", (0..n).map(|_| "{}").join(", "));

    let doc = format!(
        "A sequentially laid out aggregate of {n} element{}, accessed as `item1..item{n}`.",
        if n == 1 { "" } else { "s" }
    );

    Ok(quote! {
        #[doc = #doc]
        #[derive(Debug, Default, Clone, Copy, PartialEq)]
        #[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
        #[repr(C)]
        pub struct #name<#(#types),*> {
            #(pub #items: #types),*
        }

        impl<#(#types),*> #name<#(#types),*> {
            #[inline]
            pub const fn new(#(#items: #types),*) -> Self {
                Self { #(#items),* }
            }
        }

        impl<#(#types: Eq),*> Eq for #name<#(#types),*> {}

        impl<#(#types: Element),*> Element for #name<#(#types),*> {
            #[inline]
            fn hash_code(&self) -> u64 {
                #(#hash_codes)^*
            }
        }

        impl<#(#types: Element),*> ValueBlock for #name<#(#types),*> {
            const ARITY: usize = #n;

            type Tuple = (#(#types,)*);

            #[inline]
            fn from_tuple((#(#items,)*): Self::Tuple) -> Self {
                Self { #(#items),* }
            }

            #[inline]
            fn into_tuple(self) -> Self::Tuple {
                (#(self.#items,)*)
            }

            fn measure_offsets() -> Vec<usize> {
                let block = Self::default();
                let base = ::core::ptr::addr_of!(block) as usize;
                vec![#(#offsets),*]
            }
        }

        impl<#(#types: Element),*> ::core::hash::Hash for #name<#(#types),*> {
            #[inline]
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                state.write_u64(self.hash_code());
            }
        }

        impl<#(#types: Element),*> ::core::fmt::Display for #name<#(#types),*> {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, #format, #(self.#items),*)
            }
        }

        impl<#(#types),*> From<(#(#types,)*)> for #name<#(#types),*> {
            #[inline]
            fn from((#(#items,)*): (#(#types,)*)) -> Self {
                Self { #(#items),* }
            }
        }

        impl<#(#types),*> From<#name<#(#types),*>> for (#(#types,)*) {
            #[inline]
            fn from(value: #name<#(#types),*>) -> Self {
                (#(value.#items,)*)
            }
        }

        unsafe impl<#(#types: ::bytemuck::Zeroable),*> ::bytemuck::Zeroable for #name<#(#types),*> {}
    })
}
