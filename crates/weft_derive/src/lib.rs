use proc_macro::TokenStream;
use syn::{LitInt, parse_macro_input};

mod block;

/// Generates `DataBlockN` for the given arity `N`.
///
/// The expansion refers to `Element` and `ValueBlock` by name, so both traits must be in scope.
#[proc_macro]
pub fn data_block(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitInt);
    let expanded = match block::data_block(input) {
        Ok(expanded) => expanded,
        Err(err) => err.to_compile_error(),
    };
    expanded.into()
}
