use proc_macro::TokenStream;
use quote::quote;
use syn::*;

/// Derives `NamedVector<N>` for a struct whose named fields are all `f64`.
///
/// Field order defines the vector layout. A field can carry
/// `#[vector(name = "Eqp")]` to override its display name.
#[proc_macro_derive(NamedVector, attributes(vector))]
pub fn derive_named_vector(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match input.data {
        syn::Data::Struct(data) => match data.fields {
            syn::Fields::Named(fields) => fields.named,
            _ => panic!("NamedVector can only be derived for named struct"),
        },
        _ => panic!("NamedVector only supports structs"),
    };

    let mut idents = Vec::with_capacity(fields.len());
    let mut labels = Vec::with_capacity(fields.len());
    for f in fields.iter() {
        let fname = f.ident.clone().unwrap();
        let mut label = fname.to_string();
        for attr in &f.attrs {
            if !attr.path().is_ident("vector") {
                continue;
            }
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    label = lit.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported vector attribute, expected `name`"))
                }
            });
            if let Err(err) = parsed {
                return err.to_compile_error().into();
            }
        }
        idents.push(fname);
        labels.push(label);
    }

    let n = idents.len();
    let index = 0..n;

    let expanded = quote! {
        impl NamedVector<#n> for #name {
            const NAMES: [&'static str; #n] = [#(#labels),*];

            fn to_vector(&self) -> ::nalgebra::SVector<f64, #n> {
                ::nalgebra::SVector::<f64, #n>::from([#(self.#idents),*])
            }

            fn from_vector(v: &::nalgebra::SVector<f64, #n>) -> Self {
                Self {
                    #(#idents: v[#index]),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}
