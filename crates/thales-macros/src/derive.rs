//! `#[derive(BindModel)]` expansion.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Fields};

use crate::parse::{FieldAttrs, FieldShape, ModelAttrs, SourceArg, StrategyName};

/// Expands the derive into an `impl ::thales::BindModel`.
pub fn expand_bind_model(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let model = ModelAttrs::from_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "BindModel requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.ident.span(),
                "BindModel can only be derived for structs",
            ))
        }
    };

    let mut properties = Vec::new();
    let mut provenance_field = None;

    for field in fields {
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;
        let Some(ident) = &field.ident else {
            continue;
        };

        if attrs.provenance {
            if provenance_field.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "only one field can receive provenance",
                ));
            }
            provenance_field = Some(ident.clone());
            continue;
        }
        if attrs.skip {
            continue;
        }

        let default_name = ident.to_string();
        let name = attrs
            .name
            .clone()
            .unwrap_or_else(|| default_name.trim_start_matches("r#").to_string());
        let ty = &field.ty;

        let constructor = match FieldShape::of(ty) {
            FieldShape::Scalar => quote! {
                ::thales::Property::scalar(#name, |model: &mut Self, value: #ty| model.#ident = value)
            },
            FieldShape::Collection => quote! {
                ::thales::Property::collection(#name, |model: &mut Self, value: #ty| model.#ident = value)
            },
            FieldShape::File => quote! {
                ::thales::Property::file(#name, |model: &mut Self, value: #ty| model.#ident = value)
            },
            FieldShape::OptionalFile => quote! {
                ::thales::Property::file(#name, |model: &mut Self, value: ::thales::UploadedFile| {
                    model.#ident = ::core::option::Option::Some(value);
                })
            },
            FieldShape::Files => quote! {
                ::thales::Property::files(#name, |model: &mut Self, value: #ty| model.#ident = value)
            },
        };

        let alias = attrs.alias.as_ref().map(|a| quote! { .alias(#a) });
        let strategy = attrs.strategy.map(|s| {
            let kind = strategy_tokens(s);
            quote! { .strategy_kind(#kind) }
        });
        let annotations = attrs.annotations.iter().map(|a| {
            let sources = a.sources.iter().map(source_tokens);
            let alias = a.alias.as_ref().map(|alias| quote! { .alias(#alias) });
            let rank = a.rank.map(|rank| quote! { .rank(#rank) });
            let strategy = a.strategy.map(|s| {
                let kind = strategy_tokens(s);
                quote! { .strategy_kind(#kind) }
            });
            quote! {
                .bind(::thales::BindAnnotation::new([#(#sources),*]) #alias #rank #strategy)
            }
        });

        properties.push(quote! {
            .property(#constructor #alias #strategy #(#annotations)*)
        });
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let class = model.sources.as_ref().map(|sources| {
        let sources = sources.iter().map(source_tokens);
        quote! { .sources([#(#sources),*]) }
    });
    let factory = model.factory.as_ref().map(|path| quote! { .factory(#path) });
    let default = (model.factory.is_none() && !model.no_default)
        .then(|| quote! { .default_constructor() });
    let hydrate = model.hydrate_body.then(|| quote! { .hydrate_from_body() });

    let (with_provenance, provenance_impl) = match &provenance_field {
        Some(field) => (
            Some(quote! { .with_provenance() }),
            Some(quote! {
                impl #impl_generics ::thales::ProvidesProvenance for #ident #ty_generics #where_clause {
                    fn receive_provenance(&mut self, provenance: ::thales::Provenance) {
                        self.#field = provenance;
                    }
                }
            }),
        ),
        None => (None, None),
    };

    Ok(quote! {
        impl #impl_generics ::thales::BindModel for #ident #ty_generics #where_clause {
            fn schema() -> ::core::result::Result<::thales::ModelSchema<Self>, ::thales::SchemaError> {
                ::thales::ModelSchema::<Self>::builder()
                    #class
                    #(#properties)*
                    #factory
                    #default
                    #hydrate
                    #with_provenance
                    .build()
            }
        }

        #provenance_impl
    })
}

fn source_tokens(source: &SourceArg) -> TokenStream {
    match source {
        SourceArg::Builtin(ident) => quote! { ::thales::SourceId::#ident },
        SourceArg::Custom(name) => quote! { ::thales::SourceId::custom(#name) },
    }
}

fn strategy_tokens(strategy: StrategyName) -> TokenStream {
    match strategy {
        StrategyName::FirstInWins => quote! { ::thales::StrategyKind::FirstInWins },
        StrategyName::Passthrough => quote! { ::thales::StrategyKind::Passthrough },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_properties_and_annotations() {
        let input = quote! {
            #[bind(sources(Route, Body))]
            struct Product {
                #[bind(from(Header), alias = "x-id", rank = 2)]
                id: i32,
                tags: Vec<String>,
                #[bind(skip)]
                cached: bool,
            }
        };

        let expanded = expand_bind_model(input).unwrap().to_string();

        assert!(expanded.contains("impl :: thales :: BindModel for Product"));
        assert!(expanded.contains("Property :: scalar (\"id\""));
        assert!(expanded.contains("Property :: collection (\"tags\""));
        assert!(expanded.contains(". rank (2i32)"));
        assert!(expanded.contains(". default_constructor ()"));
        assert!(!expanded.contains("cached"));
    }

    #[test]
    fn test_factory_replaces_default() {
        let input = quote! {
            #[bind(factory = Product::new)]
            struct Product {
                id: i32,
            }
        };

        let expanded = expand_bind_model(input).unwrap().to_string();
        assert!(expanded.contains(". factory (Product :: new)"));
        assert!(!expanded.contains("default_constructor"));
    }

    #[test]
    fn test_provenance_field() {
        let input = quote! {
            struct Product {
                id: i32,
                #[bind(provenance)]
                provenance: Provenance,
            }
        };

        let expanded = expand_bind_model(input).unwrap().to_string();
        assert!(expanded.contains("ProvidesProvenance for Product"));
        assert!(expanded.contains(". with_provenance ()"));
        assert!(!expanded.contains("Property :: scalar (\"provenance\""));
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let input = quote! {
            struct Product(i32);
        };

        assert!(expand_bind_model(input).is_err());
    }
}
