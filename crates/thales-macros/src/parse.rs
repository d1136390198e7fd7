//! Parsing of `#[bind(...)]` attributes and field types.

use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Expr, ExprLit, ExprPath, GenericArgument, Ident, Lit, LitStr, Meta, MetaList,
    MetaNameValue, Path, PathArguments, Token, Type,
};

const BUILTIN_SOURCES: [&str; 6] = ["Body", "Form", "Route", "QueryString", "Header", "Claim"];

/// One entry of a `from(...)` or `sources(...)` list.
#[derive(Debug, Clone)]
pub enum SourceArg {
    /// A built-in source, e.g. `Route`.
    Builtin(Ident),
    /// A custom source, e.g. `"Tenant"`.
    Custom(LitStr),
}

impl Parse for SourceArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(Self::Custom(input.parse()?));
        }

        let ident: Ident = input.parse()?;
        if BUILTIN_SOURCES.iter().any(|s| ident == s) {
            Ok(Self::Builtin(ident))
        } else {
            Err(syn::Error::new(
                ident.span(),
                format!(
                    "unknown source `{ident}`; expected one of {} or a string literal for a custom source",
                    BUILTIN_SOURCES.join(", ")
                ),
            ))
        }
    }
}

/// A built-in strategy named in an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyName {
    /// `first_in_wins`
    FirstInWins,
    /// `passthrough`
    Passthrough,
}

impl StrategyName {
    fn parse_lit(lit: &LitStr) -> syn::Result<Self> {
        let normalized: String = lit
            .value()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "firstinwins" => Ok(Self::FirstInWins),
            "passthrough" => Ok(Self::Passthrough),
            _ => Err(syn::Error::new(
                lit.span(),
                format!("unknown strategy '{}'", lit.value()),
            )),
        }
    }
}

/// Struct-level `#[bind(...)]` options.
#[derive(Debug, Default)]
pub struct ModelAttrs {
    /// Class-level default source order.
    pub sources: Option<Vec<SourceArg>>,
    /// Factory function for base instances.
    pub factory: Option<Path>,
    /// Deserialize the base instance from the body.
    pub hydrate_body: bool,
    /// Do not fall back to `Default`.
    pub no_default: bool,
}

impl ModelAttrs {
    /// Collects every `#[bind(...)]` attribute on the struct.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for meta in bind_metas(attrs)? {
            match &meta {
                Meta::List(list) if list.path.is_ident("sources") => {
                    parsed.sources = Some(source_list(list)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("factory") => {
                    parsed.factory = Some(path_value(nv)?);
                }
                Meta::Path(path) if path.is_ident("hydrate_body") => parsed.hydrate_body = true,
                Meta::Path(path) if path.is_ident("no_default") => parsed.no_default = true,
                _ => return Err(unknown(&meta)),
            }
        }

        Ok(parsed)
    }
}

/// One explicit source annotation on a field.
#[derive(Debug)]
pub struct AnnotationAttrs {
    /// Sources named in `from(...)`.
    pub sources: Vec<SourceArg>,
    /// Lookup key for these sources.
    pub alias: Option<String>,
    /// Position among the field's annotations.
    pub rank: Option<i32>,
    /// Strategy for these sources.
    pub strategy: Option<StrategyName>,
}

/// Field-level `#[bind(...)]` options.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Property name, defaults to the field name.
    pub name: Option<String>,
    /// Property-level lookup key.
    pub alias: Option<String>,
    /// Property-level strategy.
    pub strategy: Option<StrategyName>,
    /// Explicit annotations, one per attribute carrying `from(...)`.
    pub annotations: Vec<AnnotationAttrs>,
    /// Not a bound property.
    pub skip: bool,
    /// Receives the provenance map.
    pub provenance: bool,
}

impl FieldAttrs {
    /// Collects every `#[bind(...)]` attribute on a field.
    ///
    /// `alias`, `rank` and `strategy` written next to `from(...)` belong to
    /// that annotation; without `from(...)` they apply to the property.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
            let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;

            let mut sources = None;
            let mut alias = None;
            let mut rank = None;
            let mut strategy = None;

            for meta in &metas {
                match meta {
                    Meta::List(list) if list.path.is_ident("from") => {
                        sources = Some(source_list(list)?);
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("name") => {
                        parsed.name = Some(str_value(nv)?.value());
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("alias") => {
                        alias = Some(str_value(nv)?.value());
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("rank") => {
                        rank = Some((int_value(nv)?, nv.span()));
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("strategy") => {
                        strategy = Some(StrategyName::parse_lit(&str_value(nv)?)?);
                    }
                    Meta::Path(path) if path.is_ident("skip") => parsed.skip = true,
                    Meta::Path(path) if path.is_ident("provenance") => parsed.provenance = true,
                    _ => return Err(unknown(meta)),
                }
            }

            match sources {
                Some(sources) => parsed.annotations.push(AnnotationAttrs {
                    sources,
                    alias,
                    rank: rank.map(|(r, _)| r),
                    strategy,
                }),
                None => {
                    if let Some((_, span)) = rank {
                        return Err(syn::Error::new(span, "`rank` requires `from(...)`"));
                    }
                    if alias.is_some() {
                        parsed.alias = alias;
                    }
                    if strategy.is_some() {
                        parsed.strategy = strategy;
                    }
                }
            }
        }

        Ok(parsed)
    }
}

/// How a field's type is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Any `FromRawValue` type, including `Option<_>`.
    Scalar,
    /// `Vec<_>` of a non-file type.
    Collection,
    /// `UploadedFile`.
    File,
    /// `Option<UploadedFile>`.
    OptionalFile,
    /// `Vec<UploadedFile>`.
    Files,
}

impl FieldShape {
    /// Infers the shape from the field type.
    pub fn of(ty: &Type) -> Self {
        if is_named(ty, "UploadedFile") {
            return Self::File;
        }
        if let Some(inner) = generic_arg(ty, "Vec") {
            if is_named(inner, "UploadedFile") {
                return Self::Files;
            }
            return Self::Collection;
        }
        if generic_arg(ty, "Option").is_some_and(|inner| is_named(inner, "UploadedFile")) {
            return Self::OptionalFile;
        }
        Self::Scalar
    }
}

fn bind_metas(attrs: &[Attribute]) -> syn::Result<Vec<Meta>> {
    let mut metas = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
        metas.extend(attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?);
    }
    Ok(metas)
}

fn source_list(list: &MetaList) -> syn::Result<Vec<SourceArg>> {
    let sources: Vec<SourceArg> = list
        .parse_args_with(Punctuated::<SourceArg, Token![,]>::parse_terminated)?
        .into_iter()
        .collect();

    if sources.is_empty() {
        return Err(syn::Error::new(list.span(), "expected at least one source"));
    }
    Ok(sources)
}

fn str_value(nv: &MetaNameValue) -> syn::Result<LitStr> {
    match &nv.value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        _ => Err(syn::Error::new(nv.value.span(), "expected string literal")),
    }
}

fn int_value(nv: &MetaNameValue) -> syn::Result<i32> {
    match &nv.value {
        Expr::Lit(ExprLit {
            lit: Lit::Int(i), ..
        }) => i.base10_parse(),
        _ => Err(syn::Error::new(nv.value.span(), "expected integer literal")),
    }
}

fn path_value(nv: &MetaNameValue) -> syn::Result<Path> {
    match &nv.value {
        Expr::Path(ExprPath { path, .. }) => Ok(path.clone()),
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => s.parse(),
        _ => Err(syn::Error::new(nv.value.span(), "expected a function path")),
    }
}

fn unknown(meta: &Meta) -> syn::Error {
    let name = meta
        .path()
        .get_ident()
        .map_or_else(|| "?".to_string(), ToString::to_string);
    syn::Error::new(meta.span(), format!("unknown bind attribute: {name}"))
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path.path.segments.last(),
        _ => None,
    }
}

fn is_named(ty: &Type, name: &str) -> bool {
    last_segment(ty).is_some_and(|s| s.ident == name && s.arguments.is_none())
}

fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{parse_quote, DeriveInput};

    fn field_attrs(input: DeriveInput) -> syn::Result<FieldAttrs> {
        let syn::Data::Struct(data) = input.data else {
            panic!("expected struct");
        };
        let field = data.fields.into_iter().next().unwrap();
        FieldAttrs::from_attrs(&field.attrs)
    }

    #[test]
    fn test_model_attrs() {
        let input: DeriveInput = parse_quote! {
            #[bind(sources(Route, "Tenant"), factory = Product::new, hydrate_body)]
            struct Product {}
        };

        let attrs = ModelAttrs::from_attrs(&input.attrs).unwrap();
        let sources = attrs.sources.unwrap();
        assert_eq!(sources.len(), 2);
        assert!(matches!(sources[1], SourceArg::Custom(_)));
        assert!(attrs.factory.is_some());
        assert!(attrs.hydrate_body);
        assert!(!attrs.no_default);
    }

    #[test]
    fn test_annotation_owns_alias() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                #[bind(name = "Id", alias = "product_id")]
                #[bind(from(Header), alias = "x-id", rank = 1, strategy = "passthrough")]
                id: i32,
            }
        };

        let attrs = field_attrs(input).unwrap();
        assert_eq!(attrs.name.as_deref(), Some("Id"));
        assert_eq!(attrs.alias.as_deref(), Some("product_id"));
        assert_eq!(attrs.annotations.len(), 1);
        assert_eq!(attrs.annotations[0].alias.as_deref(), Some("x-id"));
        assert_eq!(attrs.annotations[0].rank, Some(1));
        assert_eq!(attrs.annotations[0].strategy, Some(StrategyName::Passthrough));
    }

    #[test]
    fn test_rank_without_sources_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                #[bind(rank = 1)]
                id: i32,
            }
        };

        assert!(field_attrs(input).is_err());
    }

    #[test]
    fn test_unknown_source_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                #[bind(from(Cookie))]
                id: i32,
            }
        };

        let err = field_attrs(input).unwrap_err();
        assert!(err.to_string().contains("unknown source"));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                #[bind(strategy = "last_wins")]
                id: i32,
            }
        };

        assert!(field_attrs(input).is_err());
    }

    #[test]
    fn test_field_shapes() {
        let cases: [(Type, FieldShape); 6] = [
            (parse_quote!(i32), FieldShape::Scalar),
            (parse_quote!(Option<String>), FieldShape::Scalar),
            (parse_quote!(Vec<i64>), FieldShape::Collection),
            (parse_quote!(UploadedFile), FieldShape::File),
            (parse_quote!(Option<thales::UploadedFile>), FieldShape::OptionalFile),
            (parse_quote!(Vec<UploadedFile>), FieldShape::Files),
        ];

        for (ty, shape) in cases {
            assert_eq!(FieldShape::of(&ty), shape);
        }
    }
}
