use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Error, Field, Fields, LitStr, Token, Type, meta::ParseNestedMeta,
    spanned::Spanned,
};

const RESERVED: [&str; 3] = ["id", "created", "last_updated"];

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

struct RecordField<'a> {
    ident: &'a syn::Ident,
    ty: &'a Type,
    external: String,
    kind: Option<syn::Ident>,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                ident,
                "Record can only be derived for structs with named fields",
            ));
        }
    };

    check_container(&input.attrs)?;

    let mut fields = Vec::new();
    let mut errors: Option<Error> = None;
    for field in named {
        match record_field(field) {
            Ok(Some(parsed)) => fields.push(parsed),
            Ok(None) => {}
            Err(err) => combine(&mut errors, err),
        }
    }

    for (index, field) in fields.iter().enumerate() {
        if RESERVED.contains(&field.external.as_str()) {
            combine(
                &mut errors,
                Error::new(
                    field.ident.span(),
                    format!("`{}` is reserved for the document envelope", field.external),
                ),
            );
        }
        if fields[..index]
            .iter()
            .any(|earlier| earlier.external == field.external)
        {
            combine(
                &mut errors,
                Error::new(
                    field.ident.span(),
                    format!("duplicate external field name `{}`", field.external),
                ),
            );
        }
    }

    if let Some(err) = errors {
        return Err(err);
    }

    let descriptors = fields.iter().map(|field| {
        let name = unraw(field.ident);
        let external = &field.external;
        let ty = field.ty;
        let (kind, nullable) = match &field.kind {
            Some(kind) => {
                let nullable = is_option(ty);
                (quote!(::scaffold::record::FieldKind::#kind), quote!(#nullable))
            }
            None => (
                quote!(<#ty as ::scaffold::record::FieldType>::KIND),
                quote!(<#ty as ::scaffold::record::FieldType>::NULLABLE),
            ),
        };

        quote! {
            ::scaffold::record::FieldDescriptor {
                name: #name,
                external: #external,
                kind: #kind,
                nullable: #nullable,
            }
        }
    });

    let getters = fields.iter().map(|field| {
        let field_ident = field.ident;
        let name = unraw(field_ident);

        quote! {
            #name => Some(::scaffold::record::encode_field(&self.#field_ident)),
        }
    });

    let setters = fields.iter().map(|field| {
        let field_ident = field.ident;
        let name = unraw(field_ident);
        let external = &field.external;

        quote! {
            #name => {
                self.#field_ident = ::scaffold::record::decode_field(#external, value)?;
                Ok(())
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::scaffold::record::Record for #ident #ty_generics #where_clause {
            const FIELDS: &'static [::scaffold::record::FieldDescriptor] = &[
                #(#descriptors),*
            ];

            fn field_value(
                &self,
                name: &str,
            ) -> Option<::scaffold::error::ScaffoldResult<::scaffold::record::Value>> {
                match name {
                    #(#getters)*
                    _ => None,
                }
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                name: &str,
                value: ::scaffold::record::Value,
            ) -> ::scaffold::error::ScaffoldResult<()> {
                match name {
                    #(#setters)*
                    _ => Err(::scaffold::record::unknown_field(name)),
                }
            }
        }
    })
}

fn combine(errors: &mut Option<Error>, err: Error) {
    match errors {
        Some(existing) => existing.combine(err),
        None => *errors = Some(err),
    }
}

/// Rejects container attributes that change field names or unknown-field handling.
fn check_container(attrs: &[Attribute]) -> syn::Result<()> {
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") || meta.path.is_ident("rename_all_fields") {
                return Err(meta.error("Record does not support `rename_all`; rename fields individually"));
            }
            if meta.path.is_ident("deny_unknown_fields") {
                return Err(meta.error("Record does not support `deny_unknown_fields`"));
            }

            skip_meta(&meta)
        })?;
    }

    Ok(())
}

/// Parses one field. Returns `None` for fields serde skips.
fn record_field(field: &Field) -> syn::Result<Option<RecordField<'_>>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| Error::new(field.span(), "expected a named field"))?;

    let mut external = None;
    let mut skipped = false;
    let mut kind = None;

    for attr in &field.attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if !meta.input.peek(Token![=]) {
                        return Err(meta.error("Record requires `rename = \"...\"`; split serialize/deserialize names are not supported"));
                    }
                    let name: LitStr = meta.value()?.parse()?;
                    external = Some(name.value());
                    Ok(())
                } else if meta.path.is_ident("skip")
                    || meta.path.is_ident("skip_serializing")
                    || meta.path.is_ident("skip_deserializing")
                {
                    skipped = true;
                    Ok(())
                } else if meta.path.is_ident("flatten") {
                    Err(meta.error("Record does not support flattened fields"))
                } else {
                    skip_meta(&meta)
                }
            })?;
        } else if attr.path().is_ident("record") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("kind") {
                    let name: LitStr = meta.value()?.parse()?;
                    kind = Some(kind_ident(&name)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown record attribute"))
                }
            })?;
        }
    }

    if skipped {
        return Ok(None);
    }

    Ok(Some(RecordField {
        ident,
        ty: &field.ty,
        external: external.unwrap_or_else(|| unraw(ident)),
        kind,
    }))
}

fn kind_ident(name: &LitStr) -> syn::Result<syn::Ident> {
    let variant = match name.value().as_str() {
        "bool" => "Bool",
        "integer" => "Integer",
        "float" => "Float",
        "string" => "String",
        "array" => "Array",
        "object" => "Object",
        "any" => "Any",
        other => {
            return Err(Error::new(name.span(), format!("unknown field kind `{other}`")));
        }
    };

    Ok(format_ident!("{}", variant, span = name.span()))
}

/// Consumes the value of a serde attribute this derive does not interpret.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_meta(&nested))?;
    }

    Ok(())
}

// serde writes `r#type` as `type`
fn unraw(ident: &syn::Ident) -> String {
    let name = ident.to_string();

    match name.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
