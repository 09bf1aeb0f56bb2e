use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitInt, LitStr};

#[derive(Default)]
struct ClassAttributes {
  name: Option<String>,
  version: Option<u32>,
  is_abstract: bool,
  untracked: bool,
  no_class_info: bool,
}

impl ClassAttributes {
  fn parse(input: &DeriveInput) -> syn::Result<Self> {
    let mut attributes = ClassAttributes::default();
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("class")) {
      attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
          let value: LitStr = meta.value()?.parse()?;
          attributes.name = Some(value.value());
        } else if meta.path.is_ident("version") {
          let value: LitInt = meta.value()?.parse()?;
          attributes.version = Some(value.base10_parse()?);
        } else if meta.path.is_ident("abstract_class") {
          attributes.is_abstract = true;
        } else if meta.path.is_ident("untracked") {
          attributes.untracked = true;
        } else if meta.path.is_ident("no_class_info") {
          attributes.no_class_info = true;
        } else {
          return Err(meta.error("unsupported class attribute"));
        }
        Ok(())
      })?;
    }
    Ok(attributes)
  }
}

/// Registers the static class traits of a type.
///
/// ```ignore
/// #[derive(ClassTraits)]
/// #[class(name = "Circle", version = 2, untracked)]
/// struct Circle { radius: f64 }
/// ```
///
/// Also declares the type as a statically dispatched pointee so it can be held by
/// `Box`, `Rc` and `Arc` inside an archive.
#[proc_macro_derive(ClassTraits, attributes(class))]
pub fn derive_class_traits(input: TokenStream) -> TokenStream {
  let input = parse_macro_input!(input as DeriveInput);
  let attributes = match ClassAttributes::parse(&input) {
    Ok(attributes) => attributes,
    Err(err) => return err.to_compile_error().into(),
  };
  let ident = &input.ident;
  let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

  let name = attributes.name.unwrap_or_default();
  let version = attributes.version.unwrap_or(0);
  let is_abstract = attributes.is_abstract;
  let tracked = !attributes.untracked;
  let store_class_info = !attributes.no_class_info;

  let expanded = quote! {
      impl #impl_generics ::archivum_core_rs::ClassTraits for #ident #ty_generics #where_clause {
          const NAME: &'static str = #name;
          const VERSION: u32 = #version;
          const IS_ABSTRACT: bool = #is_abstract;
          const TRACKED: bool = #tracked;
          const STORE_CLASS_INFO: bool = #store_class_info;
      }

      impl #impl_generics ::archivum_core_rs::Pointee for #ident #ty_generics #where_clause {
          type Dispatch = ::archivum_core_rs::StaticDispatch;
      }
  };

  TokenStream::from(expanded)
}

/// Implements the runtime self-description hook used when a value is reached through
/// a trait object.
#[proc_macro_derive(SelfDescribing)]
pub fn derive_self_describing(input: TokenStream) -> TokenStream {
  let input = parse_macro_input!(input as DeriveInput);
  let ident = &input.ident;
  let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

  let expanded = quote! {
      impl #impl_generics ::archivum_core_rs::SelfDescribing for #ident #ty_generics #where_clause {
          fn describe(&self) -> ::archivum_core_rs::TypeDescriptor {
              ::archivum_core_rs::TypeDescriptor::of::<Self>()
          }

          fn as_any(&self) -> &dyn ::std::any::Any {
              self
          }

          fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
              self
          }
      }
  };

  TokenStream::from(expanded)
}
