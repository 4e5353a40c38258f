use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
	#[darling(multiple)]
	response: Vec<ResponseArgs>,
}

#[derive(FromMeta)]
struct ResponseArgs {
	status: syn::LitInt,
	shape: Option<syn::Type>,
	description: Option<String>,
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(args) => args,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match RouteArgs::from_list(&args) {
		Ok(args) => args,
		Err(e) => return e.write_errors().into(),
	};

	let function = syn::parse_macro_input!(input as syn::ItemFn);
	let (summary, description) = match doc_comment(&function) {
		Ok(docs) => docs,
		Err(e) => return e.into_compile_error().into(),
	};

	let docs_name = format_ident!("{}_docs", function.sig.ident);
	let vis = &function.vis;

	let tags = args.tag.iter();
	let description = description.map(|description| quote!(.description(#description)));
	let responses = args.response.into_iter().map(|response| {
		let status = response.status;
		let shape = response.shape.map_or_else(|| quote!(()), |shape| quote!(#shape));

		match response.description {
			Some(description) => quote! {
				.response_with::<#status, #shape, _>(|res| res.description(#description))
			},
			None => quote! {
				.response::<#status, #shape>()
			},
		}
	});

	quote! {
		#function

		#vis fn #docs_name(op: aide::transform::TransformOperation) -> aide::transform::TransformOperation {
			op.summary(#summary)
				#description
				#(
					.tag(#tags)
				)*
				#(
					#responses
				)*
		}
	}
	.into()
}

/// Splits the doc comment into the summary (first line) and the description (the rest).
fn doc_comment(function: &syn::ItemFn) -> syn::Result<(String, Option<String>)> {
	let lines = function
		.attrs
		.iter()
		.filter(|attr| attr.path().is_ident("doc"))
		.filter_map(|attr| match &attr.meta {
			syn::Meta::NameValue(syn::MetaNameValue {
				value:
					syn::Expr::Lit(syn::ExprLit {
						lit: syn::Lit::Str(literal),
						..
					}),
				..
			}) => Some(literal.value().trim().to_string()),
			_ => None,
		})
		.collect::<Vec<_>>();

	let mut lines = lines.iter().skip_while(|line| line.is_empty());

	let Some(summary) = lines.next() else {
		return Err(syn::Error::new(
			function.sig.ident.span(),
			"API routes need a doc comment, its first line is used as the summary",
		));
	};

	let description = lines
		.map(String::as_str)
		.collect::<Vec<_>>()
		.join("\n")
		.trim()
		.to_string();

	Ok((
		summary.clone(),
		(!description.is_empty()).then_some(description),
	))
}
