use pulldown_cmark::{html, Options, Parser};

/// Renders a Markdown post body to sanitized HTML.
///
/// Fenced code blocks keep their `language-*` class so they can be highlighted
/// client-side. Everything that could run script is stripped.
pub fn render(body: &str) -> String {
	let mut options = Options::empty();

	options.insert(Options::ENABLE_TABLES);
	options.insert(Options::ENABLE_STRIKETHROUGH);

	let mut unsafe_html = String::with_capacity(body.len() * 3 / 2);

	html::push_html(&mut unsafe_html, Parser::new_ext(body, options));

	ammonia::Builder::default()
		.add_tag_attributes("code", &["class"])
		.clean(&unsafe_html)
		.to_string()
}

#[cfg(test)]
mod test {
	use super::render;

	#[test]
	fn test_fenced_code_block() {
		let html = render("```rust\nfn main() {}\n```");

		assert!(html.contains("<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"));
	}

	#[test]
	fn test_basic_markdown() {
		let html = render("# Title\n\nSome *emphasis* and a [link](https://example.com).");

		assert!(html.contains("<h1>Title</h1>"));
		assert!(html.contains("<em>emphasis</em>"));
		assert!(html.contains("href=\"https://example.com\""));
	}

	#[test]
	fn test_script_is_stripped() {
		let html = render("hello <script>alert(1)</script> <img src=x onerror=alert(1)>");

		assert!(!html.contains("<script"));
		assert!(!html.contains("onerror"));
		assert!(html.contains("hello"));
	}

	#[test]
	fn test_javascript_links_are_stripped() {
		let html = render("[click](javascript:alert(1))");

		assert!(!html.contains("javascript:"));
	}
}
