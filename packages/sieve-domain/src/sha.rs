//! Partial commit SHA detection. Tokens of 5 to 40 lowercase hex characters become prefix
//! queries so abbreviated SHAs still match.

pub const MIN_SHA_LEN: usize = 5;
pub const MAX_SHA_LEN: usize = 40;

pub fn is_sha_token(token: &str) -> bool {
	(MIN_SHA_LEN..=MAX_SHA_LEN).contains(&token.len())
		&& token.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Appends `*` to every SHA-looking whitespace token. Already rewritten tokens end with `*`
/// and no longer match, so applying the rewrite twice is a no-op.
pub fn rewrite_sha_prefixes(query: &str) -> String {
	let mut out = String::with_capacity(query.len() + 4);
	let mut rest = query;

	while !rest.is_empty() {
		let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
		let (token, tail) = rest.split_at(token_end);

		out.push_str(token);

		if is_sha_token(token) {
			out.push('*');
		}

		let gap_end = tail.find(|c: char| !c.is_whitespace()).unwrap_or(tail.len());
		let (gap, next) = tail.split_at(gap_end);

		out.push_str(gap);

		rest = next;
	}

	out
}
