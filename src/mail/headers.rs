/// Sender identity extracted from a From header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSender {
    pub name: String,
    pub email: String,
}

/// Extracts sender name and address from a From header value.
///
/// The fallback chain is fixed: try the `"Name <address>"` form first; if
/// that fails, look for a bare address-like token and use it for both
/// fields; if there is no address at all, both fields are the raw header
/// unmodified.
pub fn parse_sender(header: &str) -> ParsedSender {
    if let Some(sender) = parse_name_and_address(header) {
        return sender;
    }

    if let Some(address) = find_bare_address(header) {
        return ParsedSender {
            name: address.clone(),
            email: address,
        };
    }

    ParsedSender {
        name: header.to_string(),
        email: header.to_string(),
    }
}

/// Matches `Name <address>` where the address contains an `@`
fn parse_name_and_address(header: &str) -> Option<ParsedSender> {
    let open = header.find('<')?;
    let close = header[open..].find('>')? + open;
    if close <= open {
        return None;
    }

    let address = header[open + 1..close].trim();
    if address.is_empty() || !address.contains('@') {
        return None;
    }

    let name = header[..open].trim().trim_matches('"').trim();
    let name = if name.is_empty() { address } else { name };

    Some(ParsedSender {
        name: name.to_string(),
        email: address.to_string(),
    })
}

/// Finds the first whitespace-separated token containing an `@`
fn find_bare_address(header: &str) -> Option<String> {
    header
        .split_whitespace()
        .find(|token| token.contains('@'))
        .map(|token| token.trim_matches(|c| matches!(c, '<' | '>' | ',' | ';' | '"')).to_string())
        .filter(|token| !token.is_empty())
}
