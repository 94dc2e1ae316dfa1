//! Address fields of the message header block.

use mailparse::{MailAddr, MailHeader, MailHeaderMap, SingleInfo, addrparse_header};
use tracing::warn;

/// Parses the header block at the start of `content`.
///
/// An unparseable block is logged and treated as having no fields.
#[must_use]
pub fn parse_block(content: &[u8]) -> Vec<MailHeader<'_>> {
    match mailparse::parse_headers(content) {
        Ok((headers, _body_offset)) => headers,
        Err(e) => {
            warn!(error = %e, "cannot parse header block, ignoring headers");
            Vec::new()
        }
    }
}

/// Addresses of every `field` header in message order, groups flattened,
/// each in envelope form.
#[must_use]
pub fn field_addresses(headers: &[MailHeader<'_>], field: &str) -> Vec<String> {
    let mut out = Vec::new();
    for header in headers.get_all_headers(field) {
        let list = match addrparse_header(header) {
            Ok(list) => list,
            Err(e) => {
                warn!(
                    field,
                    value = %header.get_value(),
                    error = %e,
                    "cannot parse address list"
                );
                continue;
            }
        };
        for addr in list.iter() {
            match addr {
                MailAddr::Single(single) => out.push(envelope_form(single)),
                MailAddr::Group(group) => out.extend(group.addrs.iter().map(envelope_form)),
            }
        }
    }
    out
}

/// `local@domain` with the local part quoted again when it needs to be.
fn envelope_form(single: &SingleInfo) -> String {
    let Some((local, domain)) = single.addr.rsplit_once('@') else {
        return single.addr.clone();
    };
    if local.starts_with('"') || !local.chars().any(needs_quoting) {
        return single.addr.clone();
    }

    let mut quoted = String::with_capacity(local.len() + 2);
    quoted.push('"');
    for c in local.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    format!("{quoted}@{domain}")
}

fn needs_quoting(c: char) -> bool {
    c.is_whitespace() || "()<>[]:;@\\,\"".contains(c)
}
