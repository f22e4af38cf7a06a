//! `textDocument/documentLink` (`spec.md` §6): every literal `Path` and
//! `Uri` token becomes a clickable link. Grounded on
//! `perl-lsp-navigation::document_links`'s "scan the parsed tree, emit one
//! link per resolvable reference" shape, adapted from Perl's `use`/`require`
//! statements to Nix's path/URI literals — the closest analogue this
//! language has to an import statement, since `spec.md`'s Non-goals put
//! filesystem access behind "read access and path resolution only".

use nix_ast::{InterpolPart, NodeId, NodeKind};
use nix_position::WireRange;
use nix_tu::NixTu;
use lsp_types::{DocumentLink, Uri};

pub fn document_links(tu: &NixTu, doc_uri: &Uri) -> Vec<DocumentLink> {
    let mut out = Vec::new();
    for i in 0..tu.ast.len() {
        let id = NodeId(i as u32);
        let data = tu.ast.get(id);
        let literal = match &data.kind {
            NodeKind::Path(parts) => literal_text(parts),
            NodeKind::Uri(s) => Some(s.clone()),
            _ => None,
        };
        let Some(text) = literal else { continue };
        let Some(target) = resolve_target(doc_uri, &text) else { continue };
        out.push(DocumentLink {
            range: WireRange::from_byte_offsets(&tu.source, data.range.start.offset, data.range.end.offset).into(),
            target: Some(target),
            tooltip: None,
            data: None,
        });
    }
    out
}

fn literal_text(parts: &[InterpolPart]) -> Option<String> {
    match parts {
        [InterpolPart::Escaped(s)] => Some(s.clone()),
        _ => None,
    }
}

fn resolve_target(doc_uri: &Uri, text: &str) -> Option<Uri> {
    if let Ok(absolute) = text.parse::<Uri>() {
        if text.contains("://") {
            return Some(absolute);
        }
    }
    if text.starts_with('/') {
        return format!("file://{text}").parse().ok();
    }
    // Relative path: resolve against the containing document's directory.
    let base = doc_uri.as_str();
    let dir = &base[..base.rfind('/').map(|i| i + 1).unwrap_or(base.len())];
    let relative = text.trim_start_matches("./");
    format!("{dir}{relative}").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn doc_uri() -> Uri {
        "file:///home/user/project/default.nix".parse().expect("static uri parses")
    }

    #[test]
    fn literal_relative_path_becomes_a_link() {
        let tu = NixTu::build(Arc::from("./lib.nix"), 1);
        let links = document_links(&tu, &doc_uri());
        assert_eq!(links.len(), 1);
        assert!(links[0].target.as_ref().expect("resolved").as_str().ends_with("/lib.nix"));
    }

    #[test]
    fn interpolated_path_has_no_link() {
        let tu = NixTu::build(Arc::from(r#"./${"x"}.nix"#), 1);
        assert!(document_links(&tu, &doc_uri()).is_empty());
    }

    #[test]
    fn uri_literal_becomes_a_link() {
        let tu = NixTu::build(Arc::from("https://example.com/foo"), 1);
        let links = document_links(&tu, &doc_uri());
        assert_eq!(links.len(), 1);
    }
}
