//! quick-xml-backed implementation of the parser driver, driven in the
//! `loop { reader.read_event_into(&mut buf) }` shape this house's other
//! XML-touching crates already use for SAX-style consumption.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::trace;

use crate::builder_node::BuilderNode;
use crate::error::{CompileError, Position, Result};
use crate::flags::{CompileFlags, NodeFlags};

const XML_LANG_ATTR: &[u8] = b"xml:lang";

fn is_whitespace_only(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// Parses one import's XML bytes into a synthetic root `BuilderNode` whose
/// children are the document's top-level elements, splicing `info` under
/// each of them as it closes (§4.4).
pub fn parse_import(
    reader: &mut Reader<impl BufRead>,
    flags: CompileFlags,
    locales: &[String],
    info: Option<&BuilderNode>,
    guid: &str,
) -> Result<BuilderNode> {
    // `stack[0]` is the synthetic root; every other entry is an element
    // currently open, with `stack.last()` the roving cursor.
    let mut stack: Vec<BuilderNode> = vec![BuilderNode::new("")];
    let mut buf = Vec::new();

    loop {
        let pos = Position {
            line: 0,
            column: reader.buffer_position(),
        };
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            if e.to_string().contains("cancelled") {
                CompileError::Cancelled { guid: guid.to_string() }
            } else {
                CompileError::invalid_data(guid, pos, e.to_string())
            }
        })?;

        match event {
            Event::Eof => break,

            Event::Start(ref start) | Event::Empty(ref start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                trace!(element = %name, "start element");

                let parent_ignored = stack
                    .last()
                    .map(|n| n.is_ignored())
                    .unwrap_or(false);

                let mut node = BuilderNode::new(name);
                if parent_ignored {
                    node.flags |= NodeFlags::IGNORE_CDATA;
                }

                for attr in start.attributes() {
                    let attr = attr.map_err(|e| CompileError::invalid_data(guid, pos, e.to_string()))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| CompileError::invalid_data(guid, pos, e.to_string()))?
                        .into_owned();

                    if flags.contains(CompileFlags::NATIVE_LANGS)
                        && attr.key.as_ref() == XML_LANG_ATTR
                        && !locales.iter().any(|l| l.eq_ignore_ascii_case(&value))
                    {
                        node.flags |= NodeFlags::IGNORE_CDATA;
                    }

                    node.add_attr(
                        String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                        value,
                    );
                }

                let is_empty_tag = matches!(event, Event::Empty(_));
                stack.push(node);

                // `Empty` (`<a/>`) never produces its own `End`, so close it
                // immediately the same way a `Start`+`End` pair would.
                if is_empty_tag {
                    close_current(&mut stack, info)?;
                }
            }

            Event::End(_) => {
                if stack.len() <= 1 {
                    return Err(CompileError::invalid_data(guid, pos, "Mismatched XML"));
                }
                close_current(&mut stack, info)?;
            }

            Event::Text(ref t) => {
                let text = t
                    .unescape()
                    .map_err(|e| CompileError::invalid_data(guid, pos, e.to_string()))?
                    .into_owned();
                apply_text(&mut stack, flags, &text);
            }

            Event::CData(ref t) => {
                let text = std::str::from_utf8(t.as_ref())
                    .map_err(|e| CompileError::invalid_data(guid, pos, e.to_string()))?
                    .to_string();
                apply_text(&mut stack, flags, &text);
            }

            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(CompileError::invalid_data(
            guid,
            Position {
                line: 0,
                column: reader.buffer_position(),
            },
            "Mismatched XML",
        ));
    }

    Ok(stack.pop().expect("checked len == 1 above"))
}

/// Applies a `Text`/`CData` event's decoded content to the current cursor,
/// per §4.4's text rules: ignored when empty, when the cursor is itself
/// ignored, or when the content is entirely whitespace; otherwise the last
/// non-whitespace call wins.
fn apply_text(stack: &mut [BuilderNode], flags: CompileFlags, text: &str) {
    if text.is_empty() {
        return;
    }
    let Some(cursor) = stack.last_mut() else {
        return;
    };
    if cursor.is_ignored() || is_whitespace_only(text.as_bytes()) {
        return;
    }
    if flags.contains(CompileFlags::LITERAL_TEXT) {
        cursor.flags |= NodeFlags::LITERAL_TEXT;
    }
    cursor.set_text(text);
}

/// Pops the current cursor, splices `info` into it if it is a top-level
/// element (its new parent, after popping, is the synthetic root), and
/// appends it as a child of its parent.
fn close_current(stack: &mut Vec<BuilderNode>, info: Option<&BuilderNode>) -> Result<()> {
    let mut node = stack.pop().expect("checked non-empty by caller");
    if stack.len() == 1 {
        if let Some(info) = info {
            info.clone_into(&mut node);
        }
    }
    stack.last_mut().expect("root never popped").push_child(node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;

    fn parse(xml: &str, flags: CompileFlags, locales: &[String], info: Option<&BuilderNode>) -> Result<BuilderNode> {
        let mut reader = Reader::from_reader(IoCursor::new(xml.as_bytes()));
        parse_import(&mut reader, flags, locales, info, "test")
    }

    #[test]
    fn builds_nested_tree_with_text() {
        let root = parse("<a><b>hi</b><b>ho</b></a>", CompileFlags::empty(), &[], None).unwrap();
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert_eq!(a.element, "a");
        assert_eq!(a.children.len(), 2);
        assert_eq!(a.children[0].text(), Some("hi"));
        assert_eq!(a.children[1].text(), Some("ho"));
    }

    #[test]
    fn whitespace_only_text_is_dropped() {
        let root = parse("<a>\n   \t</a>", CompileFlags::empty(), &[], None).unwrap();
        assert_eq!(root.children[0].text(), None);
    }

    #[test]
    fn attribute_order_is_preserved() {
        let root = parse(r#"<r x="1" y="2"/>"#, CompileFlags::empty(), &[], None).unwrap();
        assert_eq!(
            root.children[0].attrs,
            vec![("x".to_string(), "1".to_string()), ("y".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn native_langs_prunes_mismatched_locale() {
        let flags = CompileFlags::NATIVE_LANGS;
        let locales = vec!["en".to_string()];
        let root = parse(
            r#"<p><t xml:lang="en">A</t><t xml:lang="fr">B</t></p>"#,
            flags,
            &locales,
            None,
        )
        .unwrap();
        let p = &root.children[0];
        assert!(!p.children[0].is_ignored());
        assert!(p.children[1].is_ignored());
    }

    #[test]
    fn ignore_cdata_propagates_to_children() {
        let flags = CompileFlags::NATIVE_LANGS;
        let locales = vec!["en".to_string()];
        let root = parse(
            r#"<p xml:lang="fr"><child>text</child></p>"#,
            flags,
            &locales,
            None,
        )
        .unwrap();
        let p = &root.children[0];
        assert!(p.is_ignored());
        assert!(p.children[0].is_ignored());
    }

    #[test]
    fn info_node_is_spliced_under_every_top_level_element() {
        let mut info = BuilderNode::new("meta");
        info.add_attr("source", "test");
        let root = parse("<a/><b/>", CompileFlags::empty(), &[], Some(&info)).unwrap();
        assert_eq!(root.children.len(), 2);
        for top in &root.children {
            assert_eq!(top.children.len(), 1);
            assert_eq!(top.children[0].element, "meta");
        }
    }

    #[test]
    fn unbalanced_document_is_reported_as_invalid_data() {
        let err = parse("<a><b></a>", CompileFlags::empty(), &[], None).unwrap_err();
        assert!(matches!(err, CompileError::InvalidData { .. }));
    }

    #[test]
    fn last_text_event_wins() {
        // quick-xml only ever delivers one contiguous Text event per run of
        // character data, so this exercises the documented last-write-wins
        // rule indirectly: CDATA immediately followed by Text overwrites.
        let root = parse("<a>first<![CDATA[second]]></a>", CompileFlags::empty(), &[], None).unwrap();
        assert_eq!(root.children[0].text(), Some("second"));
    }
}
