//! Text writer for document trees

use quick_xml::escape::{escape, partial_escape};

use super::options::SerializeOptions;
use crate::error::ModelError;
use crate::models::DocumentNode;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

pub const PARTWISE_DOCTYPE: &str = r#"<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 4.0 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">"#;

/// Declaration, optional DOCTYPE, then the checked root
pub fn write_document(root: &DocumentNode<'_>, options: &SerializeOptions) -> Result<String, ModelError> {
    let body = write_fragment(root, options)?;

    let mut xml = String::new();
    if options.xml_declaration {
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
    }
    if options.doctype {
        if root.name() == "score-partwise" {
            xml.push_str(PARTWISE_DOCTYPE);
            xml.push('\n');
        } else {
            log::warn!("No DOCTYPE known for root element '{}', omitted", root.name());
        }
    }
    xml.push_str(&body);
    Ok(xml)
}

/// A single node and its subtree, checked first unless the node is relaxed
pub fn write_fragment(node: &DocumentNode<'_>, options: &SerializeOptions) -> Result<String, ModelError> {
    if node.is_strict() {
        node.final_checks(options.intelligent_choice)?;
    }
    let mut xml = String::new();
    write_node(&mut xml, node, 0, options.indent);
    Ok(xml)
}

fn write_node(xml: &mut String, node: &DocumentNode<'_>, depth: usize, indent: usize) {
    let pad = " ".repeat(depth * indent);
    xml.push_str(&pad);
    xml.push('<');
    xml.push_str(node.name());
    for (name, value) in node.attributes() {
        xml.push_str(&format!(" {}=\"{}\"", name, escape(value.to_string().as_str())));
    }

    let children = node.children(true);
    if children.is_empty() {
        let text = node.value().map(|v| v.to_string()).unwrap_or_default();
        if text.is_empty() {
            xml.push_str("/>\n");
        } else {
            xml.push('>');
            xml.push_str(&partial_escape(text.as_str()));
            xml.push_str(&format!("</{}>\n", node.name()));
        }
        return;
    }

    xml.push_str(">\n");
    for child in children {
        write_node(xml, child, depth + 1, indent);
    }
    xml.push_str(&pad);
    xml.push_str(&format!("</{}>\n", node.name()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn schema() -> &'static Schema {
        Schema::musicxml().expect("catalog")
    }

    #[test]
    fn test_empty_elements_self_close() {
        let node = schema().element("chord").unwrap();
        assert_eq!(node.to_xml().unwrap(), "<chord/>\n");
    }

    #[test]
    fn test_text_and_attributes_are_escaped() {
        let title = schema()
            .element("movement-title")
            .unwrap()
            .with_value("Salt & <Pepper>")
            .unwrap();
        assert_eq!(
            title.to_xml().unwrap(),
            "<movement-title>Salt &amp; &lt;Pepper&gt;</movement-title>\n"
        );

        let measure = schema()
            .element("measure")
            .unwrap()
            .with_attribute("number", "1")
            .unwrap()
            .with_attribute("text", "a \"b\" & c")
            .unwrap()
            .relaxed();
        assert_eq!(
            measure.to_xml().unwrap(),
            "<measure number=\"1\" text=\"a &quot;b&quot; &amp; c\"/>\n"
        );
    }

    #[test]
    fn test_indent_and_declaration_options() {
        let mut pitch = schema().element("pitch").unwrap();
        pitch.add_child(schema().element("octave").unwrap().with_value(4).unwrap()).unwrap();
        pitch.add_child(schema().element("step").unwrap().with_value("C").unwrap()).unwrap();

        let options = SerializeOptions {
            indent: 4,
            ..SerializeOptions::default()
        };
        assert_eq!(
            pitch.serialize_with(&options).unwrap(),
            format!(
                "{}\n<pitch>\n    <step>C</step>\n    <octave>4</octave>\n</pitch>\n",
                XML_DECLARATION
            )
        );

        let bare = SerializeOptions {
            xml_declaration: false,
            doctype: true,
            ..SerializeOptions::default()
        };
        assert!(pitch.serialize_with(&bare).unwrap().starts_with("<pitch>"));
    }

    #[test]
    fn test_strict_root_is_checked() {
        let pitch = schema().element("pitch").unwrap();
        assert!(matches!(
            pitch.to_xml(),
            Err(ModelError::SchemaViolation { .. })
        ));
        assert_eq!(pitch.relaxed().to_xml().unwrap(), "<pitch/>\n");
    }
}
