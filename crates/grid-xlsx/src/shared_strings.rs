use crate::{parse_xml, XlsxError};

/// Parse `xl/sharedStrings.xml` into the indexed string table.
///
/// Rich-text runs are flattened: every `<t>` fragment under an `<si>` entry
/// is concatenated into one plain string.
pub(crate) fn parse_shared_strings(xml: &str, part: &str) -> Result<Vec<String>, XlsxError> {
    let doc = parse_xml(part, xml)?;

    let mut strings = Vec::new();
    for si in doc
        .root_element()
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "si")
    {
        let mut text = String::new();
        for t in si
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "t")
        {
            text.push_str(t.text().unwrap_or_default());
        }
        strings.push(text);
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rich_text_runs_are_flattened() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
  <si><t>Name</t></si>
  <si><r><t>Al</t></r><r><rPr><b/></rPr><t>ice</t></r></si>
</sst>"#;
        let strings = parse_shared_strings(xml, "xl/sharedStrings.xml").unwrap();
        assert_eq!(strings, vec!["Name".to_string(), "Alice".to_string()]);
    }

    #[test]
    fn empty_table_parses() {
        let xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"/>"#;
        assert!(parse_shared_strings(xml, "xl/sharedStrings.xml")
            .unwrap()
            .is_empty());
    }
}
