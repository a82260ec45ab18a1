//! XML payload rendering
//!
//! Works on the quick-xml event stream so that everything not touched by a
//! token (declaration, comments, attribute quoting, indentation) is written
//! back as it was read.

use crate::error::{TemplateError, TemplateResult};
use crate::matching_token;
use drift_core::IterationAssignment;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

pub(crate) fn render(template: &str, assignment: &IterationAssignment) -> TemplateResult<String> {
    let mut reader = Reader::from_str(template);
    let mut writer = Writer::new(Vec::with_capacity(template.len()));
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if depth > 0 {
                    if let Some(value) = token_for(&start, assignment) {
                        // Drop the original content, including nested elements
                        reader.read_to_end(start.name())?;
                        write_replaced(&mut writer, &start, &value)?;
                        continue;
                    }
                } else {
                    enter_root(&mut seen_root)?;
                }
                depth += 1;
                writer.write_event(Event::Start(start))?;
            }
            Event::Empty(start) => {
                if depth > 0 {
                    if let Some(value) = token_for(&start, assignment) {
                        write_replaced(&mut writer, &start, &value)?;
                        continue;
                    }
                } else {
                    enter_root(&mut seen_root)?;
                }
                writer.write_event(Event::Empty(start))?;
            }
            Event::End(end) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TemplateError::malformed("unexpected closing tag"))?;
                writer.write_event(Event::End(end))?;
            }
            Event::Text(text) => {
                if depth == 0 && !text.unescape()?.trim().is_empty() {
                    return Err(TemplateError::malformed("text outside the root element"));
                }
                writer.write_event(Event::Text(text))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if depth != 0 {
        return Err(TemplateError::malformed("unclosed element at end of template"));
    }
    if !seen_root {
        return Err(TemplateError::malformed("template has no root element"));
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

fn token_for(start: &BytesStart<'_>, assignment: &IterationAssignment) -> Option<String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    matching_token(&name, assignment).map(|value| value.to_string())
}

fn enter_root(seen_root: &mut bool) -> TemplateResult<()> {
    if *seen_root {
        return Err(TemplateError::malformed("template has more than one root element"));
    }
    *seen_root = true;
    Ok(())
}

/// `<name attrs>value</name>`, also used to expand self-closing elements
fn write_replaced(
    writer: &mut Writer<Vec<u8>>,
    start: &BytesStart<'_>,
    value: &str,
) -> TemplateResult<()> {
    writer.write_event(Event::Start(start.borrow()))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(start.to_end()))?;
    Ok(())
}
