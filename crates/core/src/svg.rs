//! SVG and raster payload handling: base64 decoding, responsive sizing of
//! the root `<svg>` element, and re-serialization for download.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::PredictError;

/// File name offered for a downloaded structure drawing.
pub const DOWNLOAD_FILE_NAME: &str = "rna_structure.svg";
/// MIME type of a downloaded structure drawing.
pub const SVG_MIME: &str = "image/svg+xml";

/// Decode a base64 payload into SVG markup text.
///
/// ASCII whitespace inside the payload (line-wrapped base64) is ignored.
pub fn decode_svg(b64: &str) -> Result<String, PredictError> {
    let bytes = decode_base64(b64)?;
    String::from_utf8(bytes).map_err(|e| PredictError::Render(format!("SVG is not UTF-8: {e}")))
}

/// Decode a base64 payload, ignoring embedded whitespace.
pub fn decode_base64(b64: &str) -> Result<Vec<u8>, PredictError> {
    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(cleaned)
        .map_err(|e| PredictError::Render(format!("invalid base64 payload: {e}")))
}

/// Decode and size an SVG payload in one step.
pub fn prepare(b64: &str) -> Result<String, PredictError> {
    let markup = decode_svg(b64)?;
    make_responsive(&markup)
}

/// Force `width="100%"` and `height="auto"` on the first `<svg>` element.
///
/// Everything else passes through untouched. Fails if the markup is not
/// well-formed or contains no `<svg>` element.
pub fn make_responsive(markup: &str) -> Result<String, PredictError> {
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len() + 32));
    let mut found = false;
    let mut depth = 0usize;

    loop {
        let written = match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) if !found && is_svg(&e) => {
                found = true;
                depth += 1;
                writer.write_event(Event::Start(responsive(&e)?))
            }
            Ok(Event::Empty(e)) if !found && is_svg(&e) => {
                found = true;
                writer.write_event(Event::Empty(responsive(&e)?))
            }
            Ok(Event::Start(e)) => {
                depth += 1;
                writer.write_event(Event::Start(e))
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e))
            }
            Ok(event) => writer.write_event(event),
            Err(e) => return Err(PredictError::Render(format!("malformed SVG: {e}"))),
        };
        written.map_err(|e| PredictError::Render(e.to_string()))?;
    }

    if !found {
        return Err(PredictError::Render("no <svg> root element found".into()));
    }
    if depth > 0 {
        return Err(PredictError::Render("malformed SVG: unclosed elements".into()));
    }
    String::from_utf8(writer.into_inner()).map_err(|e| PredictError::Render(e.to_string()))
}

/// Serialize the first `<svg>` element (and its subtree) back to markup.
pub fn serialize_root(markup: &str) -> Result<String, PredictError> {
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len()));
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| PredictError::Render(format!("malformed SVG: {e}")))?;
        match event {
            Event::Eof => {
                return Err(PredictError::Render("no complete <svg> element found".into()))
            }
            Event::Empty(e) if depth == 0 && is_svg(&e) => {
                writer
                    .write_event(Event::Empty(e))
                    .map_err(|e| PredictError::Render(e.to_string()))?;
                break;
            }
            Event::Start(e) if depth > 0 || is_svg(&e) => {
                depth += 1;
                writer
                    .write_event(Event::Start(e))
                    .map_err(|e| PredictError::Render(e.to_string()))?;
            }
            Event::End(e) if depth > 0 => {
                depth -= 1;
                writer
                    .write_event(Event::End(e))
                    .map_err(|e| PredictError::Render(e.to_string()))?;
                if depth == 0 {
                    break;
                }
            }
            other if depth > 0 => {
                writer
                    .write_event(other)
                    .map_err(|e| PredictError::Render(e.to_string()))?;
            }
            _ => {}
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| PredictError::Render(e.to_string()))
}

/// Wrap a base64 raster payload in an `<img>` data-URI reference.
pub fn raster_img(plot: &str) -> String {
    let cleaned: String = plot.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    format!(
        r#"<img src="data:image/png;base64,{}" alt="RNA secondary structure plot" style="max-width: 100%" />"#,
        escape(cleaned.as_str())
    )
}

fn is_svg(e: &BytesStart<'_>) -> bool {
    e.local_name().as_ref() == b"svg"
}

fn responsive(e: &BytesStart<'_>) -> Result<BytesStart<'static>, PredictError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PredictError::Render(format!("bad attribute: {err}")))?;
        let key = attr.key.as_ref();
        if key == b"width" || key == b"height" {
            continue;
        }
        // Re-escaped on push, since the value is always written double-quoted.
        let key = String::from_utf8_lossy(key).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| PredictError::Render(format!("bad attribute value: {err}")))?;
        out.push_attribute((key.as_str(), value.as_ref()));
    }
    out.push_attribute(("width", "100%"));
    out.push_attribute(("height", "auto"));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(s: &str) -> String {
        STANDARD.encode(s)
    }

    #[test]
    fn test_root_gets_responsive_size() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="452" height="452"><circle r="3"/></svg>"#;
        let out = prepare(&b64(svg)).unwrap();
        assert!(out.contains(r#"width="100%""#));
        assert!(out.contains(r#"height="auto""#));
        assert!(!out.contains(r#"width="452""#));
        assert!(out.contains(r#"<circle r="3"/>"#));
    }

    #[test]
    fn test_prolog_and_doctype_survive() {
        let svg = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.0//EN" "http://www.w3.org/TR/2001/REC-SVG-20010904/DTD/svg10.dtd">"#,
            r#"<svg viewBox="0 0 10 10"><g><text>A</text></g></svg>"#
        );
        let out = make_responsive(svg).unwrap();
        assert!(out.starts_with("<?xml"));
        assert!(out.contains("svg10.dtd"));
        assert!(out.contains(r#"<svg viewBox="0 0 10 10" width="100%" height="auto">"#));
    }

    #[test]
    fn test_only_first_svg_is_resized() {
        let svg = r#"<svg width="10"><svg width="5"/></svg>"#;
        let out = make_responsive(svg).unwrap();
        assert!(out.contains(r#"<svg width="5"/>"#));
    }

    #[test]
    fn test_no_root_element() {
        let err = prepare(&b64("just some text")).unwrap_err();
        assert!(matches!(err, PredictError::Render(_)));
    }

    #[test]
    fn test_mismatched_tags() {
        assert!(make_responsive("<svg><g></svg>").is_err());
    }

    #[test]
    fn test_truncated_root_is_rejected() {
        let err = make_responsive(r#"<svg width="10"><g><circle r="1"/>"#).unwrap_err();
        assert_eq!(
            err,
            PredictError::Render("malformed SVG: unclosed elements".into())
        );
    }

    #[test]
    fn test_single_quoted_attribute_with_double_quotes() {
        let out = make_responsive(r#"<svg data-x='say "hi"' width='5'><g/></svg>"#).unwrap();
        assert!(out.contains(r#"data-x="say &quot;hi&quot;""#));
        assert!(!out.contains(r#"width="5""#));
        // Output must itself be well-formed and survive the download path.
        assert_eq!(make_responsive(&out).unwrap(), out);
        assert_eq!(serialize_root(&out).unwrap(), out);
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(decode_svg("%%%"), Err(PredictError::Render(_))));
    }

    #[test]
    fn test_wrapped_base64() {
        let encoded = b64("<svg/>");
        let (a, b) = encoded.split_at(3);
        let wrapped = format!("{a}\n{b}\n");
        assert_eq!(decode_svg(&wrapped).unwrap(), "<svg/>");
    }

    #[test]
    fn test_serialize_root_strips_prolog() {
        let markup = r#"<?xml version="1.0"?><svg width="100%"><g><line/></g><circle/></svg><!-- tail -->"#;
        let out = serialize_root(markup).unwrap();
        assert_eq!(out, r#"<svg width="100%"><g><line/></g><circle/></svg>"#);
    }

    #[test]
    fn test_serialize_empty_root() {
        assert_eq!(serialize_root("<svg/>").unwrap(), "<svg/>");
    }

    #[test]
    fn test_raster_img() {
        let img = raster_img("iVBOR\nw0KGgo=");
        assert_eq!(
            img,
            r#"<img src="data:image/png;base64,iVBORw0KGgo=" alt="RNA secondary structure plot" style="max-width: 100%" />"#
        );
    }
}
