//! Merging independently traced SVG documents into one.
//!
//! Each input is parsed with `quick-xml`; the root element's `width` and
//! `height` are read and its children are re-serialized verbatim. The
//! children of every input are concatenated, in input order, under a
//! single new root.
//!
//! The merged width is the width of the **last** input (later inputs
//! overwrite it) while the merged height is the **maximum** of all
//! heights. Coordinate systems are not reconciled, so content from
//! inputs of different sizes overlaps at the origin.
//!
//! Prefixed namespace declarations on the input roots (`xmlns:xlink`)
//! are carried onto the merged root so prefixed children stay valid.
//! The first declaration of a prefix wins.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Namespace declared on the merged root.
const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Errors that can occur while merging SVG documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// An input is not well-formed XML.
    #[error("SVG #{index} is not well-formed: {message}")]
    Xml {
        /// Position of the offending input.
        index: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// An input contains no root element.
    #[error("SVG #{index} has no root element")]
    MissingRoot {
        /// Position of the offending input.
        index: usize,
    },
}

/// Attributes of an input root the merged root inherits.
#[derive(Debug, Clone, Default, PartialEq)]
struct Root {
    width: f64,
    height: f64,
    /// `(attribute name, value)` of every `xmlns:*` declaration.
    namespaces: Vec<(String, String)>,
}

/// Root attributes and inner markup of one parsed document.
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    root: Root,
    inner: String,
}

/// Merge SVG documents into one document.
///
/// The result is
/// `<svg xmlns="http://www.w3.org/2000/svg" width="{W}" height="{H}">{children}</svg>`
/// where `W` is the last input's width, `H` the largest input height and
/// `children` the concatenated inner markup of every input. Missing or
/// unparseable dimensions count as 0; an empty input slice gives a
/// `0 x 0` document with no content.
///
/// # Errors
///
/// Returns [`MergeError::Xml`] if an input is not well-formed and
/// [`MergeError::MissingRoot`] if an input has no element at all.
///
/// # Examples
///
/// ```
/// use chromatrace_export::merge_svgs;
///
/// let a = r#"<svg width="100" height="50"><path d="M0,0"/></svg>"#;
/// let b = r#"<svg width="80" height="60"><rect/></svg>"#;
/// let merged = merge_svgs(&[a, b]).unwrap();
/// assert_eq!(
///     merged,
///     r#"<svg xmlns="http://www.w3.org/2000/svg" width="80" height="60"><path d="M0,0"/><rect/></svg>"#,
/// );
/// ```
pub fn merge_svgs<S: AsRef<str>>(svgs: &[S]) -> Result<String, MergeError> {
    let mut total_width = 0.0_f64;
    let mut max_height = 0.0_f64;
    let mut namespaces: Vec<(String, String)> = Vec::new();
    let mut content = String::new();

    for (index, svg) in svgs.iter().enumerate() {
        let Fragment { root, inner } = parse_fragment(svg.as_ref(), index)?;
        total_width = root.width;
        max_height = max_height.max(root.height);
        for (name, uri) in root.namespaces {
            if !namespaces.iter().any(|(known, _)| *known == name) {
                namespaces.push((name, uri));
            }
        }
        content.push_str(&inner);
    }

    let declarations: String = namespaces
        .iter()
        .map(|(name, uri)| format!(r#" {name}="{uri}""#))
        .collect();
    Ok(format!(
        r#"<svg xmlns="{SVG_NS}"{declarations} width="{}" height="{}">{content}</svg>"#,
        format_number(total_width),
        format_number(max_height),
    ))
}

/// Parse one document into its root dimensions and inner markup.
///
/// Anything outside the root (XML declaration, doctype, comments,
/// whitespace) is dropped.
fn parse_fragment(svg: &str, index: usize) -> Result<Fragment, MergeError> {
    let xml_err = |message: String| MergeError::Xml { index, message };

    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::new());
    let mut root: Option<Root> = None;
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_err(format!("{e} at byte {}", reader.error_position())))?;
        match event {
            Event::Eof => break,
            Event::Start(start) if root.is_none() => {
                root = Some(read_root(&start).map_err(xml_err)?);
                depth = 1;
            }
            Event::Empty(start) if root.is_none() => {
                return Ok(Fragment {
                    root: read_root(&start).map_err(xml_err)?,
                    inner: String::new(),
                });
            }
            _ if root.is_none() => {}
            Event::Start(start) => {
                depth += 1;
                writer
                    .write_event(Event::Start(start))
                    .map_err(|e| xml_err(e.to_string()))?;
            }
            Event::End(end) => {
                depth -= 1;
                if depth == 0 {
                    let inner = String::from_utf8(writer.into_inner())
                        .map_err(|e| xml_err(e.to_string()))?;
                    return Ok(Fragment {
                        root: root.unwrap_or_default(),
                        inner,
                    });
                }
                writer
                    .write_event(Event::End(end))
                    .map_err(|e| xml_err(e.to_string()))?;
            }
            other => writer
                .write_event(other)
                .map_err(|e| xml_err(e.to_string()))?,
        }
    }

    if root.is_some() {
        Err(xml_err("root element is never closed".into()))
    } else {
        Err(MergeError::MissingRoot { index })
    }
}

/// Read `width`, `height` and the prefixed namespace declarations from
/// a root start tag.
fn read_root(start: &BytesStart<'_>) -> Result<Root, String> {
    let read = |name: &str| -> Result<f64, String> {
        let attr = start.try_get_attribute(name).map_err(|e| e.to_string())?;
        Ok(attr.map_or(0.0, |a| {
            let value: Cow<'_, str> = String::from_utf8_lossy(&a.value);
            parse_leading_float(&value)
        }))
    };

    let mut namespaces = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let name = String::from_utf8_lossy(attr.key.as_ref());
        if name.starts_with("xmlns:") {
            namespaces.push((
                name.into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            ));
        }
    }

    Ok(Root {
        width: read("width")?,
        height: read("height")?,
        namespaces,
    })
}

/// Parse the longest numeric prefix of `raw`, ignoring leading
/// whitespace, the way browsers parse a float from an attribute:
/// `"100"`, `"100px"` and `"1.5e2mm"` give 100, 100 and 150.
/// Anything without a leading number, or a non-finite result, gives 0.
fn parse_leading_float(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digit_count = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digit_count += frac_end - (end + 1);
        if digit_count > 0 {
            end = frac_end;
        }
    }
    if digit_count == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Shortest decimal form: `80`, `12.5`; negative zero prints as `0`.
fn format_number(value: f64) -> String {
    format!("{}", value + 0.0)
}
