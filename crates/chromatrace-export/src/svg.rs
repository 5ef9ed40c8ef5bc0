//! SVG export of traced outlines.
//!
//! All outlines of one trace become a single filled `<path>`: each
//! closed border is a `M … L … z` subpath and `fill-rule="evenodd"`
//! turns hole borders into holes. Documents are built with the [`svg`]
//! crate, which also handles attribute escaping and number formatting.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::Value;
use svg::node::element::path::Data;
use svg::node::element::{Description, Path, Title};
use svg::node::Text;

use chromatrace_pipeline::{Outlines, Polyline, Rgb};

/// Fill used when a trace carries no palette color.
const DEFAULT_FILL: &str = "black";

/// Optional `<title>` / `<desc>` content for exported documents.
///
/// Text values are XML-escaped by the `svg` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, typically the source file stem.
    pub title: Option<&'a str>,
    /// Free-form description, e.g. the traced color and thresholds.
    pub description: Option<&'a str>,
}

/// Build the `d` attribute for a set of closed outlines.
///
/// Outlines with fewer than 2 points are skipped. Returns an empty
/// string when nothing is drawable.
///
/// # Examples
///
/// ```
/// use chromatrace_pipeline::{Point, Polyline};
/// use chromatrace_export::build_path_data;
///
/// let square = Polyline::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(4.0, 0.0),
///     Point::new(4.0, 4.0),
/// ]);
/// assert_eq!(build_path_data([&square]), "M0,0 L4,0 L4,4 z");
/// ```
#[must_use]
pub fn build_path_data<'a>(outlines: impl IntoIterator<Item = &'a Polyline>) -> String {
    let mut data = Data::new();
    let mut any = false;
    for outline in outlines {
        let points = outline.points();
        if points.len() < 2 {
            continue;
        }
        data = data.move_to((points[0].x, points[0].y));
        for p in &points[1..] {
            data = data.line_to((p.x, p.y));
        }
        data = data.close();
        any = true;
    }
    if any {
        String::from(Value::from(data))
    } else {
        String::new()
    }
}

/// Serialize traced outlines into a standalone SVG document.
///
/// The root declares `width`, `height` and a matching `viewBox` so the
/// path coordinates map 1:1 onto source pixels. `fill` colors the
/// silhouette; `None` fills black. An empty trace yields a valid
/// document with no `<path>`.
///
/// # Examples
///
/// ```
/// use chromatrace_pipeline::{Dimensions, Outlines, Rgb};
/// use chromatrace_export::{SvgMetadata, to_svg};
///
/// let empty = Outlines {
///     outlines: Vec::new(),
///     dimensions: Dimensions { width: 80, height: 60 },
/// };
/// let svg = to_svg(&empty, Some(Rgb::new(255, 0, 0)), &SvgMetadata::default());
/// assert!(svg.contains(r#"width="80""#));
/// assert!(!svg.contains("<path"));
/// ```
#[must_use]
pub fn to_svg(outlines: &Outlines, fill: Option<Rgb>, metadata: &SvgMetadata<'_>) -> String {
    let w = outlines.dimensions.width;
    let h = outlines.dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let d = build_path_data(outlines.outlines.iter().map(|o| &o.path));
    if !d.is_empty() {
        let fill = fill.map_or_else(|| DEFAULT_FILL.to_owned(), Rgb::to_hex);
        let path = Path::new()
            .set("d", d)
            .set("fill", fill)
            .set("fill-rule", "evenodd")
            .set("stroke", "none");
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chromatrace_pipeline::{Border, Dimensions, Outline, Point};

    fn outlines(paths: Vec<Vec<(f64, f64)>>) -> Outlines {
        Outlines {
            outlines: paths
                .into_iter()
                .map(|pts| Outline {
                    path: Polyline::new(pts.into_iter().map(|(x, y)| Point::new(x, y)).collect()),
                    border: Border::Outer,
                })
                .collect(),
            dimensions: Dimensions {
                width: 100,
                height: 50,
            },
        }
    }

    #[test]
    fn path_data_closes_every_subpath() {
        let a = Polyline::new(vec![Point::new(1.0, 1.0), Point::new(2.0, 1.0)]);
        let b = Polyline::new(vec![Point::new(5.0, 5.0), Point::new(6.0, 6.5)]);
        assert_eq!(build_path_data([&a, &b]), "M1,1 L2,1 z M5,5 L6,6.5 z");
    }

    #[test]
    fn degenerate_outlines_are_skipped() {
        let dot = Polyline::new(vec![Point::new(1.0, 1.0)]);
        assert_eq!(build_path_data([&dot]), "");
    }

    #[test]
    fn document_has_declaration_namespace_and_viewbox() {
        let svg = to_svg(&outlines(vec![]), None, &SvgMetadata::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(svg.contains(r#"height="50""#));
        // No children: the svg crate self-closes the root.
        assert!(svg.trim_end().ends_with("/>"));
    }

    #[test]
    fn document_with_path_closes_root() {
        let svg = to_svg(
            &outlines(vec![vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]]),
            None,
            &SvgMetadata::default(),
        );
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn fill_uses_palette_hex() {
        let svg = to_svg(
            &outlines(vec![vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]]),
            Some(Rgb::new(0x20, 0x1A, 0x16)),
            &SvgMetadata::default(),
        );
        assert!(svg.contains("fill=\"#201A16\""));
        assert!(svg.contains(r#"fill-rule="evenodd""#));
    }

    #[test]
    fn monochrome_fill_is_black() {
        let svg = to_svg(
            &outlines(vec![vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]]),
            None,
            &SvgMetadata::default(),
        );
        assert!(svg.contains(r#"fill="black""#));
    }

    #[test]
    fn all_outlines_share_one_path() {
        let svg = to_svg(
            &outlines(vec![
                vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)],
                vec![(20.0, 20.0), (30.0, 20.0), (30.0, 30.0)],
            ]),
            None,
            &SvgMetadata::default(),
        );
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn metadata_is_escaped() {
        let meta = SvgMetadata {
            title: Some("a <b> & c"),
            description: Some("fill #FF0000"),
        };
        let svg = to_svg(&outlines(vec![]), None, &meta);
        assert!(svg.contains("<title>a &lt;b&gt; &amp; c</title>"));
        assert!(svg.contains("<desc>fill #FF0000</desc>"));
    }
}
