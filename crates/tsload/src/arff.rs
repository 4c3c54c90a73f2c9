//! Attribute-relation (ARFF) file parsing.
//!
//! The UEA/UCR repository ships each split as an ARFF document in one of two
//! encodings:
//!
//! - **multivariate**: exactly two top-level attributes — a relational
//!   attribute holding, per record, one comma-separated row per dimension
//!   (rows separated by escaped `\n`), plus the `target` label attribute;
//! - **univariate**: one scalar attribute per timestep plus the `target`
//!   attribute; the scalar fields of one record collapse into a single
//!   dimension column.
//!
//! The encoding is decided once per file from the header. Records that do not
//! match it abort the whole parse; there is no best-effort result.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array2;

use crate::error::{DataError, Result};

/// Name of the label attribute in the upstream archive files.
const TARGET_ATTRIBUTE: &str = "target";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeKind {
    Numeric,
    Str,
    Nominal,
    Relational,
}

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    kind: AttributeKind,
}

/// File-level record layout, decided once from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Two top-level fields: the nested series plus the label.
    Multivariate,
    /// Label plus independent scalar fields, collapsed to one dimension.
    Univariate,
}

#[derive(Debug)]
struct Header {
    attributes: Vec<Attribute>,
    target_index: usize,
    layout: Layout,
}

impl Header {
    fn from_attributes(attributes: Vec<Attribute>) -> Result<Self> {
        if attributes.len() < 2 {
            return Err(DataError::Parse(format!(
                "expected at least two attributes, found {}",
                attributes.len()
            )));
        }
        let target_index = attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(TARGET_ATTRIBUTE))
            .ok_or_else(|| {
                DataError::Parse(format!("no `{}` attribute in header", TARGET_ATTRIBUTE))
            })?;
        let layout = if attributes.len() == 2 {
            Layout::Multivariate
        } else {
            Layout::Univariate
        };
        Ok(Self {
            attributes,
            target_index,
            layout,
        })
    }
}

/// Load raw series and labels from an ARFF file.
///
/// Returns the series in record order, each shaped `(length, n_dims)`, and
/// the parallel label strings. See [`parse_series`] for the format rules.
pub fn load_series(path: &Path) -> Result<(Vec<Array2<f64>>, Vec<String>)> {
    let file = File::open(path)?;
    parse_series(BufReader::new(file)).map_err(|e| match e {
        DataError::Parse(msg) => DataError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse an ARFF document from any buffered reader.
///
/// Labels are passed through as opaque strings in record order; `?` values
/// become NaN. A record violating the header's layout fails the whole parse
/// with [`DataError::Parse`] carrying the record index.
pub fn parse_series<R: BufRead>(reader: R) -> Result<(Vec<Array2<f64>>, Vec<String>)> {
    let mut lines = reader.lines().enumerate();

    let header = parse_header(&mut lines)?;

    let mut series = Vec::new();
    let mut labels = Vec::new();

    for (line_no, line) in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        let record_index = series.len();
        let context = |msg: String| {
            DataError::Parse(format!(
                "record {} (line {}): {}",
                record_index,
                line_no + 1,
                msg
            ))
        };

        if line.starts_with('{') {
            return Err(context("sparse rows are not supported".to_string()));
        }

        let fields = split_fields(line).map_err(&context)?;
        let (signal, label) = match header.layout {
            Layout::Multivariate => {
                parse_relational_record(&fields, header.target_index).map_err(&context)?
            }
            Layout::Univariate => {
                parse_scalar_record(&fields, header.target_index, header.attributes.len())
                    .map_err(&context)?
            }
        };

        series.push(signal);
        labels.push(label);
    }

    Ok((series, labels))
}

/// Consume header lines up to and including the `@data` marker.
fn parse_header<I>(lines: &mut I) -> Result<Header>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    let mut attributes = Vec::new();
    let mut in_relational = false;

    for (line_no, line) in lines.by_ref() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        let lower = line.to_ascii_lowercase();
        if lower.starts_with("@relation") {
            continue;
        }
        if lower.starts_with("@attribute") {
            if in_relational {
                // Nested attribute declarations are not materialized: the
                // per-record sub-sequence count determines dimensionality.
                continue;
            }
            let attribute = parse_attribute(line)
                .map_err(|e| DataError::Parse(format!("line {}: {}", line_no + 1, e)))?;
            if attribute.kind == AttributeKind::Relational {
                in_relational = true;
            }
            attributes.push(attribute);
            continue;
        }
        if lower.starts_with("@end") {
            in_relational = false;
            continue;
        }
        if lower.starts_with("@data") {
            return Header::from_attributes(attributes);
        }
        return Err(DataError::Parse(format!(
            "line {}: unrecognized header line: {}",
            line_no + 1,
            line
        )));
    }

    Err(DataError::Parse("missing @data section".to_string()))
}

/// Parse one `@attribute <name> <type>` declaration.
fn parse_attribute(line: &str) -> std::result::Result<Attribute, String> {
    let rest = line["@attribute".len()..].trim_start();
    let (name, rest) = take_name(rest)?;
    let kind_str = rest.trim();

    let kind = if kind_str.starts_with('{') {
        AttributeKind::Nominal
    } else {
        match kind_str.to_ascii_lowercase().as_str() {
            "relational" => AttributeKind::Relational,
            "string" => AttributeKind::Str,
            "numeric" | "real" | "integer" => AttributeKind::Numeric,
            other => return Err(format!("unsupported attribute type: {}", other)),
        }
    };

    Ok(Attribute { name, kind })
}

/// Split an attribute name (possibly quoted) off the front of `rest`.
fn take_name(rest: &str) -> std::result::Result<(String, &str), String> {
    let mut chars = rest.char_indices();
    match chars.next() {
        Some((_, quote @ ('\'' | '"'))) => {
            for (i, ch) in chars {
                if ch == quote {
                    return Ok((rest[1..i].to_string(), &rest[i + 1..]));
                }
            }
            Err(format!("unterminated quote in attribute name: {}", rest))
        }
        Some(_) => {
            let end = rest
                .find(char::is_whitespace)
                .ok_or_else(|| format!("attribute declaration has no type: {}", rest))?;
            Ok((rest[..end].to_string(), &rest[end..]))
        }
        None => Err("empty attribute declaration".to_string()),
    }
}

/// Split one data row on commas, honoring single and double quotes.
///
/// Returned fields have their surrounding quotes removed but escape
/// sequences intact; [`unescape`] is applied where embedded rows are
/// expected.
fn split_fields(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in line.chars() {
        if escaped {
            current.push('\\');
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if quote.is_some() => escaped = true,
            '\'' | '"' => {
                if quote == Some(ch) {
                    quote = None;
                } else if quote.is_none() && current.trim().is_empty() {
                    current.clear();
                    quote = Some(ch);
                } else {
                    current.push(ch);
                }
            }
            ',' if quote.is_none() => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if escaped {
        current.push('\\');
    }
    if quote.is_some() {
        return Err(format!("unterminated quote: {}", line));
    }
    fields.push(current);
    Ok(fields)
}

/// Resolve `\n`, `\r`, `\t` and `\\` escape sequences.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse one numeric token; `?` marks a missing value.
fn parse_value(token: &str) -> std::result::Result<f64, String> {
    let token = token.trim();
    if token == "?" {
        return Ok(f64::NAN);
    }
    token
        .parse::<f64>()
        .map_err(|_| format!("invalid numeric value: {}", token))
}

/// Parse a multivariate record: a quoted nested field plus the label.
///
/// The nested field holds one row per dimension; rows must share a length.
/// The result is transposed to `(length, n_dims)`.
fn parse_relational_record(
    fields: &[String],
    target_index: usize,
) -> std::result::Result<(Array2<f64>, String), String> {
    if fields.len() != 2 {
        return Err(format!("expected 2 fields, found {}", fields.len()));
    }
    let label = fields[target_index].trim().to_string();
    let nested = unescape(&fields[1 - target_index]);

    let mut dims: Vec<Vec<f64>> = Vec::new();
    for row in nested.split('\n') {
        if row.trim().is_empty() {
            continue;
        }
        let values = row
            .split(',')
            .map(parse_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        dims.push(values);
    }

    if dims.is_empty() {
        return Err("empty series field".to_string());
    }
    let length = dims[0].len();
    if dims.iter().any(|d| d.len() != length) {
        return Err("sub-sequences have mismatched lengths".to_string());
    }

    let n_dims = dims.len();
    let signal = Array2::from_shape_fn((length, n_dims), |(t, d)| dims[d][t]);
    Ok((signal, label))
}

/// Parse a univariate record: one scalar per declared attribute, the
/// non-label scalars collapsing into a single `(length, 1)` column.
fn parse_scalar_record(
    fields: &[String],
    target_index: usize,
    n_attributes: usize,
) -> std::result::Result<(Array2<f64>, String), String> {
    if fields.len() != n_attributes {
        return Err(format!(
            "expected {} fields, found {}",
            n_attributes,
            fields.len()
        ));
    }
    let label = fields[target_index].trim().to_string();
    let values = fields
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_index)
        .map(|(_, field)| parse_value(field))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let length = values.len();
    let signal = Array2::from_shape_vec((length, 1), values).map_err(|e| e.to_string())?;
    Ok((signal, label))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const MULTIVARIATE: &str = "\
% three dimensions, three timesteps each
@relation example
@attribute mts relational
  @attribute channel numeric
@end mts
@attribute target {a,b}
@data
'1,2,3\\n4,5,6\\n7,8,9',a
'10,11\\n12,13\\n14,15',b
";

    const UNIVARIATE: &str = "\
@relation example
@attribute att0 numeric
@attribute att1 numeric
@attribute att2 numeric
@attribute att3 numeric
@attribute target {0,1}
@data
0.5,1.5,2.5,3.5,0
4.0,?,6.0,7.0,1
";

    #[test]
    fn multivariate_records_transpose_to_length_by_dims() {
        let (series, labels) = parse_series(Cursor::new(MULTIVARIATE)).unwrap();

        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(series[0].dim(), (3, 3));
        assert_eq!(series[1].dim(), (2, 3));

        // values[[t, d]] is sub-sequence d at timestep t
        assert_eq!(series[0][[0, 0]], 1.0);
        assert_eq!(series[0][[0, 1]], 4.0);
        assert_eq!(series[0][[0, 2]], 7.0);
        assert_eq!(series[0][[2, 1]], 6.0);
        assert_eq!(series[1][[1, 2]], 15.0);
    }

    #[test]
    fn univariate_records_collapse_scalar_fields_into_one_column() {
        let (series, labels) = parse_series(Cursor::new(UNIVARIATE)).unwrap();

        assert_eq!(labels, vec!["0", "1"]);
        assert_eq!(series.len(), 2);
        for signal in &series {
            assert_eq!(signal.dim(), (4, 1));
        }
        assert_eq!(series[0][[0, 0]], 0.5);
        assert_eq!(series[0][[3, 0]], 3.5);
        assert!(series[1][[1, 0]].is_nan());
        assert_eq!(series[1][[3, 0]], 7.0);
    }

    #[test]
    fn label_position_follows_the_header() {
        let text = "\
@relation example
@attribute target {a,b}
@attribute mts relational
  @attribute channel numeric
@end mts
@data
b,'1,2\\n3,4'
";
        let (series, labels) = parse_series(Cursor::new(text)).unwrap();
        assert_eq!(labels, vec!["b"]);
        assert_eq!(series[0].dim(), (2, 2));
    }

    #[test]
    fn quoted_labels_are_stripped() {
        let text = "\
@relation example
@attribute att0 numeric
@attribute att1 numeric
@attribute target {cat,dog}
@data
1.0,2.0,'cat'
";
        let (_, labels) = parse_series(Cursor::new(text)).unwrap();
        assert_eq!(labels, vec!["cat"]);
    }

    #[test]
    fn field_count_mismatch_aborts_the_parse() {
        let text = "\
@relation example
@attribute att0 numeric
@attribute att1 numeric
@attribute target {0,1}
@data
1.0,2.0,0
1.0,0
";
        let err = parse_series(Cursor::new(text)).unwrap_err();
        match err {
            DataError::Parse(msg) => {
                assert!(msg.contains("record 1"), "{}", msg);
                assert!(msg.contains("expected 3 fields"), "{}", msg);
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn mismatched_sub_sequence_lengths_abort_the_parse() {
        let text = "\
@relation example
@attribute mts relational
  @attribute channel numeric
@end mts
@attribute target {a}
@data
'1,2,3\\n4,5',a
";
        let err = parse_series(Cursor::new(text)).unwrap_err();
        match err {
            DataError::Parse(msg) => assert!(msg.contains("mismatched lengths"), "{}", msg),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn a_header_without_target_is_rejected() {
        let text = "\
@relation example
@attribute att0 numeric
@attribute att1 numeric
@attribute label {0,1}
@data
1.0,2.0,0
";
        let err = parse_series(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, DataError::Parse(msg) if msg.contains("target")));
    }

    #[test]
    fn a_file_without_data_section_is_rejected() {
        let text = "@relation example\n@attribute target {0,1}\n";
        let err = parse_series(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, DataError::Parse(msg) if msg.contains("@data")));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped_everywhere() {
        let text = "\
% header comment

@relation example
@attribute att0 numeric
@attribute att1 numeric
@attribute target {0,1}

@data
% data comment
1.0,2.0,0

3.0,4.0,1
";
        let (series, labels) = parse_series(Cursor::new(text)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(labels, vec!["0", "1"]);
    }

    #[test]
    fn missing_values_in_nested_rows_become_nan() {
        let text = "\
@relation example
@attribute mts relational
  @attribute channel numeric
@end mts
@attribute target {a}
@data
'1,?\\n3,4',a
";
        let (series, _) = parse_series(Cursor::new(text)).unwrap();
        assert!(series[0][[1, 0]].is_nan());
        assert_eq!(series[0][[1, 1]], 4.0);
    }
}
