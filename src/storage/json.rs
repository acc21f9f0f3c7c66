use crate::error::{KgError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// How [`dump_json`] formats its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonWriteOptions {
    /// Spaces per nesting level; `None` writes compact JSON on one line.
    pub indent: Option<usize>,
    /// Escape every non-ASCII character as `\uXXXX`.
    pub ensure_ascii: bool,
}

impl Default for JsonWriteOptions {
    fn default() -> Self {
        Self {
            indent: Some(4),
            ensure_ascii: false,
        }
    }
}

/// Serialize `obj` to a string using `options`
pub fn to_json_string<T: Serialize + ?Sized>(obj: &T, options: JsonWriteOptions) -> Result<String> {
    let mut buf = Vec::new();

    match options.indent {
        Some(width) => {
            let indent = vec![b' '; width];
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            obj.serialize(&mut serializer)
        }
        None => serde_json::to_writer(&mut buf, obj),
    }
    .map_err(|e| KgError::Serialization(e.to_string()))?;

    let text = String::from_utf8(buf).map_err(|e| KgError::Serialization(e.to_string()))?;

    Ok(if options.ensure_ascii {
        escape_non_ascii(&text)
    } else {
        text
    })
}

/// Non-ASCII characters only occur inside JSON strings, so escaping them in
/// the rendered text yields an equivalent document.
fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
    out
}

/// Write `obj` as JSON to `path`, replacing any existing file.
pub fn dump_json<T, P>(obj: &T, path: P, options: JsonWriteOptions) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = to_json_string(obj, options)?;

    let file_error = |source| KgError::FileOperation {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(file_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes()).map_err(file_error)?;
    writer.flush().map_err(file_error)?;

    log::debug!("Wrote {} bytes of JSON to {}", text.len(), path.display());
    Ok(())
}

/// Read and parse a UTF-8 JSON document from `path`.
pub fn load_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| KgError::FileOperation {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| KgError::Parse(format!("JSON parse error in {}: {}", path.display(), e)))
}
