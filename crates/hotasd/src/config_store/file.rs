//! TOML encoding of the configuration tree.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use camino::Utf8Path;
use tempfile::Builder;
use toml::{Table, Value};

use super::errors::ConfigError;
use super::value::ParamValue;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const HEADER: &str = "# hotasd device configuration\n\n";

/// Reads the file at `path`.
pub(super) fn read(path: &Utf8Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses TOML text into `(dotted key, value)` pairs.
///
/// Nested tables flatten into dotted keys, so `[led]` followed by
/// `fire = "on"` and a top-level `led.fire = "on"` are equivalent.
pub(super) fn parse(path: &Utf8Path, text: &str) -> Result<Vec<(String, Value)>, ConfigError> {
    let table: Table = toml::from_str(text).map_err(|error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: error.message().to_owned(),
    })?;
    let mut entries = Vec::new();
    flatten(None, table, &mut entries);
    Ok(entries)
}

fn flatten(prefix: Option<&str>, table: Table, entries: &mut Vec<(String, Value)>) {
    for (name, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name,
        };
        match value {
            Value::Table(nested) => flatten(Some(&key), nested, entries),
            leaf => entries.push((key, leaf)),
        }
    }
}

/// Renders `(dotted key, value)` pairs as TOML, one table per section.
pub(super) fn render<'k, 'v, I>(entries: I) -> Result<String, ConfigError>
where
    I: IntoIterator<Item = (&'k str, &'v ParamValue)>,
{
    let mut root = Table::new();
    for (key, value) in entries {
        insert_dotted(&mut root, key, value.to_toml());
    }
    let body = toml::to_string(&root)?;
    Ok(format!("{HEADER}{body}"))
}

fn insert_dotted(root: &mut Table, key: &str, value: Value) {
    let mut segments = key.split('.').peekable();
    let mut table = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        let entry = table
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Table(Table::new()));
        let Value::Table(next) = entry else {
            return;
        };
        table = next;
    }
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so readers see either the old file or the new one.
pub(super) fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("hotasd"),
    );
    builder.suffix(".tmp");
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        builder.permissions(Permissions::from_mode(0o644));
    }

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn flattens_sections_and_dotted_keys() {
        let text = "led.fire = \"off\"\n[brightness]\nmfd = 40\n";
        let mut entries = parse(Utf8Path::new("test.toml"), text).expect("parses");
        entries.sort_by(|left, right| left.0.cmp(&right.0));
        assert_eq!(
            entries,
            vec![
                ("brightness.mfd".to_owned(), Value::Integer(40)),
                ("led.fire".to_owned(), Value::String("off".to_owned())),
            ]
        );
    }

    #[test]
    fn reports_syntax_errors_as_parse_failures() {
        let error = parse(Utf8Path::new("bad.toml"), "[led\nfire = on").expect_err("invalid");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn renders_one_table_per_section() {
        let fire = ParamValue::Str("on".to_owned());
        let level = ParamValue::Int(12);
        let text = render([("led.fire", &fire), ("brightness.led", &level)]).expect("renders");
        assert!(text.starts_with(HEADER));
        assert!(text.contains("[led]"));
        assert!(text.contains("fire = \"on\""));
        assert!(text.contains("[brightness]"));
        assert!(text.contains("led = 12"));
    }

    #[test]
    fn atomic_write_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hotasd.toml");
        fs::write(&path, "old").expect("seed file");

        atomic_write(&path, b"new").expect("atomic write");

        assert_eq!(fs::read_to_string(&path).expect("read back"), "new");
        let leftovers = fs::read_dir(dir.path())
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.path() != path)
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn read_reports_missing_files_as_io() {
        let missing = Utf8PathBuf::from("/nonexistent/hotasd/hotasd.toml");
        let error = read(&missing).expect_err("missing file");
        assert!(matches!(error, ConfigError::Io { .. }));
    }
}
