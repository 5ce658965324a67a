//! JSONL trace logging for tests.
//!
//! Entries go to `target/test-logs/psr-core-tests-<pid>.jsonl` so failing
//! CI runs can be inspected after the fact.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

fn log_file_path() -> PathBuf {
    let target = std::env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new(env!("CARGO_MANIFEST_DIR")).join("../../target"));
    target
        .join("test-logs")
        .join(format!("psr-core-tests-{}.jsonl", std::process::id()))
}

fn append_line(line: &str) -> std::io::Result<()> {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line)
}

/// Write one structured entry. Failures are reported on stderr and
/// otherwise ignored.
pub fn log_event(level: &str, msg: &str, file: &str, line: u32, fields: &[(&str, Value)]) {
    let mut map = Map::new();
    map.insert(
        "ts".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    map.insert("level".to_string(), Value::String(level.to_string()));
    map.insert("msg".to_string(), Value::String(msg.to_string()));
    map.insert("file".to_string(), Value::String(file.to_string()));
    map.insert("line".to_string(), Value::from(line));
    map.insert(
        "test".to_string(),
        Value::String(std::thread::current().name().unwrap_or("unnamed").to_string()),
    );

    for (key, value) in fields {
        let key = if map.contains_key(*key) {
            format!("extra_{}", key)
        } else {
            (*key).to_string()
        };
        map.insert(key, value.clone());
    }

    let result = serde_json::to_string(&Value::Object(map))
        .map_err(std::io::Error::from)
        .and_then(|line| append_line(&line));
    if let Err(err) = result {
        eprintln!("test_log: {}", err);
    }
}

#[macro_export]
macro_rules! test_log {
    ($level:ident, $msg:expr $(, $key:ident = $val:expr )* $(,)?) => {{
        let fields = vec![
            $(
                (stringify!($key), serde_json::json!($val)),
            )*
        ];
        let msg_string = $msg.to_string();
        $crate::test_log::log_event(stringify!($level), &msg_string, file!(), line!(), &fields);
    }};
    ($($arg:tt)+) => {{
        $crate::test_log!(INFO, format!($($arg)+));
    }};
}
