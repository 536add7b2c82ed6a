// ── Wire-to-domain conversion ──
//
// Positional JSON arrays from `GET changes` become typed `ChangeRecord`s.
// Arity decides section- vs option-level variants.

use serde_json::Value;
use tracing::warn;
use ucictl_api::RawChangeset;

use crate::model::{ChangeRecord, Changeset};

// Records this client cannot interpret are kept as `Other` so they still
// count toward the indicator. Only empty records are dropped.
impl From<RawChangeset> for Changeset {
    fn from(raw: RawChangeset) -> Self {
        let mut changeset = Changeset::new();
        for (config, records) in raw.changes {
            let parsed = records
                .into_iter()
                .filter_map(|r| parse_record(&config, &r))
                .collect::<Vec<_>>();
            changeset.extend(config, parsed);
        }
        changeset
    }
}

fn parse_record(config: &str, record: &[Value]) -> Option<ChangeRecord> {
    let mut args = record.iter().map(value_to_string);
    let Some(op) = args.next() else {
        warn!(config, "dropping empty change record");
        return None;
    };
    let args: Vec<String> = args.collect();

    match typed_record(&op, &args) {
        Ok(parsed) => Some(parsed),
        Err(reason) => {
            warn!(config, %op, %reason, "keeping unrecognised change record as-is");
            Some(ChangeRecord::Other { op, args })
        }
    }
}

fn typed_record(op: &str, args: &[String]) -> Result<ChangeRecord, String> {
    let parsed = match (op, args) {
        ("add", [section_type]) => ChangeRecord::Add {
            section_type: section_type.clone(),
            name: None,
        },
        ("add", [section_type, name]) => ChangeRecord::Add {
            section_type: section_type.clone(),
            name: Some(name.clone()),
        },
        ("set", [section, value]) => ChangeRecord::Set {
            section: section.clone(),
            option: None,
            value: value.clone(),
        },
        ("set", [section, option, value]) => ChangeRecord::Set {
            section: section.clone(),
            option: Some(option.clone()),
            value: value.clone(),
        },
        ("remove", [section]) => ChangeRecord::Remove {
            section: section.clone(),
            option: None,
        },
        ("remove", [section, option]) => ChangeRecord::Remove {
            section: section.clone(),
            option: Some(option.clone()),
        },
        ("order", [section, position]) => ChangeRecord::Reorder {
            section: section.clone(),
            position: position
                .parse()
                .map_err(|_| format!("invalid position '{position}'"))?,
        },
        ("list-add", [section, option, value]) => ChangeRecord::ListAdd {
            section: section.clone(),
            option: option.clone(),
            value: value.clone(),
        },
        ("list-del", [section, option, value]) => ChangeRecord::ListRemove {
            section: section.clone(),
            option: option.clone(),
            value: value.clone(),
        },
        ("rename", [section, name]) => ChangeRecord::Rename {
            section: section.clone(),
            option: None,
            name: name.clone(),
        },
        ("rename", [section, option, name]) => ChangeRecord::Rename {
            section: section.clone(),
            option: Some(option.clone()),
            name: name.clone(),
        },
        ("add" | "set" | "remove" | "order" | "list-add" | "list-del" | "rename", _) => {
            return Err(format!("{} arguments", args.len()));
        }
        _ => return Err("unknown operation".into()),
    };

    Ok(parsed)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
