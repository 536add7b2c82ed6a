// ── Staged change records ──
//
// One variant per UCI operation. Arity is encoded in the variant shape:
// an absent `option` means the operation targets the whole section.

use std::fmt;

use serde::Serialize;

/// A single staged mutation of one configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ChangeRecord {
    /// Create an anonymous section of the given type. `name` is the
    /// placeholder the backend uses until the section is committed.
    Add {
        section_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Section-level set (value is the section type) or option-level set.
    Set {
        section: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        option: Option<String>,
        value: String,
    },
    Remove {
        section: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        option: Option<String>,
    },
    Reorder {
        section: String,
        position: u32,
    },
    ListAdd {
        section: String,
        option: String,
        value: String,
    },
    ListRemove {
        section: String,
        option: String,
        value: String,
    },
    /// Rename a section, or an option within a section.
    Rename {
        section: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        option: Option<String>,
        name: String,
    },
    /// An operation this client does not interpret, kept with its raw
    /// arguments so it is still listed and counted.
    Other {
        #[serde(rename = "operation")]
        op: String,
        args: Vec<String>,
    },
}

impl ChangeRecord {
    /// Wire name of the operation.
    pub fn op(&self) -> &str {
        match self {
            Self::Add { .. } => "add",
            Self::Set { .. } => "set",
            Self::Remove { .. } => "remove",
            Self::Reorder { .. } => "order",
            Self::ListAdd { .. } => "list-add",
            Self::ListRemove { .. } => "list-del",
            Self::Rename { .. } => "rename",
            Self::Other { op, .. } => op,
        }
    }

    /// The section this record targets. `Add` targets its own placeholder.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Add { name, .. } => name.as_deref(),
            Self::Set { section, .. }
            | Self::Remove { section, .. }
            | Self::Reorder { section, .. }
            | Self::ListAdd { section, .. }
            | Self::ListRemove { section, .. }
            | Self::Rename { section, .. } => Some(section),
            Self::Other { .. } => None,
        }
    }

    /// The option this record targets, if it is option-level.
    pub fn option(&self) -> Option<&str> {
        match self {
            Self::Set { option, .. } | Self::Remove { option, .. } | Self::Rename { option, .. } => {
                option.as_deref()
            }
            Self::ListAdd { option, .. } | Self::ListRemove { option, .. } => Some(option),
            Self::Add { .. } | Self::Reorder { .. } | Self::Other { .. } => None,
        }
    }

    /// Whether this record sets or deletes one of `options` on `section`.
    pub fn edits_option(&self, section: &str, options: &[&str]) -> bool {
        match self {
            Self::Set {
                section: s,
                option: Some(o),
                ..
            }
            | Self::Remove {
                section: s,
                option: Some(o),
            } => s == section && options.contains(&o.as_str()),
            _ => false,
        }
    }
}

/// How a record's section should be referred to for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionRef {
    /// A section with a stable name.
    Named(String),
    /// A section created by an `Add` `ops_ago` records earlier in the same
    /// file, not yet assigned a stable name by the backend.
    Pending { section_type: String, ops_ago: usize },
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Pending {
                section_type,
                ops_ago,
            } => write!(f, "<new {section_type}, {ops_ago} ops back>"),
        }
    }
}

/// A record together with its resolved section reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChange {
    pub record: ChangeRecord,
    pub section: Option<SectionRef>,
}

impl fmt::Display for ResolvedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = self
            .section
            .as_ref()
            .map_or_else(String::new, ToString::to_string);
        match &self.record {
            ChangeRecord::Add { section_type, .. } => write!(f, "add {section_type}"),
            ChangeRecord::Set {
                option: None,
                value,
                ..
            } => write!(f, "set {section}={value}"),
            ChangeRecord::Set {
                option: Some(o),
                value,
                ..
            } => write!(f, "set {section}.{o}={value}"),
            ChangeRecord::Remove { option: None, .. } => write!(f, "remove {section}"),
            ChangeRecord::Remove { option: Some(o), .. } => write!(f, "remove {section}.{o}"),
            ChangeRecord::Reorder { position, .. } => write!(f, "order {section}={position}"),
            ChangeRecord::ListAdd { option, value, .. } => {
                write!(f, "list-add {section}.{option}={value}")
            }
            ChangeRecord::ListRemove { option, value, .. } => {
                write!(f, "list-del {section}.{option}={value}")
            }
            ChangeRecord::Rename {
                option: None, name, ..
            } => write!(f, "rename {section}={name}"),
            ChangeRecord::Rename {
                option: Some(o),
                name,
                ..
            } => write!(f, "rename {section}.{o}={name}"),
            ChangeRecord::Other { op, args } if args.is_empty() => f.write_str(op),
            ChangeRecord::Other { op, args } => write!(f, "{op} {}", args.join(" ")),
        }
    }
}

/// Resolve section references across one file's ordered records.
///
/// A record addressing a placeholder introduced by an earlier `Add` becomes
/// [`SectionRef::Pending`] with the distance back to that `Add`. Renaming or
/// removing the whole section ends its pending status.
pub fn resolve_sections(records: &[ChangeRecord]) -> Vec<ResolvedChange> {
    let mut pending: Vec<(String, String, usize)> = Vec::new();
    let mut resolved = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        let section = match record {
            ChangeRecord::Add { section_type, name } => {
                if let Some(name) = name {
                    pending.retain(|(n, _, _)| n != name);
                    pending.push((name.clone(), section_type.clone(), idx));
                }
                None
            }
            other => other.section().map(|s| {
                pending
                    .iter()
                    .find(|(name, _, _)| name == s)
                    .map_or_else(
                        || SectionRef::Named(s.to_owned()),
                        |(_, section_type, added_at)| SectionRef::Pending {
                            section_type: section_type.clone(),
                            ops_ago: idx - added_at,
                        },
                    )
            }),
        };

        match record {
            ChangeRecord::Rename {
                section,
                option: None,
                ..
            }
            | ChangeRecord::Remove {
                section,
                option: None,
            } => pending.retain(|(name, _, _)| name != section),
            _ => {}
        }

        resolved.push(ResolvedChange {
            record: record.clone(),
            section,
        });
    }

    resolved
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn set(section: &str, option: &str, value: &str) -> ChangeRecord {
        ChangeRecord::Set {
            section: section.into(),
            option: Some(option.into()),
            value: value.into(),
        }
    }

    #[test]
    fn set_on_added_section_resolves_relative() {
        let records = vec![
            ChangeRecord::Add {
                section_type: "interface".into(),
                name: Some("cfg0a1b2c".into()),
            },
            set("lan", "proto", "static"),
            set("cfg0a1b2c", "proto", "dhcp"),
        ];

        let resolved = resolve_sections(&records);

        assert_eq!(resolved[0].section, None);
        assert_eq!(resolved[1].section, Some(SectionRef::Named("lan".into())));
        assert_eq!(
            resolved[2].section,
            Some(SectionRef::Pending {
                section_type: "interface".into(),
                ops_ago: 2
            })
        );
    }

    #[test]
    fn rename_ends_pending_status() {
        let records = vec![
            ChangeRecord::Add {
                section_type: "zone".into(),
                name: Some("cfg01".into()),
            },
            ChangeRecord::Rename {
                section: "cfg01".into(),
                option: None,
                name: "guest".into(),
            },
            set("cfg01", "name", "x"),
        ];

        let resolved = resolve_sections(&records);

        assert!(matches!(
            resolved[1].section,
            Some(SectionRef::Pending { ops_ago: 1, .. })
        ));
        assert_eq!(resolved[2].section, Some(SectionRef::Named("cfg01".into())));
    }

    #[test]
    fn edits_option_matches_only_listed_options() {
        let record = set("lan", "ipaddr", "10.0.0.1");
        assert!(record.edits_option("lan", &["ipaddr", "netmask"]));
        assert!(!record.edits_option("wan", &["ipaddr"]));
        assert!(!record.edits_option("lan", &["proto"]));

        let removal = ChangeRecord::Remove {
            section: "lan".into(),
            option: Some("disabled".into()),
        };
        assert!(removal.edits_option("lan", &["disabled"]));
    }

    #[test]
    fn display_formats_records() {
        let resolved = resolve_sections(&[
            set("lan", "proto", "dhcp"),
            ChangeRecord::Reorder {
                section: "wan".into(),
                position: 3,
            },
        ]);
        assert_eq!(resolved[0].to_string(), "set lan.proto=dhcp");
        assert_eq!(resolved[1].to_string(), "order wan=3");
    }

    #[test]
    fn unrecognised_record_displays_raw() {
        let record = ChangeRecord::Other {
            op: "list-set".into(),
            args: vec!["lan".into(), "dns".into(), "x".into()],
        };
        let resolved = resolve_sections(std::slice::from_ref(&record));
        assert_eq!(resolved[0].section, None);
        assert_eq!(resolved[0].to_string(), "list-set lan dns x");
        assert!(!record.edits_option("lan", &["dns"]));
    }
}
