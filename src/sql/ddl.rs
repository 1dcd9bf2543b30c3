//! DDL for data tables provisioned from descriptors.

use crate::descriptor::{DescriptorKind, TableRef};
use crate::sql::{quote_identifier, quote_literal};

const ENTITY_COLUMN_COMMENTS: &[(&str, &str)] = &[
    ("id", "Record identifier"),
    ("extra", "Extension payload"),
];

const DICTIONARY_COLUMN_COMMENTS: &[(&str, &str)] = &[
    ("id", "Record identifier"),
    ("name", "Record name"),
    ("pid", "Parent record identifier"),
    ("ord", "Sort order among siblings"),
    ("extra", "Extension payload"),
];

/// Standard columns and their comments for a kind.
pub fn column_comments(kind: DescriptorKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        DescriptorKind::Entity => ENTITY_COLUMN_COMMENTS,
        DescriptorKind::Dictionary => DICTIONARY_COLUMN_COMMENTS,
    }
}

fn create_table(kind: DescriptorKind, table: &TableRef) -> String {
    let full = table.quoted_full_name();
    let pk = table.quoted_object_name("pk");
    match kind {
        DescriptorKind::Entity => format!(
            r#"CREATE TABLE {full}
(
  id int4 NOT NULL GENERATED BY DEFAULT AS IDENTITY,
  extra jsonb NULL,
  CONSTRAINT {pk} PRIMARY KEY (id)
)"#
        ),
        DescriptorKind::Dictionary => {
            let fk = table.quoted_object_name("fk");
            format!(
                r#"CREATE TABLE {full}
(
  id int4 NOT NULL GENERATED BY DEFAULT AS IDENTITY,
  name text NOT NULL,
  pid int4 NULL,
  ord int4 NULL,
  extra jsonb NULL,
  CONSTRAINT {pk} PRIMARY KEY (id),
  CONSTRAINT {fk} FOREIGN KEY (pid) REFERENCES {full}(id) ON DELETE CASCADE ON UPDATE CASCADE
)"#
            )
        }
    }
}

/// Every statement needed to provision `table`, in execution order. Run them in one
/// transaction.
pub fn provision_statements(kind: DescriptorKind, table: &TableRef, description: &str) -> Vec<String> {
    let full = table.quoted_full_name();
    let mut out = vec![
        format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_identifier(table.schema_name())
        ),
        create_table(kind, table),
    ];

    if kind == DescriptorKind::Dictionary {
        out.push(format!(
            "CREATE INDEX {} ON {}(name)",
            table.quoted_object_name("name_idx"),
            full
        ));
        out.push(format!(
            "CREATE INDEX {} ON {}(pid)",
            table.quoted_object_name("pid_idx"),
            full
        ));
    }

    let description = description.trim();
    if !description.is_empty() {
        out.push(format!(
            "COMMENT ON TABLE {} IS {}",
            full,
            quote_literal(description)
        ));
    }
    for (column, comment) in column_comments(kind) {
        out.push(format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            full,
            quote_identifier(column),
            quote_literal(comment)
        ));
    }

    out.push(format!(
        "CLUSTER {} USING {}",
        full,
        table.quoted_object_name("pk")
    ));
    out
}
