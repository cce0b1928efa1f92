//! SQL-ish select generation for the document store's query API
//!
//! The service accepts a restricted SQL dialect where every query reads
//! `SELECT <projection> FROM <container> <alias> [WHERE ...]` and
//! properties are referenced through the container alias.

/// Default container alias in generated statements
pub const DEFAULT_ALIAS: &str = "f";

/// What the generated statement projects
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    /// `SELECT *`
    All,
    /// A plain list of properties, e.g. `SELECT f.id, f.address.city`
    Fields(&'a [&'a str]),
    /// Keyed properties, optionally wrapped as a named object:
    /// `SELECT {"Name":f.id, "City":f.address.city} AS Family`
    Projection {
        fields: &'a [(&'a str, &'a str)],
        name: Option<&'a str>,
    },
}

/// Reference a property through the alias, quoting names that contain a
/// space (also the escape for SQL keywords used as property names).
fn property_reference(alias: &str, name: &str) -> String {
    if name.contains(' ') {
        format!("{alias}[\"{name}\"]")
    } else {
        format!("{alias}.{name}")
    }
}

/// Generate a select statement over `container`
///
/// `where_clauses` are `(property, value)` pairs combined as equality
/// conditions; values are emitted verbatim, so string literals must arrive
/// already quoted.
pub fn select(
    container: &str,
    selection: Selection<'_>,
    alias: &str,
    where_clauses: &[(&str, &str)],
) -> String {
    let mut sql = String::from("SELECT ");

    match selection {
        Selection::All => sql.push('*'),
        Selection::Fields(fields) => {
            let refs: Vec<String> = fields
                .iter()
                .map(|name| property_reference(alias, name))
                .collect();
            sql.push_str(&refs.join(", "));
        }
        Selection::Projection { fields, name } => {
            let pairs: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("\"{key}\":{}", property_reference(alias, value)))
                .collect();
            if name.is_some() {
                sql.push('{');
            }
            sql.push_str(&pairs.join(", "));
            if let Some(name) = name {
                sql.push_str("} AS ");
                sql.push_str(name);
            }
        }
    }

    sql.push_str(&format!(" FROM {container} {alias}"));

    if !where_clauses.is_empty() {
        let conditions: Vec<String> = where_clauses
            .iter()
            .map(|(key, value)| format!("{} = {value}", property_reference(alias, key)))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(","));
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_all() {
        assert_eq!(
            select("Families", Selection::All, DEFAULT_ALIAS, &[]),
            "SELECT * FROM Families f"
        );
    }

    #[test]
    fn select_field_list() {
        assert_eq!(
            select(
                "Families",
                Selection::Fields(&["id", "address.city"]),
                DEFAULT_ALIAS,
                &[]
            ),
            "SELECT f.id, f.address.city FROM Families f"
        );
    }

    #[test]
    fn select_named_projection() {
        assert_eq!(
            select(
                "Families",
                Selection::Projection {
                    fields: &[("Name", "id"), ("City", "address.city")],
                    name: Some("Family"),
                },
                DEFAULT_ALIAS,
                &[]
            ),
            "SELECT {\"Name\":f.id, \"City\":f.address.city} AS Family FROM Families f"
        );
    }

    #[test]
    fn select_keyed_projection_without_name() {
        assert_eq!(
            select(
                "Families",
                Selection::Projection {
                    fields: &[("Name", "id")],
                    name: None,
                },
                DEFAULT_ALIAS,
                &[]
            ),
            "SELECT \"Name\":f.id FROM Families f"
        );
    }

    #[test]
    fn where_clauses_join_with_commas() {
        assert_eq!(
            select(
                "Families",
                Selection::All,
                DEFAULT_ALIAS,
                &[("address.city", "f.address.state"), ("day", "\"monday\"")]
            ),
            "SELECT * FROM Families f WHERE f.address.city = f.address.state,f.day = \"monday\""
        );
    }

    #[test]
    fn property_with_space_is_bracket_quoted() {
        assert_eq!(
            select(
                "c",
                Selection::Fields(&["has space"]),
                DEFAULT_ALIAS,
                &[("also spaced", "1")]
            ),
            "SELECT f[\"has space\"] FROM c f WHERE f[\"also spaced\"] = 1"
        );
    }

    #[test]
    fn alternate_alias_flows_through() {
        assert_eq!(
            select("c", Selection::Fields(&["id"]), "doc", &[]),
            "SELECT doc.id FROM c doc"
        );
    }
}
